//! Buffer pool manager.
//!
//! The pool caches pages in decoded form. One page identity maps to
//! exactly one [`PageHandle`] for as long as it stays cached, so every
//! reader and writer of that page contends on the same lock and sees
//! the same tuples. Cache misses are resolved through the owning file's
//! weak registration; the pool never holds files alive on its own.

use basalt_common::error::{BasaltError, Result};
use basalt_common::page::{PageId, DEFAULT_PAGE_SIZE};
use basalt_common::tx::{Permission, TransactionId};
use basalt_storage::{DbFile, PageBroker, PageHandle};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Size in bytes of every page behind this pool.
    pub page_size: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Shared cache of decoded pages.
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// The single decoded copy of each cached page.
    pages: RwLock<HashMap<PageId, PageHandle>>,
    /// Table id to owning file, weakly held.
    files: RwLock<HashMap<u32, Weak<dyn DbFile>>>,
}

impl BufferPool {
    /// Creates a new buffer pool.
    pub fn new(config: BufferPoolConfig) -> Self {
        Self {
            config,
            pages: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of pages currently cached.
    pub fn page_count(&self) -> usize {
        self.pages.read().len()
    }

    /// Checks if a page is in the pool.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.pages.read().contains_key(&page_id)
    }

    fn file(&self, table_id: u32) -> Result<Arc<dyn DbFile>> {
        self.files
            .read()
            .get(&table_id)
            .and_then(Weak::upgrade)
            .ok_or(BasaltError::TableIdNotFound(table_id))
    }

    /// Writes a cached page back to its file if it is dirty, clears the
    /// dirty mark, and snapshots the flushed state as the page's new
    /// before-image. Flushing an uncached page does nothing.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let handle = self.pages.read().get(&page_id).cloned();
        let Some(handle) = handle else {
            return Ok(());
        };

        let mut page = handle.write();
        if let Some(txn_id) = page.dirtied_by() {
            let file = self.file(page_id.table_id)?;
            file.write_page(&page)?;
            page.mark_dirty(false, txn_id);
            page.set_before_image();
            debug!(page_id = %page_id, txn = %txn_id, "flushed dirty page");
        }
        Ok(())
    }

    /// Flushes every cached dirty page. Pages whose table is no longer
    /// registered cannot be written back and are left cached.
    pub fn flush_all(&self) -> Result<()> {
        let page_ids: Vec<PageId> = self.pages.read().keys().copied().collect();
        for page_id in page_ids {
            match self.flush_page(page_id) {
                Ok(()) => {}
                Err(BasaltError::TableIdNotFound(table_id)) => {
                    debug!(page_id = %page_id, table_id, "skipping flush for unregistered table");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it back. Unflushed
    /// changes on that page are lost; the next access reloads it from
    /// disk.
    pub fn discard_page(&self, page_id: PageId) {
        self.pages.write().remove(&page_id);
    }
}

impl PageBroker for BufferPool {
    fn page_size(&self) -> usize {
        self.config.page_size
    }

    fn get_page(
        &self,
        txn_id: TransactionId,
        page_id: PageId,
        perm: Permission,
    ) -> Result<PageHandle> {
        if let Some(handle) = self.pages.read().get(&page_id) {
            return Ok(Arc::clone(handle));
        }

        let file = self.file(page_id.table_id)?;
        let page = file.read_page(page_id)?;
        trace!(page_id = %page_id, txn = %txn_id, ?perm, "page cache miss");

        // Two racing misses both decode; the entry call keeps whichever
        // copy landed first so there is still only one handle.
        let mut pages = self.pages.write();
        Ok(Arc::clone(
            pages
                .entry(page_id)
                .or_insert_with(|| Arc::new(RwLock::new(page))),
        ))
    }

    fn register_file(&self, table_id: u32, file: Weak<dyn DbFile>) {
        self.files.write().insert(table_id, file);
    }
}
