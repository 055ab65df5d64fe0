//! Heap files: one table's pages on disk.
//!
//! A heap file is a flat sequence of equal-size pages at offsets
//! `page_no * page_size`. The file owns raw page I/O and the policy
//! decisions (first-fit insert, extend-on-full, whole-file scan) but
//! never caches decoded pages itself; any page it wants to look inside
//! comes back through the [`PageBroker`] so the cached copy is the one
//! it mutates.

use basalt_common::error::{BasaltError, Result};
use basalt_common::page::PageId;
use basalt_common::tx::{Permission, TransactionId};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::broker::{DbFile, PageBroker, TupleScan};
use crate::heap::page::HeapPage;
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// On-disk heap file backing one table.
pub struct HeapFile {
    path: PathBuf,
    table_id: u32,
    schema: Arc<TupleDesc>,
    broker: Arc<dyn PageBroker>,
    file: Mutex<File>,
    fsync_enabled: bool,
}

impl HeapFile {
    /// Opens the heap file at `path`, creating it empty if missing.
    ///
    /// The table id is the CRC32 of the canonical path, so reopening
    /// the same file yields the same id within one host. Fails with
    /// [`BasaltError::TupleTooLarge`] when a tuple of this schema
    /// cannot fit even one slot per page.
    pub fn open(
        path: impl AsRef<Path>,
        schema: Arc<TupleDesc>,
        broker: Arc<dyn PageBroker>,
        fsync_enabled: bool,
    ) -> Result<HeapFile> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let path = path.as_ref().canonicalize()?;

        let page_size = broker.page_size();
        let tuple_size = schema.byte_size();
        if HeapPage::slot_capacity(page_size, tuple_size) == 0 {
            return Err(BasaltError::TupleTooLarge {
                tuple_size,
                page_size,
            });
        }

        let table_id = crc32fast::hash(path.as_os_str().as_encoded_bytes());
        debug!(path = %path.display(), table_id, "opened heap file");
        Ok(HeapFile {
            path,
            table_id,
            schema,
            broker,
            file: Mutex::new(file),
            fsync_enabled,
        })
    }

    /// Canonical path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stable identifier of the table this file backs.
    pub fn id(&self) -> u32 {
        self.table_id
    }

    pub fn schema(&self) -> &Arc<TupleDesc> {
        &self.schema
    }

    /// Number of whole pages currently in the file.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok((len / self.broker.page_size() as u64) as u32)
    }

    /// Reads and decodes the page at `page_id`'s offset, bypassing the
    /// broker. Reading at or past the end of the file fails with
    /// [`BasaltError::PageNotFound`].
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        let page_size = self.broker.page_size();
        let offset = page_id.page_no as u64 * page_size as u64;

        let mut buf = vec![0u8; page_size];
        {
            let mut file = self.file.lock();
            if offset >= file.metadata()?.len() {
                return Err(BasaltError::PageNotFound { page_id });
            }
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)?;
        }
        trace!(page_id = %page_id, "read page from disk");
        HeapPage::parse(page_id, Arc::clone(&self.schema), &buf, page_size)
    }

    /// Writes `page` at the offset its id dictates. Writing at the
    /// current end extends the file by one page; writing further out
    /// would leave a hole of undefined pages and fails instead.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let page_size = self.broker.page_size();
        let page_id = page.id();
        let offset = page_id.page_no as u64 * page_size as u64;
        let data = page.serialize();

        let mut file = self.file.lock();
        if offset > file.metadata()?.len() {
            return Err(BasaltError::PageNotFound { page_id });
        }
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&data)?;
        if self.fsync_enabled {
            file.sync_all()?;
        }
        trace!(page_id = %page_id, "wrote page to disk");
        Ok(())
    }

    /// Appends an all-zero page and returns its id.
    fn append_empty_page(&self) -> Result<PageId> {
        let page_size = self.broker.page_size();
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let page_no = (len / page_size as u64) as u32;

        file.seek(SeekFrom::Start(len))?;
        file.write_all(&HeapPage::empty_page_data(page_size))?;
        if self.fsync_enabled {
            file.sync_all()?;
        }
        debug!(table_id = self.table_id, page_no, "extended heap file");
        Ok(PageId::new(self.table_id, page_no))
    }

    /// Inserts `tuple` into the first page with a free slot, checking
    /// pages in ascending order. When every page is full the file grows
    /// by one empty page and the tuple lands in its slot 0. Returns the
    /// ids of the pages the insert modified.
    pub fn insert_tuple(&self, txn_id: TransactionId, tuple: Tuple) -> Result<Vec<PageId>> {
        if tuple.schema().as_ref() != self.schema.as_ref() {
            return Err(BasaltError::SchemaMismatch {
                expected: self.schema.to_string(),
                actual: tuple.schema().to_string(),
            });
        }
        if let Some(index) = tuple.first_unset() {
            return Err(BasaltError::IncompleteTuple { index });
        }

        for page_no in 0..self.num_pages()? {
            let page_id = PageId::new(self.table_id, page_no);
            let handle = self
                .broker
                .get_page(txn_id, page_id, Permission::ReadWrite)?;
            // The free-slot check and the insert happen under one write
            // latch so no other writer can steal the slot in between.
            let mut page = handle.write();
            if page.empty_slot_count() == 0 {
                continue;
            }
            page.insert_tuple(tuple)?;
            page.mark_dirty(true, txn_id);
            return Ok(vec![page_id]);
        }

        let page_id = self.append_empty_page()?;
        let handle = self
            .broker
            .get_page(txn_id, page_id, Permission::ReadWrite)?;
        let mut page = handle.write();
        page.insert_tuple(tuple)?;
        page.mark_dirty(true, txn_id);
        Ok(vec![page_id])
    }

    /// Deletes the tuple at `tuple`'s record id and clears that id.
    /// Returns the id of the page the delete modified. Fails with
    /// [`BasaltError::TupleNotFound`], mutating nothing, when the
    /// record id is missing, names another table, or points past the
    /// end of the file.
    pub fn delete_tuple(&self, txn_id: TransactionId, tuple: &mut Tuple) -> Result<PageId> {
        let record_id = tuple.record_id().ok_or_else(|| {
            BasaltError::TupleNotFound("tuple has no record id".to_string())
        })?;
        let page_id = record_id.page_id;
        if page_id.table_id != self.table_id {
            return Err(BasaltError::TupleNotFound(format!(
                "record {} does not belong to table {}",
                record_id, self.table_id
            )));
        }
        if page_id.page_no >= self.num_pages()? {
            return Err(BasaltError::TupleNotFound(format!(
                "record {} points past the end of the file",
                record_id
            )));
        }

        let handle = self
            .broker
            .get_page(txn_id, page_id, Permission::ReadWrite)?;
        let mut page = handle.write();
        page.delete_tuple(tuple)?;
        page.mark_dirty(true, txn_id);
        Ok(page_id)
    }

    /// Creates a scan over every tuple in the file. The scan starts
    /// closed.
    pub fn scan(&self, txn_id: TransactionId) -> HeapFileScan<'_> {
        HeapFileScan {
            file: self,
            txn_id,
            state: ScanState::Closed,
        }
    }
}

impl DbFile for HeapFile {
    fn id(&self) -> u32 {
        HeapFile::id(self)
    }

    fn schema(&self) -> &Arc<TupleDesc> {
        HeapFile::schema(self)
    }

    fn num_pages(&self) -> Result<u32> {
        HeapFile::num_pages(self)
    }

    fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        HeapFile::read_page(self, page_id)
    }

    fn write_page(&self, page: &HeapPage) -> Result<()> {
        HeapFile::write_page(self, page)
    }

    fn insert_tuple(&self, txn_id: TransactionId, tuple: Tuple) -> Result<Vec<PageId>> {
        HeapFile::insert_tuple(self, txn_id, tuple)
    }

    fn delete_tuple(&self, txn_id: TransactionId, tuple: &mut Tuple) -> Result<PageId> {
        HeapFile::delete_tuple(self, txn_id, tuple)
    }

    fn scan<'a>(&'a self, txn_id: TransactionId) -> Box<dyn TupleScan + 'a> {
        Box::new(HeapFile::scan(self, txn_id))
    }
}

enum ScanState {
    Closed,
    Open {
        /// Next page to pull tuples from.
        next_page: u32,
        /// Tuples buffered from the page read most recently.
        buffered: VecDeque<Tuple>,
    },
    Exhausted,
}

/// Lazy whole-file scan. Pages are fetched through the broker one at a
/// time as the caller drains the previous page's tuples, so a scan
/// never holds more than one page's worth of tuples.
pub struct HeapFileScan<'f> {
    file: &'f HeapFile,
    txn_id: TransactionId,
    state: ScanState,
}

impl TupleScan for HeapFileScan<'_> {
    fn open(&mut self) -> Result<()> {
        if matches!(self.state, ScanState::Closed) {
            self.state = ScanState::Open {
                next_page: 0,
                buffered: VecDeque::new(),
            };
        }
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        loop {
            match &mut self.state {
                ScanState::Closed | ScanState::Exhausted => return Ok(false),
                ScanState::Open { next_page, buffered } => {
                    if !buffered.is_empty() {
                        return Ok(true);
                    }
                    if *next_page >= self.file.num_pages()? {
                        self.state = ScanState::Exhausted;
                        return Ok(false);
                    }
                    let page_id = PageId::new(self.file.table_id, *next_page);
                    *next_page += 1;
                    let handle =
                        self.file
                            .broker
                            .get_page(self.txn_id, page_id, Permission::ReadOnly)?;
                    let page = handle.read();
                    buffered.extend(page.iter().cloned());
                }
            }
        }
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(BasaltError::ScanExhausted);
        }
        match &mut self.state {
            ScanState::Open { buffered, .. } => {
                buffered.pop_front().ok_or(BasaltError::ScanExhausted)
            }
            _ => Err(BasaltError::ScanExhausted),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        // A closed scan keeps its position reset but stays closed.
        if !matches!(self.state, ScanState::Closed) {
            self.state = ScanState::Open {
                next_page: 0,
                buffered: VecDeque::new(),
            };
        }
        Ok(())
    }

    fn close(&mut self) {
        self.state = ScanState::Closed;
    }
}
