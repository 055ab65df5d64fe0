//! The seam between tuple storage and page caching.
//!
//! Heap files never hand out pages directly. Every page access, the
//! file's own included, goes through a [`PageBroker`] so that at most
//! one decoded copy of a page exists process-wide and all readers and
//! writers contend on that copy's lock. The broker resolves cache
//! misses by calling back into the owning [`DbFile`], which it knows
//! only through a weak registration to keep the ownership graph
//! acyclic.

use basalt_common::error::Result;
use basalt_common::page::PageId;
use basalt_common::tx::{Permission, TransactionId};

use parking_lot::RwLock;
use std::sync::{Arc, Weak};

use crate::heap::HeapPage;
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// Shared handle to the single decoded copy of a page.
pub type PageHandle = Arc<RwLock<HeapPage>>;

/// Page access broker implemented by the buffer pool.
pub trait PageBroker: Send + Sync {
    /// Page size shared by every file behind this broker.
    fn page_size(&self) -> usize;

    /// Returns the handle for `page_id`, loading the page through its
    /// owning file on first access. Repeated calls for the same page
    /// return handles to the same copy.
    fn get_page(
        &self,
        txn_id: TransactionId,
        page_id: PageId,
        perm: Permission,
    ) -> Result<PageHandle>;

    /// Makes a table's file known so cache misses on its pages can be
    /// resolved.
    fn register_file(&self, table_id: u32, file: Weak<dyn DbFile>);
}

/// A table's backing file, as seen by the broker and the catalog.
pub trait DbFile: Send + Sync {
    /// Stable identifier of the table this file backs.
    fn id(&self) -> u32;

    /// Schema of every tuple in the file.
    fn schema(&self) -> &Arc<TupleDesc>;

    /// Number of whole pages currently on disk.
    fn num_pages(&self) -> Result<u32>;

    /// Reads and decodes one page from disk, bypassing any cache.
    fn read_page(&self, page_id: PageId) -> Result<HeapPage>;

    /// Writes one page back to disk at the offset its id dictates.
    fn write_page(&self, page: &HeapPage) -> Result<()>;

    /// Inserts a tuple, extending the file when no page has room.
    /// Returns the ids of the pages the insert modified.
    fn insert_tuple(&self, txn_id: TransactionId, tuple: Tuple) -> Result<Vec<PageId>>;

    /// Deletes the tuple at `tuple`'s record id and clears that id.
    /// Returns the id of the page the delete modified.
    fn delete_tuple(&self, txn_id: TransactionId, tuple: &mut Tuple) -> Result<PageId>;

    /// Creates a scan over every tuple in the file. The scan starts
    /// closed; call [`TupleScan::open`] before reading.
    fn scan<'a>(&'a self, txn_id: TransactionId) -> Box<dyn TupleScan + 'a>;
}

/// Restartable cursor over a file's tuples in page-then-slot order.
///
/// The protocol: [`open`](TupleScan::open) before anything else,
/// [`has_next`](TupleScan::has_next) and [`next`](TupleScan::next) to
/// drain, [`rewind`](TupleScan::rewind) to start over, and
/// [`close`](TupleScan::close) when done. On a closed scan `has_next`
/// reports false, `next` fails, and `rewind` resets the position
/// without opening.
pub trait TupleScan {
    fn open(&mut self) -> Result<()>;

    fn has_next(&mut self) -> Result<bool>;

    /// Returns the next tuple. Fails with
    /// [`BasaltError::ScanExhausted`](basalt_common::error::BasaltError::ScanExhausted)
    /// when the scan is closed or drained.
    fn next(&mut self) -> Result<Tuple>;

    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self);
}
