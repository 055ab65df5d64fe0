//! Heap storage implementation.
//!
//! This module provides bitmap-slotted tuple storage:
//! - HeapPage: fixed-size page codec with an occupancy bitmap
//! - HeapFile: the on-disk page sequence backing one table
//! - HeapFileScan: lazy page-by-page scan over a whole file

mod file;
mod page;

pub use file::{HeapFile, HeapFileScan};
pub use page::{HeapPage, HeapPageIter};
