//! Storage engine for BasaltDB.
//!
//! This crate provides:
//! - Tuple schemas and the in-memory tuple representation
//! - Slotted heap pages with an occupancy bitmap
//! - Heap files backing one table each, with first-fit insert and
//!   lazy whole-file scans
//! - The table catalog and schema-file loader
//! - The broker traits the buffer pool implements to mediate every
//!   page access

mod broker;
mod catalog;
mod heap;
mod schema;
mod tuple;

pub use broker::{DbFile, PageBroker, PageHandle, TupleScan};
pub use catalog::Catalog;
pub use heap::{HeapFile, HeapFileScan, HeapPage, HeapPageIter};
pub use schema::{FieldDef, TupleDesc};
pub use tuple::{RecordId, Tuple};
