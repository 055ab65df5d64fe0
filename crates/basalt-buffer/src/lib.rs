//! Buffer management for BasaltDB.
//!
//! This crate provides:
//! - A buffer pool caching pages in decoded form, one shared handle
//!   per page identity
//! - Dirty tracking with explicit flush and discard
//! - The `Database` context tying configuration, pool, and catalog
//!   together

mod db;
mod pool;

pub use db::Database;
pub use pool::{BufferPool, BufferPoolConfig};
