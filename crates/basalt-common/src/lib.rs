//! BasaltDB common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all BasaltDB components.

pub mod config;
pub mod error;
pub mod page;
pub mod tx;
pub mod types;

pub use config::StorageConfig;
pub use error::{BasaltError, Result};
pub use page::{PageId, DEFAULT_PAGE_SIZE};
pub use tx::{Permission, TransactionId};
pub use types::{Field, FieldType, DEFAULT_TEXT_CAPACITY};
