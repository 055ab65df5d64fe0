//! Configuration structures for BasaltDB.

use crate::page::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration for the database engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for table data files.
    pub data_dir: PathBuf,
    /// Page size in bytes. Every page in every table file has this size,
    /// and all slot-count arithmetic derives from it.
    pub page_size: usize,
    /// Enable fsync after page writes for durability.
    pub fsync_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            page_size: DEFAULT_PAGE_SIZE,
            fsync_enabled: true,
        }
    }
}
