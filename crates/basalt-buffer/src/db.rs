//! Database context.

use basalt_common::config::StorageConfig;
use basalt_common::error::Result;
use basalt_storage::{Catalog, HeapFile, PageBroker, TupleDesc};

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::pool::{BufferPool, BufferPoolConfig};

/// One database instance: configuration, buffer pool, and catalog.
///
/// There is no process-wide instance; callers construct a `Database`
/// and pass it (or its parts) to whatever needs storage access.
pub struct Database {
    config: StorageConfig,
    pool: Arc<BufferPool>,
    catalog: Arc<Catalog>,
}

impl Database {
    /// Opens a database rooted at `config.data_dir`, creating the
    /// directory if needed.
    pub fn new(config: StorageConfig) -> Result<Database> {
        fs::create_dir_all(&config.data_dir)?;
        let pool = Arc::new(BufferPool::new(BufferPoolConfig {
            page_size: config.page_size,
        }));
        let broker: Arc<dyn PageBroker> = Arc::clone(&pool) as Arc<dyn PageBroker>;
        let catalog = Arc::new(Catalog::new(broker, config.clone()));
        debug!(
            data_dir = %config.data_dir.display(),
            page_size = config.page_size,
            "opened database"
        );
        Ok(Database {
            config,
            pool,
            catalog,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Creates or reopens the table `name`, backed by
    /// `<data_dir>/<name>.dat`, and binds it in the catalog.
    pub fn create_table(
        &self,
        name: &str,
        schema: TupleDesc,
        primary_key: &str,
    ) -> Result<Arc<HeapFile>> {
        let path = self.config.data_dir.join(format!("{}.dat", name));
        let broker: Arc<dyn PageBroker> = Arc::clone(&self.pool) as Arc<dyn PageBroker>;
        let file = Arc::new(HeapFile::open(
            path,
            Arc::new(schema),
            broker,
            self.config.fsync_enabled,
        )?);
        self.catalog.add_table(Arc::clone(&file), name, primary_key);
        Ok(file)
    }

    /// Loads tables in bulk from a schema file. See
    /// [`Catalog::load_schema`] for the format.
    pub fn load_schema(&self, path: impl AsRef<Path>) -> Result<()> {
        self.catalog.load_schema(path)
    }
}
