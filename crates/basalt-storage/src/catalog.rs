//! Table catalog.
//!
//! The catalog maps table names and table ids to their schemas,
//! primary keys, and backing heap files. Bindings are process-local
//! state: tables are added programmatically or loaded in bulk from a
//! schema file, and adding a table under an existing name or id
//! replaces the old binding entirely.

use basalt_common::config::StorageConfig;
use basalt_common::error::{BasaltError, Result};
use basalt_common::types::{FieldType, DEFAULT_TEXT_CAPACITY};

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::broker::{DbFile, PageBroker};
use crate::heap::HeapFile;
use crate::schema::{FieldDef, TupleDesc};

struct TableEntry {
    name: String,
    file: Arc<HeapFile>,
    primary_key: String,
}

/// Registry of every table the engine knows about.
pub struct Catalog {
    broker: Arc<dyn PageBroker>,
    config: StorageConfig,
    inner: RwLock<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
    by_name: HashMap<String, u32>,
    by_id: HashMap<u32, TableEntry>,
}

impl Catalog {
    pub fn new(broker: Arc<dyn PageBroker>, config: StorageConfig) -> Catalog {
        Catalog {
            broker,
            config,
            inner: RwLock::new(CatalogInner::default()),
        }
    }

    /// Binds `file` under `name`, registering it with the broker so its
    /// pages become loadable. A table may have an empty name or primary
    /// key. Rebinding an existing name or id drops the old binding
    /// wholesale, so the replaced table stops resolving by either key.
    pub fn add_table(&self, file: Arc<HeapFile>, name: &str, primary_key: &str) {
        let table_id = file.id();
        let weak: Weak<dyn DbFile> = Arc::<HeapFile>::downgrade(&file);
        self.broker.register_file(table_id, weak);

        let mut inner = self.inner.write();
        if let Some(old_id) = inner.by_name.remove(name) {
            inner.by_id.remove(&old_id);
        }
        if let Some(old) = inner.by_id.remove(&table_id) {
            inner.by_name.remove(&old.name);
        }
        inner.by_name.insert(name.to_string(), table_id);
        inner.by_id.insert(
            table_id,
            TableEntry {
                name: name.to_string(),
                file,
                primary_key: primary_key.to_string(),
            },
        );
    }

    /// Id of the table named `name`.
    pub fn table_id(&self, name: &str) -> Result<u32> {
        self.inner
            .read()
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| BasaltError::TableNotFound(name.to_string()))
    }

    /// Schema of table `table_id`.
    pub fn schema(&self, table_id: u32) -> Result<Arc<TupleDesc>> {
        let inner = self.inner.read();
        let entry = inner
            .by_id
            .get(&table_id)
            .ok_or(BasaltError::TableIdNotFound(table_id))?;
        Ok(Arc::clone(entry.file.schema()))
    }

    /// Backing heap file of table `table_id`.
    pub fn file(&self, table_id: u32) -> Result<Arc<HeapFile>> {
        let inner = self.inner.read();
        let entry = inner
            .by_id
            .get(&table_id)
            .ok_or(BasaltError::TableIdNotFound(table_id))?;
        Ok(Arc::clone(&entry.file))
    }

    /// Primary key field name of table `table_id`. Empty when the table
    /// has none.
    pub fn primary_key(&self, table_id: u32) -> Result<String> {
        let inner = self.inner.read();
        let entry = inner
            .by_id
            .get(&table_id)
            .ok_or(BasaltError::TableIdNotFound(table_id))?;
        Ok(entry.primary_key.clone())
    }

    /// Name of table `table_id`.
    pub fn table_name(&self, table_id: u32) -> Result<String> {
        let inner = self.inner.read();
        let entry = inner
            .by_id
            .get(&table_id)
            .ok_or(BasaltError::TableIdNotFound(table_id))?;
        Ok(entry.name.clone())
    }

    /// Ids of every bound table, in no particular order.
    pub fn table_ids(&self) -> Vec<u32> {
        self.inner.read().by_id.keys().copied().collect()
    }

    /// Drops every binding. Already-issued file handles stay usable.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.by_name.clear();
        inner.by_id.clear();
    }

    /// Loads tables in bulk from a schema file.
    ///
    /// Each non-blank line reads `name (field type, field type pk, ...)`
    /// with types `int`, `string`, or `string(N)`, case-insensitive,
    /// and at most one field marked `pk`. Each table's data lives in
    /// `<name>.dat` next to the schema file. Any malformed line fails
    /// the whole load; a partially loaded catalog is not worth
    /// repairing, so callers should treat this as fatal.
    pub fn load_schema(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            BasaltError::ConfigError(format!(
                "cannot read schema file {}: {}",
                path.display(),
                err
            ))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.load_table_line(base_dir, line).map_err(|err| match err {
                BasaltError::ConfigError(msg) => {
                    BasaltError::ConfigError(format!("line {}: {}", line_no + 1, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    fn load_table_line(&self, base_dir: &Path, line: &str) -> Result<()> {
        let open = line.find('(').ok_or_else(|| {
            BasaltError::ConfigError(format!("expected `name (fields...)`, got `{}`", line))
        })?;
        let close = line.rfind(')').filter(|&c| c > open).ok_or_else(|| {
            BasaltError::ConfigError(format!("unterminated field list in `{}`", line))
        })?;
        let name = line[..open].trim();
        let body = &line[open + 1..close];

        let mut fields = Vec::new();
        let mut primary_key = String::new();
        for field_decl in body.split(',') {
            let mut parts = field_decl.split_whitespace();
            let field_name = parts.next().ok_or_else(|| {
                BasaltError::ConfigError(format!("empty field in table `{}`", name))
            })?;
            let type_token = parts.next().ok_or_else(|| {
                BasaltError::ConfigError(format!("field `{}` has no type", field_name))
            })?;
            match parts.next() {
                None => {}
                Some(token) if token.eq_ignore_ascii_case("pk") => {
                    if !primary_key.is_empty() {
                        return Err(BasaltError::ConfigError(format!(
                            "table `{}` declares more than one primary key",
                            name
                        )));
                    }
                    primary_key = field_name.to_string();
                }
                Some(token) => {
                    return Err(BasaltError::ConfigError(format!(
                        "unknown annotation `{}` on field `{}`",
                        token, field_name
                    )));
                }
            }
            if parts.next().is_some() {
                return Err(BasaltError::ConfigError(format!(
                    "trailing tokens after field `{}`",
                    field_name
                )));
            }
            fields.push(FieldDef::named(parse_field_type(type_token)?, field_name));
        }
        if fields.is_empty() {
            return Err(BasaltError::ConfigError(format!(
                "table `{}` has no fields",
                name
            )));
        }

        let schema = Arc::new(TupleDesc::new(fields));
        let data_path = base_dir.join(format!("{}.dat", name));
        let file = Arc::new(HeapFile::open(
            &data_path,
            schema,
            Arc::clone(&self.broker),
            self.config.fsync_enabled,
        )?);
        debug!(
            table = name,
            table_id = file.id(),
            path = %data_path.display(),
            "loaded table from schema file"
        );
        self.add_table(file, name, &primary_key);
        Ok(())
    }
}

fn parse_field_type(token: &str) -> Result<FieldType> {
    let lower = token.to_ascii_lowercase();
    if lower == "int" {
        return Ok(FieldType::Int);
    }
    if lower == "string" {
        return Ok(FieldType::Text(DEFAULT_TEXT_CAPACITY));
    }
    if let Some(capacity) = lower.strip_prefix("string(").and_then(|r| r.strip_suffix(')')) {
        let capacity = capacity.trim().parse().map_err(|_| {
            BasaltError::ConfigError(format!("bad string capacity in `{}`", token))
        })?;
        return Ok(FieldType::Text(capacity));
    }
    Err(BasaltError::ConfigError(format!("unknown type `{}`", token)))
}
