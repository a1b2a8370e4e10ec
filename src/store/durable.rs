//! ACID-durable material store backed by redb.
//!
//! Each material is one bincode-encoded record keyed by its id, with its
//! properties embedded. Every write is its own transaction; reads use MVCC
//! snapshots. Id allocation resumes past the largest stored ids on open.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::error::StoreError;
use crate::filter::FilterExpr;
use crate::model::{Material, MaterialId};
use crate::store::{Allocators, DEFAULT_MAX_COMPOUND_LEN, MaterialStore, StoreResult};

/// Material records: id → bincode(`Material`).
const MATERIALS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("materials");

/// Database file name inside the data directory.
pub const DB_FILE: &str = "materials.redb";

/// ACID-durable store using redb.
pub struct DurableStore {
    db: Arc<Database>,
    alloc: Allocators,
}

fn redb_err<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{context} failed: {e}"),
    }
}

fn decode(bytes: &[u8]) -> StoreResult<Material> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
        message: format!("failed to decode material: {e}"),
    })
}

impl DurableStore {
    /// Open or create a store in `data_dir`.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let db_path = data_dir.join(DB_FILE);
        let db = Database::create(&db_path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Create the table up front so read transactions can always open it.
        let txn = db.begin_write().map_err(redb_err("begin_write"))?;
        txn.open_table(MATERIALS_TABLE)
            .map_err(redb_err("open_table"))?;
        txn.commit().map_err(redb_err("commit"))?;

        let store = Self {
            db: Arc::new(db),
            alloc: Allocators::new(DEFAULT_MAX_COMPOUND_LEN),
        };
        let mut restored = 0usize;
        store.for_each(|m| {
            store.alloc.observe(&m);
            restored += 1;
            true
        })?;
        tracing::info!(path = %db_path.display(), restored, "opened durable material store");
        Ok(store)
    }

    /// Override the compound length limit.
    pub fn with_max_compound_len(mut self, max: usize) -> Self {
        self.alloc.set_max_compound_len(max);
        self
    }

    /// Visit every stored material in id order until `visit` returns false.
    fn for_each(&self, mut visit: impl FnMut(Material) -> bool) -> StoreResult<()> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(MATERIALS_TABLE)
            .map_err(redb_err("open_table"))?;
        for entry in table.iter().map_err(redb_err("iter"))? {
            let (_, value) = entry.map_err(redb_err("read entry"))?;
            if !visit(decode(value.value())?) {
                break;
            }
        }
        Ok(())
    }
}

impl MaterialStore for DurableStore {
    fn save(&self, material: &mut Material) -> StoreResult<MaterialId> {
        let id = self.alloc.prepare(material)?;
        let encoded = bincode::serialize(&*material).map_err(|e| StoreError::Serialization {
            message: format!("failed to encode material {id}: {e}"),
        })?;

        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        {
            let mut table = txn
                .open_table(MATERIALS_TABLE)
                .map_err(redb_err("open_table"))?;
            table
                .insert(id.get(), encoded.as_slice())
                .map_err(redb_err("insert"))?;
        }
        txn.commit().map_err(redb_err("commit"))?;
        Ok(id)
    }

    fn get(&self, id: MaterialId) -> StoreResult<Option<Material>> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(MATERIALS_TABLE)
            .map_err(redb_err("open_table"))?;
        let found = table.get(id.get()).map_err(redb_err("get"))?;
        found.map(|guard| decode(guard.value())).transpose()
    }

    fn execute(&self, filter: &FilterExpr) -> StoreResult<Vec<Material>> {
        let mut found = Vec::new();
        self.for_each(|m| {
            if filter.matches(&m) {
                found.push(m);
            }
            true
        })?;
        Ok(found)
    }

    fn remove(&self, id: MaterialId) -> StoreResult<Option<Material>> {
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        let removed = {
            let mut table = txn
                .open_table(MATERIALS_TABLE)
                .map_err(redb_err("open_table"))?;
            let guard = table.remove(id.get()).map_err(redb_err("remove"))?;
            guard.map(|g| decode(g.value())).transpose()?
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(removed)
    }

    fn len(&self) -> StoreResult<usize> {
        let txn = self.db.begin_read().map_err(redb_err("begin_read"))?;
        let table = txn
            .open_table(MATERIALS_TABLE)
            .map_err(redb_err("open_table"))?;
        let len = table.len().map_err(redb_err("len"))?;
        Ok(len as usize)
    }

    fn max_compound_len(&self) -> usize {
        self.alloc.max_compound_len()
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore").finish()
    }
}
