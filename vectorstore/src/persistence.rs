//! redb-backed persistence for both collections, grounded on `aither-rag`'s `RedbPersistence`
//! (`rag/src/persistence/redb_backend.rs`): one table per collection, JSON-serialized rows.

use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::{Result, VectorStoreError};
use crate::types::{Collection, RecordMetadata};

const VISUAL_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("visual");
const TEXT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("text");

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredRecord {
    cls: Vec<f32>,
    metadata: RecordMetadata,
}

/// Opens (creating if absent) a redb database for the two collections.
pub struct VectorStorePersistence {
    path: PathBuf,
    db: Database,
}

impl std::fmt::Debug for VectorStorePersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStorePersistence")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl VectorStorePersistence {
    /// Opens or creates the database file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(&path).map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        Ok(Self { path, db })
    }

    fn table_for(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
        match collection {
            Collection::Visual => VISUAL_TABLE,
            Collection::Text => TEXT_TABLE,
        }
    }

    /// Overwrites one collection's table with `records`.
    pub fn save(&self, collection: Collection, records: &[(Vec<f32>, RecordMetadata)]) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(Self::table_for(collection))
                .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
            for (cls, metadata) in records {
                let record = StoredRecord {
                    cls: cls.clone(),
                    metadata: metadata.clone(),
                };
                let bytes = serde_json::to_vec(&record)
                    .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
                table
                    .insert(metadata.record_id().as_str(), bytes.as_slice())
                    .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        Ok(())
    }

    /// Loads every record from one collection's table.
    pub fn load(&self, collection: Collection) -> Result<Vec<(Vec<f32>, RecordMetadata)>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
        let table = match read_txn.open_table(Self::table_for(collection)) {
            Ok(t) => t,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(VectorStoreError::Persistence(e.to_string())),
        };
        let mut out = Vec::new();
        for result in table.iter().map_err(|e| VectorStoreError::Persistence(e.to_string()))? {
            let (_, value) = result.map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
            let record: StoredRecord = serde_json::from_slice(value.value())
                .map_err(|e| VectorStoreError::Persistence(e.to_string()))?;
            out.push((record.cls, record.metadata));
        }
        Ok(out)
    }

    /// Database file path, for `Stats::approx_storage_mb`.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
