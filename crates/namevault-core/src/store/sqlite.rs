//! Relational backend
//!
//! Stores records in a single SQLite table of key/payload pairs. The
//! connection sits behind a mutex because rusqlite connections are not
//! `Sync`; isolation beyond that is SQLite's job, the facade adds no
//! locking of its own.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Resource;
use crate::store::backend::Backend;
use crate::store::codec;
use crate::store::error::{StoreError, StoreResult};

/// Statements creating the record namespace, idempotent
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        key     TEXT PRIMARY KEY,
        payload BLOB NOT NULL
    );
"#;

/// Storage backend on a SQLite database file
pub struct SqliteStore {
    path: PathBuf,
    conn: Option<Mutex<Connection>>,
}

impl SqliteStore {
    /// Create a handle for the database file at `path`
    ///
    /// Nothing is opened until [`Backend::initialize`] runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            conn: None,
        }
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        let mutex = self.conn.as_ref().ok_or_else(|| StoreError::Connection {
            uri: self.path.display().to_string(),
            details: "backend not initialized".to_string(),
        })?;
        mutex.lock().map_err(|_| StoreError::Connection {
            uri: self.path.display().to_string(),
            details: "connection mutex poisoned".to_string(),
        })
    }
}

impl Backend for SqliteStore {
    fn initialize(&mut self) -> StoreResult<()> {
        let conn = Connection::open(&self.path).map_err(|err| StoreError::Connection {
            uri: self.path.display().to_string(),
            details: err.to_string(),
        })?;

        conn.execute_batch(SCHEMA)
            .map_err(|err| StoreError::Schema {
                details: err.to_string(),
            })?;

        self.conn = Some(Mutex::new(conn));
        Ok(())
    }

    fn add_record(&self, resource: &Resource) -> StoreResult<()> {
        self.update_record(&resource.domain, resource)
    }

    fn get_record(&self, domain: &str) -> StoreResult<Resource> {
        let key = codec::storage_key(domain);
        let payload: Option<Vec<u8>> = self
            .conn()?
            .query_row(
                "SELECT payload FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(bytes) => codec::decode(&bytes),
            None => Err(StoreError::NotFound {
                domain: domain.to_string(),
            }),
        }
    }

    fn update_record(&self, domain: &str, resource: &Resource) -> StoreResult<()> {
        let key = codec::storage_key(domain);
        let payload = codec::encode(resource)?;

        self.conn()?.execute(
            "INSERT INTO records (key, payload) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload",
            params![key, payload],
        )?;
        Ok(())
    }

    fn delete_record(&self, domain: &str) -> StoreResult<()> {
        let key = codec::storage_key(domain);
        self.conn()?
            .execute("DELETE FROM records WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn reset_records(&self, resources: &[Resource]) -> StoreResult<()> {
        // Drop and recreate the table in one batch, then release the
        // lock before repopulating through the add path.
        {
            let conn = self.conn()?;
            conn.execute_batch("DROP TABLE IF EXISTS records;")?;
            conn.execute_batch(SCHEMA)?;
        }

        for resource in resources {
            self.add_record(resource)
                .map_err(|err| StoreError::Reset {
                    domain: resource.domain.clone(),
                    source: Box::new(err),
                })?;
        }
        Ok(())
    }

    fn list_records(&self) -> StoreResult<Vec<Resource>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT payload FROM records")?;
        let payloads = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut result = Vec::new();
        for payload in payloads {
            result.push(codec::decode(&payload?)?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> SqliteStore {
        let mut store = SqliteStore::new(temp_dir.path().join("records.db"));
        store.initialize().unwrap();
        store
    }

    fn resource(domain: &str, address: &str) -> Resource {
        let mut resource = Resource::new(domain);
        resource.records.push(Record::new(address));
        resource.validate();
        resource
    }

    #[test]
    fn test_add_then_get_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        let saved = resource("example.com", "127.0.0.1");
        store.add_record(&saved).unwrap();

        assert_eq!(store.get_record("example.com.").unwrap(), saved);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        assert!(matches!(
            store.get_record("missing.example.com."),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.delete_record("never-added.example.com.").unwrap();

        store.add_record(&resource("example.com", "127.0.0.1")).unwrap();
        store.delete_record("example.com.").unwrap();
        store.delete_record("example.com.").unwrap();
    }

    #[test]
    fn test_update_is_upsert() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        let first = resource("example.com", "10.0.0.1");
        store.update_record("example.com.", &first).unwrap();
        let second = resource("example.com", "10.0.0.2");
        store.update_record("example.com.", &second).unwrap();

        let loaded = store.get_record("example.com.").unwrap();
        assert_eq!(loaded.records[0].address, "10.0.0.2");
    }

    #[test]
    fn test_reset_replaces_everything() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.add_record(&resource("old.example.com", "10.0.0.1")).unwrap();
        store.add_record(&resource("kept.example.com", "10.0.0.2")).unwrap();

        store
            .reset_records(&[
                resource("kept.example.com", "192.168.0.1"),
                resource("new.example.com", "192.168.0.2"),
            ])
            .unwrap();

        let mut listed = store.list_records().unwrap();
        listed.sort_by(|a, b| a.domain.cmp(&b.domain));

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].records[0].address, "192.168.0.1");
        assert!(matches!(
            store.get_record("old.example.com."),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_initialize_preserves_existing_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.db");

        let mut store = SqliteStore::new(&path);
        store.initialize().unwrap();
        store.add_record(&resource("example.com", "127.0.0.1")).unwrap();
        drop(store);

        let mut reopened = SqliteStore::new(&path);
        reopened.initialize().unwrap();
        assert_eq!(
            reopened.get_record("example.com.").unwrap().records[0].address,
            "127.0.0.1"
        );
    }

    #[test]
    fn test_initialize_unwritable_path_is_connection_error() {
        let err = SqliteStore::new("/nonexistent-dir/sub/records.db")
            .initialize()
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection { .. }));
    }
}
