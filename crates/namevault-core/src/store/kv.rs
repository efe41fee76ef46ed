//! Embedded key-value backend
//!
//! Wraps redb, a single-file transactional engine. The database file is
//! opened exclusively; every read runs inside a read transaction and
//! every mutation inside its own write transaction, committed exactly
//! once per call. Records live in one `dns` table keyed by the shared
//! prefix convention.

use std::fs;
use std::path::PathBuf;

use redb::{Database, ReadableTable, TableDefinition};

use crate::models::Resource;
use crate::store::backend::Backend;
use crate::store::codec;
use crate::store::error::{StoreError, StoreResult};

/// The table holding DNS resource records
const DNS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("dns");

/// Storage backend on an embedded redb database file
pub struct KvStore {
    path: PathBuf,
    db: Option<Database>,
}

impl KvStore {
    /// Create a handle for the database file at `path`
    ///
    /// Nothing is opened until [`Backend::initialize`] runs.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            db: None,
        }
    }

    fn db(&self) -> StoreResult<&Database> {
        self.db.as_ref().ok_or_else(|| StoreError::Connection {
            uri: self.path.display().to_string(),
            details: "backend not initialized".to_string(),
        })
    }
}

impl Backend for KvStore {
    fn initialize(&mut self) -> StoreResult<()> {
        let db = Database::create(&self.path).map_err(|err| StoreError::Connection {
            uri: self.path.display().to_string(),
            details: err.to_string(),
        })?;

        // Owner read/write only on the data file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).map_err(|err| {
                StoreError::Connection {
                    uri: self.path.display().to_string(),
                    details: err.to_string(),
                }
            })?;
        }

        // One write transaction to ensure the table exists; opening a
        // table that already exists leaves its contents untouched.
        let txn = db.begin_write().map_err(|err| StoreError::Schema {
            details: err.to_string(),
        })?;
        txn.open_table(DNS_TABLE).map_err(|err| StoreError::Schema {
            details: err.to_string(),
        })?;
        txn.commit().map_err(|err| StoreError::Schema {
            details: err.to_string(),
        })?;

        self.db = Some(db);
        Ok(())
    }

    fn add_record(&self, resource: &Resource) -> StoreResult<()> {
        self.update_record(&resource.domain, resource)
    }

    fn get_record(&self, domain: &str) -> StoreResult<Resource> {
        let txn = self.db()?.begin_read()?;
        let table = txn.open_table(DNS_TABLE)?;
        let key = codec::storage_key(domain);

        match table.get(key.as_str())? {
            Some(guard) => codec::decode(guard.value()),
            None => Err(StoreError::NotFound {
                domain: domain.to_string(),
            }),
        }
    }

    fn update_record(&self, domain: &str, resource: &Resource) -> StoreResult<()> {
        let payload = codec::encode(resource)?;
        let key = codec::storage_key(domain);

        let txn = self.db()?.begin_write()?;
        {
            let mut table = txn.open_table(DNS_TABLE)?;
            table.insert(key.as_str(), payload.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn delete_record(&self, domain: &str) -> StoreResult<()> {
        let key = codec::storage_key(domain);

        let txn = self.db()?.begin_write()?;
        {
            let mut table = txn.open_table(DNS_TABLE)?;
            table.remove(key.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn reset_records(&self, resources: &[Resource]) -> StoreResult<()> {
        // Drop and recreate the table in one transaction: readers see
        // either the old set or the empty namespace, never half of each.
        let txn = self.db()?.begin_write()?;
        txn.delete_table(DNS_TABLE)?;
        txn.open_table(DNS_TABLE)?;
        txn.commit()?;

        // Repopulate through the add path, one transaction per record.
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
        let txn = self.db()?.begin_read()?;
        let table = txn.open_table(DNS_TABLE)?;

        let mut result = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            result.push(codec::decode(value.value())?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> KvStore {
        let mut store = KvStore::new(temp_dir.path().join("records.redb"));
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

        let loaded = store.get_record("example.com.").unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        let err = store.get_record("missing.example.com.").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.add_record(&resource("example.com", "127.0.0.1")).unwrap();
        store.delete_record("example.com.").unwrap();
        // Deleting again is a no-op, not an error
        store.delete_record("example.com.").unwrap();

        assert!(matches!(
            store.get_record("example.com."),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_is_upsert() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        // Update on a domain that was never added succeeds
        let first = resource("example.com", "10.0.0.1");
        store.update_record("example.com.", &first).unwrap();

        // And replaces wholesale on the second write
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
        // Same domain will reappear in the new set with a new payload
        store.add_record(&resource("kept.example.com", "10.0.0.2")).unwrap();

        let replacement = vec![
            resource("kept.example.com", "192.168.0.1"),
            resource("new.example.com", "192.168.0.2"),
        ];
        store.reset_records(&replacement).unwrap();

        let mut listed = store.list_records().unwrap();
        listed.sort_by(|a, b| a.domain.cmp(&b.domain));

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].domain, "kept.example.com.");
        assert_eq!(listed[0].records[0].address, "192.168.0.1");
        assert_eq!(listed[1].domain, "new.example.com.");
        assert!(matches!(
            store.get_record("old.example.com."),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reset_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.add_record(&resource("example.com", "127.0.0.1")).unwrap();
        store.reset_records(&[]).unwrap();

        assert!(store.list_records().unwrap().is_empty());
    }

    #[test]
    fn test_initialize_preserves_existing_data() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.redb");

        let mut store = KvStore::new(&path);
        store.initialize().unwrap();
        store.add_record(&resource("example.com", "127.0.0.1")).unwrap();
        drop(store);

        // Re-initializing against the same file must not destroy data
        let mut reopened = KvStore::new(&path);
        reopened.initialize().unwrap();
        let loaded = reopened.get_record("example.com.").unwrap();
        assert_eq!(loaded.records[0].address, "127.0.0.1");
    }

    #[test]
    fn test_initialize_unwritable_path_is_connection_error() {
        let err = KvStore::new("/nonexistent-dir/sub/records.redb")
            .initialize()
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_data_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("records.redb");
        let mut store = KvStore::new(&path);
        store.initialize().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
