//! Document-file backend
//!
//! The default backend: one JSON document per record under
//! `<base>/dns/`, no external dependencies, always startable. Writes go
//! through a temp file and rename so a document is never observed
//! half-written.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::models::Resource;
use crate::store::backend::Backend;
use crate::store::codec;
use crate::store::error::{StoreError, StoreResult};

/// Directory under the base path holding the record documents
const DNS_DIR: &str = "dns";

/// Storage backend keeping each record as a JSON document on disk
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// Create a handle rooted at `base`
    ///
    /// An empty base falls back to the platform data directory, so an
    /// unrecognized connection URI without a path still yields a working
    /// store.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let base = if base.as_os_str().is_empty() {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("namevault")
        } else {
            base
        };
        Self { base }
    }

    fn records_dir(&self) -> PathBuf {
        self.base.join(DNS_DIR)
    }

    fn document_path(&self, domain: &str) -> PathBuf {
        self.records_dir()
            .join(format!("{}.json", codec::storage_key(domain)))
    }
}

impl Backend for FileStore {
    fn initialize(&mut self) -> StoreResult<()> {
        fs::create_dir_all(self.records_dir()).map_err(|err| StoreError::Schema {
            details: format!(
                "could not create record directory {:?}: {}",
                self.records_dir(),
                err
            ),
        })
    }

    fn add_record(&self, resource: &Resource) -> StoreResult<()> {
        self.update_record(&resource.domain, resource)
    }

    fn get_record(&self, domain: &str) -> StoreResult<Resource> {
        let path = self.document_path(domain);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    domain: domain.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };

        serde_json::from_slice(&bytes).map_err(|err| StoreError::Encoding {
            details: format!("{:?}: {}", path, err),
        })
    }

    fn update_record(&self, domain: &str, resource: &Resource) -> StoreResult<()> {
        let payload =
            serde_json::to_vec_pretty(resource).map_err(|err| StoreError::Encoding {
                details: err.to_string(),
            })?;
        atomic_write(&self.document_path(domain), &payload)?;
        Ok(())
    }

    fn delete_record(&self, domain: &str) -> StoreResult<()> {
        match fs::remove_file(self.document_path(domain)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn reset_records(&self, resources: &[Resource]) -> StoreResult<()> {
        // Swap the whole directory: remove, recreate empty, repopulate
        // through the add path.
        match fs::remove_dir_all(self.records_dir()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        fs::create_dir_all(self.records_dir())?;

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
        let mut result = Vec::new();

        for entry in fs::read_dir(self.records_dir())? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            // Skip files outside the record namespace
            let stem = path.file_stem().and_then(|stem| stem.to_str());
            if stem.and_then(codec::domain_from_key).is_none() {
                continue;
            }

            let bytes = fs::read(&path)?;
            let resource =
                serde_json::from_slice(&bytes).map_err(|err| StoreError::Encoding {
                    details: format!("{:?}: {}", path, err),
                })?;
            result.push(resource);
        }
        Ok(result)
    }
}

/// Write data to a file atomically
///
/// Writes to a temp file in the same directory, syncs it, then renames
/// over the target so the document is never left half-written.
fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}
