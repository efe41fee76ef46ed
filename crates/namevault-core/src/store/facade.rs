//! Store facade and backend selection
//!
//! The single entry point to persistence. `Store::open` parses the
//! connection URI, picks exactly one backend from a closed set, and
//! initializes it. Persistence is an optional enhancement for the
//! calling service: when the chosen backend cannot start, the store
//! comes up disabled and every operation quietly no-ops instead of
//! taking the service down with it.
//!
//! Domain sanitization and record validation are applied here, before
//! key derivation, so every backend sees canonical input.

use tracing::{debug, info};
use url::Url;

use crate::models::{sanitize_domain, Resource};
use crate::store::backend::Backend;
use crate::store::consul::ConsulStore;
use crate::store::error::{StoreError, StoreResult};
use crate::store::file::FileStore;
use crate::store::kv::KvStore;
use crate::store::sqlite::SqliteStore;

/// The persistence facade: at most one active backend, or none
///
/// Owned by the caller and passed down to whatever needs persistence;
/// there is no global handle.
pub struct Store {
    backend: Option<Box<dyn Backend>>,
}

impl Store {
    /// Select and initialize a backend from a connection URI
    ///
    /// Schemes: `redb://` (embedded key-value), `sqlite://` or
    /// `sqlite3://` (relational), `consul://` (cluster KV), `file://`
    /// (JSON documents, the default), `none://` (no persistence).
    /// Unrecognized schemes fall back to the file backend so the service
    /// stays startable without external dependencies.
    ///
    /// Fails only when the URI itself cannot be parsed. A backend that
    /// cannot initialize is logged and dropped: the store comes up
    /// disabled rather than propagating the failure.
    pub fn open(uri: &str) -> StoreResult<Self> {
        let parsed = Url::parse(uri).map_err(|err| StoreError::Config {
            uri: uri.to_string(),
            details: err.to_string(),
        })?;

        let backend: Option<Box<dyn Backend>> = match parsed.scheme() {
            "redb" => {
                debug!("using embedded redb storage");
                Some(Box::new(KvStore::new(parsed.path())))
            }
            "sqlite" | "sqlite3" => {
                debug!("using sqlite storage");
                Some(Box::new(SqliteStore::new(parsed.path())))
            }
            "consul" => {
                debug!("using consul storage");
                Some(Box::new(ConsulStore::new(parsed.clone())))
            }
            "file" => {
                debug!("using file storage");
                Some(Box::new(FileStore::new(parsed.path())))
            }
            "none" => {
                debug!("not using storage");
                None
            }
            other => {
                debug!(
                    "unrecognized storage scheme '{}', using default file storage",
                    other
                );
                Some(Box::new(FileStore::new(parsed.path())))
            }
        };

        let backend = match backend {
            Some(mut inner) => match inner.initialize() {
                Ok(()) => Some(inner),
                Err(err) => {
                    info!(
                        "failed to initialize storage, continuing without persistence: {}",
                        err
                    );
                    None
                }
            },
            None => None,
        };

        Ok(Self { backend })
    }

    /// A store with no backend; every operation no-ops
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Whether a backend is currently active
    pub fn exists(&self) -> bool {
        self.backend.is_some()
    }

    /// Persist a record under its own domain
    ///
    /// Validates the resource in place first. No-op without a backend.
    pub fn add_record(&self, resource: &mut Resource) -> StoreResult<()> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(()),
        };
        resource.validate();
        backend.add_record(resource)
    }

    /// Look up a record by domain
    ///
    /// Returns `Ok(None)` without a backend; with one, a miss surfaces
    /// as [`StoreError::NotFound`].
    pub fn get_record(&self, domain: &str) -> StoreResult<Option<Resource>> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(None),
        };
        let mut domain = domain.to_string();
        sanitize_domain(&mut domain);
        backend.get_record(&domain).map(Some)
    }

    /// Persist a record under an explicitly supplied domain
    pub fn update_record(&self, domain: &str, resource: &mut Resource) -> StoreResult<()> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(()),
        };
        let mut domain = domain.to_string();
        sanitize_domain(&mut domain);
        resource.validate();
        backend.update_record(&domain, resource)
    }

    /// Remove a record by domain; absent records are not an error
    pub fn delete_record(&self, domain: &str) -> StoreResult<()> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(()),
        };
        let mut domain = domain.to_string();
        sanitize_domain(&mut domain);
        backend.delete_record(&domain)
    }

    /// Replace the entire record set
    pub fn reset_records(&self, resources: &mut [Resource]) -> StoreResult<()> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(()),
        };
        for resource in resources.iter_mut() {
            resource.validate();
        }
        backend.reset_records(resources)
    }

    /// Enumerate every stored record
    pub fn list_records(&self) -> StoreResult<Vec<Resource>> {
        let backend = match &self.backend {
            Some(backend) => backend,
            None => return Ok(Vec::new()),
        };
        backend.list_records()
    }
}
