//! The storage backend contract
//!
//! Every storage engine implements [`Backend`] with identical externally
//! observable semantics, so the facade can hold any of them behind one
//! handle. Domains arriving here are already sanitized and resources
//! already validated; backends only address, serialize, and store.

use crate::models::Resource;
use crate::store::error::StoreResult;

/// The uniform contract all storage backends satisfy
///
/// One implementing type exists per storage engine; exactly one instance
/// is selected at startup and shared process-wide. Correctness under
/// concurrent calls is delegated to the underlying engine's transaction
/// isolation.
pub trait Backend: Send + Sync {
    /// Establish the connection and ensure the record namespace exists
    ///
    /// Idempotent: initializing against a store that already holds data
    /// must not destroy it. Fails with `Connection` when the engine is
    /// unreachable or `Schema` when the namespace cannot be created.
    fn initialize(&mut self) -> StoreResult<()>;

    /// Upsert a resource under its own domain key
    ///
    /// Never fails because the key already exists.
    fn add_record(&self, resource: &Resource) -> StoreResult<()>;

    /// Exact-match lookup by domain
    ///
    /// Fails with `NotFound` when absent.
    fn get_record(&self, domain: &str) -> StoreResult<Resource>;

    /// Upsert a resource under an explicitly supplied domain key
    ///
    /// Same semantics as [`Backend::add_record`]; the explicit key allows
    /// callers to rekey, the backend itself never renames.
    fn update_record(&self, domain: &str, resource: &Resource) -> StoreResult<()>;

    /// Remove a record by domain; succeeds as a no-op when absent
    fn delete_record(&self, domain: &str) -> StoreResult<()>;

    /// Replace the entire record set
    ///
    /// Drops and recreates the namespace (the atomic unit), then inserts
    /// every supplied resource through the add path so inconsistent key
    /// variants from the caller cannot leave duplicates. A failed insert
    /// aborts with `Reset` naming the offending domain; earlier inserts
    /// remain.
    fn reset_records(&self, resources: &[Resource]) -> StoreResult<()>;

    /// Enumerate every stored record, in backend-native order
    ///
    /// A single undecodable payload fails the whole listing.
    fn list_records(&self) -> StoreResult<Vec<Resource>>;
}
