//! Key addressing and payload serialization
//!
//! Every backend derives storage keys and encodes payloads through this
//! module, so data written under one backend version stays readable by
//! the next. Keys are a fixed prefix plus the already-sanitized domain;
//! payloads are CBOR, a self-describing binary encoding that round-trips
//! every resource field losslessly.

use crate::models::Resource;
use crate::store::error::{StoreError, StoreResult};

/// Fixed prefix prepended to every domain when deriving a storage key
///
/// Distinct domains always yield distinct keys, and the prefix lets a
/// backend enumerate the record namespace with a prefix scan.
pub const KEY_PREFIX: &str = "domain-";

/// Derive the storage key for a (sanitized) domain
pub fn storage_key(domain: &str) -> String {
    format!("{}{}", KEY_PREFIX, domain)
}

/// Recover the domain from a storage key
///
/// Returns `None` for keys outside the record namespace.
pub fn domain_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(KEY_PREFIX)
}

/// Encode a resource into its stored byte form
pub fn encode(resource: &Resource) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(resource, &mut bytes).map_err(|err| StoreError::Encoding {
        details: err.to_string(),
    })?;
    Ok(bytes)
}

/// Decode a resource from its stored byte form
///
/// A failure here means the stored payload is corrupt; callers must
/// surface it, never skip the record.
pub fn decode(bytes: &[u8]) -> StoreResult<Resource> {
    ciborium::from_reader(bytes).map_err(|err| StoreError::Encoding {
        details: err.to_string(),
    })
}
