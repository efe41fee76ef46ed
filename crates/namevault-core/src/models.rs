//! Data models for namevault
//!
//! Defines the unit of persistence: a `Resource` (all records for one
//! domain) and its individual `Record` entries. The storage layer treats
//! these as opaque payloads keyed by domain; normalization happens here,
//! before anything reaches a backend.

use serde::{Deserialize, Serialize};

/// Default TTL applied to records that don't specify one, in seconds
const DEFAULT_TTL: u32 = 60;

/// Default record class
const DEFAULT_CLASS: &str = "IN";

/// Default record type
const DEFAULT_TYPE: &str = "A";

/// A single DNS answer belonging to a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Time-to-live in seconds (0 means "use the default")
    #[serde(default)]
    pub ttl: u32,
    /// Record class (IN, CH, ...)
    #[serde(default)]
    pub class: String,
    /// Record type (A, AAAA, CNAME, MX, ...)
    #[serde(rename = "type", default)]
    pub rtype: String,
    /// The answer payload (address, target name, ...)
    pub address: String,
}

impl Record {
    /// Create a record with the given address and default ttl/class/type
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            ttl: DEFAULT_TTL,
            class: DEFAULT_CLASS.to_string(),
            rtype: DEFAULT_TYPE.to_string(),
            address: address.into(),
        }
    }
}

/// All stored records for one domain - the unit of persistence
///
/// The domain is the primary key; everything else is payload the storage
/// backends never inspect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// The domain these records answer for (canonical form after
    /// [`Resource::validate`])
    pub domain: String,
    /// The records themselves
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Resource {
    /// Create a resource for the given domain with no records yet
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            records: Vec::new(),
        }
    }

    /// Normalize this resource in place before persistence
    ///
    /// Sanitizes the domain into canonical form and fills in missing
    /// record fields: ttl 0 becomes 60, empty class becomes `IN`, empty
    /// type becomes `A`. Idempotent.
    pub fn validate(&mut self) {
        sanitize_domain(&mut self.domain);
        for record in &mut self.records {
            if record.ttl == 0 {
                record.ttl = DEFAULT_TTL;
            }
            if record.class.is_empty() {
                record.class = DEFAULT_CLASS.to_string();
            }
            if record.rtype.is_empty() {
                record.rtype = DEFAULT_TYPE.to_string();
            }
        }
    }
}

/// Normalize a domain string in place to DNS canonical form
///
/// Lowercases and appends the trailing root dot if absent. Storage keys
/// are always derived from the sanitized form, so `EXAMPLE.com` and
/// `example.com.` address the same record.
pub fn sanitize_domain(domain: &mut String) {
    if !domain.ends_with('.') {
        domain.push('.');
    }
    *domain = domain.to_lowercase();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_adds_trailing_dot() {
        let mut domain = String::from("example.com");
        sanitize_domain(&mut domain);
        assert_eq!(domain, "example.com.");
    }

    #[test]
    fn test_sanitize_lowercases() {
        let mut domain = String::from("EXAMPLE.Com.");
        sanitize_domain(&mut domain);
        assert_eq!(domain, "example.com.");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut domain = String::from("Example.COM");
        sanitize_domain(&mut domain);
        let once = domain.clone();
        sanitize_domain(&mut domain);
        assert_eq!(domain, once);
    }

    #[test]
    fn test_validate_fills_defaults() {
        let mut resource = Resource {
            domain: "Example.com".to_string(),
            records: vec![Record {
                ttl: 0,
                class: String::new(),
                rtype: String::new(),
                address: "127.0.0.1".to_string(),
            }],
        };

        resource.validate();

        assert_eq!(resource.domain, "example.com.");
        assert_eq!(resource.records[0].ttl, 60);
        assert_eq!(resource.records[0].class, "IN");
        assert_eq!(resource.records[0].rtype, "A");
    }

    #[test]
    fn test_validate_preserves_explicit_fields() {
        let mut resource = Resource {
            domain: "mail.example.com.".to_string(),
            records: vec![Record {
                ttl: 3600,
                class: "IN".to_string(),
                rtype: "MX".to_string(),
                address: "10 mx.example.com.".to_string(),
            }],
        };

        resource.validate();

        assert_eq!(resource.records[0].ttl, 3600);
        assert_eq!(resource.records[0].rtype, "MX");
    }

    #[test]
    fn test_record_json_field_names() {
        let record = Record::new("127.0.0.1");
        let json = serde_json::to_value(&record).unwrap();
        // The wire name for rtype is "type"
        assert!(json.get("type").is_some());
        assert!(json.get("rtype").is_none());
    }
}
