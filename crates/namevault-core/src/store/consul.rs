//! Cluster-coordination backend
//!
//! Persists records in Consul's key-value store over its HTTP API, for
//! deployments that already run a Consul cluster. Values are the same
//! CBOR payloads the embedded backends store; Consul hands them back
//! base64-encoded on read. All calls are blocking, matching the rest of
//! the storage layer.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::models::Resource;
use crate::store::backend::Backend;
use crate::store::codec;
use crate::store::error::{StoreError, StoreResult};

/// Root of the KV subtree holding DNS records
const KV_ROOT: &str = "namevault/dns";

/// Default Consul HTTP API port
const DEFAULT_PORT: u16 = 8500;

/// Storage backend on a Consul cluster's KV store
pub struct ConsulStore {
    uri: Url,
    conn: Option<ConsulConn>,
}

struct ConsulConn {
    client: Client,
    base: String,
}

/// One entry of a Consul KV read response
#[derive(Debug, Deserialize)]
struct KvEntry {
    #[serde(rename = "Value")]
    value: Option<String>,
}

impl ConsulStore {
    /// Create a handle for the agent named by a `consul://host:port` URI
    ///
    /// Nothing is contacted until [`Backend::initialize`] runs.
    pub fn new(uri: Url) -> Self {
        Self { uri, conn: None }
    }

    fn conn(&self) -> StoreResult<&ConsulConn> {
        self.conn.as_ref().ok_or_else(|| StoreError::Connection {
            uri: self.uri.to_string(),
            details: "backend not initialized".to_string(),
        })
    }

    fn record_url(&self, domain: &str) -> StoreResult<String> {
        let conn = self.conn()?;
        Ok(format!(
            "{}/v1/kv/{}/{}",
            conn.base,
            KV_ROOT,
            codec::storage_key(domain)
        ))
    }

    fn tree_url(&self) -> StoreResult<String> {
        Ok(format!("{}/v1/kv/{}", self.conn()?.base, KV_ROOT))
    }
}

impl Backend for ConsulStore {
    fn initialize(&mut self) -> StoreResult<()> {
        let base = agent_base(&self.uri)?;
        let client = Client::new();

        // Probe the agent so a dead cluster surfaces here, not on the
        // first CRUD call.
        let response = client
            .get(format!("{}/v1/agent/self", base))
            .send()
            .map_err(|err| StoreError::Connection {
                uri: self.uri.to_string(),
                details: err.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(StoreError::Connection {
                uri: self.uri.to_string(),
                details: format!("agent responded with {}", response.status()),
            });
        }

        self.conn = Some(ConsulConn { client, base });
        Ok(())
    }

    fn add_record(&self, resource: &Resource) -> StoreResult<()> {
        self.update_record(&resource.domain, resource)
    }

    fn get_record(&self, domain: &str) -> StoreResult<Resource> {
        let response = self.conn()?.client.get(self.record_url(domain)?).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                domain: domain.to_string(),
            });
        }

        let entries: Vec<KvEntry> = response.error_for_status()?.json()?;
        match entries.first().and_then(|entry| entry.value.as_deref()) {
            Some(encoded) => decode_value(encoded),
            None => Err(StoreError::NotFound {
                domain: domain.to_string(),
            }),
        }
    }

    fn update_record(&self, domain: &str, resource: &Resource) -> StoreResult<()> {
        let payload = codec::encode(resource)?;
        self.conn()?
            .client
            .put(self.record_url(domain)?)
            .body(payload)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn delete_record(&self, domain: &str) -> StoreResult<()> {
        // Consul deletes are already idempotent
        self.conn()?
            .client
            .delete(self.record_url(domain)?)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn reset_records(&self, resources: &[Resource]) -> StoreResult<()> {
        // Drop the whole subtree in one recursive delete, then
        // repopulate through the add path.
        self.conn()?
            .client
            .delete(format!("{}?recurse=true", self.tree_url()?))
            .send()?
            .error_for_status()?;

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
        let response = self
            .conn()?
            .client
            .get(format!("{}?recurse=true", self.tree_url()?))
            .send()?;
        // An empty subtree reads as 404
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let entries: Vec<KvEntry> = response.error_for_status()?.json()?;
        let mut result = Vec::new();
        for entry in &entries {
            if let Some(encoded) = entry.value.as_deref() {
                result.push(decode_value(encoded)?);
            }
        }
        Ok(result)
    }
}

/// Build the agent's HTTP base URL from the connection URI
fn agent_base(uri: &Url) -> StoreResult<String> {
    let host = uri.host_str().ok_or_else(|| StoreError::Connection {
        uri: uri.to_string(),
        details: "connection URI names no host".to_string(),
    })?;
    Ok(format!(
        "http://{}:{}",
        host,
        uri.port().unwrap_or(DEFAULT_PORT)
    ))
}

/// Decode one base64-wrapped stored payload
fn decode_value(encoded: &str) -> StoreResult<Resource> {
    let bytes = BASE64.decode(encoded).map_err(|err| StoreError::Encoding {
        details: err.to_string(),
    })?;
    codec::decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_agent_base_with_port() {
        let uri = Url::parse("consul://10.0.0.5:8501").unwrap();
        assert_eq!(agent_base(&uri).unwrap(), "http://10.0.0.5:8501");
    }

    #[test]
    fn test_agent_base_default_port() {
        let uri = Url::parse("consul://consul.service.local").unwrap();
        assert_eq!(
            agent_base(&uri).unwrap(),
            "http://consul.service.local:8500"
        );
    }

    #[test]
    fn test_agent_base_requires_host() {
        let uri = Url::parse("consul:///only/a/path").unwrap();
        assert!(matches!(
            agent_base(&uri),
            Err(StoreError::Connection { .. })
        ));
    }

    #[test]
    fn test_decode_value_roundtrip() {
        let mut resource = Resource::new("example.com");
        resource.records.push(Record::new("127.0.0.1"));
        resource.validate();

        let encoded = BASE64.encode(codec::encode(&resource).unwrap());
        assert_eq!(decode_value(&encoded).unwrap(), resource);
    }

    #[test]
    fn test_decode_value_rejects_bad_base64() {
        assert!(matches!(
            decode_value("!!not base64!!"),
            Err(StoreError::Encoding { .. })
        ));
    }

    #[test]
    fn test_kv_response_parsing() {
        let body = r#"[{"LockIndex":0,"Key":"namevault/dns/domain-example.com.","Flags":0,"Value":"aGk=","CreateIndex":10,"ModifyIndex":10}]"#;
        let entries: Vec<KvEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(entries[0].value.as_deref(), Some("aGk="));
    }

    #[test]
    fn test_uninitialized_store_errors() {
        let store = ConsulStore::new(Url::parse("consul://127.0.0.1").unwrap());
        assert!(matches!(
            store.get_record("example.com."),
            Err(StoreError::Connection { .. })
        ));
    }
}
