//! Command handlers

use std::path::Path;

use anyhow::{bail, Context, Result};

use namevault_core::{Record, Resource, Store, StoreError};

use crate::output::Output;

/// Add or replace the records for a domain
pub fn add(
    store: &Store,
    domain: String,
    addresses: Vec<String>,
    ttl: u32,
    rtype: String,
    class: String,
    output: &Output,
) -> Result<()> {
    let mut resource = Resource::new(domain);
    for address in addresses {
        resource.records.push(Record {
            ttl,
            class: class.clone(),
            rtype: rtype.clone(),
            address,
        });
    }

    store
        .add_record(&mut resource)
        .context("Failed to save record")?;

    if store.exists() {
        output.success(&format!("Saved {}", resource.domain));
        output.print_resource(&resource);
    } else {
        output.message("Storage is disabled; nothing was saved.");
    }
    Ok(())
}

/// Show the records stored for a domain
pub fn get(store: &Store, domain: &str, output: &Output) -> Result<()> {
    match store.get_record(domain) {
        Ok(Some(resource)) => output.print_resource(&resource),
        Ok(None) => output.message("Storage is disabled; nothing stored."),
        Err(StoreError::NotFound { domain }) => bail!("No record found for '{}'", domain),
        Err(err) => return Err(err).context("Failed to look up record"),
    }
    Ok(())
}

/// List every stored record
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let mut resources = store.list_records().context("Failed to list records")?;
    resources.sort_by(|a, b| a.domain.cmp(&b.domain));
    output.print_resources(&resources);
    Ok(())
}

/// Delete the records for a domain
pub fn delete(store: &Store, domain: &str, output: &Output) -> Result<()> {
    store
        .delete_record(domain)
        .context("Failed to delete record")?;
    output.success(&format!("Deleted {}", domain));
    Ok(())
}

/// Replace the whole record set from a JSON file
pub fn import(store: &Store, path: &Path, output: &Output) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let mut resources: Vec<Resource> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;

    store
        .reset_records(&mut resources)
        .context("Failed to replace record set")?;

    output.success(&format!("Imported {} record(s)", resources.len()));
    Ok(())
}

/// Show which backend is active and how many records it holds
pub fn status(store: &Store, uri: &str, output: &Output) -> Result<()> {
    if store.exists() {
        let count = store.list_records().context("Failed to list records")?.len();
        output.message(&format!("storage: {}", uri));
        output.message(&format!("records: {}", count));
    } else {
        output.message(&format!("storage: disabled ({})", uri));
    }
    Ok(())
}
