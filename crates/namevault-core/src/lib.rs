//! namevault core library
//!
//! This crate provides durable storage for DNS resource records learned
//! or configured at runtime, independent of any single storage
//! technology. A DNS-serving application opens one [`Store`] at startup
//! from a connection URI and passes it down; the store either delegates
//! to the selected backend or, when none could be started, degrades to
//! non-persistent no-ops so the service keeps answering queries.
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open("redb:///var/db/namevault/records.redb")?;
//!
//! let mut resource = Resource::new("example.com");
//! resource.records.push(Record::new("127.0.0.1"));
//! store.add_record(&mut resource)?;
//!
//! let found = store.get_record("EXAMPLE.com")?;
//! ```
//!
//! # Modules
//!
//! - `store`: backend contract, engines, and the `Store` facade
//! - `models`: the resource/record model and domain normalization
//! - `config`: application configuration

pub mod config;
pub mod models;
pub mod store;

pub use config::Config;
pub use models::{sanitize_domain, Record, Resource};
pub use store::{Backend, Store, StoreError, StoreResult};
