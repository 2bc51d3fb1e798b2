//! Restaurant picker backend.
//!
//! The restaurant list and its profiles live in a single JSON document in a
//! GitHub repository. Every change is a read → mutate → conditional write
//! against that document, with the file's blob SHA acting as the version
//! token.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod models;
pub mod server;
pub mod store;

pub use catalog::{Catalog, CatalogError};
pub use config::{Config, ConfigError};
pub use store::{DocumentStore, GitHubStore, MemoryStore, StoreError, VersionToken};
