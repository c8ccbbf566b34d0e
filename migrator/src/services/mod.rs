//! Infrastructure services
//!
//! - **client**: management API client, version catalog, credentials and domain contexts
//! - **config**: run configuration and the TOML run file
//! - **errors**: the migration error taxonomy

pub mod client;
pub mod config;
pub mod errors;
