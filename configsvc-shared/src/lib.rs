//! # Config Service Shared Library
//!
//! Data layer of the configuration service: the pooled database manager, the
//! migration runner, domain models and the repositories that map them to SQL.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool manager and forward-only migrations
//! - `id`: Sortable 26-character identifiers
//! - `models`: Applications and configurations
//! - `repositories`: CRUD over the models

pub mod db;
pub mod id;
pub mod models;
pub mod repositories;

/// Current version of the config service shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
