//! # xdiff
//!
//! SQL dialect layer and connection manager for cross-database table
//! comparison.
//!
//! This library renders the SQL a table-diff engine needs on each side of a
//! comparison and runs it on a pool of blocking connections:
//!
//! - **Dialects** for OceanBase (Oracle mode), PostgreSQL, MySQL and SQL Server
//! - **Canonical types** so columns of different engines can be compared
//! - **Fixed-width checksums** that agree across engines for identical bytes
//! - **Worker pools** with one thread-confined session per worker
//! - **Driver bridge** started once per process for vendor drivers
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xdiff::{ConnectionConfig, DialectCatalog, TablePath, ThreadedDatabase};
//!
//! let _bridge = xdiff::BridgeRuntime::global().shutdown_guard();
//! let catalog = DialectCatalog::with_builtins();
//! let config = ConnectionConfig::load("oceanbase.yaml")?;
//! let db = ThreadedDatabase::new(config, &catalog, Arc::new(xdiff::OdbcConnector::new()))?;
//!
//! let dialect = db.dialect();
//! let checksum = format!(
//!     "SELECT sum({}) FROM {}",
//!     dialect.hash_to_int(&dialect.concat(&["ID".into(), "NAME".into()])),
//!     dialect.qualify_table(&TablePath::table("orders"), db.default_schema())?,
//! );
//! let rows = db.query(checksum).await?;
//! ```

pub mod bridge;
pub mod checksum;
pub mod config;
pub mod connection;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;

// Re-exports for convenient access
#[cfg(feature = "odbc")]
pub use bridge::BridgeConnection;
pub use bridge::{BridgeLease, BridgeRuntime, BridgeState, ShutdownGuard};
pub use config::{BridgeConfig, ConnectionConfig};
#[cfg(feature = "odbc")]
pub use connection::OdbcConnector;
pub use connection::{
    Backend, BackendError, Connector, Rows, Session, SessionState, ThreadedDatabase,
};
pub use crate::core::{Dialect, DialectCatalog, IdentifierCase, RawColumnInfo, SqlLiteral, TablePath};
pub use dialect::{ColumnType, FractionalType, TemporalType};
pub use error::{DiffError, Result};
