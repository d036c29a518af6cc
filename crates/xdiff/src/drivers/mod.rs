//! Database driver implementations.
//!
//! This module provides the engine-specific implementations of the
//! [`Dialect`](crate::core::Dialect) trait:
//!
//! - [`oceanbase`]: OceanBase in Oracle compatibility mode
//! - [`postgres`]: PostgreSQL
//! - [`mysql`]: MySQL / MariaDB
//! - [`mssql`]: Microsoft SQL Server
//! - [`common`]: Shared rendering helpers
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` (e.g., `drivers/db2/`)
//! 2. Implement the `Dialect` trait, with a static `TypeRules` list and a
//!    default type table
//! 3. Register it (and any aliases) in `DialectCatalog::with_builtins()`

pub mod common;
pub mod mssql;
pub mod mysql;
pub mod oceanbase;
pub mod postgres;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use oceanbase::OceanBaseDialect;
pub use postgres::PostgresDialect;
