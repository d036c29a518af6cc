//! MySQL driver.
//!
//! - [`MysqlDialect`]: SQL syntax strategy for MySQL and MariaDB

mod dialect;

pub use dialect::MysqlDialect;
