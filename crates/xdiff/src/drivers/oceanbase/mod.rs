//! OceanBase driver (Oracle compatibility mode).
//!
//! - [`OceanBaseDialect`]: SQL syntax strategy for OceanBase Oracle mode
//!
//! Connections go through the native driver bridge; see [`crate::bridge`].

mod dialect;

pub use dialect::OceanBaseDialect;
