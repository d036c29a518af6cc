//! Core abstractions shared by every engine.
//!
//! - [`schema`]: table paths, identifier folding, raw column metadata
//! - [`value`]: constants that dialects render as literals
//! - [`identifier`]: validated identifier and literal quoting
//! - [`traits`]: the [`Dialect`] contract
//! - [`catalog`]: engine identifier → dialect registry
//!
//! Engine-specific implementations live in `drivers/`; this module never
//! names a concrete engine except in [`DialectCatalog::with_builtins`].

pub mod catalog;
pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

pub use catalog::DialectCatalog;
pub use schema::{IdentifierCase, RawColumnInfo, TablePath};
pub use traits::Dialect;
pub use value::SqlLiteral;
