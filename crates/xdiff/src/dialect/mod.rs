//! Canonical type system and type normalizer.
//!
//! - [`canonical`]: the engine-independent [`ColumnType`] set and the
//!   checksum/timestamp constants every dialect shares
//! - [`typemap`]: ordered pattern rules plus default tables that turn raw
//!   engine column types into canonical types
//!
//! # Usage
//!
//! Dialects own a static [`TypeRules`] list and [`DefaultTypes`] table and
//! expose them through `Dialect::parse_type`:
//!
//! ```rust,ignore
//! let dialect = catalog.require("oceanbase")?;
//! let ty = dialect.parse_type(&path, &RawColumnInfo::new("TS", "TIMESTAMP(3)"));
//! ```

pub mod canonical;
pub mod typemap;

pub use canonical::{
    ColumnType, FractionalType, TemporalType, TypeKind, CHECKSUM_HEXDIGITS, CHECKSUM_MASK,
    CHECKSUM_OFFSET, DEFAULT_DATETIME_PRECISION, DEFAULT_NUMERIC_PRECISION,
    MAX_DATETIME_PRECISION, MAX_DECIMAL_PRECISION, MD5_HEXDIGITS, NORMALIZED_FRACTION_DIGITS,
    TIMESTAMP_PRECISION_POS,
};
pub use typemap::{DefaultTypes, TypeBuilder, TypeNormalizer, TypeRules};
