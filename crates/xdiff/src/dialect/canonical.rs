//! Canonical column types shared by every dialect.
//!
//! Each engine reports its own type names. Before values can be compared
//! across engines they are reduced to this small set of semantic types,
//! which is what the normalization rules in each dialect key off.
//!
//! ```text
//! NUMBER(10,2)                 →  Decimal { precision: 10, scale: 2 }
//! numeric(10,2)                →  Decimal { precision: 10, scale: 2 }
//! TIMESTAMP(3) WITH TIME ZONE  →  TimestampTz { precision: 3, rounds }
//! uuid                         →  Uuid
//! ```

use std::fmt;

/// Number of trailing MD5 hex digits kept for checksums.
///
/// 12 hex digits = 48 bits. Keeping the digest well under 63 bits leaves
/// headroom so that sums of many row checksums do not overflow BIGINT.
pub const CHECKSUM_HEXDIGITS: usize = 12;

/// Length of a full MD5 digest in hex digits.
pub const MD5_HEXDIGITS: usize = 32;

/// Largest value representable in [`CHECKSUM_HEXDIGITS`] hex digits.
pub const CHECKSUM_MASK: u64 = (1u64 << (CHECKSUM_HEXDIGITS * 4)) - 1;

/// Subtracted from every digest so checksums are centered on zero.
///
/// Positive and negative values then cancel out when summed, allowing
/// many more rows to be added together before overflowing.
pub const CHECKSUM_OFFSET: u64 = CHECKSUM_MASK / 2;

/// Position of the first fractional-second digit in `YYYY-MM-DD HH:MM:SS.`
pub const TIMESTAMP_PRECISION_POS: usize = 20;

/// Fractional-second digits every normalized timestamp is padded to.
pub const NORMALIZED_FRACTION_DIGITS: u32 = 6;

/// Datetime precision assumed when the engine does not report one.
pub const DEFAULT_DATETIME_PRECISION: u32 = 6;

/// Float precision (binary digits) assumed when the engine does not report one.
pub const DEFAULT_NUMERIC_PRECISION: u32 = 24;

/// Largest precision of a fixed-point numeric across supported engines.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Largest fractional-second precision across supported engines.
pub const MAX_DATETIME_PRECISION: u32 = 9;

/// Precision and scale of a fractional number.
///
/// `scale` is the number of digits after the decimal point and is what
/// `normalize_number` pads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FractionalType {
    /// Total significant digits, at most [`MAX_DECIMAL_PRECISION`].
    pub precision: u32,
    /// Digits after the decimal point, at most `precision`.
    pub scale: u32,
}

impl FractionalType {
    /// Create a fractional type, clamping to the engine-wide bounds.
    pub fn new(precision: u32, scale: u32) -> Self {
        let precision = precision.min(MAX_DECIMAL_PRECISION);
        Self {
            precision,
            scale: scale.min(precision),
        }
    }
}

/// Fractional-second precision of a timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporalType {
    /// Fractional-second digits, at most [`MAX_DATETIME_PRECISION`].
    pub precision: u32,
    /// True when the engine rounds (rather than truncates) values that
    /// exceed `precision`.
    pub rounds: bool,
}

impl TemporalType {
    /// Create a temporal type, clamping the precision to the supported range.
    pub fn new(precision: u32, rounds: bool) -> Self {
        Self {
            precision: precision.min(MAX_DATETIME_PRECISION),
            rounds,
        }
    }
}

/// Canonical column type.
///
/// Produced once per column by `Dialect::parse_type`; consumed by the
/// normalization rules to pick the right SQL rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Exact fixed-point number.
    Decimal(FractionalType),
    /// Binary floating point; precision is in decimal digits.
    Float(FractionalType),
    /// Whole number.
    Integer,
    /// Character data.
    Text,
    /// Timestamp without time zone.
    Timestamp(TemporalType),
    /// Timestamp with time zone.
    TimestampTz(TemporalType),
    /// UUID / GUID.
    Uuid,
    /// No rule or default mapping applied; carries the raw type name.
    Unknown(String),
}

impl ColumnType {
    /// Fractional parameters for `Decimal` and `Float` columns.
    pub fn fractional(&self) -> Option<&FractionalType> {
        match self {
            ColumnType::Decimal(f) | ColumnType::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Temporal parameters for timestamp columns.
    pub fn temporal(&self) -> Option<&TemporalType> {
        match self {
            ColumnType::Timestamp(t) | ColumnType::TimestampTz(t) => Some(t),
            _ => None,
        }
    }

    /// Whether the type could not be resolved.
    pub fn is_unknown(&self) -> bool {
        matches!(self, ColumnType::Unknown(_))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Decimal(t) => write!(f, "Decimal({},{})", t.precision, t.scale),
            ColumnType::Float(t) => write!(f, "Float({})", t.precision),
            ColumnType::Integer => write!(f, "Integer"),
            ColumnType::Text => write!(f, "Text"),
            ColumnType::Timestamp(t) => write!(f, "Timestamp({})", t.precision),
            ColumnType::TimestampTz(t) => write!(f, "TimestampTz({})", t.precision),
            ColumnType::Uuid => write!(f, "Uuid"),
            ColumnType::Unknown(name) => write!(f, "Unknown({})", name),
        }
    }
}

/// Kind of canonical type named in a dialect's default mapping table.
///
/// The default path fills in precision and scale from the raw column info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Decimal,
    Float,
    Integer,
    Text,
    Timestamp,
    TimestampTz,
    Uuid,
}

/// Convert a binary-digit float precision to decimal digits.
///
/// `floor(bits * log10(2))`, e.g. 53 bits → 15 digits, 24 bits → 7 digits.
pub fn binary_precision_to_digits(bits: u32) -> u32 {
    (f64::from(bits) * std::f64::consts::LOG10_2).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_constants() {
        assert_eq!(CHECKSUM_MASK, 0xFFFF_FFFF_FFFF);
        assert_eq!(CHECKSUM_OFFSET, 140_737_488_355_327);
        assert_eq!(TIMESTAMP_PRECISION_POS, "2022-06-03 12:24:35.".len());
    }

    #[test]
    fn test_fractional_type_clamps() {
        let t = FractionalType::new(50, 60);
        assert_eq!(t.precision, MAX_DECIMAL_PRECISION);
        assert_eq!(t.scale, MAX_DECIMAL_PRECISION);

        let t = FractionalType::new(4, 2);
        assert_eq!((t.precision, t.scale), (4, 2));
    }

    #[test]
    fn test_temporal_type_clamps() {
        assert_eq!(TemporalType::new(12, true).precision, MAX_DATETIME_PRECISION);
    }

    #[test]
    fn test_binary_precision_to_digits() {
        assert_eq!(binary_precision_to_digits(53), 15);
        assert_eq!(binary_precision_to_digits(24), 7);
        assert_eq!(binary_precision_to_digits(126), 37);
        assert_eq!(binary_precision_to_digits(0), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ColumnType::Decimal(FractionalType::new(10, 2)).to_string(),
            "Decimal(10,2)"
        );
        assert_eq!(
            ColumnType::Unknown("XMLTYPE".into()).to_string(),
            "Unknown(XMLTYPE)"
        );
    }
}
