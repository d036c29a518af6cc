//! Helpers shared by the engine dialects.

use chrono::NaiveDateTime;

use crate::dialect::{
    CHECKSUM_HEXDIGITS, MD5_HEXDIGITS, NORMALIZED_FRACTION_DIGITS, TIMESTAMP_PRECISION_POS,
};
use crate::error::{DiffError, Result};

/// 1-based position of the first checksum digit within a 32-digit MD5 hex.
pub const CHECKSUM_SUBSTR_START: usize = 1 + MD5_HEXDIGITS - CHECKSUM_HEXDIGITS;

/// Total width of a normalized timestamp (`YYYY-MM-DD HH:MM:SS.ffffff`).
pub const NORMALIZED_TIMESTAMP_WIDTH: usize =
    TIMESTAMP_PRECISION_POS + NORMALIZED_FRACTION_DIGITS as usize;

/// `YYYY-MM-DD HH:MM:SS.ffffff`, the text inside every timestamp literal.
pub fn timestamp_text(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Reject time zone names that are not plain region/offset names.
///
/// Accepts names such as `UTC`, `Asia/Shanghai`, `+08:00`, `Etc/GMT-8`.
pub fn validate_time_zone(zone: &str) -> Result<&str> {
    let valid = !zone.is_empty()
        && zone.len() <= 64
        && zone
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '+' | '-' | ':'));
    if valid {
        Ok(zone)
    } else {
        Err(DiffError::Config(format!("Invalid session time zone: {:?}", zone)))
    }
}
