//! Identifier and string-literal quoting shared by all dialects.
//!
//! Table and column names cannot be bound as statement parameters, so every
//! name embedded in rendered SQL goes through one of these functions:
//!
//! 1. Validate the name (empty, NUL bytes, excessive length are rejected)
//! 2. Wrap it in the engine's quoting syntax
//! 3. Escape the closing quote character by doubling it
//!
//! Each quoting function has an `unquote_*` inverse so the round-trip
//! property can be checked directly.

use crate::error::{DiffError, Result};

/// Maximum identifier length (conservative limit across engines).
/// - Oracle / OceanBase: 128 bytes
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// # Errors
///
/// Returns `DiffError::Config` for empty names, names containing NUL bytes,
/// and names longer than the maximum identifier length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DiffError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DiffError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DiffError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier with ANSI double quotes (Oracle, OceanBase, PostgreSQL).
///
/// ```ignore
/// assert_eq!(quote_double("users")?, "\"users\"");
/// assert_eq!(quote_double("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_double(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a MySQL identifier using backticks.
pub fn quote_backtick(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Quote a SQL Server identifier using brackets.
pub fn quote_bracket(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// Reverse of [`quote_double`].
pub fn unquote_double(quoted: &str) -> Option<String> {
    unquote(quoted, '"', '"')
}

/// Reverse of [`quote_backtick`].
pub fn unquote_backtick(quoted: &str) -> Option<String> {
    unquote(quoted, '`', '`')
}

/// Reverse of [`quote_bracket`].
pub fn unquote_bracket(quoted: &str) -> Option<String> {
    unquote(quoted, '[', ']')
}

/// Strip `open`/`close` and collapse doubled `close` characters.
///
/// Returns `None` when the text is not a well-formed quoted identifier,
/// e.g. a lone closing character appears inside.
fn unquote(quoted: &str, open: char, close: char) -> Option<String> {
    let inner = quoted.strip_prefix(open)?.strip_suffix(close)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == close {
            if chars.next() != Some(close) {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// Quote a string literal by doubling single quotes.
///
/// # Errors
///
/// Returns `DiffError::Config` if the value contains a NUL byte, which
/// several drivers truncate at and would change the statement's meaning.
pub fn quote_literal(value: &str) -> Result<String> {
    if value.contains('\0') {
        return Err(DiffError::Config(format!(
            "SECURITY: String literal contains null byte: {:?}",
            value
        )));
    }
    Ok(format!("'{}'", value.replace('\'', "''")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("Order Details").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let err = validate_identifier("users\0; DROP TABLE x").unwrap_err();
        assert!(err.to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_length_limit() {
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_quote_double_escapes() {
        assert_eq!(quote_double("users").unwrap(), "\"users\"");
        assert_eq!(quote_double("a\"b").unwrap(), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_double_injection_safely_quoted() {
        let quoted = quote_double("x\"; DROP TABLE t; --").unwrap();
        assert_eq!(quoted, "\"x\"\"; DROP TABLE t; --\"");
        assert_eq!(unquote_double(&quoted).unwrap(), "x\"; DROP TABLE t; --");
    }

    #[test]
    fn test_quote_backtick_and_bracket() {
        assert_eq!(quote_backtick("a`b").unwrap(), "`a``b`");
        assert_eq!(quote_bracket("a]b").unwrap(), "[a]]b]");
    }

    #[test]
    fn test_round_trips() {
        for name in ["plain", "with space", "q\"uote", "back`tick", "br]acket", "[]\"`"] {
            assert_eq!(unquote_double(&quote_double(name).unwrap()).unwrap(), name);
            assert_eq!(unquote_backtick(&quote_backtick(name).unwrap()).unwrap(), name);
            assert_eq!(unquote_bracket(&quote_bracket(name).unwrap()).unwrap(), name);
        }
    }

    #[test]
    fn test_unquote_rejects_malformed() {
        assert!(unquote_double("users").is_none());
        assert!(unquote_double("\"a\"b\"").is_none());
        assert!(unquote_bracket("[a]b]").is_none());
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("O'Brien").unwrap(), "'O''Brien'");
        assert!(quote_literal("bad\0").is_err());
    }
}
