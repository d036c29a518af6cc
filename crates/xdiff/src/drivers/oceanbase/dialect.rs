//! OceanBase (Oracle compatibility mode) SQL dialect.
//!
//! Renders Oracle-flavored SQL: `"ident"` quoting, `||` concatenation,
//! `DECODE` for NULL-safe comparison, `DBMS_CRYPTO` for hashing and
//! `TO_CHAR` format models for normalization. Oracle mode has no OFFSET
//! clause, so offset pagination is rejected.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

use crate::core::identifier::{quote_double, quote_literal};
use crate::core::schema::{IdentifierCase, TablePath};
use crate::core::traits::Dialect;
use crate::dialect::{
    ColumnType, DefaultTypes, FractionalType, TemporalType, TypeKind, TypeRules,
    CHECKSUM_HEXDIGITS, CHECKSUM_OFFSET, MAX_DECIMAL_PRECISION,
};
use crate::drivers::common::{
    timestamp_text, validate_time_zone, CHECKSUM_SUBSTR_START, NORMALIZED_TIMESTAMP_WIDTH,
};
use crate::error::{DiffError, Result};

/// `DBMS_CRYPTO.HASH_MD5`
const HASH_MD5: u32 = 2;

// Order matters: the zone-qualified forms must be tried before the bare
// TIMESTAMP(n) pattern.
static TYPE_RULES: Lazy<TypeRules> = Lazy::new(|| {
    TypeRules::new()
        .rule(r"TIMESTAMP\((\d)\) WITH LOCAL TIME ZONE", |p, r| {
            ColumnType::Timestamp(TemporalType::new(p, r))
        })
        .and_then(|rules| {
            rules.rule(r"TIMESTAMP\((\d)\) WITH TIME ZONE", |p, r| {
                ColumnType::TimestampTz(TemporalType::new(p, r))
            })
        })
        .and_then(|rules| {
            rules.rule(r"TIMESTAMP\((\d)\)", |p, r| {
                ColumnType::Timestamp(TemporalType::new(p, r))
            })
        })
        .expect("OceanBase type patterns are valid")
});

const DEFAULT_TYPES: DefaultTypes = &[
    ("NUMBER", TypeKind::Decimal),
    ("FLOAT", TypeKind::Float),
    ("BINARY_FLOAT", TypeKind::Float),
    ("BINARY_DOUBLE", TypeKind::Float),
    ("CHAR", TypeKind::Text),
    ("NCHAR", TypeKind::Text),
    ("NVARCHAR2", TypeKind::Text),
    ("VARCHAR2", TypeKind::Text),
    ("VARCHAR", TypeKind::Text),
    ("DATE", TypeKind::Timestamp),
    ("TIMESTAMP", TypeKind::Timestamp),
];

/// OceanBase Oracle-mode dialect.
#[derive(Debug, Clone, Default)]
pub struct OceanBaseDialect;

impl OceanBaseDialect {
    /// Create a new OceanBase dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// Uppercase MD5 hex of `expr` as a RAW → VARCHAR2 conversion.
    fn md5_hex(&self, expr: &str) -> String {
        format!(
            "RAWTOHEX(DBMS_CRYPTO.Hash(utl_raw.cast_to_raw({}), {}))",
            expr, HASH_MD5
        )
    }
}

impl Dialect for OceanBaseDialect {
    fn name(&self) -> &str {
        "oceanbase"
    }

    fn rounds_on_precision_loss(&self) -> bool {
        true
    }

    fn placeholder_table(&self) -> Option<&str> {
        Some("DUAL")
    }

    fn identifier_case(&self) -> IdentifierCase {
        IdentifierCase::Upper
    }

    fn default_schema(&self, user: &str, _database: &str) -> String {
        user.to_uppercase()
    }

    fn quote_identifier(&self, name: &str) -> Result<String> {
        quote_double(name)
    }

    fn text_type(&self) -> &str {
        "VARCHAR(1024)"
    }

    fn to_text(&self, expr: &str) -> String {
        format!("cast({} as {})", expr, self.text_type())
    }

    /// A zero offset is the same as no offset; any other offset is
    /// `Unsupported`.
    fn paginate(&self, query: &str, offset: Option<u64>, limit: Option<u64>) -> Result<String> {
        if matches!(offset, Some(n) if n > 0) {
            return Err(DiffError::unsupported(
                self.name(),
                "OFFSET pagination (Oracle mode)",
            ));
        }
        Ok(match limit {
            Some(n) => format!("SELECT * FROM ({}) FETCH NEXT {} ROWS ONLY", query, n),
            None => query.to_string(),
        })
    }

    fn concat(&self, items: &[String]) -> String {
        if items.is_empty() {
            return "''".to_string();
        }
        format!("({})", items.join(" || "))
    }

    fn literal_timestamp(&self, t: &NaiveDateTime) -> String {
        format!("timestamp '{}'", timestamp_text(t))
    }

    fn random(&self) -> String {
        "dbms_random.value".to_string()
    }

    fn is_distinct_from(&self, a: &str, b: &str) -> String {
        // DECODE treats two NULLs as equal
        format!("DECODE({}, {}, 1, 0) = 0", a, b)
    }

    fn hash_to_int(&self, expr: &str) -> String {
        format!(
            "to_number(substr({}, {}), '{}') - {}",
            self.md5_hex(expr),
            CHECKSUM_SUBSTR_START,
            "x".repeat(CHECKSUM_HEXDIGITS),
            CHECKSUM_OFFSET
        )
    }

    fn hash_to_hex(&self, expr: &str) -> String {
        format!(
            "lower(substr({}, {}))",
            self.md5_hex(expr),
            CHECKSUM_SUBSTR_START
        )
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("LOWER(CAST(TRIM({}) AS VARCHAR(36)))", expr)
    }

    fn normalize_timestamp(&self, expr: &str, t: &TemporalType) -> String {
        if t.rounds {
            return format!(
                "to_char(cast({} as timestamp({})), 'YYYY-MM-DD HH24:MI:SS.FF6')",
                expr, t.precision
            );
        }
        let truncated = if t.precision > 0 {
            format!("to_char({}, 'YYYY-MM-DD HH24:MI:SS.FF{}')", expr, t.precision)
        } else {
            format!("to_char({}, 'YYYY-MM-DD HH24:MI:SS.')", expr)
        };
        format!("RPAD({}, {}, '0')", truncated, NORMALIZED_TIMESTAMP_WIDTH)
    }

    fn normalize_number(&self, expr: &str, t: &FractionalType) -> String {
        let mut format_model = format!(
            "FM{}",
            "9".repeat((MAX_DECIMAL_PRECISION - t.scale) as usize)
        );
        if t.scale > 0 {
            format_model.push_str("0.");
            format_model.push_str(&"9".repeat((t.scale - 1) as usize));
            format_model.push('0');
        }
        format!("to_char({}, '{}')", expr, format_model)
    }

    fn set_session_timezone(&self, zone: &str) -> Result<String> {
        let zone = validate_time_zone(zone)?;
        Ok(format!("ALTER SESSION SET TIME_ZONE = {}", quote_literal(zone)?))
    }

    fn current_timestamp(&self) -> String {
        "LOCALTIMESTAMP".to_string()
    }

    fn type_rules(&self) -> &TypeRules {
        &TYPE_RULES
    }

    fn default_types(&self) -> DefaultTypes {
        DEFAULT_TYPES
    }

    fn schema_query(&self, path: &TablePath, default_schema: &str) -> Result<String> {
        let (schema, table) = self.normalize_table_path(path, default_schema)?;
        Ok(format!(
            "SELECT column_name, data_type, 6 as datetime_precision, \
             data_precision as numeric_precision, data_scale as numeric_scale \
             FROM ALL_TAB_COLUMNS WHERE table_name = {} AND owner = {} \
             ORDER BY column_id",
            quote_literal(&table)?,
            quote_literal(&schema)?
        ))
    }
}
