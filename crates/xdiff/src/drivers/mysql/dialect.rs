//! MySQL SQL dialect (Strategy pattern).
//!
//! Provides MySQL-specific SQL syntax: backtick quoting, `<=>` for
//! NULL-safe comparison and `CONV` for hex digests.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

use crate::core::identifier::{self, quote_backtick};
use crate::core::schema::{IdentifierCase, TablePath};
use crate::core::traits::Dialect;
use crate::dialect::{
    DefaultTypes, FractionalType, TemporalType, TypeKind, TypeRules, CHECKSUM_OFFSET,
    MAX_DECIMAL_PRECISION, NORMALIZED_FRACTION_DIGITS, TIMESTAMP_PRECISION_POS,
};
use crate::drivers::common::{
    timestamp_text, validate_time_zone, CHECKSUM_SUBSTR_START, NORMALIZED_TIMESTAMP_WIDTH,
};
use crate::error::Result;

/// Largest LIMIT MySQL accepts; used for offset-only pagination.
const MAX_LIMIT: u64 = u64::MAX;

static TYPE_RULES: Lazy<TypeRules> = Lazy::new(TypeRules::new);

const DEFAULT_TYPES: DefaultTypes = &[
    ("decimal", TypeKind::Decimal),
    ("numeric", TypeKind::Decimal),
    ("float", TypeKind::Float),
    ("double", TypeKind::Float),
    ("tinyint", TypeKind::Integer),
    ("smallint", TypeKind::Integer),
    ("mediumint", TypeKind::Integer),
    ("int", TypeKind::Integer),
    ("integer", TypeKind::Integer),
    ("bigint", TypeKind::Integer),
    ("char", TypeKind::Text),
    ("varchar", TypeKind::Text),
    ("tinytext", TypeKind::Text),
    ("text", TypeKind::Text),
    ("mediumtext", TypeKind::Text),
    ("longtext", TypeKind::Text),
    ("datetime", TypeKind::Timestamp),
    ("timestamp", TypeKind::Timestamp),
];

/// MySQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn rounds_on_precision_loss(&self) -> bool {
        true
    }

    fn identifier_case(&self) -> IdentifierCase {
        IdentifierCase::Preserve
    }

    fn default_schema(&self, _user: &str, database: &str) -> String {
        database.to_string()
    }

    fn quote_identifier(&self, name: &str) -> Result<String> {
        quote_backtick(name)
    }

    fn quote_literal(&self, value: &str) -> Result<String> {
        // backslash is an escape character unless NO_BACKSLASH_ESCAPES is set
        identifier::quote_literal(&value.replace('\\', "\\\\"))
    }

    fn text_type(&self) -> &str {
        "char"
    }

    fn to_text(&self, expr: &str) -> String {
        format!("cast({} as {})", expr, self.text_type())
    }

    fn paginate(&self, query: &str, offset: Option<u64>, limit: Option<u64>) -> Result<String> {
        Ok(match (offset, limit) {
            (None, None) => query.to_string(),
            (None, Some(n)) => format!("{} LIMIT {}", query, n),
            (Some(m), n) => format!("{} LIMIT {} OFFSET {}", query, n.unwrap_or(MAX_LIMIT), m),
        })
    }

    fn concat(&self, items: &[String]) -> String {
        if items.is_empty() {
            return "''".to_string();
        }
        format!("concat({})", items.join(", "))
    }

    fn literal_timestamp(&self, t: &NaiveDateTime) -> String {
        format!("timestamp '{}'", timestamp_text(t))
    }

    fn random(&self) -> String {
        "RAND()".to_string()
    }

    fn is_distinct_from(&self, a: &str, b: &str) -> String {
        format!("not ({} <=> {})", a, b)
    }

    fn hash_to_int(&self, expr: &str) -> String {
        format!(
            "cast(conv({}, 16, 10) as signed) - {}",
            self.hash_to_hex(expr),
            CHECKSUM_OFFSET
        )
    }

    fn hash_to_hex(&self, expr: &str) -> String {
        format!("substring(md5({}), {})", expr, CHECKSUM_SUBSTR_START)
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("lower(trim(cast({} as char)))", expr)
    }

    fn normalize_timestamp(&self, expr: &str, t: &TemporalType) -> String {
        let precision = t.precision.min(NORMALIZED_FRACTION_DIGITS);
        if t.rounds {
            return format!(
                "cast(cast(cast({} as datetime({})) as datetime(6)) as char)",
                expr, precision
            );
        }
        format!(
            "rpad(rpad(cast({} as char), {}, '.'), {}, '0')",
            expr,
            TIMESTAMP_PRECISION_POS + precision as usize,
            NORMALIZED_TIMESTAMP_WIDTH
        )
    }

    fn normalize_number(&self, expr: &str, t: &FractionalType) -> String {
        format!(
            "cast(cast({} as decimal({}, {})) as char)",
            expr, MAX_DECIMAL_PRECISION, t.scale
        )
    }

    fn set_session_timezone(&self, zone: &str) -> Result<String> {
        let zone = validate_time_zone(zone)?;
        // named zones need the tz tables loaded; UTC is always available as an offset
        let zone = if zone.eq_ignore_ascii_case("UTC") {
            "+00:00"
        } else {
            zone
        };
        Ok(format!("SET @@session.time_zone = {}", self.quote_literal(zone)?))
    }

    fn current_timestamp(&self) -> String {
        "current_timestamp(6)".to_string()
    }

    fn type_rules(&self) -> &TypeRules {
        &TYPE_RULES
    }

    fn default_types(&self) -> DefaultTypes {
        DEFAULT_TYPES
    }

    fn schema_query(&self, path: &TablePath, default_schema: &str) -> Result<String> {
        let (schema, table) = self.normalize_table_path(path, default_schema)?;
        // information_schema reports float precision in decimal digits;
        // report the binary precision every other engine uses
        Ok(format!(
            "SELECT column_name, data_type, datetime_precision, \
             CASE data_type WHEN 'float' THEN 24 WHEN 'double' THEN 53 \
             ELSE numeric_precision END AS numeric_precision, numeric_scale \
             FROM information_schema.columns \
             WHERE table_name = {} AND table_schema = {} \
             ORDER BY ordinal_position",
            self.quote_literal(&table)?,
            self.quote_literal(&schema)?
        ))
    }
}
