//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Provides PostgreSQL-specific SQL syntax for identifier quoting,
//! pagination, hashing and value normalization.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

use crate::core::identifier::quote_double;
use crate::core::schema::{IdentifierCase, TablePath};
use crate::core::traits::Dialect;
use crate::dialect::{
    DefaultTypes, FractionalType, TemporalType, TypeKind, TypeRules, CHECKSUM_HEXDIGITS,
    CHECKSUM_OFFSET, MAX_DECIMAL_PRECISION, NORMALIZED_FRACTION_DIGITS, TIMESTAMP_PRECISION_POS,
};
use crate::drivers::common::{
    timestamp_text, validate_time_zone, CHECKSUM_SUBSTR_START, NORMALIZED_TIMESTAMP_WIDTH,
};
use crate::error::Result;

// information_schema reports bare type names, so the defaults do all the work.
static TYPE_RULES: Lazy<TypeRules> = Lazy::new(TypeRules::new);

const DEFAULT_TYPES: DefaultTypes = &[
    ("numeric", TypeKind::Decimal),
    ("decimal", TypeKind::Decimal),
    ("double precision", TypeKind::Float),
    ("real", TypeKind::Float),
    ("smallint", TypeKind::Integer),
    ("integer", TypeKind::Integer),
    ("bigint", TypeKind::Integer),
    ("character varying", TypeKind::Text),
    ("character", TypeKind::Text),
    ("varchar", TypeKind::Text),
    ("text", TypeKind::Text),
    ("timestamp without time zone", TypeKind::Timestamp),
    ("timestamp", TypeKind::Timestamp),
    ("timestamp with time zone", TypeKind::TimestampTz),
    ("timestamptz", TypeKind::TimestampTz),
    ("uuid", TypeKind::Uuid),
];

const TO_CHAR_FORMAT: &str = "YYYY-mm-dd HH24:MI:SS.US";

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn rounds_on_precision_loss(&self) -> bool {
        true
    }

    fn identifier_case(&self) -> IdentifierCase {
        IdentifierCase::Lower
    }

    fn default_schema(&self, _user: &str, _database: &str) -> String {
        "public".to_string()
    }

    fn quote_identifier(&self, name: &str) -> Result<String> {
        // PostgreSQL uses double quotes; embedded quotes are doubled
        quote_double(name)
    }

    fn text_type(&self) -> &str {
        "varchar(1024)"
    }

    fn to_text(&self, expr: &str) -> String {
        format!("{}::{}", expr, self.text_type())
    }

    fn paginate(&self, query: &str, offset: Option<u64>, limit: Option<u64>) -> Result<String> {
        let mut sql = query.to_string();
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        if let Some(m) = offset {
            sql.push_str(&format!(" OFFSET {}", m));
        }
        Ok(sql)
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
        "random()".to_string()
    }

    fn is_distinct_from(&self, a: &str, b: &str) -> String {
        format!("{} IS DISTINCT FROM {}", a, b)
    }

    fn hash_to_int(&self, expr: &str) -> String {
        format!(
            "('x' || {})::bit({})::bigint - {}",
            self.hash_to_hex(expr),
            CHECKSUM_HEXDIGITS * 4,
            CHECKSUM_OFFSET
        )
    }

    fn hash_to_hex(&self, expr: &str) -> String {
        format!("substring(md5({}), {})", expr, CHECKSUM_SUBSTR_START)
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("lower(trim({}::text))", expr)
    }

    fn normalize_timestamp(&self, expr: &str, t: &TemporalType) -> String {
        // PostgreSQL stores at most microseconds
        let precision = t.precision.min(NORMALIZED_FRACTION_DIGITS);
        if t.rounds {
            return format!(
                "to_char({}::timestamp({}), '{}')",
                expr, precision, TO_CHAR_FORMAT
            );
        }
        format!(
            "RPAD(LEFT(to_char({}::timestamp(6), '{}'), {}), {}, '0')",
            expr,
            TO_CHAR_FORMAT,
            TIMESTAMP_PRECISION_POS + precision as usize,
            NORMALIZED_TIMESTAMP_WIDTH
        )
    }

    fn normalize_number(&self, expr: &str, t: &FractionalType) -> String {
        format!(
            "({}::decimal({}, {}))::varchar",
            expr, MAX_DECIMAL_PRECISION, t.scale
        )
    }

    fn set_session_timezone(&self, zone: &str) -> Result<String> {
        let zone = validate_time_zone(zone)?;
        Ok(format!("SET TIME ZONE {}", self.quote_literal(zone)?))
    }

    fn current_timestamp(&self) -> String {
        "current_timestamp".to_string()
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
            "SELECT column_name, data_type, datetime_precision, numeric_precision, numeric_scale \
             FROM information_schema.columns \
             WHERE table_name = {} AND table_schema = {} \
             ORDER BY ordinal_position",
            self.quote_literal(&table)?,
            self.quote_literal(&schema)?
        ))
    }
}
