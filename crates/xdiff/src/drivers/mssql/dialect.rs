//! Microsoft SQL Server SQL dialect (Strategy pattern).
//!
//! Provides MSSQL-specific SQL syntax: bracket quoting, `OFFSET ... FETCH`
//! pagination and `HASHBYTES` digests. SQL Server has no session time
//! zone, so [`Dialect::set_session_timezone`] is unsupported.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

use crate::core::identifier::quote_bracket;
use crate::core::schema::{IdentifierCase, TablePath};
use crate::core::traits::Dialect;
use crate::dialect::{
    DefaultTypes, FractionalType, TemporalType, TypeKind, TypeRules, CHECKSUM_HEXDIGITS,
    CHECKSUM_OFFSET, MAX_DECIMAL_PRECISION, NORMALIZED_FRACTION_DIGITS, TIMESTAMP_PRECISION_POS,
};
use crate::drivers::common::{timestamp_text, NORMALIZED_TIMESTAMP_WIDTH};
use crate::error::{DiffError, Result};

/// MD5 digest length in bytes.
const MD5_BYTES: usize = 16;

static TYPE_RULES: Lazy<TypeRules> = Lazy::new(TypeRules::new);

const DEFAULT_TYPES: DefaultTypes = &[
    ("decimal", TypeKind::Decimal),
    ("numeric", TypeKind::Decimal),
    ("money", TypeKind::Decimal),
    ("smallmoney", TypeKind::Decimal),
    ("float", TypeKind::Float),
    ("real", TypeKind::Float),
    ("tinyint", TypeKind::Integer),
    ("smallint", TypeKind::Integer),
    ("int", TypeKind::Integer),
    ("bigint", TypeKind::Integer),
    ("char", TypeKind::Text),
    ("varchar", TypeKind::Text),
    ("nchar", TypeKind::Text),
    ("nvarchar", TypeKind::Text),
    ("text", TypeKind::Text),
    ("ntext", TypeKind::Text),
    ("datetime", TypeKind::Timestamp),
    ("datetime2", TypeKind::Timestamp),
    ("smalldatetime", TypeKind::Timestamp),
    ("datetimeoffset", TypeKind::TimestampTz),
    ("uniqueidentifier", TypeKind::Uuid),
];

/// MSSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    fn md5_bytes(&self, expr: &str) -> String {
        format!("HASHBYTES('MD5', CAST({} AS VARCHAR(MAX)))", expr)
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn rounds_on_precision_loss(&self) -> bool {
        true
    }

    fn identifier_case(&self) -> IdentifierCase {
        IdentifierCase::Preserve
    }

    fn default_schema(&self, _user: &str, _database: &str) -> String {
        "dbo".to_string()
    }

    fn quote_identifier(&self, name: &str) -> Result<String> {
        // MSSQL uses square brackets; an embedded ] is doubled
        quote_bracket(name)
    }

    fn text_type(&self) -> &str {
        "VARCHAR(1024)"
    }

    fn to_text(&self, expr: &str) -> String {
        format!("CONVERT({}, {})", self.text_type(), expr)
    }

    fn paginate(&self, query: &str, offset: Option<u64>, limit: Option<u64>) -> Result<String> {
        if offset.is_none() && limit.is_none() {
            return Ok(query.to_string());
        }
        // OFFSET ... FETCH requires an ORDER BY
        let mut sql = format!(
            "SELECT * FROM ({}) AS LIMITED_SELECT ORDER BY (SELECT NULL) OFFSET {} ROWS",
            query,
            offset.unwrap_or(0)
        );
        if let Some(n) = limit {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", n));
        }
        Ok(sql)
    }

    fn concat(&self, items: &[String]) -> String {
        match items {
            [] => "''".to_string(),
            [single] => format!("CONCAT({}, '')", single),
            _ => format!("CONCAT({})", items.join(", ")),
        }
    }

    fn literal_timestamp(&self, t: &NaiveDateTime) -> String {
        format!("CAST('{}' AS DATETIME2(6))", timestamp_text(t))
    }

    fn random(&self) -> String {
        "RAND()".to_string()
    }

    fn is_distinct_from(&self, a: &str, b: &str) -> String {
        format!(
            "(({a} <> {b} OR {a} IS NULL OR {b} IS NULL) AND NOT ({a} IS NULL AND {b} IS NULL))",
            a = a,
            b = b
        )
    }

    fn hash_to_int(&self, expr: &str) -> String {
        // last six digest bytes read as a big-endian integer
        let width = CHECKSUM_HEXDIGITS / 2;
        format!(
            "CONVERT(BIGINT, SUBSTRING({}, {}, {})) - {}",
            self.md5_bytes(expr),
            1 + MD5_BYTES - width,
            width,
            CHECKSUM_OFFSET
        )
    }

    fn hash_to_hex(&self, expr: &str) -> String {
        format!(
            "LOWER(RIGHT(CONVERT(VARCHAR(32), {}, 2), {}))",
            self.md5_bytes(expr),
            CHECKSUM_HEXDIGITS
        )
    }

    fn normalize_uuid(&self, expr: &str) -> String {
        format!("LOWER(LTRIM(RTRIM(CONVERT(VARCHAR(36), {}))))", expr)
    }

    fn normalize_timestamp(&self, expr: &str, t: &TemporalType) -> String {
        let precision = t.precision.min(NORMALIZED_FRACTION_DIGITS);
        if t.rounds {
            return format!(
                "CONVERT(VARCHAR({}), CAST(CAST({} AS DATETIME2({})) AS DATETIME2(6)), 121)",
                NORMALIZED_TIMESTAMP_WIDTH, expr, precision
            );
        }
        // style 121 on DATETIME2(7) never rounds; keep the wanted digits and pad
        format!(
            "LEFT(CONVERT(VARCHAR(27), CAST({} AS DATETIME2(7)), 121), {}) + REPLICATE('0', {})",
            expr,
            TIMESTAMP_PRECISION_POS + precision as usize,
            NORMALIZED_FRACTION_DIGITS - precision
        )
    }

    fn normalize_number(&self, expr: &str, t: &FractionalType) -> String {
        format!(
            "CONVERT(VARCHAR(50), CAST({} AS DECIMAL({}, {})))",
            expr, MAX_DECIMAL_PRECISION, t.scale
        )
    }

    fn set_session_timezone(&self, _zone: &str) -> Result<String> {
        Err(DiffError::unsupported(self.name(), "session time zone"))
    }

    fn current_timestamp(&self) -> String {
        "SYSDATETIME()".to_string()
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
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE table_name = {} AND table_schema = {} \
             ORDER BY ordinal_position",
            self.quote_literal(&table)?,
            self.quote_literal(&schema)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::RawColumnInfo;
    use crate::dialect::ColumnType;

    #[test]
    fn test_quote_identifier() {
        let d = MssqlDialect::new();
        assert_eq!(d.quote_identifier("users").unwrap(), "[users]");
        assert_eq!(d.quote_identifier("my]table").unwrap(), "[my]]table]");
    }

    #[test]
    fn test_paginate() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.paginate("SELECT * FROM t", Some(10), Some(5)).unwrap(),
            "SELECT * FROM (SELECT * FROM t) AS LIMITED_SELECT ORDER BY (SELECT NULL) \
             OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        assert_eq!(
            d.paginate("SELECT * FROM t", None, Some(5)).unwrap(),
            "SELECT * FROM (SELECT * FROM t) AS LIMITED_SELECT ORDER BY (SELECT NULL) \
             OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
        );
        assert_eq!(d.paginate("SELECT 1", None, None).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_concat_single_item() {
        let d = MssqlDialect::new();
        assert_eq!(d.concat(&["a".into()]), "CONCAT(a, '')");
        assert_eq!(d.concat(&["a".into(), "b".into()]), "CONCAT(a, b)");
    }

    #[test]
    fn test_hash_expressions() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.hash_to_int("c"),
            "CONVERT(BIGINT, SUBSTRING(HASHBYTES('MD5', CAST(c AS VARCHAR(MAX))), 11, 6)) \
             - 140737488355327"
        );
        assert_eq!(
            d.hash_to_hex("c"),
            "LOWER(RIGHT(CONVERT(VARCHAR(32), HASHBYTES('MD5', CAST(c AS VARCHAR(MAX))), 2), 12))"
        );
    }

    #[test]
    fn test_normalize_timestamp_truncating() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.normalize_timestamp("ts", &TemporalType::new(3, false)),
            "LEFT(CONVERT(VARCHAR(27), CAST(ts AS DATETIME2(7)), 121), 23) + REPLICATE('0', 3)"
        );
    }

    #[test]
    fn test_session_timezone_unsupported() {
        let d = MssqlDialect::new();
        let err = d.set_session_timezone_utc().unwrap_err();
        assert!(matches!(err, DiffError::Unsupported { .. }));
        assert_eq!(d.current_timestamp(), "SYSDATETIME()");
    }

    #[test]
    fn test_parse_type() {
        let d = MssqlDialect::new();
        let path = TablePath::qualified("dbo", "t");

        let info = RawColumnInfo::new("id", "uniqueidentifier");
        assert_eq!(d.parse_type(&path, &info), ColumnType::Uuid);

        let info = RawColumnInfo::new("m", "money").with_numeric(Some(19), Some(4));
        assert_eq!(
            d.parse_type(&path, &info),
            ColumnType::Decimal(FractionalType::new(19, 4))
        );

        let info = RawColumnInfo::new("at", "datetimeoffset").with_datetime_precision(Some(7));
        assert_eq!(
            d.parse_type(&path, &info),
            ColumnType::TimestampTz(TemporalType::new(7, true))
        );
    }

    #[test]
    fn test_schema_query() {
        let d = MssqlDialect::new();
        let sql = d.schema_query(&TablePath::table("Orders"), "dbo").unwrap();
        assert!(sql.contains("INFORMATION_SCHEMA.COLUMNS"));
        assert!(sql.contains("table_name = 'Orders'"));
        assert!(sql.contains("table_schema = 'dbo'"));
        assert!(d.schema_query(&TablePath::parse("a.b.c"), "dbo").is_err());
    }
}
