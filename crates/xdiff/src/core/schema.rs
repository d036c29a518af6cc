//! Table path and raw column metadata types.
//!
//! These types carry what an engine reports about a table before any
//! dialect-specific interpretation is applied.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered identifier components naming a table, e.g. `["SALES", "ORDERS"]`.
///
/// A one-component path is resolved against the connection's default schema.
/// The same dialect normalization must be used when rendering a reference to
/// the table and when looking up its schema, otherwise the lookup silently
/// returns zero rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TablePath(Vec<String>);

impl TablePath {
    /// Create a path from its components.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// A path with only a table name.
    pub fn table(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// A schema-qualified path.
    pub fn qualified(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self(vec![schema.into(), table.into()])
    }

    /// Parse a dotted name such as `sales.orders`.
    ///
    /// This is a plain split on `.`; names containing dots must be built
    /// with [`TablePath::new`].
    pub fn parse(dotted: &str) -> Self {
        Self(dotted.split('.').map(str::to_string).collect())
    }

    /// The path components in order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// How an engine folds unquoted identifiers.
///
/// Used to normalize [`TablePath`] components before they are rendered or
/// used as information-schema lookup keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCase {
    /// Oracle-family engines store unquoted names upper-cased.
    Upper,
    /// PostgreSQL stores unquoted names lower-cased.
    Lower,
    /// Names are matched as given.
    Preserve,
}

impl IdentifierCase {
    /// Apply this folding rule to a single identifier.
    pub fn apply(self, name: &str) -> String {
        match self {
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower => name.to_lowercase(),
            IdentifierCase::Preserve => name.to_string(),
        }
    }
}

/// One row of an engine's information-schema column listing.
///
/// Produced by a schema-introspection query, consumed once by
/// `Dialect::parse_type` and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnInfo {
    /// Column name as reported by the engine.
    pub column_name: String,
    /// Raw type string. Some engines report NULL for virtual columns.
    pub data_type: Option<String>,
    /// Declared fractional-second precision, if any.
    pub datetime_precision: Option<u32>,
    /// Declared numeric precision, if any.
    pub numeric_precision: Option<u32>,
    /// Declared numeric scale, if any.
    pub numeric_scale: Option<u32>,
}

impl RawColumnInfo {
    /// Create column info with only a name and type string.
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: Some(data_type.into()),
            datetime_precision: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    /// Set the declared numeric precision and scale.
    #[must_use]
    pub fn with_numeric(mut self, precision: Option<u32>, scale: Option<u32>) -> Self {
        self.numeric_precision = precision;
        self.numeric_scale = scale;
        self
    }

    /// Set the declared fractional-second precision.
    #[must_use]
    pub fn with_datetime_precision(mut self, precision: Option<u32>) -> Self {
        self.datetime_precision = precision;
        self
    }

    /// Build from one text row of a schema query.
    ///
    /// Expects the column order used by every `Dialect::schema_query`:
    /// name, data type, datetime precision, numeric precision, numeric scale.
    /// Unparseable numbers are treated as absent.
    pub fn from_row(row: &[Option<String>]) -> Self {
        let text = |idx: usize| row.get(idx).and_then(|v| v.clone());
        let number = |idx: usize| {
            row.get(idx)
                .and_then(|v| v.as_deref())
                .and_then(|s| s.trim().parse::<u32>().ok())
        };

        Self {
            column_name: text(0).unwrap_or_default(),
            data_type: text(1),
            datetime_precision: number(2),
            numeric_precision: number(3),
            numeric_scale: number(4),
        }
    }
}
