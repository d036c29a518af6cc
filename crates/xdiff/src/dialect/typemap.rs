//! Type normalizer: raw engine column types → canonical [`ColumnType`].
//!
//! Resolution happens in two stages:
//!
//! 1. An **ordered** list of pattern rules is tried against the raw type
//!    string. The first matching rule wins, so more specific patterns such
//!    as `TIMESTAMP(n) WITH TIME ZONE` must come before their generic
//!    prefixes such as `TIMESTAMP(n)`.
//! 2. When no rule matches, the base type name is looked up in the
//!    dialect's default table and precision/scale are taken from the
//!    declared column metadata.
//!
//! Resolution is total: an absent, empty or unrecognized type never
//! produces an error, only [`ColumnType::Unknown`].

use regex::Regex;
use tracing::{debug, warn};

use crate::core::schema::{RawColumnInfo, TablePath};

use super::canonical::{
    binary_precision_to_digits, ColumnType, FractionalType, TemporalType, TypeKind,
    DEFAULT_DATETIME_PRECISION, DEFAULT_NUMERIC_PRECISION, MAX_DECIMAL_PRECISION,
};

/// Builds a canonical type from the precision captured by a rule and the
/// engine-wide rounding policy.
pub type TypeBuilder = fn(precision: u32, rounds: bool) -> ColumnType;

/// A single pattern → constructor rule.
#[derive(Debug, Clone)]
pub struct TypeRule {
    regex: Regex,
    build: TypeBuilder,
}

/// Ordered pattern rules. Order is significant: first match wins.
#[derive(Debug, Clone, Default)]
pub struct TypeRules {
    rules: Vec<TypeRule>,
}

impl TypeRules {
    /// Create an empty rule list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule.
    ///
    /// `pattern` is matched case-insensitively against the whole raw type
    /// string. Its first capture group, when present, is the precision.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` is not a valid expression.
    pub fn rule(mut self, pattern: &str, build: TypeBuilder) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i)^(?:{})$", pattern))?;
        self.rules.push(TypeRule { regex, build });
        Ok(self)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the list has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the first matching rule, if any.
    pub fn resolve(&self, raw: &str, rounds: bool) -> Option<ColumnType> {
        self.rules.iter().find_map(|rule| {
            let caps = rule.regex.captures(raw)?;
            let precision = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(DEFAULT_DATETIME_PRECISION);
            Some((rule.build)(precision, rounds))
        })
    }
}

/// Default mapping from raw type names to canonical kinds.
///
/// Keys are compared case-insensitively. Engine-qualified names such as
/// `SYS.XMLTYPE` or `pg_catalog.int4` are also looked up by their last
/// component.
pub type DefaultTypes = &'static [(&'static str, TypeKind)];

/// Rule table, default table and rounding policy of one engine.
#[derive(Debug, Clone, Copy)]
pub struct TypeNormalizer<'a> {
    rules: &'a TypeRules,
    defaults: DefaultTypes,
    rounds: bool,
}

impl<'a> TypeNormalizer<'a> {
    /// Create a normalizer from an engine's tables.
    pub fn new(rules: &'a TypeRules, defaults: DefaultTypes, rounds: bool) -> Self {
        Self {
            rules,
            defaults,
            rounds,
        }
    }

    /// Resolve the canonical type of one column. Never fails.
    pub fn parse_type(&self, table_path: &TablePath, info: &RawColumnInfo) -> ColumnType {
        let raw = info.data_type.as_deref().map(str::trim).unwrap_or("");
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            warn!(
                "Unexpected data_type for column '{}' of {}: {:?}",
                info.column_name, table_path, info.data_type
            );
            return self.default_type(raw, info);
        }

        if let Some(resolved) = self.rules.resolve(raw, self.rounds) {
            return resolved;
        }

        self.default_type(raw, info)
    }

    /// Default path: look up the base type name and take parameters from
    /// the declared column metadata.
    fn default_type(&self, raw: &str, info: &RawColumnInfo) -> ColumnType {
        let Some(kind) = self.lookup(raw) else {
            debug!(
                "No type mapping for column '{}' ({:?}), treating as unknown",
                info.column_name, raw
            );
            return ColumnType::Unknown(raw.to_string());
        };

        let (declared_precision, declared_scale) = declared_numeric(raw);
        let precision = info.numeric_precision.or(declared_precision);
        let scale = info.numeric_scale.or(declared_scale);

        match kind {
            TypeKind::Decimal => ColumnType::Decimal(FractionalType::new(
                precision.unwrap_or(MAX_DECIMAL_PRECISION),
                scale.unwrap_or(0),
            )),
            TypeKind::Float => {
                let digits =
                    binary_precision_to_digits(precision.unwrap_or(DEFAULT_NUMERIC_PRECISION));
                ColumnType::Float(FractionalType::new(digits, digits))
            }
            TypeKind::Integer => ColumnType::Integer,
            TypeKind::Text => ColumnType::Text,
            TypeKind::Timestamp => ColumnType::Timestamp(TemporalType::new(
                info.datetime_precision.unwrap_or(DEFAULT_DATETIME_PRECISION),
                self.rounds,
            )),
            TypeKind::TimestampTz => ColumnType::TimestampTz(TemporalType::new(
                info.datetime_precision.unwrap_or(DEFAULT_DATETIME_PRECISION),
                self.rounds,
            )),
            TypeKind::Uuid => ColumnType::Uuid,
        }
    }

    fn lookup(&self, raw: &str) -> Option<TypeKind> {
        if raw.is_empty() {
            return None;
        }
        let base = raw.split('(').next().unwrap_or(raw).trim();
        let unqualified = base
            .rsplit('.')
            .next()
            .unwrap_or(base)
            .trim_matches('"');

        [raw, base, unqualified].iter().find_map(|candidate| {
            self.defaults
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(candidate))
                .map(|(_, kind)| *kind)
        })
    }
}

/// Extract `(p)` or `(p, s)` from a raw type string such as `NUMBER(10,2)`.
fn declared_numeric(raw: &str) -> (Option<u32>, Option<u32>) {
    let Some(open) = raw.find('(') else {
        return (None, None);
    };
    let Some(close) = raw[open..].find(')') else {
        return (None, None);
    };
    let mut parts = raw[open + 1..open + close]
        .split(',')
        .map(|p| p.trim().parse::<u32>().ok());
    let precision = parts.next().flatten();
    let scale = parts.next().flatten();
    (precision, scale)
}
