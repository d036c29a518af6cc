//! Dialect catalog: engine identifier → shared dialect.
//!
//! The [`DialectCatalog`] is explicitly constructed and passed to whoever
//! opens connections, instead of living in a global. Each registered
//! dialect is an `Arc<dyn Dialect>` that every connection of that engine
//! kind shares read-only.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiffError, Result};

use super::traits::Dialect;

/// Registry of dialects keyed by canonical engine name.
///
/// # Example
///
/// ```rust,ignore
/// let catalog = DialectCatalog::with_builtins();
/// let dialect = catalog.require("oceanbase_cloud")?;
/// assert_eq!(dialect.name(), "oceanbase");
/// ```
#[derive(Default)]
pub struct DialectCatalog {
    /// Registered dialects by canonical name.
    dialects: HashMap<String, Arc<dyn Dialect>>,

    /// Alternative spellings → canonical name.
    aliases: HashMap<String, String>,
}

impl DialectCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with the built-in dialects registered.
    pub fn with_builtins() -> Self {
        use crate::drivers::{MssqlDialect, MysqlDialect, OceanBaseDialect, PostgresDialect};

        let mut catalog = Self::new();

        catalog.register(OceanBaseDialect::new());
        catalog.alias("oceanbase_oracle", "oceanbase");
        catalog.alias("oceanbase_cloud", "oceanbase");

        catalog.register(PostgresDialect::new());
        catalog.alias("postgresql", "postgres");
        catalog.alias("pg", "postgres");

        catalog.register(MysqlDialect::new());
        catalog.alias("mariadb", "mysql");

        catalog.register(MssqlDialect::new());
        catalog.alias("sqlserver", "mssql");
        catalog.alias("sql_server", "mssql");

        catalog
    }

    /// Register a dialect under its own name.
    pub fn register(&mut self, dialect: impl Dialect + 'static) {
        self.register_arc(Arc::new(dialect));
    }

    /// Register an already shared dialect under its own name.
    pub fn register_arc(&mut self, dialect: Arc<dyn Dialect>) {
        self.dialects.insert(dialect.name().to_lowercase(), dialect);
    }

    /// Register an alternative name for a registered dialect.
    pub fn alias(&mut self, alias: impl Into<String>, name: impl Into<String>) {
        self.aliases
            .insert(alias.into().to_lowercase(), name.into().to_lowercase());
    }

    /// Resolve an engine identifier or alias to its canonical name.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        let key = name.to_lowercase();
        if let Some((k, _)) = self.dialects.get_key_value(&key) {
            return Some(k.as_str());
        }
        self.aliases
            .get(&key)
            .filter(|target| self.dialects.contains_key(*target))
            .map(String::as_str)
    }

    /// Get a dialect by name or alias.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        let canonical = self.canonical_name(name)?;
        self.dialects.get(canonical).cloned()
    }

    /// Get a dialect by name or alias, returning an error if not found.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.get(name).ok_or_else(|| {
            DiffError::Config(format!(
                "Unknown database type: '{}'. Supported types: {}",
                name,
                self.names().join(", ")
            ))
        })
    }

    /// Check if a dialect is registered under this name or alias.
    pub fn contains(&self, name: &str) -> bool {
        self.canonical_name(name).is_some()
    }

    /// Canonical names of all registered dialects, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for DialectCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectCatalog")
            .field("dialects", &self.names())
            .field("aliases", &self.aliases)
            .finish()
    }
}
