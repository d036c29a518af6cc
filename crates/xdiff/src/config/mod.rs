//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;
pub use validation::requires_bridge;

use std::path::Path;

use crate::core::{Dialect, DialectCatalog};
use crate::error::{DiffError, Result};

impl ConnectionConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ConnectionConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration against the built-in engines.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&DialectCatalog::with_builtins())
    }

    /// Validate the configuration against the engines known to `catalog`.
    pub fn validate_with(&self, catalog: &DialectCatalog) -> Result<()> {
        validation::validate(self, catalog)
    }

    /// Configured port, or the engine's well-known port.
    pub fn port_or_default(&self, engine: &str) -> Option<u16> {
        self.port.or_else(|| default_port(engine))
    }

    /// Schema for one-component table paths.
    pub fn default_schema(&self, dialect: &dyn Dialect) -> String {
        self.schema
            .clone()
            .unwrap_or_else(|| dialect.default_schema(&self.user, &self.database))
    }

    /// Build the driver-manager connection string.
    ///
    /// `driver` is what [`BridgeRuntime::resolve_driver`] picked: a
    /// registered driver name or the path of the configured driver library.
    ///
    /// [`BridgeRuntime::resolve_driver`]: crate::bridge::BridgeRuntime::resolve_driver
    pub fn odbc_connection_string(&self, engine: &str, driver: &str) -> Result<String> {
        self.build_connection_string(engine, driver, &self.password)
    }

    /// The connection string with the password elided, for logging.
    pub fn redacted_connection_string(&self, engine: &str, driver: &str) -> Result<String> {
        self.build_connection_string(engine, driver, "***")
    }

    fn build_connection_string(
        &self,
        engine: &str,
        driver: &str,
        password: &str,
    ) -> Result<String> {
        let bridge = self.bridge.as_ref().ok_or_else(|| {
            DiffError::Config(format!("{}: no bridge driver configured", engine))
        })?;

        let mut attrs = vec![
            format!("Driver={{{}}}", driver.replace('}', "}}")),
            format!("Server={}", odbc_value(&self.host)),
        ];
        if let Some(port) = self.port_or_default(engine) {
            attrs.push(format!("Port={}", port));
        }
        attrs.push(format!("Database={}", odbc_value(&self.database)));
        attrs.push(format!("Uid={}", odbc_value(&self.user)));
        attrs.push(format!("Pwd={}", odbc_value(password)));
        for (key, value) in &bridge.options {
            attrs.push(format!("{}={}", key, odbc_value(value)));
        }

        Ok(attrs.join(";"))
    }
}

/// Well-known port of each built-in engine.
fn default_port(engine: &str) -> Option<u16> {
    match engine {
        // Oracle-mode listener
        "oceanbase" => Some(1521),
        "postgres" => Some(5432),
        "mysql" => Some(3306),
        "mssql" => Some(1433),
        _ => None,
    }
}

/// Brace-quote attribute values that would otherwise break the
/// `key=value;` syntax.
fn odbc_value(value: &str) -> String {
    let needs_braces = value.contains([';', '{', '}'])
        || value.starts_with(' ')
        || value.ends_with(' ');
    if needs_braces {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{OceanBaseDialect, PostgresDialect};
    use std::io::Write;

    const YAML: &str = r#"
type: oceanbase
host: ob.example.com
database: tenant1
user: app
password: s3cret
thread_count: 2
session_time_zone: UTC
bridge:
  driver: OceanBase ODBC
  artifacts:
    - /opt/ob/libobodbc.so
  options:
    Charset: utf8mb4
"#;

    #[test]
    fn test_from_yaml() {
        let config = ConnectionConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.r#type, "oceanbase");
        assert_eq!(config.thread_count, 2);
        assert_eq!(config.session_time_zone.as_deref(), Some("UTC"));
        let bridge = config.bridge.as_ref().unwrap();
        assert_eq!(bridge.driver, "OceanBase ODBC");
        assert_eq!(bridge.artifacts.len(), 1);
        assert_eq!(config.port_or_default("oceanbase"), Some(1521));
    }

    #[test]
    fn test_defaults() {
        let yaml = "type: postgres\nhost: localhost\ndatabase: db\nuser: u\n";
        let config = ConnectionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.thread_count, 4);
        assert!(config.password.is_empty());
        assert!(config.bridge.is_none());
        assert!(config.session_time_zone.is_none());
    }

    #[test]
    fn test_from_yaml_rejects_missing_bridge() {
        let yaml = "type: oceanbase\nhost: h\ndatabase: d\nuser: u\n";
        assert!(ConnectionConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let config = ConnectionConfig::load(file.path()).unwrap();
        assert_eq!(config.host, "ob.example.com");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig::from_yaml(YAML).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_default_schema() {
        let mut config = ConnectionConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.default_schema(&OceanBaseDialect::new()), "APP");
        assert_eq!(config.default_schema(&PostgresDialect::new()), "public");

        config.schema = Some("reporting".to_string());
        assert_eq!(config.default_schema(&OceanBaseDialect::new()), "reporting");
    }

    #[test]
    fn test_connection_string() {
        let config = ConnectionConfig::from_yaml(YAML).unwrap();
        assert_eq!(
            config
                .odbc_connection_string("oceanbase", "OceanBase ODBC")
                .unwrap(),
            "Driver={OceanBase ODBC};Server=ob.example.com;Port=1521;Database=tenant1;\
             Uid=app;Pwd=s3cret;Charset=utf8mb4"
        );
        let redacted = config
            .redacted_connection_string("oceanbase", "OceanBase ODBC")
            .unwrap();
        assert!(redacted.contains("Pwd=***"));
        assert!(!redacted.contains("s3cret"));
    }

    #[test]
    fn test_connection_string_escapes_values() {
        let mut config = ConnectionConfig::from_yaml(YAML).unwrap();
        config.password = "a;b}c".to_string();
        let conn = config
            .odbc_connection_string("oceanbase", "/opt/ob/lib{x}.so")
            .unwrap();
        assert!(conn.contains("Pwd={a;b}}c}"));
        assert!(conn.starts_with("Driver={/opt/ob/lib{x}}.so};"));
    }

    #[test]
    fn test_connection_string_requires_bridge() {
        let yaml = "type: postgres\nhost: localhost\ndatabase: db\nuser: u\n";
        let config = ConnectionConfig::from_yaml(yaml).unwrap();
        assert!(config.odbc_connection_string("postgres", "PostgreSQL").is_err());
    }
}
