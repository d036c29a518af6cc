//! Configuration validation.

use super::ConnectionConfig;
use crate::core::DialectCatalog;
use crate::error::{DiffError, Result};

/// Engines whose connections go through the native driver bridge.
const BRIDGED_ENGINES: &[&str] = &["oceanbase"];

/// Whether `engine` (canonical name) must be reached through the bridge.
pub fn requires_bridge(engine: &str) -> bool {
    BRIDGED_ENGINES.contains(&engine)
}

/// Validate the configuration against the engines known to `catalog`.
pub fn validate(config: &ConnectionConfig, catalog: &DialectCatalog) -> Result<()> {
    // Same error as opening a pool with an unknown type.
    let dialect = catalog.require(&config.r#type)?;
    let engine = dialect.name();

    if config.host.is_empty() {
        return Err(DiffError::Config("host is required".into()));
    }
    if config.database.is_empty() {
        return Err(DiffError::Config("database is required".into()));
    }
    if config.user.is_empty() {
        return Err(DiffError::Config("user is required".into()));
    }
    if config.thread_count == 0 {
        return Err(DiffError::Config("thread_count must be at least 1".into()));
    }
    if let Some(schema) = &config.schema {
        if schema.is_empty() {
            return Err(DiffError::Config("schema must not be empty when set".into()));
        }
    }
    if let Some(zone) = &config.session_time_zone {
        if zone.trim().is_empty() {
            return Err(DiffError::Config(
                "session_time_zone must not be empty when set".into(),
            ));
        }
    }

    match &config.bridge {
        Some(bridge) => {
            if bridge.driver.trim().is_empty() {
                return Err(DiffError::Config("bridge.driver is required".into()));
            }
            if bridge.artifacts.is_empty() {
                return Err(DiffError::Config(
                    "bridge.artifacts must list at least one driver artifact".into(),
                ));
            }
        }
        None if requires_bridge(engine) => {
            return Err(DiffError::Config(format!(
                "{} connections require a bridge section (driver and artifacts); \
                 no default driver location is assumed",
                engine
            )));
        }
        None => {}
    }

    Ok(())
}
