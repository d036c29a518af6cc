//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Connection settings for one database.
///
/// The outer engine builds one of these per side of a comparison; the
/// worker pool hands a clone to every worker thread.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Engine identifier or alias (e.g. "oceanbase", "postgres").
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (engine default when omitted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database (or service / tenant) name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Schema used for one-component table paths (engine convention when
    /// not set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Number of worker threads, each owning one connection (default: 4).
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,

    /// Time zone pinned on every new session. Unset leaves the server
    /// default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_time_zone: Option<String>,

    /// Native driver settings for bridged engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeConfig>,
}

/// Native driver location and identity.
///
/// There is no built-in default: bridged engines must name their driver
/// and at least one driver artifact explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Driver identifier passed to the driver manager (a registered driver
    /// name or the path of the driver library).
    pub driver: String,

    /// Driver artifacts (shared libraries, jars, ...) loaded once per
    /// process.
    pub artifacts: Vec<PathBuf>,

    /// Extra driver-specific connection attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl BridgeConfig {
    /// The driver library itself: the first configured artifact.
    pub fn primary_artifact(&self) -> Option<&Path> {
        self.artifacts.first().map(PathBuf::as_path)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("thread_count", &self.thread_count)
            .field("session_time_zone", &self.session_time_zone)
            .field("bridge", &self.bridge)
            .finish()
    }
}

// Default value functions for serde
fn default_thread_count() -> usize {
    4
}
