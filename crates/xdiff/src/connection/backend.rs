//! The seam between a session and an engine-native driver.
//!
//! A [`Connector`] opens one [`Backend`] per session. Backends report
//! failures as [`BackendError`], which only carries the driver's message
//! and whether the handle is still usable; the session turns it into a
//! [`DiffError`](crate::error::DiffError) so no driver type escapes.

use std::fmt;

use crate::config::ConnectionConfig;

/// A text row set: one `Vec` per row, `None` for SQL NULL.
pub type Rows = Vec<Vec<Option<String>>>;

/// Failure reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// The driver's message, verbatim.
    pub message: String,
    /// Whether the underlying handle can no longer be used.
    pub connection_lost: bool,
}

impl BackendError {
    /// A statement-level failure; the handle stays usable.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            connection_lost: false,
        }
    }

    /// A failure that broke the underlying handle.
    pub fn lost(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            connection_lost: true,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

/// One live engine-native connection.
///
/// Backends are confined to the thread that opened them.
pub trait Backend {
    /// Run one statement and collect its rows as text. Statements without
    /// a result set return no rows.
    fn run(&mut self, sql: &str) -> Result<Rows, BackendError>;

    /// Release the underlying handle.
    fn close(&mut self) -> Result<(), BackendError>;
}

/// Opens backends for one kind of driver.
///
/// Shared by every worker thread of a pool.
pub trait Connector: Send + Sync {
    /// Open a connection for `config`. `engine` is the canonical dialect
    /// name.
    fn connect(
        &self,
        config: &ConnectionConfig,
        engine: &str,
    ) -> Result<Box<dyn Backend>, BackendError>;
}
