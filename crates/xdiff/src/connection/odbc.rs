//! ODBC backend on the shared bridge environment.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - An ODBC driver manager (unixODBC or the Windows driver manager) and
//!   the engine's ODBC driver must be installed; the driver is named in the
//!   connection's `bridge` section

use odbc_api::buffers::TextRowSet;
use odbc_api::{Cursor, ResultSetMetadata};
use tracing::debug;

use crate::bridge::{BridgeConnection, BridgeRuntime};
use crate::config::ConnectionConfig;
use crate::error::DiffError;

use super::backend::{Backend, BackendError, Connector, Rows};

/// Rows fetched per round trip.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Longest text value fetched per cell, in bytes.
const DEFAULT_MAX_STR_LEN: usize = 4096;

/// Opens ODBC connections through the process-wide bridge.
#[derive(Debug, Clone)]
pub struct OdbcConnector {
    bridge: &'static BridgeRuntime,
    batch_size: usize,
    max_str_len: usize,
}

impl Default for OdbcConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl OdbcConnector {
    /// Create a connector on the global bridge.
    pub fn new() -> Self {
        Self {
            bridge: BridgeRuntime::global(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_str_len: DEFAULT_MAX_STR_LEN,
        }
    }

    /// Set the fetch batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the maximum fetched text length per cell.
    pub fn with_max_str_len(mut self, max_str_len: usize) -> Self {
        self.max_str_len = max_str_len.max(1);
        self
    }
}

impl Connector for OdbcConnector {
    fn connect(
        &self,
        config: &ConnectionConfig,
        engine: &str,
    ) -> Result<Box<dyn Backend>, BackendError> {
        let bridge = config.bridge.as_ref().ok_or_else(|| {
            BackendError::new(format!("{}: no bridge driver configured", engine))
        })?;

        // Artifacts are registered once per process; repeated loads are no-ops.
        let driver = self
            .bridge
            .resolve_driver(bridge)
            .map_err(|e| BackendError::new(e.to_string()))?;

        let connection_string = config
            .odbc_connection_string(engine, &driver)
            .map_err(|e| BackendError::new(e.to_string()))?;
        if let Ok(redacted) = config.redacted_connection_string(engine, &driver) {
            debug!("ODBC connection string (credentials hidden): {}", redacted);
        }

        let conn = self
            .bridge
            .connect(&connection_string)
            .map_err(|e| match e {
                DiffError::Connect { message } => BackendError::new(message),
                other => BackendError::new(other.to_string()),
            })?;

        Ok(Box::new(OdbcBackend {
            conn,
            batch_size: self.batch_size,
            max_str_len: self.max_str_len,
        }))
    }
}

struct OdbcBackend {
    conn: BridgeConnection<'static>,
    batch_size: usize,
    max_str_len: usize,
}

impl Backend for OdbcBackend {
    fn run(&mut self, sql: &str) -> Result<Rows, BackendError> {
        let conn = self
            .conn
            .connection()
            .ok_or_else(|| BackendError::lost("connection is closed"))?;

        let mut rows = Vec::new();

        if let Some(mut cursor) = conn.execute(sql, ()).map_err(to_backend_error)? {
            let num_cols = cursor.num_result_cols().map_err(to_backend_error)? as usize;

            let mut buffers =
                TextRowSet::for_cursor(self.batch_size, &mut cursor, Some(self.max_str_len))
                    .map_err(to_backend_error)?;
            let mut row_cursor = cursor.bind_buffer(&mut buffers).map_err(to_backend_error)?;

            while let Some(batch) = row_cursor.fetch().map_err(to_backend_error)? {
                for row_idx in 0..batch.num_rows() {
                    let row = (0..num_cols)
                        .map(|col_idx| {
                            batch
                                .at(col_idx, row_idx)
                                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                        })
                        .collect();
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        // The bridge lease is returned when the backend is dropped.
        self.conn.close();
        Ok(())
    }
}

/// SQLSTATE class 08 means the connection itself is gone.
fn to_backend_error(e: odbc_api::Error) -> BackendError {
    let lost = match &e {
        odbc_api::Error::Diagnostics { record, .. } => record.state.as_str().starts_with("08"),
        _ => false,
    };
    let message = e.to_string();
    if lost {
        BackendError::lost(message)
    } else {
        BackendError::new(message)
    }
}
