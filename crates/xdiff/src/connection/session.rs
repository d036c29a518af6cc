//! Single-connection session state machine.
//!
//! ```text
//! Uninitialized → Connecting → Ready ⇄ Querying
//!                     │                  │
//!                     └──→ Failed ←──────┘
//! any state → Closed
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::core::{Dialect, RawColumnInfo, TablePath};
use crate::dialect::ColumnType;
use crate::error::{DiffError, Result};

use super::backend::{Backend, Connector, Rows};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Connecting,
    Ready,
    Querying,
    Closed,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Querying => "querying",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One database connection and its dialect.
///
/// A session is owned by exactly one thread and never shared.
pub struct Session {
    dialect: Arc<dyn Dialect>,
    config: ConnectionConfig,
    default_schema: String,
    state: SessionState,
    backend: Option<Box<dyn Backend>>,
}

impl Session {
    /// Create an unconnected session.
    pub fn new(dialect: Arc<dyn Dialect>, config: ConnectionConfig) -> Self {
        let default_schema = config.default_schema(dialect.as_ref());
        Self {
            dialect,
            config,
            default_schema,
            state: SessionState::Uninitialized,
            backend: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The session's dialect.
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Schema used for one-component table paths.
    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Open the underlying connection.
    ///
    /// When a session time zone is configured it is pinned before the
    /// session becomes usable. Connecting a `Ready` session is a no-op.
    ///
    /// # Errors
    ///
    /// `DiffError::Connect` with the driver's message; the session is then
    /// `Failed`. `DiffError::Closed` on a closed session.
    pub fn connect(&mut self, connector: &dyn Connector) -> Result<()> {
        match self.state {
            SessionState::Ready => return Ok(()),
            SessionState::Uninitialized => {}
            SessionState::Closed => return Err(DiffError::Closed),
            state => {
                return Err(DiffError::connect(format!(
                    "cannot connect a session in state '{}'",
                    state
                )))
            }
        }

        self.state = SessionState::Connecting;
        let engine = self.dialect.name().to_string();
        debug!("Connecting to {} at {}", engine, self.config.host);

        let backend = match connector.connect(&self.config, &engine) {
            Ok(backend) => backend,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(DiffError::connect(e.message));
            }
        };
        self.backend = Some(backend);

        if let Some(zone) = self.config.session_time_zone.clone() {
            if let Err(e) = self.pin_time_zone(&zone) {
                self.release();
                self.state = SessionState::Failed;
                return Err(e);
            }
        }

        self.state = SessionState::Ready;
        info!(
            "Connected to {} {}/{}",
            engine, self.config.host, self.config.database
        );
        Ok(())
    }

    fn pin_time_zone(&mut self, zone: &str) -> Result<()> {
        let sql = if zone.eq_ignore_ascii_case("UTC") {
            self.dialect.set_session_timezone_utc()?
        } else {
            self.dialect.set_session_timezone(zone)?
        };
        let backend = self.backend.as_mut().ok_or(DiffError::Closed)?;
        backend.run(&sql).map_err(|e| {
            DiffError::connect(format!("failed to set session time zone: {}", e.message))
        })?;
        debug!("Session time zone set to {}", zone);
        Ok(())
    }

    /// Run one statement and return its rows.
    ///
    /// # Errors
    ///
    /// `DiffError::Query` with the driver's message. The session stays
    /// `Ready` unless the driver reports the connection as lost, in which
    /// case it becomes `Failed`.
    pub fn execute(&mut self, sql: &str) -> Result<Rows> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Closed => return Err(DiffError::Closed),
            state => {
                return Err(DiffError::query(
                    format!("session is not ready (state: {})", state),
                    sql,
                ))
            }
        }
        let Some(backend) = self.backend.as_mut() else {
            self.state = SessionState::Failed;
            return Err(DiffError::query("session has no open connection", sql));
        };

        self.state = SessionState::Querying;
        debug!("Executing on {}: {}", self.dialect.name(), sql);
        match backend.run(sql) {
            Ok(rows) => {
                self.state = SessionState::Ready;
                Ok(rows)
            }
            Err(e) => {
                self.state = if e.connection_lost {
                    warn!("{} connection lost: {}", self.dialect.name(), e.message);
                    SessionState::Failed
                } else {
                    SessionState::Ready
                };
                Err(DiffError::query(e.message, sql))
            }
        }
    }

    /// Raw column metadata of `path`, in column order.
    ///
    /// A missing table yields an empty list.
    pub fn introspect_schema(&mut self, path: &TablePath) -> Result<Vec<RawColumnInfo>> {
        let sql = self.dialect.schema_query(path, &self.default_schema)?;
        let rows = self.execute(&sql)?;
        Ok(rows.iter().map(|row| RawColumnInfo::from_row(row)).collect())
    }

    /// Column names of `path` with their canonical types, in column order.
    pub fn query_table_schema(&mut self, path: &TablePath) -> Result<Vec<(String, ColumnType)>> {
        let columns = self.introspect_schema(path)?;
        Ok(columns
            .iter()
            .map(|info| (info.column_name.clone(), self.dialect.parse_type(path, info)))
            .collect())
    }

    /// Release the connection. Idempotent.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.release();
        self.state = SessionState::Closed;
    }

    fn release(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.close() {
                warn!("Error closing {} connection: {}", self.dialect.name(), e);
            } else {
                debug!("Closed {} connection", self.dialect.name());
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect.name())
            .field("state", &self.state)
            .field("default_schema", &self.default_schema)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::backend::BackendError;
    use crate::drivers::{MssqlDialect, OceanBaseDialect};
    use std::sync::Mutex;

    /// Records statements; fails any SQL containing "FAIL", and loses the
    /// connection on "LOSE".
    #[derive(Default)]
    struct FakeConnector {
        log: Arc<Mutex<Vec<String>>>,
        refuse: bool,
    }

    struct FakeBackend {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Backend for FakeBackend {
        fn run(&mut self, sql: &str) -> std::result::Result<Rows, BackendError> {
            self.log.lock().unwrap().push(sql.to_string());
            if sql.contains("LOSE") {
                return Err(BackendError::lost("server closed the connection"));
            }
            if sql.contains("FAIL") {
                return Err(BackendError::new("ORA-00942: table or view does not exist"));
            }
            if sql.contains("ALL_TAB_COLUMNS") {
                return Ok(vec![
                    vec![
                        Some("ID".into()),
                        Some("NUMBER".into()),
                        Some("6".into()),
                        Some("10".into()),
                        Some("0".into()),
                    ],
                    vec![
                        Some("CREATED".into()),
                        Some("TIMESTAMP(3)".into()),
                        Some("6".into()),
                        None,
                        None,
                    ],
                ]);
            }
            Ok(vec![vec![Some("1".into())]])
        }

        fn close(&mut self) -> std::result::Result<(), BackendError> {
            self.log.lock().unwrap().push("<close>".to_string());
            Ok(())
        }
    }

    impl Connector for FakeConnector {
        fn connect(
            &self,
            _config: &ConnectionConfig,
            _engine: &str,
        ) -> std::result::Result<Box<dyn Backend>, BackendError> {
            if self.refuse {
                return Err(BackendError::new("ORA-01017: invalid username/password"));
            }
            Ok(Box::new(FakeBackend {
                log: Arc::clone(&self.log),
            }))
        }
    }

    fn config(zone: Option<&str>) -> ConnectionConfig {
        ConnectionConfig {
            r#type: "oceanbase".into(),
            host: "localhost".into(),
            port: None,
            database: "sys".into(),
            user: "app".into(),
            password: "secret".into(),
            schema: None,
            thread_count: 1,
            session_time_zone: zone.map(String::from),
            bridge: None,
        }
    }

    fn session(zone: Option<&str>) -> Session {
        Session::new(Arc::new(OceanBaseDialect::new()), config(zone))
    }

    #[test]
    fn test_connect_and_execute() {
        let connector = FakeConnector::default();
        let mut s = session(None);
        assert_eq!(s.state(), SessionState::Uninitialized);

        s.connect(&connector).unwrap();
        assert_eq!(s.state(), SessionState::Ready);

        let rows = s.execute("SELECT 1 FROM DUAL").unwrap();
        assert_eq!(rows, vec![vec![Some("1".to_string())]]);
        assert_eq!(s.state(), SessionState::Ready);
        // no time zone configured: nothing but the query ran
        assert_eq!(connector.log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_connect_pins_time_zone() {
        let connector = FakeConnector::default();
        let mut s = session(Some("UTC"));
        s.connect(&connector).unwrap();
        assert_eq!(
            connector.log.lock().unwrap()[0],
            "ALTER SESSION SET TIME_ZONE = 'UTC'"
        );
    }

    #[test]
    fn test_unsupported_time_zone_fails_connect() {
        let connector = FakeConnector::default();
        let mut s = Session::new(Arc::new(MssqlDialect::new()), config(Some("UTC")));
        let err = s.connect(&connector).unwrap_err();
        assert!(matches!(err, DiffError::Unsupported { .. }));
        assert_eq!(s.state(), SessionState::Failed);
        assert_eq!(connector.log.lock().unwrap().as_slice(), ["<close>"]);
    }

    #[test]
    fn test_connect_failure_wraps_message() {
        let connector = FakeConnector {
            refuse: true,
            ..Default::default()
        };
        let mut s = session(None);
        let err = s.connect(&connector).unwrap_err();
        assert!(matches!(err, DiffError::Connect { .. }));
        assert!(err.to_string().contains("ORA-01017"));
        assert_eq!(s.state(), SessionState::Failed);
        assert!(s.execute("SELECT 1 FROM DUAL").is_err());
    }

    #[test]
    fn test_query_failure_keeps_session_ready() {
        let connector = FakeConnector::default();
        let mut s = session(None);
        s.connect(&connector).unwrap();

        let err = s.execute("SELECT * FROM FAIL").unwrap_err();
        match err {
            DiffError::Query { message, sql } => {
                assert!(message.contains("ORA-00942"));
                assert_eq!(sql, "SELECT * FROM FAIL");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(s.state(), SessionState::Ready);
    }

    #[test]
    fn test_lost_connection_fails_session() {
        let connector = FakeConnector::default();
        let mut s = session(None);
        s.connect(&connector).unwrap();
        assert!(s.execute("LOSE").is_err());
        assert_eq!(s.state(), SessionState::Failed);
    }

    #[test]
    fn test_introspect_and_parse() {
        let connector = FakeConnector::default();
        let mut s = session(None);
        s.connect(&connector).unwrap();

        let path = TablePath::table("orders");
        let columns = s.introspect_schema(&path).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].numeric_precision, Some(10));

        let schema = s.query_table_schema(&path).unwrap();
        assert_eq!(schema[0].0, "ID");
        assert_eq!(schema[1].1.to_string(), "Timestamp(3)");

        let log = connector.log.lock().unwrap();
        assert!(log[0].contains("owner = 'APP'"));
        assert!(log[0].contains("table_name = 'ORDERS'"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let connector = FakeConnector::default();
        let mut s = session(None);
        s.connect(&connector).unwrap();
        s.close();
        s.close();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(matches!(s.execute("SELECT 1 FROM DUAL"), Err(DiffError::Closed)));
        assert!(matches!(s.connect(&connector), Err(DiffError::Closed)));
        drop(s);
        let closes = connector
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|l| *l == "<close>")
            .count();
        assert_eq!(closes, 1);
    }
}
