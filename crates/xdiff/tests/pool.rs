//! Worker pool tests against an in-memory backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use xdiff::{
    Backend, BackendError, ColumnType, ConnectionConfig, Connector, DialectCatalog, DiffError,
    Rows, TablePath, ThreadedDatabase,
};

/// Records which thread opened each connection and which ran each query.
#[derive(Default)]
struct Recorder {
    connects: AtomicUsize,
    connect_threads: Mutex<Vec<ThreadId>>,
    // (connection id, thread that ran the query)
    runs: Mutex<Vec<(usize, ThreadId)>>,
    statements: Mutex<Vec<String>>,
}

struct FakeConnector {
    recorder: Arc<Recorder>,
    refuse: bool,
}

impl FakeConnector {
    fn new() -> (Arc<Self>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let connector = Arc::new(Self {
            recorder: Arc::clone(&recorder),
            refuse: false,
        });
        (connector, recorder)
    }

    fn refusing() -> Arc<Self> {
        Arc::new(Self {
            recorder: Arc::new(Recorder::default()),
            refuse: true,
        })
    }
}

impl Connector for FakeConnector {
    fn connect(
        &self,
        _config: &ConnectionConfig,
        _engine: &str,
    ) -> Result<Box<dyn Backend>, BackendError> {
        if self.refuse {
            return Err(BackendError::new("FATAL: password authentication failed"));
        }
        let id = self.recorder.connects.fetch_add(1, Ordering::SeqCst);
        self.recorder
            .connect_threads
            .lock()
            .unwrap()
            .push(thread::current().id());
        Ok(Box::new(FakeBackend {
            id,
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct FakeBackend {
    id: usize,
    recorder: Arc<Recorder>,
}

impl Backend for FakeBackend {
    fn run(&mut self, sql: &str) -> Result<Rows, BackendError> {
        self.recorder
            .runs
            .lock()
            .unwrap()
            .push((self.id, thread::current().id()));
        self.recorder.statements.lock().unwrap().push(sql.to_string());

        if sql.contains("information_schema.columns") {
            return Ok(vec![
                vec![
                    Some("id".into()),
                    Some("integer".into()),
                    None,
                    Some("32".into()),
                    Some("0".into()),
                ],
                vec![
                    Some("amount".into()),
                    Some("numeric".into()),
                    None,
                    Some("10".into()),
                    Some("2".into()),
                ],
                vec![
                    Some("created_at".into()),
                    Some("timestamp without time zone".into()),
                    Some("3".into()),
                    None,
                    None,
                ],
            ]);
        }
        if sql.starts_with("BROKEN") {
            return Err(BackendError::new("syntax error at or near \"BROKEN\""));
        }
        Ok(vec![vec![Some(sql.to_string())]])
    }

    fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

fn config(thread_count: usize) -> ConnectionConfig {
    ConnectionConfig {
        r#type: "postgres".into(),
        host: "localhost".into(),
        port: None,
        database: "shop".into(),
        user: "app".into(),
        password: "secret".into(),
        schema: None,
        thread_count,
        session_time_zone: Some("UTC".into()),
        bridge: None,
    }
}

fn open(thread_count: usize, connector: Arc<dyn Connector>) -> ThreadedDatabase {
    ThreadedDatabase::new(config(thread_count), &DialectCatalog::with_builtins(), connector)
        .unwrap()
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_query_returns_rows() {
    let (connector, recorder) = FakeConnector::new();
    let db = open(2, connector);

    let rows = db.query("SELECT 1").await.unwrap();
    assert_eq!(rows, vec![vec![Some("SELECT 1".to_string())]]);

    // the session pins UTC before the first query
    let statements = recorder.statements.lock().unwrap().clone();
    assert_eq!(statements[0], "SET TIME ZONE 'UTC'");
    assert_eq!(statements[1], "SELECT 1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_error_keeps_worker_usable() {
    let (connector, _recorder) = FakeConnector::new();
    let db = open(1, connector);

    let err = db.query("BROKEN").await.unwrap_err();
    match err {
        DiffError::Query { message, sql } => {
            assert!(message.contains("syntax error"));
            assert_eq!(sql, "BROKEN");
        }
        other => panic!("expected Query error, got {:?}", other),
    }

    assert!(db.query("SELECT 2").await.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_schema_lookup() {
    let (connector, recorder) = FakeConnector::new();
    let db = open(1, connector);
    assert_eq!(db.default_schema(), "public");

    let raw = db.introspect_schema(TablePath::table("Orders")).await.unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw[1].numeric_scale, Some(2));

    let schema = db
        .query_table_schema(TablePath::table("Orders"))
        .await
        .unwrap();
    let names: Vec<&str> = schema.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["id", "amount", "created_at"]);
    assert_eq!(schema[0].1, ColumnType::Integer);
    assert!(matches!(schema[1].1, ColumnType::Decimal(f) if f.scale == 2));
    assert!(matches!(schema[2].1, ColumnType::Timestamp(t) if t.precision == 3));

    // the lookup uses the folded default schema and table name
    let statements = recorder.statements.lock().unwrap().clone();
    let lookup = statements
        .iter()
        .find(|s| s.contains("information_schema.columns"))
        .unwrap();
    assert!(lookup.contains("'public'"));
    assert!(lookup.contains("'orders'"));
}

#[test]
fn test_query_blocking_from_plain_thread() {
    let (connector, _recorder) = FakeConnector::new();
    let db = open(2, connector);
    let rows = db.query_blocking("SELECT 3").unwrap();
    assert_eq!(rows.len(), 1);
}

// =============================================================================
// Failures and shutdown
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_error_surfaces_as_connect() {
    let db = open(1, FakeConnector::refusing());

    let err = db.query("SELECT 1").await.unwrap_err();
    match &err {
        DiffError::Connect { message } => assert!(message.contains("authentication failed")),
        other => panic!("expected Connect error, got {:?}", other),
    }
    assert!(err.is_retryable());

    // the failed session is replaced, so the next job tries again
    assert!(matches!(
        db.query("SELECT 1").await.unwrap_err(),
        DiffError::Connect { .. }
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_close_is_idempotent_and_final() {
    let (connector, _recorder) = FakeConnector::new();
    let db = open(2, connector);
    db.query("SELECT 1").await.unwrap();

    db.close().unwrap();
    db.close().unwrap();
    assert!(db.is_closed());

    assert!(matches!(
        db.query("SELECT 1").await.unwrap_err(),
        DiffError::Closed
    ));
    assert!(matches!(
        db.query_table_schema(TablePath::table("t")).await.unwrap_err(),
        DiffError::Closed
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (connector, _recorder) = FakeConnector::new();
    let mut cfg = config(0);
    let err = ThreadedDatabase::new(cfg.clone(), &DialectCatalog::with_builtins(), connector.clone())
        .unwrap_err();
    assert!(matches!(err, DiffError::Config(_)));

    cfg.thread_count = 1;
    cfg.r#type = "db2".into();
    let err =
        ThreadedDatabase::new(cfg, &DialectCatalog::with_builtins(), connector).unwrap_err();
    assert!(err.to_string().contains("Unknown database type"));
}

// =============================================================================
// Thread confinement
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_connections_stay_on_their_worker_thread() {
    let (connector, recorder) = FakeConnector::new();
    let db = Arc::new(open(3, connector));

    let mut handles = Vec::new();
    for i in 0..30 {
        let db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            db.query(format!("SELECT {}", i)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let connects = recorder.connects.load(Ordering::SeqCst);
    assert!(connects >= 1 && connects <= 3, "opened {} connections", connects);

    let connect_threads = recorder.connect_threads.lock().unwrap().clone();
    let distinct: HashSet<_> = connect_threads.iter().collect();
    assert_eq!(distinct.len(), connect_threads.len());

    // every statement ran on the thread that opened its connection
    for (id, thread) in recorder.runs.lock().unwrap().iter() {
        assert_eq!(&connect_threads[*id], thread);
    }
    assert!(!connect_threads.contains(&thread::current().id()));
}
