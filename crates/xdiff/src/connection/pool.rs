//! Fixed-size pool of worker threads, one session per thread.
//!
//! Work is blocking and thread-confined: a job runs on whichever worker
//! takes it from the shared queue, against that worker's own [`Session`].
//! Callers get the result back over a oneshot channel, so they can await
//! it from async code or block on it from plain threads.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::core::{Dialect, DialectCatalog, RawColumnInfo, TablePath};
use crate::dialect::ColumnType;
use crate::error::{DiffError, Result};

use super::backend::{Connector, Rows};
use super::session::{Session, SessionState};

type Job = Box<dyn FnOnce(&mut Worker) + Send>;

/// Per-thread state: the connector and a lazily opened session.
struct Worker {
    dialect: Arc<dyn Dialect>,
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    session: Session,
}

impl Worker {
    /// The worker's session, connecting it first if needed.
    ///
    /// A session that failed earlier is replaced with a fresh one, so a
    /// caller retrying after a connect error gets a new attempt.
    fn session(&mut self) -> Result<&mut Session> {
        if self.session.state() == SessionState::Failed {
            debug!("Replacing failed {} session", self.dialect.name());
            self.session = Session::new(Arc::clone(&self.dialect), self.config.clone());
        }
        self.session.connect(self.connector.as_ref())?;
        Ok(&mut self.session)
    }
}

/// A pool of `thread_count` workers for one database.
///
/// # Example
///
/// ```rust,ignore
/// let db = ThreadedDatabase::new(config, &DialectCatalog::with_builtins(), connector)?;
/// let rows = db.query("SELECT 1 FROM DUAL").await?;
/// let schema = db.query_table_schema(TablePath::parse("APP.ORDERS")).await?;
/// db.close()?;
/// ```
pub struct ThreadedDatabase {
    dialect: Arc<dyn Dialect>,
    default_schema: String,
    thread_count: usize,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadedDatabase {
    /// Validate `config`, resolve its dialect and start the workers.
    ///
    /// Connections are opened lazily, by each worker on its first job.
    pub fn new(
        config: ConnectionConfig,
        catalog: &DialectCatalog,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        config.validate_with(catalog)?;
        let dialect = catalog.require(&config.r#type)?;
        let default_schema = config.default_schema(dialect.as_ref());
        let thread_count = config.thread_count;

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(thread_count);
        for id in 0..thread_count {
            let receiver = Arc::clone(&receiver);
            let dialect = Arc::clone(&dialect);
            let config = config.clone();
            let connector = Arc::clone(&connector);

            let handle = std::thread::Builder::new()
                .name(format!("xdiff-{}-{}", dialect.name(), id))
                .spawn(move || {
                    // Sessions are created on, and never leave, their thread.
                    let mut worker = Worker {
                        session: Session::new(Arc::clone(&dialect), config.clone()),
                        dialect,
                        config,
                        connector,
                    };
                    loop {
                        // The lock is released before the job runs.
                        let job = match receiver.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        match job {
                            Ok(job) => job(&mut worker),
                            Err(_) => break,
                        }
                    }
                    worker.session.close();
                    debug!("Worker {} stopped", id);
                })?;
            workers.push(handle);
        }

        info!(
            "Started {} worker(s) for {} {}/{}",
            thread_count,
            dialect.name(),
            config.host,
            config.database
        );

        Ok(Self {
            dialect,
            default_schema,
            thread_count,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// The shared dialect of this database.
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Schema used for one-component table paths.
    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().map(|s| s.is_none()).unwrap_or(true)
    }

    /// Queue `f` for the next free worker.
    fn submit<T, F>(&self, f: F) -> Result<oneshot::Receiver<Result<T>>>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |worker: &mut Worker| {
            let result = worker.session().and_then(f);
            // The caller may have stopped waiting.
            let _ = tx.send(result);
        });

        let sender = self.sender.lock().map_err(|_| DiffError::Closed)?;
        sender
            .as_ref()
            .ok_or(DiffError::Closed)?
            .send(job)
            .map_err(|_| DiffError::Closed)?;
        Ok(rx)
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
    {
        self.submit(f)?.await.map_err(|_| DiffError::Closed)?
    }

    /// Run one statement on a worker.
    pub async fn query(&self, sql: impl Into<String>) -> Result<Rows> {
        let sql = sql.into();
        self.run(move |session| session.execute(&sql)).await
    }

    /// Run one statement on a worker, blocking the calling thread.
    ///
    /// Must not be called from within an async runtime.
    pub fn query_blocking(&self, sql: impl Into<String>) -> Result<Rows> {
        let sql = sql.into();
        self.submit(move |session| session.execute(&sql))?
            .blocking_recv()
            .map_err(|_| DiffError::Closed)?
    }

    /// Raw column metadata of `path`.
    pub async fn introspect_schema(&self, path: TablePath) -> Result<Vec<RawColumnInfo>> {
        self.run(move |session| session.introspect_schema(&path)).await
    }

    /// Column names of `path` with their canonical types.
    pub async fn query_table_schema(&self, path: TablePath) -> Result<Vec<(String, ColumnType)>> {
        self.run(move |session| session.query_table_schema(&path))
            .await
    }

    /// Stop the workers, closing their sessions. Idempotent.
    ///
    /// Queued jobs still run before the workers exit; later calls fail
    /// with `DiffError::Closed`.
    pub fn close(&self) -> Result<()> {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if sender.is_none() {
            return Ok(());
        }
        drop(sender);

        let handles = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                warn!("Worker thread {} panicked", name);
            }
        }
        info!("Closed {} worker pool", self.dialect.name());
        Ok(())
    }
}

impl Drop for ThreadedDatabase {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for ThreadedDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedDatabase")
            .field("dialect", &self.dialect.name())
            .field("default_schema", &self.default_schema)
            .field("thread_count", &self.thread_count)
            .field("closed", &self.is_closed())
            .finish()
    }
}
