//! Process-wide native driver bridge.
//!
//! Bridged engines reach the database through a vendor driver loaded into
//! a shared runtime (the ODBC driver manager when the `odbc` feature is
//! enabled). The runtime is started at most once per process, every driver
//! artifact is registered at most once, and once [`BridgeRuntime::shutdown`]
//! has run the runtime is never started again.
//!
//! Every connection opened through the runtime holds a [`BridgeLease`].
//! Shutdown refuses new leases and releases the driver manager as soon as
//! the last lease is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! let bridge = BridgeRuntime::global();
//! let _shutdown = bridge.shutdown_guard(); // tears the runtime down on exit
//!
//! // Loads the artifacts (a second call is a no-op) and picks the
//! // `Driver=` attribute for the connection string.
//! let driver = bridge.resolve_driver(&bridge_config)?;
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::{DiffError, Result};

static GLOBAL: OnceCell<BridgeRuntime> = OnceCell::new();

/// Lifecycle of the bridge runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Nothing started yet; artifacts may still be registered.
    Idle,
    /// The runtime is up and hands out connections.
    Running,
    /// Torn down; starting again is an error.
    ShutDown,
}

#[derive(Debug)]
struct Inner {
    state: BridgeState,
    artifacts: BTreeSet<PathBuf>,
    leases: usize,
    #[cfg(feature = "odbc")]
    env: Option<EnvHandle>,
}

impl Inner {
    fn start(&mut self) -> Result<()> {
        match self.state {
            BridgeState::Running => Ok(()),
            BridgeState::ShutDown => Err(DiffError::Bridge(
                "bridge runtime has been shut down and cannot be restarted".into(),
            )),
            BridgeState::Idle => {
                #[cfg(feature = "odbc")]
                {
                    let env = odbc_api::Environment::new().map_err(|e| {
                        DiffError::Bridge(format!(
                            "failed to create ODBC environment: {}. \
                             Make sure an ODBC driver manager is installed",
                            e
                        ))
                    })?;
                    self.env = Some(EnvHandle::new(env));
                }
                self.state = BridgeState::Running;
                info!(
                    "Bridge runtime started ({} driver artifact(s))",
                    self.artifacts.len()
                );
                Ok(())
            }
        }
    }

    /// Drop the driver manager once nothing can use it any more.
    fn release_if_idle(&mut self) {
        if self.state != BridgeState::ShutDown || self.leases > 0 {
            return;
        }
        #[cfg(feature = "odbc")]
        if self.env.take().is_some() {
            info!("Released ODBC environment");
        }
    }
}

/// Owned ODBC environment with a stable address.
///
/// Connections borrow the environment for `'static`; [`BridgeLease`]
/// accounting guarantees every such borrow ends before the handle drops.
#[cfg(feature = "odbc")]
#[derive(Debug)]
struct EnvHandle(std::ptr::NonNull<odbc_api::Environment>);

// SAFETY: the handle uniquely owns the boxed environment, and
// `odbc_api::Environment` is itself `Send + Sync`.
#[cfg(feature = "odbc")]
unsafe impl Send for EnvHandle {}
#[cfg(feature = "odbc")]
unsafe impl Sync for EnvHandle {}

#[cfg(feature = "odbc")]
impl EnvHandle {
    fn new(env: odbc_api::Environment) -> Self {
        Self(std::ptr::NonNull::from(Box::leak(Box::new(env))))
    }

    /// # Safety
    ///
    /// The returned reference must not be used after the lease it was
    /// obtained under has been dropped.
    unsafe fn get(&self) -> &'static odbc_api::Environment {
        self.0.as_ref()
    }
}

#[cfg(feature = "odbc")]
impl Drop for EnvHandle {
    fn drop(&mut self) {
        // SAFETY: the pointer came from `Box::leak` in `new` and no lease
        // (hence no borrowed connection) is outstanding when the runtime
        // lets go of the handle.
        unsafe { drop(Box::from_raw(self.0.as_ptr())) }
    }
}

/// Shared runtime for native drivers.
///
/// Use [`BridgeRuntime::global`] in production code; separate instances
/// exist only so the lifecycle can be exercised in isolation.
pub struct BridgeRuntime {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for BridgeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeRuntime")
            .field("inner", &self.inner)
            .finish()
    }
}

impl Default for BridgeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeRuntime {
    /// Create a stand-alone runtime in the `Idle` state.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BridgeState::Idle,
                artifacts: BTreeSet::new(),
                leases: 0,
                #[cfg(feature = "odbc")]
                env: None,
            }),
        }
    }

    /// The process-wide runtime.
    pub fn global() -> &'static BridgeRuntime {
        GLOBAL.get_or_init(BridgeRuntime::new)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| DiffError::Bridge(format!("bridge state lock poisoned: {}", e)))
    }

    fn lock_unpoisoned(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Result<BridgeState> {
        Ok(self.lock()?.state)
    }

    /// Register driver artifacts with the runtime.
    ///
    /// Each path must name an existing file. Paths are compared after
    /// canonicalization, so loading an artifact that is already registered
    /// is a no-op. Returns the number of newly registered artifacts.
    pub fn load_artifacts<P: AsRef<Path>>(&self, paths: &[P]) -> Result<usize> {
        let resolved = paths
            .iter()
            .map(|p| resolve_artifact(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut inner = self.lock()?;
        if inner.state == BridgeState::ShutDown {
            return Err(DiffError::Bridge(
                "cannot load driver artifacts: bridge runtime has been shut down".into(),
            ));
        }

        let mut added = 0;
        for path in resolved {
            if inner.artifacts.insert(path.clone()) {
                info!("Loaded driver artifact {}", path.display());
                added += 1;
            } else {
                debug!("Driver artifact {} already loaded", path.display());
            }
        }
        Ok(added)
    }

    /// Whether `path` has been registered.
    pub fn is_loaded(&self, path: &Path) -> bool {
        let Ok(resolved) = std::fs::canonicalize(path) else {
            return false;
        };
        self.lock()
            .map(|inner| inner.artifacts.contains(&resolved))
            .unwrap_or(false)
    }

    /// All registered artifacts, sorted.
    pub fn loaded_artifacts(&self) -> Result<Vec<PathBuf>> {
        Ok(self.lock()?.artifacts.iter().cloned().collect())
    }

    /// Load the artifacts of `config` and choose the driver the connection
    /// string names.
    ///
    /// A driver the driver manager already knows by `config.driver` is used
    /// by name. Otherwise the driver manager is pointed at the first
    /// configured artifact, which must be the driver library itself.
    pub fn resolve_driver(&self, config: &BridgeConfig) -> Result<String> {
        self.load_artifacts(&config.artifacts)?;

        #[cfg(feature = "odbc")]
        if self.is_registered_driver(&config.driver)? {
            debug!("Using registered ODBC driver '{}'", config.driver);
            return Ok(config.driver.clone());
        }

        let primary = config.primary_artifact().ok_or_else(|| {
            DiffError::Bridge(format!(
                "driver '{}' is not registered and no driver artifact is configured",
                config.driver
            ))
        })?;
        let library = resolve_artifact(primary)?;
        debug!(
            "Driver '{}' resolved to library {}",
            config.driver,
            library.display()
        );
        Ok(library.display().to_string())
    }

    #[cfg(feature = "odbc")]
    fn is_registered_driver(&self, name: &str) -> Result<bool> {
        let lease = self.acquire()?;
        // SAFETY: the borrow ends before `lease` is dropped.
        let env = unsafe { lease.environment()? };
        let drivers = env
            .drivers()
            .map_err(|e| DiffError::Bridge(format!("failed to list ODBC drivers: {}", e)))?;
        Ok(drivers
            .iter()
            .any(|d| d.description.eq_ignore_ascii_case(name)))
    }

    /// Start the runtime if it is not running yet.
    ///
    /// # Errors
    ///
    /// `DiffError::Bridge` after [`shutdown`](Self::shutdown), or if the
    /// driver manager cannot be initialized.
    pub fn ensure_started(&self) -> Result<()> {
        self.lock()?.start()
    }

    /// Take a lease on the running runtime, starting it if needed.
    ///
    /// The runtime stays alive, even across [`shutdown`](Self::shutdown),
    /// until every lease has been dropped.
    pub fn acquire(&self) -> Result<BridgeLease<'_>> {
        let mut inner = self.lock()?;
        inner.start()?;
        inner.leases += 1;
        Ok(BridgeLease { runtime: self })
    }

    /// Number of leases currently held.
    pub fn open_leases(&self) -> Result<usize> {
        Ok(self.lock()?.leases)
    }

    /// Open a driver-manager connection held under its own lease.
    #[cfg(feature = "odbc")]
    pub fn connect(&self, connection_string: &str) -> Result<BridgeConnection<'_>> {
        let lease = self.acquire()?;
        // SAFETY: the connection is stored next to `lease` in
        // `BridgeConnection`, which drops the connection first.
        let env = unsafe { lease.environment()? };
        let conn = env
            .connect_with_connection_string(
                connection_string,
                odbc_api::ConnectionOptions::default(),
            )
            .map_err(|e| DiffError::connect(format!("ODBC connection failed: {}", e)))?;
        Ok(BridgeConnection {
            conn: Some(conn),
            _lease: lease,
        })
    }

    /// Tear the runtime down. Idempotent.
    ///
    /// No new connections are handed out afterwards. The driver manager
    /// is released at once, or when the last open connection closes.
    pub fn shutdown(&self) {
        let mut inner = self.lock_unpoisoned();
        if inner.state == BridgeState::ShutDown {
            return;
        }
        inner.state = BridgeState::ShutDown;
        inner.artifacts.clear();
        if inner.leases > 0 {
            info!(
                "Bridge runtime shut down; {} connection(s) still open",
                inner.leases
            );
        } else {
            info!("Bridge runtime shut down");
        }
        inner.release_if_idle();
    }

    /// A guard that calls [`shutdown`](Self::shutdown) when dropped.
    ///
    /// Hold it for the lifetime of `main` so the runtime is torn down on
    /// exit, including on early returns.
    pub fn shutdown_guard(&self) -> ShutdownGuard<'_> {
        ShutdownGuard { runtime: self }
    }
}

/// Keeps the runtime (and its driver manager) alive while held.
#[derive(Debug)]
pub struct BridgeLease<'a> {
    runtime: &'a BridgeRuntime,
}

impl BridgeLease<'_> {
    /// # Safety
    ///
    /// The reference must not be used after this lease is dropped.
    #[cfg(feature = "odbc")]
    unsafe fn environment(&self) -> Result<&'static odbc_api::Environment> {
        let inner = self.runtime.lock()?;
        let handle = inner
            .env
            .as_ref()
            .ok_or_else(|| DiffError::Bridge("ODBC environment is not initialized".into()))?;
        Ok(handle.get())
    }
}

impl Drop for BridgeLease<'_> {
    fn drop(&mut self) {
        let mut inner = self.runtime.lock_unpoisoned();
        inner.leases = inner.leases.saturating_sub(1);
        inner.release_if_idle();
    }
}

/// A driver-manager connection together with the lease that keeps its
/// environment alive.
#[cfg(feature = "odbc")]
pub struct BridgeConnection<'a> {
    // Declared before the lease so it is dropped first.
    conn: Option<odbc_api::Connection<'static>>,
    _lease: BridgeLease<'a>,
}

#[cfg(feature = "odbc")]
impl BridgeConnection<'_> {
    /// The open connection, or `None` after [`close`](Self::close).
    pub fn connection(&self) -> Option<&odbc_api::Connection<'static>> {
        self.conn.as_ref()
    }

    /// Disconnect. The lease is returned when this value is dropped.
    pub fn close(&mut self) {
        self.conn.take();
    }
}

/// Shuts the runtime down when dropped.
#[must_use = "the runtime is shut down as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ShutdownGuard<'a> {
    runtime: &'a BridgeRuntime,
}

impl Drop for ShutdownGuard<'_> {
    fn drop(&mut self) {
        self.runtime.shutdown();
    }
}

fn resolve_artifact(path: &Path) -> Result<PathBuf> {
    let resolved = std::fs::canonicalize(path).map_err(|e| {
        DiffError::Bridge(format!("driver artifact {} not found: {}", path.display(), e))
    })?;
    if !resolved.is_file() {
        return Err(DiffError::Bridge(format!(
            "driver artifact {} is not a file",
            path.display()
        )));
    }
    Ok(resolved)
}
