//! Connection management.
//!
//! - [`backend`]: the [`Backend`]/[`Connector`] seam to engine-native drivers
//! - [`session`]: one connection and its lifecycle ([`Session`])
//! - [`pool`]: fixed-size worker pool, one session per thread
//!   ([`ThreadedDatabase`])
//! - `odbc`: ODBC connector on the shared bridge (feature `odbc`)

pub mod backend;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod pool;
pub mod session;

pub use backend::{Backend, BackendError, Connector, Rows};
#[cfg(feature = "odbc")]
pub use odbc::OdbcConnector;
pub use pool::ThreadedDatabase;
pub use session::{Session, SessionState};
