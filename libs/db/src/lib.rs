//! SQLite database handle for the users workspace.
//!
//! Wraps a sqlx SQLite pool together with a SeaORM `DatabaseConnection` built
//! on top of it. The handle is constructed explicitly at process start with
//! [`DbHandle::connect`], passed to whoever needs it, and closed explicitly
//! with [`DbHandle::close`] at shutdown.
//!
//! DSN query parameters are split into two groups: a strict whitelist of
//! SQLite PRAGMA knobs (`wal`, `journal_mode`, `synchronous`, `busy_timeout`)
//! applied on every new connection, and everything else, which is passed to
//! sqlx untouched.
//!
//! # Example
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> db::Result<()> {
//!     use db::{ConnectOpts, DbHandle};
//!
//!     let db = DbHandle::connect("sqlite://users.db?wal=true", ConnectOpts::default()).await?;
//!     let _conn = db.sea();
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod sqlite;

pub use errors::{is_unique_violation, is_unique_violation_code};
pub use sqlite::absolutize_sqlite_dsn;

use std::str::FromStr;
use std::time::Duration;

use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

/// Typed error for the DB handle and helpers.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unsupported DSN (expected sqlite:...): {0}")]
    UnknownDsn(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pool knobs. SQLite honours all of them except where noted.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    /// Maximum number of connections in the pool. Forced to 1 for in-memory DSNs.
    pub max_conns: Option<u32>,
    /// Minimum number of connections in the pool.
    pub min_conns: Option<u32>,
    /// Timeout to acquire a connection from the pool.
    pub acquire_timeout: Option<Duration>,
    /// Idle timeout before a connection is closed. Ignored for in-memory DSNs.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime for a connection. Ignored for in-memory DSNs.
    pub max_lifetime: Option<Duration>,
    /// Busy timeout used when the DSN does not carry `busy_timeout`.
    pub sqlite_busy_timeout: Option<Duration>,
    /// Create parent directories for file DSNs.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            min_conns: None,
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            max_lifetime: None,
            sqlite_busy_timeout: Some(Duration::from_millis(DEFAULT_SQLITE_BUSY_TIMEOUT_MS)),
            create_sqlite_dirs: true,
        }
    }
}

const DEFAULT_SQLITE_BUSY_TIMEOUT_MS: u64 = 5000;

/// Main handle.
#[derive(Debug)]
pub struct DbHandle {
    pool: SqlitePool,
    dsn: String,
    in_memory: bool,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Connect and build the handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let dsn = dsn.trim();
        if !dsn.starts_with("sqlite:") {
            return Err(DbError::UnknownDsn(dsn.to_string()));
        }

        let in_memory = sqlite::is_memory_dsn(dsn);
        if !in_memory && opts.create_sqlite_dirs {
            sqlite::prepare_sqlite_path(dsn)?;
        }

        let (clean_dsn, pairs) = sqlite::extract_sqlite_pragmas(dsn);
        let pragmas = sqlite::Pragmas::from_pairs(&pairs);

        let mut connect_opts = SqliteConnectOptions::from_str(&clean_dsn)?
            .create_if_missing(true)
            .foreign_keys(true);
        connect_opts = pragmas.apply(connect_opts, in_memory, opts.sqlite_busy_timeout);

        let pool = pool_options(&opts, in_memory)
            .connect_with(connect_opts)
            .await?;
        let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());

        tracing::debug!(dsn = %clean_dsn, in_memory, "sqlite pool connected");

        Ok(Self {
            pool,
            dsn: clean_dsn,
            in_memory,
            sea,
        })
    }

    /// Graceful pool close. Dropping the handle also closes the pool; this waits for it.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!(dsn = %self.dsn, "sqlite pool closed");
    }

    /// DSN with PRAGMA parameters stripped.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    pub fn sqlx_sqlite(&self) -> &SqlitePool {
        &self.pool
    }

    /// SeaORM connection (clone; cheap handle).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }
}

fn pool_options(opts: &ConnectOpts, in_memory: bool) -> SqlitePoolOptions {
    let mut o = SqlitePoolOptions::new();

    // Every in-memory connection is its own database, so keep exactly one alive.
    if in_memory {
        return o
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(opts.acquire_timeout.unwrap_or(Duration::from_secs(30)));
    }

    if let Some(n) = opts.max_conns {
        o = o.max_connections(n);
    }
    if let Some(n) = opts.min_conns {
        o = o.min_connections(n);
    }
    if let Some(t) = opts.acquire_timeout {
        o = o.acquire_timeout(t);
    }
    if let Some(t) = opts.idle_timeout {
        o = o.idle_timeout(t);
    }
    if let Some(t) = opts.max_lifetime {
        o = o.max_lifetime(t);
    }
    o
}
