//! Connection setup and table definitions.
//!
//! - [`tatp`]: the four TATP tables and the transaction statements
//! - [`blob`]: the single-row blob table

pub mod blob;
pub mod tatp;

use anyhow::{Context, Result};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::time::Duration;

/// SQLite journal modes accepted on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_sql(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// Per-connection settings applied right after opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub journal_mode: JournalMode,
    /// `PRAGMA cache_size`; negative values are KiB, positive values pages.
    pub cache_size: i64,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Delete,
            cache_size: -1_000_000,
            busy_timeout: Duration::from_secs(30),
            foreign_keys: false,
        }
    }
}

/// Open a database file and apply `options`.
pub fn open(path: &Path, options: &ConnectionOptions) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("opening SQLite database {}", path.display()))?;
    configure_connection(&conn, options)?;
    Ok(conn)
}

/// Apply journal mode, cache size, busy timeout and foreign key enforcement.
pub fn configure_connection(conn: &Connection, options: &ConnectionOptions) -> Result<()> {
    conn.busy_timeout(options.busy_timeout)?;
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = {};
         PRAGMA cache_size = {};
         PRAGMA foreign_keys = {};",
        options.journal_mode.as_sql(),
        options.cache_size,
        if options.foreign_keys { "ON" } else { "OFF" },
    ))
    .context("configuring connection")?;
    Ok(())
}

/// Whether `err` is SQLite rejecting a write on a UNIQUE, PRIMARY KEY or
/// FOREIGN KEY constraint.
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Database keys are `u64` in the workload and `INTEGER` (i64) in SQLite.
pub(crate) fn sql_key(s_id: u64) -> Result<i64> {
    i64::try_from(s_id).with_context(|| format!("s_id {s_id} does not fit an SQLite INTEGER"))
}
