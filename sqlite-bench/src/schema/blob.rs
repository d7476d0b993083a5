//! Single-row blob table `t(a BLOB)`.

use anyhow::Result;
use rusqlite::{params, Connection};

pub const SELECT_BLOB: &str = "SELECT a FROM t";
pub const UPDATE_BLOB: &str = "UPDATE t SET a = ?1";

/// (Re)create `t` holding one blob of `payload`.
pub fn create_and_load(conn: &Connection, payload: &[u8]) -> Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS t;
         CREATE TABLE t (a BLOB);",
    )?;
    conn.execute("INSERT INTO t VALUES (?1)", params![payload])?;
    Ok(())
}
