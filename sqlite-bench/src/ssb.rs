//! Star Schema Benchmark query timing against a pre-loaded database.
//!
//! The database is expected to already hold the five SSB tables; this module
//! only warms it up and times the thirteen queries.

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// Query names, in execution order. Each is read from `<sql-dir>/<name>.sql`.
pub const QUERIES: [&str; 13] = [
    "q1.1", "q1.2", "q1.3", "q2.1", "q2.2", "q2.3", "q3.1", "q3.2", "q3.3", "q3.4", "q4.1",
    "q4.2", "q4.3",
];

/// Tables scanned once before timing.
pub const TABLES: [&str; 5] = ["lineorder", "part", "supplier", "customer", "date"];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct QueryTiming {
    pub name: String,
    pub elapsed: Duration,
    pub rows: u64,
}

/// Step `sql` to completion, returning the number of result rows.
///
/// `sql` must hold a single statement; a trailing semicolon is allowed.
fn drain(conn: &Connection, sql: &str) -> Result<u64> {
    let sql = sql.trim().trim_end_matches(';');
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Gather statistics and pull every table through the page cache.
pub fn prepare(conn: &Connection) -> Result<()> {
    let start = Instant::now();
    conn.execute_batch("ANALYZE").context("analyzing SSB tables")?;
    for table in TABLES {
        let rows = drain(conn, &format!("SELECT * FROM \"{table}\""))
            .with_context(|| format!("scanning table {table}"))?;
        debug!("scanned {table}: {rows} rows");
    }
    info!("SSB database prepared in {:.2?}", start.elapsed());
    Ok(())
}

/// Run `sql` to completion and time it.
pub fn time_query(conn: &Connection, name: &str, sql: &str) -> Result<QueryTiming> {
    let start = Instant::now();
    let rows = drain(conn, sql).with_context(|| format!("executing query {name}"))?;
    let elapsed = start.elapsed();
    debug!("{name}: {rows} rows in {elapsed:.2?}");
    Ok(QueryTiming {
        name: name.to_string(),
        elapsed,
        rows,
    })
}

/// Read and time every query in [`QUERIES`] from `sql_dir`.
///
/// All query files are read before the first one runs, so a missing file
/// fails fast.
pub fn run_queries(conn: &Connection, sql_dir: &Path) -> Result<Vec<QueryTiming>> {
    let sources = QUERIES
        .iter()
        .map(|name| {
            let path = sql_dir.join(format!("{name}.sql"));
            fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))
                .map(|sql| (*name, sql))
        })
        .collect::<Result<Vec<_>>>()?;

    sources
        .iter()
        .map(|(name, sql)| time_query(conn, name, sql))
        .collect()
}
