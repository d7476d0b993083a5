//! Data population: streams the TATP record generator into SQLite and loads
//! the blob table.

use crate::schema::{self, sql_key};
use anyhow::{ensure, Context, Result};
use dbbench_core::blob::random_payload;
use dbbench_core::load::{load_records, LoadStats, Loader};
use dbbench_core::tatp::{Record, RecordGenerator};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::time::Instant;

/// Writes TATP records through cached prepared statements.
///
/// Does not open a transaction itself; [`load_tatp`] wraps the whole load in
/// one.
pub struct SqliteLoader<'c> {
    conn: &'c Connection,
    insert_subscriber: String,
}

impl<'c> SqliteLoader<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            insert_subscriber: schema::tatp::insert_subscriber_sql(),
        }
    }

    fn insert(&self, record: &Record) -> Result<()> {
        match record {
            Record::Subscriber(r) => {
                let mut values: Vec<Value> = Vec::with_capacity(schema::tatp::SUBSCRIBER_COLUMNS);
                values.push(Value::Integer(sql_key(r.s_id)?));
                values.push(Value::Text(r.sub_nbr.clone()));
                values.extend(r.bit.iter().map(|&b| Value::Integer(b as i64)));
                values.extend(r.hex.iter().map(|&h| Value::Integer(h as i64)));
                values.extend(r.byte2.iter().map(|&b| Value::Integer(b as i64)));
                values.push(Value::Integer(r.msc_location as i64));
                values.push(Value::Integer(r.vlr_location as i64));
                self.conn
                    .prepare_cached(&self.insert_subscriber)?
                    .execute(params_from_iter(values))?;
            }
            Record::AccessInfo(r) => {
                self.conn
                    .prepare_cached(schema::tatp::INSERT_ACCESS_INFO)?
                    .execute(params![
                        sql_key(r.s_id)?,
                        r.ai_type,
                        r.data1,
                        r.data2,
                        r.data3,
                        r.data4
                    ])?;
            }
            Record::SpecialFacility(r) => {
                self.conn
                    .prepare_cached(schema::tatp::INSERT_SPECIAL_FACILITY)?
                    .execute(params![
                        sql_key(r.s_id)?,
                        r.sf_type,
                        r.is_active,
                        r.error_cntrl,
                        r.data_a,
                        r.data_b
                    ])?;
            }
            Record::CallForwarding(r) => {
                self.conn
                    .prepare_cached(schema::tatp::INSERT_CALL_FORWARDING)?
                    .execute(params![
                        sql_key(r.s_id)?,
                        r.sf_type,
                        r.start_time,
                        r.end_time,
                        r.numberx
                    ])?;
            }
        }
        Ok(())
    }
}

impl Loader for SqliteLoader<'_> {
    fn load_batch(&mut self, batch: &[Record]) -> Result<()> {
        for record in batch {
            self.insert(record).with_context(|| {
                format!("inserting {} row for s_id {}", record.table(), record.s_id())
            })?;
        }
        Ok(())
    }
}

/// Recreate the TATP tables and load `subscribers` subscribers in a single
/// transaction.
pub fn load_tatp(conn: &mut Connection, subscribers: u64, batch_size: usize) -> Result<LoadStats> {
    let start = Instant::now();
    schema::tatp::create_tables(conn).context("creating TATP tables")?;

    let tx = conn.transaction()?;
    let stats = {
        let mut loader = SqliteLoader::new(&tx);
        load_records(RecordGenerator::new(subscribers), &mut loader, batch_size)?
    };
    tx.commit().context("committing TATP load")?;

    info!(
        "loaded {} subscribers ({} rows) in {:.2?}",
        stats.subscribers,
        stats.rows(),
        start.elapsed()
    );
    Ok(stats)
}

/// Recreate the blob table with one random payload of `payload_size` bytes.
pub fn load_blob(conn: &Connection, payload_size: usize) -> Result<()> {
    ensure!(payload_size > 0, "blob payload size must be positive");
    let payload = random_payload(payload_size);
    schema::blob::create_and_load(conn, &payload).context("loading blob table")?;
    info!("loaded blob of {payload_size} bytes");
    Ok(())
}
