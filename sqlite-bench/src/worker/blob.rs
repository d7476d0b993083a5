use crate::schema::blob::{SELECT_BLOB, UPDATE_BLOB};
use anyhow::{Context, Result};
use dbbench_core::blob::{BlobGenerator, BlobMix, BlobRequest};
use dbbench_core::{Outcome, Worker};
use rusqlite::{params, Connection};

/// Reads or overwrites the single blob row, per the configured mix.
pub struct BlobWorker {
    conn: Connection,
    requests: BlobGenerator,
    payload: Vec<u8>,
}

impl BlobWorker {
    pub fn new(conn: Connection, mix: &BlobMix, mut requests: BlobGenerator) -> Self {
        let payload = requests.payload(mix.payload_size);
        Self {
            conn,
            requests,
            payload,
        }
    }

    pub fn execute(&mut self, request: BlobRequest) -> Result<Outcome> {
        match request {
            BlobRequest::Read => {
                let mut stmt = self.conn.prepare_cached(SELECT_BLOB)?;
                let mut rows = stmt.query([])?;
                let mut found = false;
                while let Some(row) = rows.next()? {
                    row.get_ref(0)?.as_blob()?;
                    found = true;
                }
                Ok(Outcome::hit_or_miss(found))
            }
            BlobRequest::Write => {
                let changed = self
                    .conn
                    .prepare_cached(UPDATE_BLOB)?
                    .execute(params![&self.payload[..]])?;
                Ok(Outcome::hit_or_miss(changed > 0))
            }
        }
    }
}

impl Worker for BlobWorker {
    fn step(&mut self) -> Result<Outcome> {
        let request = self.requests.next_request();
        self.execute(request)
            .with_context(|| format!("blob {request:?}"))
    }
}
