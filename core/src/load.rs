//! Streaming the record generator into a backing store in batches.

use crate::tatp::Record;
use anyhow::{Context, Result, ensure};
use log::debug;
use serde::Serialize;

/// Something that makes batches of records durable.
///
/// Batches arrive in generator order, so parents always precede children.
pub trait Loader {
    fn load_batch(&mut self, batch: &[Record]) -> Result<()>;
}

/// Row counts written by [`load_records`].
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub subscribers: u64,
    pub access_infos: u64,
    pub special_facilities: u64,
    pub call_forwardings: u64,
    pub batches: u64,
}

impl LoadStats {
    fn count(&mut self, record: &Record) {
        match record {
            Record::Subscriber(_) => self.subscribers += 1,
            Record::AccessInfo(_) => self.access_infos += 1,
            Record::SpecialFacility(_) => self.special_facilities += 1,
            Record::CallForwarding(_) => self.call_forwardings += 1,
        }
    }

    pub fn rows(&self) -> u64 {
        self.subscribers + self.access_infos + self.special_facilities + self.call_forwardings
    }
}

/// Feeds `records` to `loader` in batches of at most `batch_size`.
pub fn load_records<I, L>(records: I, loader: &mut L, batch_size: usize) -> Result<LoadStats>
where
    I: IntoIterator<Item = Record>,
    L: Loader + ?Sized,
{
    ensure!(batch_size > 0, "batch size must be positive");

    let mut stats = LoadStats::default();
    let mut batch = Vec::with_capacity(batch_size);
    for record in records {
        stats.count(&record);
        batch.push(record);
        if batch.len() == batch_size {
            flush(loader, &mut batch, &mut stats)?;
        }
    }
    if !batch.is_empty() {
        flush(loader, &mut batch, &mut stats)?;
    }
    Ok(stats)
}

fn flush<L: Loader + ?Sized>(
    loader: &mut L,
    batch: &mut Vec<Record>,
    stats: &mut LoadStats,
) -> Result<()> {
    loader
        .load_batch(batch)
        .with_context(|| format!("loading batch {} ({} records)", stats.batches + 1, batch.len()))?;
    stats.batches += 1;
    debug!("loaded batch {} ({} rows so far)", stats.batches, stats.rows());
    batch.clear();
    Ok(())
}
