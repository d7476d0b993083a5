//! Closed-loop measurement runner.
//!
//! Every worker gets its own thread and calls its operation back to back for
//! the warmup period (results discarded) and then the measurement period
//! (completions counted). The only state shared between threads is the pair
//! of one-shot [`Signal`]s that arm measurement and stop the run.
//!
//! A worker's in-flight operation always runs to completion, so the run can
//! overshoot the nominal measurement duration by up to one operation per
//! worker. Throughput still divides by the nominal duration; the actual
//! elapsed time is reported alongside it.

use crate::outcome::Outcome;
use crate::signal::Signal;
use anyhow::{Context, Result, anyhow, ensure};
use log::{debug, error, info};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

/// One simulated client: a blocking operation invoked in a tight loop.
///
/// Implementations own all of their state (connection, statements, request
/// generator). `Err` means an unexpected failure and aborts the run.
pub trait Worker: Send {
    fn step(&mut self) -> Result<Outcome>;
}

impl<F> Worker for F
where
    F: FnMut() -> Result<Outcome> + Send,
{
    fn step(&mut self) -> Result<Outcome> {
        self()
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub warmup: Duration,
    pub measure: Duration,
}

impl RunConfig {
    pub fn from_secs(warmup: u64, measure: u64) -> Self {
        Self {
            warmup: Duration::from_secs(warmup),
            measure: Duration::from_secs(measure),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.measure.is_zero(), "measurement duration must be positive");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    Measurement,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => write!(f, "warmup"),
            Phase::Measurement => write!(f, "measurement"),
        }
    }
}

/// Measured-phase completions of one worker.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerTally {
    /// All completed operations, whatever their outcome.
    pub completed: u64,
    pub missing: u64,
    pub conflicts: u64,
}

impl WorkerTally {
    fn record(&mut self, outcome: Outcome) {
        self.completed += 1;
        match outcome {
            Outcome::Success => {}
            Outcome::Missing => self.missing += 1,
            Outcome::Conflict => self.conflicts += 1,
        }
    }

    pub fn successes(&self) -> u64 {
        self.completed - self.missing - self.conflicts
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Nominal measurement duration; the throughput denominator.
    pub measure: Duration,
    /// Wall time from arming measurement until the last worker stopped.
    pub elapsed: Duration,
    pub workers: Vec<WorkerTally>,
}

impl RunReport {
    pub fn completed(&self) -> u64 {
        self.workers.iter().map(|w| w.completed).sum()
    }

    pub fn missing(&self) -> u64 {
        self.workers.iter().map(|w| w.missing).sum()
    }

    pub fn conflicts(&self) -> u64 {
        self.workers.iter().map(|w| w.conflicts).sum()
    }

    /// Completed operations per second of nominal measurement time.
    pub fn throughput(&self) -> f64 {
        self.completed() as f64 / self.measure.as_secs_f64()
    }
}

/// Drives every worker on its own thread through warmup and measurement.
///
/// Returns the first (lowest-index) worker failure if any worker's operation
/// fails; the remaining workers are stopped after their current operation.
pub fn run<W: Worker>(workers: Vec<W>, config: &RunConfig) -> Result<RunReport> {
    ensure!(!workers.is_empty(), "no workers to run");
    config.validate()?;

    let measuring = Signal::new();
    let stop = Signal::new();
    let mut armed_at = None;

    let results = thread::scope(|s| -> Result<Vec<Result<WorkerTally>>> {
        let mut handles = Vec::with_capacity(workers.len());
        for (idx, mut worker) in workers.into_iter().enumerate() {
            let (measuring, stop) = (&measuring, &stop);
            let spawned = thread::Builder::new()
                .name(format!("worker-{idx}"))
                .spawn_scoped(s, move || drive(idx, &mut worker, measuring, stop));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop.fire();
                    return Err(e).with_context(|| format!("spawning worker {idx}"));
                }
            }
        }

        info!("warming up {} workers for {:?}", handles.len(), config.warmup);
        if !stop.wait_timeout(config.warmup) {
            armed_at = Some(Instant::now());
            measuring.fire();
            info!("measuring for {:?}", config.measure);
            stop.wait_timeout(config.measure);
        }
        stop.fire();
        info!("stopping workers");

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(idx, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow!("worker {idx} panicked")))
            })
            .collect())
    })?;
    let elapsed = armed_at.map(|t| t.elapsed()).unwrap_or_default();

    let mut tallies = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(tally) => tallies.push(tally),
            Err(e) => {
                error!("{e:#}");
                return Err(e);
            }
        }
    }

    for (idx, tally) in tallies.iter().enumerate() {
        debug!(
            "worker {idx}: {} completed ({} missing, {} conflicts)",
            tally.completed, tally.missing, tally.conflicts
        );
    }

    Ok(RunReport {
        measure: config.measure,
        elapsed,
        workers: tallies,
    })
}

fn drive<W: Worker + ?Sized>(
    idx: usize,
    worker: &mut W,
    measuring: &Signal,
    stop: &Signal,
) -> Result<WorkerTally> {
    let mut tally = WorkerTally::default();
    while !stop.is_set() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| worker.step()))
            .unwrap_or_else(|payload| Err(anyhow!("panicked: {}", panic_message(&*payload))));
        // Sampled after the step so an operation that straddles the warmup
        // boundary is attributed to measurement.
        let phase = if measuring.is_set() {
            Phase::Measurement
        } else {
            Phase::Warmup
        };
        match result {
            Ok(outcome) => {
                if phase == Phase::Measurement {
                    tally.record(outcome);
                }
            }
            Err(e) => {
                stop.fire();
                return Err(e.context(format!("worker {idx} failed during {phase}")));
            }
        }
    }
    Ok(tally)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn instant() -> impl FnMut() -> Result<Outcome> + Send {
        || -> Result<Outcome> { Ok(Outcome::Success) }
    }

    #[test]
    fn empty_worker_set_is_rejected() {
        let workers: Vec<fn() -> Result<Outcome>> = Vec::new();
        assert!(run(workers, &RunConfig::from_secs(0, 1)).is_err());
    }

    #[test]
    fn zero_measurement_is_rejected() {
        assert!(run(vec![instant()], &RunConfig::from_secs(0, 0)).is_err());
    }

    #[test]
    fn sleeping_worker_reaches_expected_rate() {
        let worker = || -> Result<Outcome> {
            thread::sleep(Duration::from_millis(10));
            Ok(Outcome::Success)
        };
        let report = run(vec![worker], &RunConfig::from_secs(0, 1)).unwrap();
        let throughput = report.throughput();
        assert!(
            (90.0..=110.0).contains(&throughput),
            "throughput {throughput}"
        );
        assert_eq!(report.workers.len(), 1);
        assert!(report.elapsed >= report.measure);
    }

    #[test]
    fn sleeping_workers_run_in_parallel() {
        let sleeper = || {
            || -> Result<Outcome> {
                thread::sleep(Duration::from_millis(5));
                Ok(Outcome::Success)
            }
        };
        let config = RunConfig {
            warmup: Duration::ZERO,
            measure: Duration::from_millis(500),
        };
        let one = run(vec![sleeper()], &config).unwrap().throughput();
        let four = run((0..4).map(|_| sleeper()).collect(), &config).unwrap().throughput();
        assert!(four > one * 3.0, "1 worker: {one}, 4 workers: {four}");
    }

    #[test]
    fn warmup_completions_are_not_counted() {
        let config = RunConfig {
            warmup: Duration::from_millis(300),
            measure: Duration::from_millis(100),
        };
        let worker = || -> Result<Outcome> {
            thread::sleep(Duration::from_millis(10));
            Ok(Outcome::Success)
        };
        let report = run(vec![worker], &config).unwrap();
        // ~10 completions fit the measurement window, ~40 fit both phases.
        assert!(report.completed() <= 15, "counted {}", report.completed());
    }

    #[test]
    fn expected_outcomes_count_as_completed() {
        let mut n = 0u64;
        let worker = move || -> Result<Outcome> {
            n += 1;
            thread::sleep(Duration::from_millis(1));
            Ok(match n % 3 {
                0 => Outcome::Success,
                1 => Outcome::Missing,
                _ => Outcome::Conflict,
            })
        };
        let config = RunConfig {
            warmup: Duration::ZERO,
            measure: Duration::from_millis(200),
        };
        let report = run(vec![worker], &config).unwrap();
        let tally = report.workers[0];
        assert!(tally.missing > 0 && tally.conflicts > 0 && tally.successes() > 0);
        assert_eq!(
            tally.completed,
            tally.successes() + tally.missing + tally.conflicts
        );
    }

    #[test]
    fn failure_names_worker_and_phase() {
        let healthy = || -> Result<Outcome> {
            thread::sleep(Duration::from_millis(1));
            Ok(Outcome::Success)
        };
        let failing = || -> Result<Outcome> { bail!("connection reset") };
        let workers: Vec<Box<dyn FnMut() -> Result<Outcome> + Send>> =
            vec![Box::new(healthy), Box::new(failing)];

        let start = Instant::now();
        let err = run(workers, &RunConfig::from_secs(5, 5)).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("worker 1 failed during warmup"), "{message}");
        assert!(message.contains("connection reset"), "{message}");
        // The failure stops the run instead of waiting out both phases.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn panicking_worker_stops_the_run() {
        let healthy = || -> Result<Outcome> {
            thread::sleep(Duration::from_millis(1));
            Ok(Outcome::Success)
        };
        let panicking = || -> Result<Outcome> { panic!("driver bug") };
        let workers: Vec<Box<dyn FnMut() -> Result<Outcome> + Send>> =
            vec![Box::new(healthy), Box::new(panicking)];

        let start = Instant::now();
        let err = run(workers, &RunConfig::from_secs(2, 2)).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(1), "took {:?}", start.elapsed());
        let message = format!("{err:#}");
        assert!(message.contains("worker 1 failed during warmup"), "{message}");
        assert!(message.contains("driver bug"), "{message}");
    }

    #[test]
    fn failure_straddling_warmup_boundary_is_attributed_to_measurement() {
        let worker = || -> Result<Outcome> {
            thread::sleep(Duration::from_millis(200));
            bail!("lock timeout")
        };
        let config = RunConfig {
            warmup: Duration::from_millis(50),
            measure: Duration::from_secs(5),
        };
        let err = run(vec![worker], &config).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("worker 0 failed during measurement"), "{message}");
    }

    #[test]
    fn failure_during_measurement_is_reported_as_such() {
        let mut calls = 0u32;
        let worker = move || -> Result<Outcome> {
            calls += 1;
            thread::sleep(Duration::from_millis(5));
            if calls > 30 {
                bail!("disk I/O error");
            }
            Ok(Outcome::Success)
        };
        let config = RunConfig {
            warmup: Duration::from_millis(50),
            measure: Duration::from_secs(5),
        };
        let err = run(vec![worker], &config).unwrap_err();
        assert!(format!("{err:#}").contains("worker 0 failed during measurement"));
    }
}
