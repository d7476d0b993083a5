//! Workload engine for transactional and analytical database benchmarks.
//!
//! - [`tatp`]: deterministic TATP population ([`tatp::RecordGenerator`]) and
//!   weighted transaction stream ([`tatp::ProcedureGenerator`])
//! - [`blob`]: single-row blob read/update request stream
//! - [`runner`]: concurrent warmup/measurement runner computing throughput
//! - [`load`]: batching the population into a backing store
//!
//! Nothing here knows about SQL; engine adapters supply the [`runner::Worker`]
//! and [`load::Loader`] implementations.

use anyhow::Context;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::{Encode, pattern::PatternEncoder},
    filter::threshold::ThresholdFilter,
};
use std::{backtrace, env};

pub mod blob;
pub mod load;
pub mod outcome;
pub mod runner;
pub mod signal;
pub mod tatp;

pub use outcome::Outcome;
pub use runner::{RunConfig, RunReport, Worker, WorkerTally, run};

#[derive(Debug)]
struct BacktracePatternEncoder {
    pattern_encoder: PatternEncoder,
    is_backtrace_enabled: bool,
}

impl BacktracePatternEncoder {
    fn new(pattern: &str) -> Self {
        BacktracePatternEncoder {
            pattern_encoder: PatternEncoder::new(pattern),
            is_backtrace_enabled: env::var("RUST_BACKTRACE").is_ok()
                || env::var("RUST_LIB_BACKTRACE").is_ok(),
        }
    }
}

impl Encode for BacktracePatternEncoder {
    fn encode(
        &self,
        w: &mut dyn log4rs::encode::Write,
        record: &log::Record<'_>,
    ) -> anyhow::Result<()> {
        if record.level() == log::Level::Error && self.is_backtrace_enabled {
            let args = format_args!(
                "{}\nBacktrace:\n{}",
                record.args(),
                backtrace::Backtrace::capture()
            );
            let new_record = log::Record::builder()
                .args(args)
                .level(record.level())
                .target(record.target())
                .module_path(record.module_path())
                .file(record.file())
                .line(record.line())
                .build();
            self.pattern_encoder.encode(w, &new_record)?;
        } else {
            self.pattern_encoder.encode(w, record)?;
        }
        Ok(())
    }
}

/// Installs the process-wide logger: stderr at `log_level`, plus everything at
/// `log_level` to `file_path` when given.
pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&str>) -> anyhow::Result<()> {
    const LOGGING_PATTERN: &str = "{d} {l} {f}:{L} - {m}\n";

    // Benchmark output goes to stdout, so diagnostics stay on stderr.
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
            .build(path)
            .with_context(|| format!("opening log file {path}"))?;

        config_builder =
            config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = config_builder
        .build(root.build(log_level))
        .context("building logger configuration")?;
    log4rs::init_config(config).context("installing logger")?;

    Ok(())
}
