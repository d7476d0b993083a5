//! `dbbench`: command-line entry point for the SQLite benchmarks.
//!
//! Usage:
//!   dbbench tatp load --records 100000
//!   dbbench tatp run --records 100000 --clients 4 --warmup 10 --measure 60
//!   dbbench blob load --size 1000000
//!   dbbench blob run --size 1000000 --mix 0.9 --clients 2
//!   dbbench ssb --sql-dir sql
//!
//! Each workload defaults to its own database file in the working directory;
//! `--db` (or `DBBENCH_DB`) overrides it.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dbbench_core::blob::{BlobGenerator, BlobMix};
use dbbench_core::tatp::ProcedureGenerator;
use dbbench_core::{initialize_logger, run, RunConfig};
use log::{info, LevelFilter};
use sqlite_bench::populate::{load_blob, load_tatp};
use sqlite_bench::report::{print_json, print_query_report, print_run_report, query_csv_line};
use sqlite_bench::schema::{self, ConnectionOptions, JournalMode};
use sqlite_bench::ssb;
use sqlite_bench::worker::{BlobWorker, TatpWorker};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "dbbench", version, about = "TATP, blob and SSB benchmarks on SQLite")]
struct Cli {
    /// Database file [default: tatp.sqlite, blob.sqlite or ssb.sqlite]
    #[arg(long, global = true, env = "DBBENCH_DB")]
    db: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<String>,

    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Telecom OLTP workload
    Tatp {
        #[command(subcommand)]
        action: TatpAction,
    },
    /// Single-row blob read/write workload
    Blob {
        #[command(subcommand)]
        action: BlobAction,
    },
    /// Time the Star Schema Benchmark queries on a loaded database
    Ssb(SsbArgs),
}

#[derive(Subcommand, Debug)]
enum TatpAction {
    /// Create the tables and load the subscriber population
    Load {
        #[arg(long, default_value_t = 1000)]
        records: u64,
        #[arg(long, default_value_t = 10_000)]
        batch_size: usize,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Run the transaction mix against a loaded database
    Run {
        /// Subscriber population the database was loaded with
        #[arg(long, default_value_t = 1000)]
        records: u64,
        #[command(flatten)]
        run: RunArgs,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Subcommand, Debug)]
enum BlobAction {
    /// Create the blob table holding one random payload
    Load {
        /// Payload size in bytes
        #[arg(long, default_value_t = 1000)]
        size: usize,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Run the read/write mix against a loaded blob table
    Run {
        /// Payload size in bytes
        #[arg(long, default_value_t = 1000)]
        size: usize,
        /// Fraction of operations that are reads
        #[arg(long, default_value_t = 0.5)]
        mix: f64,
        #[command(flatten)]
        run: RunArgs,
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Args, Debug)]
struct SsbArgs {
    /// Directory holding q1.1.sql .. q4.3.sql
    #[arg(long, default_value = "sql")]
    sql_dir: PathBuf,
    /// Print the per-query seconds as one comma-separated line
    #[arg(long)]
    csv: bool,
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Number of concurrent clients, one connection each
    #[arg(long, default_value_t = 1)]
    clients: usize,
    /// Warmup duration in seconds
    #[arg(long, default_value_t = 10)]
    warmup: u64,
    /// Measurement duration in seconds
    #[arg(long, default_value_t = 60)]
    measure: u64,
    /// Base RNG seed; client `i` uses `seed + i`. Random when absent.
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn config(&self) -> RunConfig {
        RunConfig::from_secs(self.warmup, self.measure)
    }

    fn client_seed(&self, idx: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(idx as u64))
    }
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    #[arg(long, value_enum, default_value_t = JournalMode::Delete)]
    journal_mode: JournalMode,
    /// PRAGMA cache_size; negative values are KiB
    #[arg(long, default_value_t = -1_000_000, allow_negative_numbers = true)]
    cache_size: i64,
    /// Seconds to wait on a locked database
    #[arg(long, default_value_t = 30)]
    busy_timeout: u64,
    /// Enforce foreign keys
    #[arg(long)]
    foreign_keys: bool,
}

impl ConnectionArgs {
    fn options(&self) -> ConnectionOptions {
        ConnectionOptions {
            journal_mode: self.journal_mode,
            cache_size: self.cache_size,
            busy_timeout: Duration::from_secs(self.busy_timeout),
            foreign_keys: self.foreign_keys,
        }
    }
}

fn tatp_load(
    db: &Path,
    records: u64,
    batch_size: usize,
    options: &ConnectionOptions,
) -> Result<()> {
    let mut conn = schema::open(db, options)?;
    let stats = load_tatp(&mut conn, records, batch_size)?;
    info!(
        "{} access_info, {} special_facility, {} call_forwarding rows",
        stats.access_infos, stats.special_facilities, stats.call_forwardings
    );
    Ok(())
}

fn tatp_run(
    db: &Path,
    records: u64,
    args: &RunArgs,
    options: &ConnectionOptions,
    json: bool,
) -> Result<()> {
    let workers = (0..args.clients)
        .map(|idx| -> Result<TatpWorker> {
            let conn = schema::open(db, options)?;
            let procedures = match args.client_seed(idx) {
                Some(seed) => ProcedureGenerator::new(records, seed)?,
                None => ProcedureGenerator::from_entropy(records)?,
            };
            Ok(TatpWorker::new(conn, procedures))
        })
        .collect::<Result<Vec<_>>>()
        .context("preparing TATP clients")?;

    info!("running TATP with {} clients on {}", args.clients, db.display());
    let report = run(workers, &args.config())?;
    if json {
        print_json(&report)
    } else {
        print_run_report("TATP on SQLite", &report);
        Ok(())
    }
}

fn blob_run(
    db: &Path,
    mix: &BlobMix,
    args: &RunArgs,
    options: &ConnectionOptions,
    json: bool,
) -> Result<()> {
    mix.validate()?;
    let workers = (0..args.clients)
        .map(|idx| -> Result<BlobWorker> {
            let conn = schema::open(db, options)?;
            let requests = match args.client_seed(idx) {
                Some(seed) => BlobGenerator::new(mix, seed)?,
                None => BlobGenerator::from_entropy(mix)?,
            };
            Ok(BlobWorker::new(conn, mix, requests))
        })
        .collect::<Result<Vec<_>>>()
        .context("preparing blob clients")?;

    info!(
        "running blob workload ({} bytes, {:.0}% reads) with {} clients",
        mix.payload_size,
        mix.read_fraction * 100.0,
        args.clients
    );
    let report = run(workers, &args.config())?;
    if json {
        print_json(&report)
    } else {
        print_run_report("Blob on SQLite", &report);
        Ok(())
    }
}

fn ssb_run(db: &Path, args: &SsbArgs, json: bool) -> Result<()> {
    let conn = schema::open(db, &args.connection.options())?;
    ssb::prepare(&conn)?;
    let timings = ssb::run_queries(&conn, &args.sql_dir)?;
    if json {
        print_json(&timings)
    } else if args.csv {
        println!("{}", query_csv_line(&timings));
        Ok(())
    } else {
        print_query_report(&timings);
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logger(cli.log_level, cli.log_file.as_deref())?;

    let db = |default: &str| cli.db.clone().unwrap_or_else(|| PathBuf::from(default));

    match &cli.command {
        Command::Tatp { action } => match action {
            TatpAction::Load {
                records,
                batch_size,
                connection,
            } => tatp_load(&db("tatp.sqlite"), *records, *batch_size, &connection.options()),
            TatpAction::Run {
                records,
                run,
                connection,
            } => tatp_run(&db("tatp.sqlite"), *records, run, &connection.options(), cli.json),
        },
        Command::Blob { action } => match action {
            BlobAction::Load { size, connection } => {
                let conn = schema::open(&db("blob.sqlite"), &connection.options())?;
                load_blob(&conn, *size)
            }
            BlobAction::Run {
                size,
                mix,
                run,
                connection,
            } => {
                let mix = BlobMix {
                    read_fraction: *mix,
                    payload_size: *size,
                };
                blob_run(&db("blob.sqlite"), &mix, run, &connection.options(), cli.json)
            }
        },
        Command::Ssb(args) => ssb_run(&db("ssb.sqlite"), args, cli.json),
    }
}
