//! SQLite Database Benchmarks
//!
//! Runs three workloads against on-disk SQLite databases:
//! - **TATP**: the telecom OLTP mix (seven transactions, 80% reads) driven by
//!   closed-loop clients, each on its own connection
//! - **Blob**: a single-row table read or overwritten by a configurable mix
//! - **SSB**: the thirteen Star Schema Benchmark queries timed one by one
//!
//! Workload generation and the measurement runner live in `dbbench-core`;
//! this crate holds everything that speaks SQL.
//!
//! Run benchmarks: `cargo bench`
//! Run tests: `cargo test`

pub mod populate;
pub mod report;
pub mod schema;
pub mod ssb;
pub mod worker;
