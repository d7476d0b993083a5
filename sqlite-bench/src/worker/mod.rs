//! Closed-loop clients run by [`dbbench_core::run`].

mod blob;
mod tatp;

pub use blob::BlobWorker;
pub use tatp::TatpWorker;
