//! Background workers for administrative jobs
//!
//! Worker tasks take job ids from the queue and record the outcome on the job.

mod admin_worker;
mod base;
mod runner;

pub use admin_worker::AdminWorker;
pub use base::Worker;
pub use runner::{run_worker, spawn_workers};
