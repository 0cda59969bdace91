//! Scheduled background jobs.

mod executor;
mod scheduler;
pub mod tasks;
mod types;

pub use executor::JobExecutor;
pub use scheduler::JobScheduler;
pub use types::{JobContext, JobStatus, JobTask};
