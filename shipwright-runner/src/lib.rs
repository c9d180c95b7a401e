//! Shipwright job pipeline
//!
//! Takes an accepted job request through generation, deployment and
//! notification:
//!
//! - [`scheduler`]: background admission, concurrency limit, per-task locks
//! - [`orchestrator`]: the state machine of a single job
//! - [`service`]: one service per stage
//! - [`repository`]: trait seams over the upstream HTTP clients
//!
//! Everything a job needs is passed in through [`RunnerConfig`] at startup.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod repository;
pub mod retry;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RunnerConfig;
pub use error::{JobFailure, UpstreamError};
pub use orchestrator::JobOrchestrator;
pub use retry::{Backoff, RetryPolicy};
pub use scheduler::{Admission, DispatchError, JobDispatcher};
