//! Scheduling layer
//!
//! Admits jobs into background execution and keeps rounds of the same task
//! from overlapping.

pub mod dispatcher;
pub mod locks;

pub use dispatcher::{Admission, DispatchError, JobDispatcher};
pub use locks::{TaskGuard, TaskLockRegistry};
