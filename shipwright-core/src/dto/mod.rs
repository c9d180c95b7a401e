//! Data Transfer Objects
//!
//! Wire formats exchanged with the outside world: the task submission the
//! gateway accepts, its acknowledgement, the health report and the notice
//! posted to the evaluation callback.

pub mod notification;
pub mod task;
