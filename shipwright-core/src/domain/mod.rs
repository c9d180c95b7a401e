//! Core domain types
//!
//! These types describe one pipeline run from request to outcome. They carry
//! no behaviour beyond small invariants; generation, deployment and
//! notification logic lives in the runner.

pub mod artifact;
pub mod deployment;
pub mod job;
pub mod outcome;
