//! Shipwright Core
//!
//! Core types shared by every Shipwright crate.
//!
//! This crate contains:
//! - Domain types: the job request, generated artifact, deployment result and
//!   the terminal outcome of a job
//! - DTOs: wire formats for the inbound task submission and the outbound
//!   evaluation callback

pub mod domain;
pub mod dto;
