//! Candidate recruitment pipeline.
//!
//! The `pipeline` module owns the canonical candidate state machine and the
//! gates around it: public access tokens, form progress, role permissions,
//! interview scoring, hiring decisions, and wave assignment.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
