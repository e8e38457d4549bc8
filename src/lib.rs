//! Scholarship finder lead-funnel service.
//!
//! Hosts the multi-stage funnel (profile intake, results display, lead
//! capture, thank-you) as in-memory sessions behind an HTTP API, and consumes
//! the scholarship calculation and lead submission endpoints upstream.

pub mod config;
pub mod error;
pub mod funnel;
pub mod telemetry;
