//! Hire lifecycle, disclosure, and rating engine for a two-sided services marketplace.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
