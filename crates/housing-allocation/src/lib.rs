//! Subsidized housing allocation: eligibility-gated applications, officer
//! registrations, and flat bookings that all draw on one per-project unit
//! ledger.

pub mod allocation;
pub mod config;
pub mod error;
pub mod telemetry;
