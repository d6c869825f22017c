//! Pure decision functions consulted before any state mutation.

mod config;
mod policy;
mod rules;

pub use config::EligibilityPolicy;
pub use policy::{DenialReason, Eligibility};
pub use rules::{can_apply, can_apply_as_officer, can_register_as_officer, OfficerStanding};
