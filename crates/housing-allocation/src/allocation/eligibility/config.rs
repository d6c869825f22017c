use serde::{Deserialize, Serialize};

/// Age thresholds applied by the flat type eligibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    pub single_min_age: u8,
    pub married_min_age: u8,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            single_min_age: 35,
            married_min_age: 21,
        }
    }
}
