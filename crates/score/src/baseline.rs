//! Starting points for actor scores, keyed by actor type.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASELINE: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub authority: u8,
    pub reach: u8,
}

impl Baseline {
    /// Lookup by the `Actor Type` select label. Unrecognised types get the
    /// default on both axes.
    pub fn for_actor_type(actor_type: &str) -> Self {
        let (authority, reach) = match actor_type {
            "State" => (50, 35),
            "Hybrid" => (35, 25),
            "Non-State" => (20, 15),
            "IGO" => (10, 45),
            "Individual" => (15, 20),
            _ => (DEFAULT_BASELINE, DEFAULT_BASELINE),
        };
        Self { authority, reach }
    }
}
