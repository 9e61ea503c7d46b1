// Aggregate statistics over the full collection.
use serde::{Deserialize, Serialize};

use crate::core::record::WorkoutRecord;

pub const COUNTER_DURATION_MS: u64 = 650;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: u64,
    pub average_weight: f64,
}

impl Stats {
    pub fn from_records(records: &[WorkoutRecord]) -> Self {
        let total = records.len() as u64;
        if total == 0 {
            return Self {
                total: 0,
                average_weight: 0.0,
            };
        }
        let sum: f64 = records.iter().map(|record| record.weight).sum();
        Self {
            total,
            average_weight: sum / total as f64,
        }
    }
}

/// `1 - (1 - t)^3`, with `t` clamped to `[0, 1]`.
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
