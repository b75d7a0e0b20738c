//! Significance levels for the test battery.
//!
//! The runs test is judged at 0.1 and accepts `p >= α`; every other test
//! is judged at 0.01 and accepts `p > α`.

use super::verdict::TestKind;
use serde::{Deserialize, Serialize};

/// Per-test significance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Significance {
    pub frequency: f64,
    pub block_frequency: f64,
    pub runs: f64,
    pub longest_run: f64,
    pub matrix_rank: f64,
}

impl Default for Significance {
    fn default() -> Self {
        Self {
            frequency: 0.01,
            block_frequency: 0.01,
            runs: 0.1,
            longest_run: 0.01,
            matrix_rank: 0.01,
        }
    }
}

impl Significance {
    /// Level for one test.
    pub fn alpha(&self, kind: TestKind) -> f64 {
        match kind {
            TestKind::Frequency => self.frequency,
            TestKind::BlockFrequency => self.block_frequency,
            TestKind::Runs => self.runs,
            TestKind::LongestRun => self.longest_run,
            TestKind::MatrixRank => self.matrix_rank,
        }
    }

    /// Returns true if `p_value` passes `kind` at its level.
    pub fn accepts(&self, kind: TestKind, p_value: f64) -> bool {
        let alpha = self.alpha(kind);
        match kind {
            TestKind::Runs => p_value >= alpha,
            _ => p_value > alpha,
        }
    }

    /// Returns true if every level lies in `(0, 1)`.
    pub fn is_valid(&self) -> bool {
        TestKind::ALL.iter().all(|&kind| {
            let alpha = self.alpha(kind);
            alpha > 0.0 && alpha < 1.0
        })
    }
}
