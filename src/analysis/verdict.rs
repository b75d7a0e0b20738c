//! Test identities, verdicts and precondition failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The five tests of the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Frequency,
    BlockFrequency,
    Runs,
    LongestRun,
    MatrixRank,
}

impl TestKind {
    /// All tests in battery order.
    pub const ALL: [TestKind; 5] = [
        TestKind::Frequency,
        TestKind::BlockFrequency,
        TestKind::Runs,
        TestKind::LongestRun,
        TestKind::MatrixRank,
    ];

    /// Name used in report lines.
    pub fn name(self) -> &'static str {
        match self {
            TestKind::Frequency => "Frequency",
            TestKind::BlockFrequency => "Frequency block",
            TestKind::Runs => "Runs",
            TestKind::LongestRun => "OnesLongestRun",
            TestKind::MatrixRank => "BinaryMatrixRank",
        }
    }

    /// Stable identifier used as a metrics label.
    pub fn label(self) -> &'static str {
        match self {
            TestKind::Frequency => "frequency",
            TestKind::BlockFrequency => "block_frequency",
            TestKind::Runs => "runs",
            TestKind::LongestRun => "longest_run",
            TestKind::MatrixRank => "matrix_rank",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one test invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TestVerdict {
    /// Which test produced this verdict.
    pub kind: TestKind,
    /// Probability of a statistic at least this extreme under randomness.
    pub p_value: f64,
    /// The test statistic the p-value was derived from.
    pub statistic: f64,
    /// Whether `p_value` clears the test's significance level.
    pub passed: bool,
}

impl fmt::Display for TestVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.passed { "passed" } else { "failed" };
        write!(f, "{} test {}", self.kind, outcome)
    }
}

/// Reasons a test could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestError {
    #[error("insufficient data: need {needed} bits, got {got}")]
    InsufficientData {
        test: TestKind,
        needed: usize,
        got: usize,
    },
    #[error("degenerate input: {reason}")]
    DegenerateInput { test: TestKind, reason: &'static str },
}

impl TestError {
    /// The test that rejected its input.
    pub fn test(&self) -> TestKind {
        match self {
            TestError::InsufficientData { test, .. } | TestError::DegenerateInput { test, .. } => {
                *test
            }
        }
    }
}

/// Fails with [`TestError::InsufficientData`] when fewer than `needed` bits are present.
pub(crate) fn require_bits(test: TestKind, needed: usize, got: usize) -> Result<(), TestError> {
    if got < needed {
        return Err(TestError::InsufficientData { test, needed, got });
    }
    Ok(())
}
