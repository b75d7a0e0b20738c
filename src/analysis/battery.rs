//! Runs the full test battery and reports the verdicts.

use super::frequency::{block_frequency, frequency};
use super::rank::matrix_rank;
use super::runs::{longest_run, runs, LongestRunVariant};
use super::threshold::Significance;
use super::verdict::{TestError, TestKind, TestVerdict};
use crate::bits::BitBuffer;
use crate::generator::BbsGenerator;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Battery parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Bits drawn for the frequency, block, runs and longest-run tests.
    pub sample_bits: usize,
    /// Bits drawn for the matrix rank test.
    pub matrix_bits: usize,
    /// Block size of the block frequency test.
    pub block_size: usize,
    /// Category table of the longest-run test.
    pub longest_run: LongestRunVariant,
    /// Per-test significance levels.
    pub significance: Significance,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            sample_bits: 6272,
            matrix_bits: 38_912,
            block_size: 32,
            longest_run: LongestRunVariant::default(),
            significance: Significance::default(),
        }
    }
}

/// Result of one test: a verdict or the reason it could not run.
pub type TestOutcome = Result<TestVerdict, TestError>;

/// Verdicts of one battery run, in battery order.
#[derive(Debug, Clone)]
pub struct BatteryReport {
    outcomes: Vec<(TestKind, TestOutcome)>,
}

impl BatteryReport {
    /// Every outcome with the test that produced it.
    pub fn outcomes(&self) -> &[(TestKind, TestOutcome)] {
        &self.outcomes
    }

    /// Outcome of one test, if it ran.
    pub fn outcome(&self, kind: TestKind) -> Option<&TestOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    /// Number of passing tests.
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, Ok(v) if v.passed))
            .count()
    }

    /// Returns true if every test produced a passing verdict.
    pub fn all_passed(&self) -> bool {
        self.passed() == self.outcomes.len()
    }

    /// Writes one `<TestName> test passed|failed` line per test.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (kind, outcome) in &self.outcomes {
            match outcome {
                Ok(verdict) => writeln!(out, "{verdict}")?,
                Err(e) => writeln!(out, "{kind} test failed: {e}")?,
            }
        }
        out.flush()
    }
}

/// The five-test battery under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Battery {
    config: BatteryConfig,
}

impl Battery {
    pub fn new(config: BatteryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }

    /// Runs the first four tests on `sample` and the rank test on `matrix_sample`.
    pub fn run(&self, sample: &BitBuffer, matrix_sample: &BitBuffer) -> BatteryReport {
        let sig = &self.config.significance;
        let outcomes = vec![
            (TestKind::Frequency, frequency(sample, sig)),
            (
                TestKind::BlockFrequency,
                block_frequency(sample, self.config.block_size, sig),
            ),
            (TestKind::Runs, runs(sample, sig)),
            (
                TestKind::LongestRun,
                longest_run(sample, self.config.longest_run, sig),
            ),
            (TestKind::MatrixRank, matrix_rank(matrix_sample, sig)),
        ];

        for (kind, outcome) in &outcomes {
            match outcome {
                Ok(v) => tracing::debug!(
                    test = kind.label(),
                    p_value = v.p_value,
                    statistic = v.statistic,
                    passed = v.passed,
                    "Test verdict"
                ),
                Err(e) => tracing::warn!(test = kind.label(), error = %e, "Test could not run"),
            }
        }

        let report = BatteryReport { outcomes };
        tracing::info!(
            passed = report.passed(),
            total = report.outcomes.len(),
            sample_bits = sample.len(),
            matrix_bits = matrix_sample.len(),
            "Battery complete"
        );
        report
    }

    /// Draws both samples from `generator` and runs the battery.
    pub fn run_generator(&self, generator: &mut BbsGenerator) -> BatteryReport {
        let sample = generator.next_bits(self.config.sample_bits);
        let matrix_sample = generator.next_bits(self.config.matrix_bits);
        self.run(&sample, &matrix_sample)
    }
}
