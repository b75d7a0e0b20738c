//! Runs test and longest-run-of-ones test.

use super::special::{erfc, igamc};
use super::threshold::Significance;
use super::verdict::{require_bits, TestError, TestKind, TestVerdict};
use crate::bits::BitBuffer;
use serde::{Deserialize, Serialize};

/// Shortest sequence the runs test accepts.
pub const MIN_RUNS_BITS: usize = 100;

/// Runs test: the number of maximal equal-bit stretches across the buffer.
///
/// When the ones proportion `π` violates `|π - ½| < 2/√n` the test fails
/// without counting runs and reports `p = 0`. Otherwise
/// `p = erfc(|V - 2nπ(1-π)| / (2√(2n) π(1-π)))`.
pub fn runs(bits: &BitBuffer, significance: &Significance) -> Result<TestVerdict, TestError> {
    let kind = TestKind::Runs;
    let n = bits.len();
    require_bits(kind, MIN_RUNS_BITS, n)?;

    let n_f = n as f64;
    let pi = bits.count_ones() as f64 / n_f;

    if (pi - 0.5).abs() >= 2.0 / n_f.sqrt() {
        tracing::debug!(pi, "Runs test precondition failed");
        return Ok(TestVerdict {
            kind,
            p_value: 0.0,
            statistic: pi,
            passed: false,
        });
    }

    let spread = pi * (1.0 - pi);
    let denominator = 2.0 * (2.0 * n_f).sqrt() * spread;
    if denominator == 0.0 {
        return Err(TestError::DegenerateInput {
            test: kind,
            reason: "ones proportion is 0 or 1",
        });
    }

    let mut previous = bits.bit(0);
    let mut v_obs = 1usize;
    for bit in bits.iter().skip(1) {
        if bit != previous {
            v_obs += 1;
        }
        previous = bit;
    }

    let p_value = erfc((v_obs as f64 - 2.0 * n_f * spread).abs() / denominator);

    Ok(TestVerdict {
        kind,
        p_value,
        statistic: v_obs as f64,
        passed: significance.accepts(kind, p_value),
    })
}

/// Block size and category table for the longest-run test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongestRunVariant {
    /// 8-bit blocks, categories ≤1, 2, 3, ≥4.
    M8,
    /// 128-bit blocks, categories ≤4, 5, 6, 7, 8, ≥9.
    #[default]
    M128,
    /// 10 000-bit blocks, categories ≤10, 11, …, 15, ≥16.
    M10000,
}

/// A fixed category table from NIST SP 800-22 section 2.4.
#[derive(Debug)]
pub struct RunCategories {
    /// Bits per block.
    pub block_size: usize,
    /// Shortest recommended sequence.
    pub min_bits: usize,
    /// Longest runs at or below this value fall into category 0.
    pub lowest: usize,
    /// Theoretical probability of each category; there are K+1 of them.
    pub probabilities: &'static [f64],
}

const M8_CATEGORIES: RunCategories = RunCategories {
    block_size: 8,
    min_bits: 128,
    lowest: 1,
    probabilities: &[0.2148, 0.3672, 0.2305, 0.1875],
};

const M128_CATEGORIES: RunCategories = RunCategories {
    block_size: 128,
    min_bits: 6272,
    lowest: 4,
    probabilities: &[0.1174, 0.2430, 0.2493, 0.1752, 0.1027, 0.1124],
};

const M10000_CATEGORIES: RunCategories = RunCategories {
    block_size: 10_000,
    min_bits: 750_000,
    lowest: 10,
    probabilities: &[0.0882, 0.2092, 0.2483, 0.1933, 0.1208, 0.0675, 0.0727],
};

impl LongestRunVariant {
    /// The category table for this variant.
    pub fn categories(self) -> &'static RunCategories {
        match self {
            LongestRunVariant::M8 => &M8_CATEGORIES,
            LongestRunVariant::M128 => &M128_CATEGORIES,
            LongestRunVariant::M10000 => &M10000_CATEGORIES,
        }
    }
}

impl RunCategories {
    /// Degrees of freedom K.
    pub fn k(&self) -> usize {
        self.probabilities.len() - 1
    }

    /// Category index for a block's longest run.
    pub fn category(&self, longest: usize) -> usize {
        longest.clamp(self.lowest, self.lowest + self.k()) - self.lowest
    }
}

fn longest_ones(bits: &BitBuffer, start: usize, len: usize) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for i in start..start + len {
        if bits.bit(i) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Longest run of ones within fixed-size blocks.
///
/// Runs reset at every block boundary; a trailing partial block is
/// discarded. `χ² = Σ (vᵢ - Nπᵢ)² / (Nπᵢ)`, `p = Q(K/2, χ²/2)`.
pub fn longest_run(
    bits: &BitBuffer,
    variant: LongestRunVariant,
    significance: &Significance,
) -> Result<TestVerdict, TestError> {
    let kind = TestKind::LongestRun;
    let table = variant.categories();
    require_bits(kind, table.min_bits, bits.len())?;

    let blocks = bits.len() / table.block_size;
    let mut counts = vec![0usize; table.probabilities.len()];
    for block in 0..blocks {
        let longest = longest_ones(bits, block * table.block_size, table.block_size);
        counts[table.category(longest)] += 1;
    }

    let n = blocks as f64;
    let chi_sq: f64 = counts
        .iter()
        .zip(table.probabilities)
        .map(|(&v, &pi)| (v as f64 - n * pi).powi(2) / (n * pi))
        .sum();
    let p_value = igamc(table.k() as f64 / 2.0, chi_sq / 2.0);

    tracing::trace!(?variant, ?counts, chi_sq, "Longest run categories");

    Ok(TestVerdict {
        kind,
        p_value,
        statistic: chi_sq,
        passed: significance.accepts(kind, p_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frequency::tests::{parse_bits, NIST_EPSILON};

    #[test]
    fn test_runs_nist_example() {
        let bits = parse_bits(NIST_EPSILON);
        let verdict = runs(&bits, &Significance::default()).unwrap();
        assert_eq!(verdict.statistic, 52.0);
        assert!((verdict.p_value - 0.500_798).abs() < 1e-5);
        assert!(verdict.passed);
    }

    #[test]
    fn test_runs_counts_across_byte_boundaries() {
        // 0x0F 0xF0 ...: the 1111|1111 seam is one run, not two.
        let bits = BitBuffer::from_bytes([0x0F, 0xF0].repeat(8));
        let verdict = runs(&bits, &Significance::default()).unwrap();
        assert_eq!(verdict.statistic, 17.0);
    }

    #[test]
    fn test_runs_biased_short_circuit() {
        let bits = BitBuffer::from_bytes(vec![0xFF; 128]);
        let verdict = runs(&bits, &Significance::default()).unwrap();
        assert_eq!(verdict.p_value, 0.0);
        assert!(!verdict.passed);
    }

    #[test]
    fn test_runs_bias_toward_zeros_short_circuits() {
        let mut bytes = vec![0x00; 120];
        bytes.extend([0xFF; 8]);
        let verdict = runs(&BitBuffer::from_bytes(bytes), &Significance::default()).unwrap();
        assert_eq!(verdict.p_value, 0.0);
    }

    #[test]
    fn test_runs_alternating_fails() {
        // Balanced, but twice the expected number of runs.
        let bits = BitBuffer::from_bytes(vec![0xAA; 128]);
        let verdict = runs(&bits, &Significance::default()).unwrap();
        assert_eq!(verdict.statistic, 1024.0);
        assert!(!verdict.passed);
    }

    #[test]
    fn test_runs_short_input() {
        let bits = BitBuffer::from_bytes(vec![0x5A; 4]);
        assert!(matches!(
            runs(&bits, &Significance::default()),
            Err(TestError::InsufficientData { test: TestKind::Runs, .. })
        ));
    }

    #[test]
    fn test_category_boundaries() {
        let m8 = LongestRunVariant::M8.categories();
        assert_eq!(m8.k(), 3);
        assert_eq!(m8.category(0), 0);
        assert_eq!(m8.category(1), 0);
        assert_eq!(m8.category(2), 1);
        assert_eq!(m8.category(8), 3);

        let m128 = LongestRunVariant::M128.categories();
        assert_eq!(m128.k(), 5);
        assert_eq!(m128.category(4), 0);
        assert_eq!(m128.category(9), 5);
        assert_eq!(m128.category(40), 5);

        let m10000 = LongestRunVariant::M10000.categories();
        assert_eq!(m10000.k(), 6);
        assert_eq!(m10000.category(13), 3);
    }

    #[test]
    fn test_probability_tables_sum_to_one() {
        for variant in [
            LongestRunVariant::M8,
            LongestRunVariant::M128,
            LongestRunVariant::M10000,
        ] {
            let total: f64 = variant.categories().probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-3, "{variant:?}");
        }
    }

    #[test]
    fn test_longest_run_nist_example() {
        let bits = parse_bits(
            "11001100000101010110110001001100111000000000001001\
             00110101010001000100111101011010000000110101111100\
             1100111001101101100010110010",
        );
        assert_eq!(bits.len(), 128);
        let verdict = longest_run(&bits, LongestRunVariant::M8, &Significance::default()).unwrap();
        assert!((verdict.statistic - 4.882_605).abs() < 1e-5);
        assert!((verdict.p_value - 0.180_598).abs() < 1e-4);
        assert!(verdict.passed);
    }

    #[test]
    fn test_longest_run_resets_per_block() {
        // Every 8-bit block holds exactly one run of 4.
        let bits = BitBuffer::from_bytes(vec![0x0F; 16]);
        let verdict = longest_run(&bits, LongestRunVariant::M8, &Significance::default()).unwrap();
        // All 16 blocks land in the top category.
        let expected: f64 = [0.2148, 0.3672, 0.2305]
            .iter()
            .map(|pi| 16.0 * pi)
            .sum::<f64>()
            + (16.0 - 16.0 * 0.1875f64).powi(2) / (16.0 * 0.1875);
        assert!((verdict.statistic - expected).abs() < 1e-9);
        assert!(!verdict.passed);
    }

    #[test]
    fn test_longest_run_short_input() {
        let bits = BitBuffer::from_bytes(vec![0x5A; 100]);
        assert_eq!(
            longest_run(&bits, LongestRunVariant::M128, &Significance::default()),
            Err(TestError::InsufficientData {
                test: TestKind::LongestRun,
                needed: 6272,
                got: 800
            })
        );
    }
}
