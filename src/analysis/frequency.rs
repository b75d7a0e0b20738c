//! Frequency (monobit) and block frequency tests.

use super::special::{erfc, igamc};
use super::threshold::Significance;
use super::verdict::{require_bits, TestError, TestKind, TestVerdict};
use crate::bits::BitBuffer;

/// Shortest sequence the frequency test accepts.
pub const MIN_FREQUENCY_BITS: usize = 100;

/// Monobit test: the balance of ones against zeros over the whole buffer.
///
/// Each bit maps to ±1; `p = erfc(|S| / sqrt(2n))`.
pub fn frequency(bits: &BitBuffer, significance: &Significance) -> Result<TestVerdict, TestError> {
    let kind = TestKind::Frequency;
    let n = bits.len();
    require_bits(kind, MIN_FREQUENCY_BITS, n)?;

    let sum: i64 = bits.iter().map(|bit| if bit { 1 } else { -1 }).sum();
    let s_obs = sum.unsigned_abs() as f64 / (n as f64).sqrt();
    let p_value = erfc(sum.unsigned_abs() as f64 / (2.0 * n as f64).sqrt());

    Ok(TestVerdict {
        kind,
        p_value,
        statistic: s_obs,
        passed: significance.accepts(kind, p_value),
    })
}

/// Block frequency test over non-overlapping blocks of `block_size` bits.
///
/// A trailing partial block is discarded.
/// `χ² = 4M Σ (πᵢ - ½)²`, `p = Q(N/2, χ²/2)`.
pub fn block_frequency(
    bits: &BitBuffer,
    block_size: usize,
    significance: &Significance,
) -> Result<TestVerdict, TestError> {
    let kind = TestKind::BlockFrequency;
    if block_size == 0 {
        return Err(TestError::DegenerateInput {
            test: kind,
            reason: "block size is zero",
        });
    }
    require_bits(kind, block_size, bits.len())?;

    let blocks = bits.len() / block_size;
    let chi_sq = 4.0
        * block_size as f64
        * (0..blocks)
            .map(|i| {
                let ones = bits.count_ones_in(i * block_size, block_size);
                let proportion = ones as f64 / block_size as f64;
                (proportion - 0.5).powi(2)
            })
            .sum::<f64>();
    let p_value = igamc(blocks as f64 / 2.0, chi_sq / 2.0);

    Ok(TestVerdict {
        kind,
        p_value,
        statistic: chi_sq,
        passed: significance.accepts(kind, p_value),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The 100-bit sample used in NIST SP 800-22 sections 2.1.8, 2.2.8 and 2.3.8.
    pub(crate) const NIST_EPSILON: &str = "1100100100001111110110101010001000100001\
        0110100011000010001101001100010011000110\
        01100010100010111000";

    pub(crate) fn parse_bits(text: &str) -> BitBuffer {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c == '1')
            .collect()
    }

    #[test]
    fn test_frequency_nist_example() {
        let bits = parse_bits(NIST_EPSILON);
        assert_eq!(bits.len(), 100);
        let verdict = frequency(&bits, &Significance::default()).unwrap();
        assert!((verdict.p_value - 0.109_599).abs() < 1e-5);
        assert!(verdict.passed);
    }

    #[test]
    fn test_frequency_all_ones_fails() {
        let bits = BitBuffer::from_bytes(vec![0xFF; 128]);
        let verdict = frequency(&bits, &Significance::default()).unwrap();
        assert!(verdict.p_value < 1e-100);
        assert!(!verdict.passed);
    }

    #[test]
    fn test_frequency_balanced_passes() {
        let bits = BitBuffer::from_bytes(vec![0xAA; 128]);
        let verdict = frequency(&bits, &Significance::default()).unwrap();
        assert!((verdict.p_value - 1.0).abs() < 1e-12);
        assert!(verdict.passed);
    }

    #[test]
    fn test_frequency_short_input() {
        let bits = BitBuffer::from_bytes(vec![0x55; 12]);
        assert_eq!(
            frequency(&bits, &Significance::default()),
            Err(TestError::InsufficientData {
                test: TestKind::Frequency,
                needed: 100,
                got: 96
            })
        );
    }

    #[test]
    fn test_block_frequency_nist_example() {
        let bits = parse_bits(NIST_EPSILON);
        let verdict = block_frequency(&bits, 10, &Significance::default()).unwrap();
        assert!((verdict.statistic - 7.2).abs() < 1e-9);
        assert!((verdict.p_value - 0.706_438).abs() < 1e-5);
        assert!(verdict.passed);
    }

    #[test]
    fn test_block_frequency_all_ones_fails() {
        let bits = BitBuffer::from_bytes(vec![0xFF; 128]);
        let verdict = block_frequency(&bits, 32, &Significance::default()).unwrap();
        assert!(!verdict.passed);
        assert!(verdict.p_value < 1e-100);
    }

    #[test]
    fn test_block_frequency_discards_partial_block() {
        // 16 balanced bits, then a 7-bit tail of ones that must be ignored.
        let mut bits = BitBuffer::from_bytes(vec![0xF0, 0x0F]);
        bits.extend(std::iter::repeat(true).take(7));
        let verdict = block_frequency(&bits, 8, &Significance::default()).unwrap();
        assert_eq!(verdict.statistic, 0.0);
        assert_eq!(verdict.p_value, 1.0);
    }

    #[test]
    fn test_block_frequency_preconditions() {
        let bits = BitBuffer::from_bytes(vec![0x00; 2]);
        assert!(matches!(
            block_frequency(&bits, 0, &Significance::default()),
            Err(TestError::DegenerateInput { .. })
        ));
        assert!(matches!(
            block_frequency(&bits, 32, &Significance::default()),
            Err(TestError::InsufficientData { needed: 32, got: 16, .. })
        ));
    }
}
