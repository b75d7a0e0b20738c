//! GF(2) matrix rank and the binary matrix rank test.

use super::special::igamc;
use super::threshold::Significance;
use super::verdict::{require_bits, TestError, TestKind, TestVerdict};
use crate::bits::BitBuffer;

/// Rows and columns of each matrix in the rank test.
pub const MATRIX_SIZE: usize = 32;

/// Fewest matrices the rank test accepts.
pub const MIN_MATRICES: usize = 38;

/// Probabilities of full rank, rank M-1, and anything lower for 32x32.
const RANK_PROBABILITIES: [f64; 3] = [0.2888, 0.5776, 0.1336];

/// A square matrix of 0/1 entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMatrix {
    rows: Vec<Vec<u8>>,
}

impl BinaryMatrix {
    /// Builds a matrix from rows; returns `None` unless the grid is square.
    /// Nonzero entries are read as 1.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| u8::from(v != 0)).collect())
            .collect();
        Some(Self { rows })
    }

    /// Reads `size * size` bits row-major starting at bit `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + size * size > bits.len()`.
    pub fn from_bits(bits: &BitBuffer, offset: usize, size: usize) -> Self {
        let rows = (0..size)
            .map(|r| {
                (0..size)
                    .map(|c| u8::from(bits.bit(offset + r * size + c)))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// The all-zero matrix.
    pub fn zero(size: usize) -> Self {
        Self {
            rows: vec![vec![0; size]; size],
        }
    }

    /// The identity matrix.
    pub fn identity(size: usize) -> Self {
        let mut matrix = Self::zero(size);
        for i in 0..size {
            matrix.rows[i][i] = 1;
        }
        matrix
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Entry at `row`, `col`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not less than `self.size()`.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.rows[row][col]
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Rank over GF(2), consuming the matrix.
    pub fn rank(mut self) -> usize {
        let m = self.size();
        if m == 0 {
            return 0;
        }

        for i in 0..m - 1 {
            if self.rows[i][i] == 1 || self.swap_pivot(i, i + 1..m) {
                self.eliminate(i, i + 1..m);
            }
        }
        for i in (1..m).rev() {
            if self.rows[i][i] == 1 || self.swap_pivot(i, (0..i).rev()) {
                self.eliminate(i, (0..i).rev());
            }
        }

        self.rows
            .iter()
            .filter(|row| row.iter().any(|&v| v == 1))
            .count()
    }

    /// Swaps the first row of `candidates` with a 1 in column `i` into row `i`.
    fn swap_pivot(&mut self, i: usize, mut candidates: impl Iterator<Item = usize>) -> bool {
        match candidates.find(|&r| self.rows[r][i] == 1) {
            Some(r) => {
                self.rows.swap(i, r);
                true
            }
            None => false,
        }
    }

    /// XORs pivot row `i` into each of `targets` holding a 1 in column `i`.
    fn eliminate(&mut self, i: usize, targets: impl Iterator<Item = usize>) {
        let pivot = self.rows[i].clone();
        for r in targets {
            if self.rows[r][i] == 1 {
                for (v, p) in self.rows[r].iter_mut().zip(&pivot) {
                    *v ^= p;
                }
            }
        }
    }
}

/// Rank of a square binary matrix over GF(2).
pub fn gf2_rank(matrix: BinaryMatrix) -> usize {
    matrix.rank()
}

/// Binary matrix rank test over disjoint 32x32 matrices.
///
/// Ranks are tallied as full, full-1, and lower;
/// `χ² = Σ (Fᵢ - Nπᵢ)² / (Nπᵢ)`, `p = Q(1, χ²/2)`.
pub fn matrix_rank(bits: &BitBuffer, significance: &Significance) -> Result<TestVerdict, TestError> {
    let kind = TestKind::MatrixRank;
    let bits_per_matrix = MATRIX_SIZE * MATRIX_SIZE;
    require_bits(kind, MIN_MATRICES * bits_per_matrix, bits.len())?;

    let matrices = bits.len() / bits_per_matrix;
    let mut full = 0usize;
    let mut full_minus_one = 0usize;
    for i in 0..matrices {
        let rank = BinaryMatrix::from_bits(bits, i * bits_per_matrix, MATRIX_SIZE).rank();
        if rank == MATRIX_SIZE {
            full += 1;
        } else if rank == MATRIX_SIZE - 1 {
            full_minus_one += 1;
        }
    }
    let rest = matrices - full - full_minus_one;

    let n = matrices as f64;
    let chi_sq: f64 = [full, full_minus_one, rest]
        .iter()
        .zip(RANK_PROBABILITIES)
        .map(|(&f, pi)| (f as f64 - n * pi).powi(2) / (n * pi))
        .sum();
    let p_value = igamc(1.0, chi_sq / 2.0);

    tracing::trace!(matrices, full, full_minus_one, rest, chi_sq, "Matrix rank tally");

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
    use proptest::prelude::*;

    fn matrix(rows: &[&[u8]]) -> BinaryMatrix {
        BinaryMatrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn test_identity_full_rank() {
        for size in [1, 2, 5, MATRIX_SIZE] {
            assert_eq!(BinaryMatrix::identity(size).rank(), size);
        }
    }

    #[test]
    #[should_panic]
    fn test_from_bits_past_end_panics() {
        let bits = BitBuffer::from_bytes(vec![0xFF; 3]);
        BinaryMatrix::from_bits(&bits, 0, 5);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        BinaryMatrix::identity(4).get(0, 4);
    }

    #[test]
    fn test_zero_rank() {
        assert_eq!(BinaryMatrix::zero(MATRIX_SIZE).rank(), 0);
        assert_eq!(BinaryMatrix::zero(0).rank(), 0);
    }

    #[test]
    fn test_dependent_rows() {
        // Third row is the XOR of the first two.
        let m = matrix(&[&[1, 0, 1], &[0, 1, 1], &[1, 1, 0]]);
        assert_eq!(m.rank(), 2);
    }

    #[test]
    fn test_missing_pivot_column() {
        // Column 0 is empty; elimination moves on to column 1.
        let m = matrix(&[&[0, 1, 0], &[0, 0, 1], &[0, 1, 1]]);
        assert_eq!(m.rank(), 2);
    }

    #[test]
    fn test_upper_pivot_needed() {
        let m = matrix(&[&[0, 1, 1], &[0, 0, 0], &[0, 1, 1]]);
        assert_eq!(m.rank(), 1);
    }

    #[test]
    fn test_xor_not_addition() {
        // Over the integers these rows are independent.
        let m = matrix(&[&[1, 1], &[1, 1]]);
        assert_eq!(m.rank(), 1);
    }

    #[test]
    fn test_from_rows_rejects_non_square() {
        assert!(BinaryMatrix::from_rows(vec![vec![1, 0], vec![1]]).is_none());
        assert!(BinaryMatrix::from_rows(vec![vec![1, 0, 0]]).is_none());
    }

    #[test]
    fn test_from_bits_row_major() {
        let bits = BitBuffer::from_bits([true, false, false, true]);
        let m = BinaryMatrix::from_bits(&bits, 0, 2);
        assert_eq!(m, BinaryMatrix::identity(2));
    }

    #[test]
    fn test_matrix_rank_short_input() {
        let bits = BitBuffer::from_bytes(vec![0x5A; 1024]);
        assert_eq!(
            matrix_rank(&bits, &Significance::default()),
            Err(TestError::InsufficientData {
                test: TestKind::MatrixRank,
                needed: 38_912,
                got: 8192
            })
        );
    }

    #[test]
    fn test_matrix_rank_constant_input_fails() {
        let bits = BitBuffer::from_bytes(vec![0xFF; 38_912 / 8]);
        let verdict = matrix_rank(&bits, &Significance::default()).unwrap();
        assert!(!verdict.passed);
    }

    /// XOR-basis rank used as an independent reference.
    fn reference_rank(rows: &[u32]) -> usize {
        let mut basis: Vec<u32> = Vec::new();
        for &row in rows {
            let reduced = basis.iter().fold(row, |v, &b| v.min(v ^ b));
            if reduced != 0 {
                basis.push(reduced);
                basis.sort_unstable_by(|a, b| b.cmp(a));
            }
        }
        basis.len()
    }

    fn to_matrix(rows: &[u32], size: usize) -> BinaryMatrix {
        let grid = rows
            .iter()
            .map(|&row| (0..size).map(|c| ((row >> (size - 1 - c)) & 1) as u8).collect())
            .collect();
        BinaryMatrix::from_rows(grid).unwrap()
    }

    proptest! {
        #[test]
        fn prop_rank_matches_reference(rows in proptest::collection::vec(0u32..256, 8)) {
            prop_assert_eq!(to_matrix(&rows, 8).rank(), reference_rank(&rows));
        }

        #[test]
        fn prop_rank_invariant_under_row_permutation(
            rows in proptest::collection::vec(any::<u32>(), 32),
            rotation in 0usize..32,
        ) {
            let mut permuted = rows.clone();
            permuted.rotate_left(rotation);
            permuted.reverse();
            prop_assert_eq!(
                to_matrix(&rows, 32).rank(),
                to_matrix(&permuted, 32).rank()
            );
        }
    }
}
