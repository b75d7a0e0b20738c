//! Statistical test battery.
//!
//! Five tests loosely following NIST SP 800-22: frequency, block
//! frequency, runs, longest run of ones in a block, and binary matrix
//! rank. Each test is a pure function of a [`BitBuffer`](crate::bits::BitBuffer)
//! and a [`Significance`] table, returning a [`TestVerdict`] or a
//! [`TestError`] when the input cannot support the test.

mod battery;
mod frequency;
mod rank;
mod runs;
mod special;
mod threshold;
mod verdict;

pub use battery::{Battery, BatteryConfig, BatteryReport, TestOutcome};
pub use frequency::{block_frequency, frequency, MIN_FREQUENCY_BITS};
pub use rank::{gf2_rank, matrix_rank, BinaryMatrix, MATRIX_SIZE, MIN_MATRICES};
pub use runs::{longest_run, runs, LongestRunVariant, RunCategories, MIN_RUNS_BITS};
pub use special::{erfc, igamc};
pub use threshold::Significance;
pub use verdict::{TestError, TestKind, TestVerdict};
