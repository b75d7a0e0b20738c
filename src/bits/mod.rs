//! Bit-level access over byte buffers.
//!
//! Every generator and test in this crate works on individual bits, never
//! on bytes. Bits are ordered most-significant-first within each byte.

mod buffer;

pub use buffer::{bit_at, test_bit, BitBuffer};
