//! Blum-Blum-Shub bit generation.
//!
//! A [`ModulusBuilder`] draws two distinct Blum primes from an entropy
//! source and multiplies them into a [`Modulus`]. A [`BbsGenerator`] owns
//! one modulus and a state below it, squaring the state once per emitted bit.

mod bbs;
mod prime;

pub use bbs::BbsGenerator;
pub use prime::{
    is_probable_prime, Modulus, ModulusBuilder, DEFAULT_MAX_PRIME_ATTEMPTS,
    DEFAULT_PRIMALITY_ROUNDS, MIN_MODULUS_BITS,
};

use crate::entropy::EntropyError;
use thiserror::Error;

/// Errors raised while building a modulus or seeding a generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid modulus size {0} bits (must be even and at least 16)")]
    InvalidBitLength(u64),
    #[error("no usable prime after {attempts} candidates")]
    GenerationExhausted { attempts: u64 },
    #[error("invalid modulus: {0}")]
    InvalidModulus(&'static str),
    #[error("entropy source failed: {0}")]
    Entropy(#[from] EntropyError),
}
