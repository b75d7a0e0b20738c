//! The Blum-Blum-Shub generator.
//!
//! A generator is a single owned state value. Every emitted bit is a
//! read-modify-write of that state, so sharing one generator across
//! threads requires external locking.

use super::{GeneratorError, Modulus, ModulusBuilder};
use crate::bits::BitBuffer;
use crate::entropy::EntropySource;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand_core::RngCore;

/// Iterated squaring modulo a Blum integer.
///
/// Each step computes `state = state² mod n` and emits the least
/// significant bit of the new state. Byte-oriented output packs emitted
/// bits most-significant-first.
pub struct BbsGenerator {
    modulus: Modulus,
    /// Always in `[0, n)`.
    state: BigUint,
    /// Bits emitted since the last seed.
    emitted: u64,
}

impl BbsGenerator {
    /// Creates a generator over `modulus` seeded with `seed`.
    pub fn new(modulus: Modulus, seed: &[u8]) -> Self {
        let mut generator = Self {
            modulus,
            state: BigUint::default(),
            emitted: 0,
        };
        generator.seed(seed);
        generator
    }

    /// Builds a modulus and a seed from one source, then closes it.
    ///
    /// The seed is `builder.bits() / 8` bytes. The source is closed whether
    /// or not construction succeeds.
    pub fn from_source<S>(builder: &ModulusBuilder, source: &mut S) -> Result<Self, GeneratorError>
    where
        S: EntropySource + ?Sized,
    {
        let result = Self::build(builder, source);
        source.close();
        result
    }

    /// Searches the two primes concurrently, one per source, then seeds from
    /// `first`. Both sources are closed whether or not construction succeeds.
    pub fn from_parallel_sources<A, B>(
        builder: &ModulusBuilder,
        first: &mut A,
        second: &mut B,
    ) -> Result<Self, GeneratorError>
    where
        A: EntropySource + Send + ?Sized,
        B: EntropySource + Send + ?Sized,
    {
        let result = builder.build_parallel(first, second).and_then(|modulus| {
            let seed = first.next_bytes((builder.bits() / 8) as usize)?;
            Ok(Self::new(modulus, &seed))
        });
        first.close();
        second.close();
        result
    }

    fn build<S>(builder: &ModulusBuilder, source: &mut S) -> Result<Self, GeneratorError>
    where
        S: EntropySource + ?Sized,
    {
        let modulus = builder.build(source)?;
        let seed = source.next_bytes((builder.bits() / 8) as usize)?;
        Ok(Self::new(modulus, &seed))
    }

    /// Sets the state to the big-endian integer `seed` reduced mod `n`.
    pub fn seed(&mut self, seed: &[u8]) {
        self.state = BigUint::from_bytes_be(seed) % self.modulus.n();
        self.emitted = 0;

        if self.state <= BigUint::one() {
            tracing::warn!("BBS seed reduces to a fixed point; output will be constant");
        } else if !self.state.gcd(self.modulus.n()).is_one() {
            tracing::warn!("BBS seed shares a factor with the modulus");
        }

        tracing::debug!(
            modulus_bits = self.modulus.bits(),
            seed_bytes = seed.len(),
            "BBS generator seeded"
        );
    }

    /// Advances the state once and returns the new least significant bit.
    #[inline]
    pub fn next_bit(&mut self) -> bool {
        self.state = (&self.state * &self.state) % self.modulus.n();
        self.emitted += 1;
        self.state.bit(0)
    }

    /// Emits `count` bits in order.
    pub fn next_bits(&mut self, count: usize) -> BitBuffer {
        let mut bits = BitBuffer::with_capacity(count);
        for _ in 0..count {
            bits.push(self.next_bit());
        }
        tracing::trace!(count, total = self.emitted, "BBS bits emitted");
        bits
    }

    /// Current state.
    pub fn state(&self) -> &BigUint {
        &self.state
    }

    /// The modulus this generator squares under.
    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    /// Bits emitted since the last seed.
    pub fn bits_emitted(&self) -> u64 {
        self.emitted
    }

    fn next_word(&mut self, bits: u32) -> u64 {
        (0..bits).fold(0u64, |word, _| (word << 1) | u64::from(self.next_bit()))
    }
}

impl RngCore for BbsGenerator {
    fn next_u32(&mut self) -> u32 {
        self.next_word(32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_word(64)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_word(8) as u8;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl std::fmt::Debug for BbsGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BbsGenerator")
            .field("modulus", &self.modulus)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}
