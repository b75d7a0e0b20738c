//! Blum prime search and modulus construction.

use super::GeneratorError;
use crate::entropy::EntropySource;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand_core::{OsRng, RngCore};

/// Smallest modulus size accepted by the builder.
pub const MIN_MODULUS_BITS: u64 = 16;

/// Miller-Rabin rounds per candidate unless configured otherwise.
pub const DEFAULT_PRIMALITY_ROUNDS: u32 = 20;

/// Candidates drawn per prime before giving up.
pub const DEFAULT_MAX_PRIME_ATTEMPTS: u64 = 10_000;

const SMALL_PRIMES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
];

/// Miller-Rabin probabilistic primality test with random witnesses.
pub fn is_probable_prime(n: &BigUint, rounds: u32) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);

    if *n < two {
        return false;
    }
    if n.is_even() {
        return *n == two;
    }
    for &p in SMALL_PRIMES.iter() {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    // n - 1 = 2^r * d
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1u32;
        r += 1;
    }

    // Witnesses are uniform in [2, n - 2].
    let span = n - BigUint::from(3u32);
    let mut witness_bytes = vec![0u8; n.to_bytes_be().len() + 8];

    'witness: for _ in 0..rounds {
        OsRng.fill_bytes(&mut witness_bytes);
        let a = BigUint::from_bytes_be(&witness_bytes) % &span + &two;

        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 1..r {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

fn is_blum(p: &BigUint) -> bool {
    (p % 4u32).to_u32() == Some(3)
}

/// A Blum integer `n = p * q` with distinct primes `p ≡ q ≡ 3 (mod 4)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Modulus {
    p: BigUint,
    q: BigUint,
    n: BigUint,
}

impl Modulus {
    /// Builds a modulus from known factors, checking every Blum condition.
    pub fn from_primes(p: BigUint, q: BigUint) -> Result<Self, GeneratorError> {
        if p == q {
            return Err(GeneratorError::InvalidModulus("factors are equal"));
        }
        if !is_blum(&p) || !is_blum(&q) {
            return Err(GeneratorError::InvalidModulus("factor not congruent to 3 mod 4"));
        }
        if !is_probable_prime(&p, DEFAULT_PRIMALITY_ROUNDS)
            || !is_probable_prime(&q, DEFAULT_PRIMALITY_ROUNDS)
        {
            return Err(GeneratorError::InvalidModulus("factor is composite"));
        }
        Ok(Self::from_verified(p, q))
    }

    fn from_verified(p: BigUint, q: BigUint) -> Self {
        let n = &p * &q;
        Self { p, q, n }
    }

    /// The modulus `n`.
    #[inline]
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// The first prime factor.
    #[inline]
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    /// The second prime factor.
    #[inline]
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Bit length of `n`.
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }
}

impl std::fmt::Debug for Modulus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modulus")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Searches for two Blum primes of half the requested modulus size.
///
/// Each prime search draws at most `max_attempts` candidates. A source
/// that keeps returning unusable values ends in
/// [`GeneratorError::GenerationExhausted`].
#[derive(Debug, Clone)]
pub struct ModulusBuilder {
    bits: u64,
    rounds: u32,
    max_attempts: u64,
}

impl ModulusBuilder {
    /// Creates a builder for a modulus of `bits` bits.
    pub fn new(bits: u64) -> Result<Self, GeneratorError> {
        if bits < MIN_MODULUS_BITS || bits % 2 != 0 {
            return Err(GeneratorError::InvalidBitLength(bits));
        }
        Ok(Self {
            bits,
            rounds: DEFAULT_PRIMALITY_ROUNDS,
            max_attempts: DEFAULT_MAX_PRIME_ATTEMPTS,
        })
    }

    /// Sets the Miller-Rabin round count (at least 10).
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(10);
        self
    }

    /// Sets the per-prime candidate cap.
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Requested modulus size.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Both primes drawn from one source, `p` first.
    pub fn build<S>(&self, source: &mut S) -> Result<Modulus, GeneratorError>
    where
        S: EntropySource + ?Sized,
    {
        let p = self.search_prime(source, None)?;
        let q = self.search_prime(source, Some(&p))?;
        Ok(self.finish(p, q))
    }

    /// Runs the two prime searches concurrently, one per source.
    pub fn build_parallel<A, B>(&self, first: &mut A, second: &mut B) -> Result<Modulus, GeneratorError>
    where
        A: EntropySource + Send + ?Sized,
        B: EntropySource + Send + ?Sized,
    {
        let (p, q) = rayon::join(
            || self.search_prime(first, None),
            || self.search_prime(second, None),
        );
        let p = p?;
        let mut q = q?;
        if q == p {
            q = self.search_prime(second, Some(&p))?;
        }
        Ok(self.finish(p, q))
    }

    fn finish(&self, p: BigUint, q: BigUint) -> Modulus {
        let modulus = Modulus::from_verified(p, q);
        tracing::info!(
            requested_bits = self.bits,
            modulus_bits = modulus.bits(),
            "BBS modulus built"
        );
        modulus
    }

    fn search_prime<S>(&self, source: &mut S, exclude: Option<&BigUint>) -> Result<BigUint, GeneratorError>
    where
        S: EntropySource + ?Sized,
    {
        let half = self.bits / 2;
        for attempt in 1..=self.max_attempts {
            let candidate = draw_candidate(source, half)?;
            if !is_blum(&candidate) || exclude == Some(&candidate) {
                continue;
            }
            if is_probable_prime(&candidate, self.rounds) {
                tracing::debug!(bits = half, attempts = attempt, "Blum prime found");
                return Ok(candidate);
            }
            tracing::trace!(attempt, "Prime candidate rejected");
        }

        tracing::warn!(
            attempts = self.max_attempts,
            "Prime search exhausted its candidate budget"
        );
        Err(GeneratorError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Draws an odd candidate of exactly `bits` bits.
fn draw_candidate<S>(source: &mut S, bits: u64) -> Result<BigUint, GeneratorError>
where
    S: EntropySource + ?Sized,
{
    let len = bits.div_ceil(8) as usize;
    let mut bytes = source.next_bytes(len)?;

    let excess = (len as u64 * 8 - bits) as u32;
    bytes[0] &= 0xFF >> excess;
    bytes[0] |= 0x80 >> excess;
    bytes[len - 1] |= 0x01;

    Ok(BigUint::from_bytes_be(&bytes))
}
