//! The entropy source capability and its in-process implementations.

use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use thiserror::Error;

/// Errors surfaced by entropy sources.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntropyError {
    #[error("entropy harvesting was cancelled")]
    Cancelled,
    #[error("entropy source exhausted: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },
    #[error("no readable input devices under {0}")]
    NoDevices(String),
    #[error("entropy source i/o error: {0}")]
    Io(String),
}

/// A producer of raw entropy bytes.
pub trait EntropySource {
    /// Fills `dest` completely, blocking until satisfied or cancelled.
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError>;

    /// Returns exactly `count` bytes.
    fn next_bytes(&mut self, count: usize) -> Result<Vec<u8>, EntropyError> {
        let mut bytes = vec![0u8; count];
        self.fill(&mut bytes)?;
        Ok(bytes)
    }

    /// Releases any underlying resources.
    fn close(&mut self) {}
}

impl<S: EntropySource + ?Sized> EntropySource for &mut S {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        (**self).fill(dest)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

impl<S: EntropySource + ?Sized> EntropySource for Box<S> {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        (**self).fill(dest)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Entropy drawn from a `rand_core` generator.
///
/// [`RngSource::chacha`] is the deterministic, trusted library source used
/// for reproducible runs; [`RngSource::os`] reads the operating system.
pub struct RngSource<R> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Returns the wrapped generator.
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngSource<ChaCha20Rng> {
    /// A ChaCha20 stream keyed from a 64-bit seed.
    pub fn chacha(seed: u64) -> Self {
        Self::new(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl RngSource<OsRng> {
    /// The operating system's entropy source.
    pub fn os() -> Self {
        Self::new(OsRng)
    }
}

impl<R: RngCore> EntropySource for RngSource<R> {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.rng
            .try_fill_bytes(dest)
            .map_err(|e| EntropyError::Io(e.to_string()))
    }
}

/// Replays a fixed byte sequence once, then reports exhaustion.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    data: Vec<u8>,
    position: usize,
}

impl ReplaySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Reads the whole file as replay material.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, EntropyError> {
        let data = std::fs::read(path.as_ref()).map_err(|e| EntropyError::Io(e.to_string()))?;
        Ok(Self::new(data))
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl EntropySource for ReplaySource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        if dest.len() > self.remaining() {
            return Err(EntropyError::Exhausted {
                requested: dest.len(),
                available: self.remaining(),
            });
        }
        let end = self.position + dest.len();
        dest.copy_from_slice(&self.data[self.position..end]);
        self.position = end;
        Ok(())
    }
}
