//! Blum-Blum-Shub Randomness Library
//!
//! Harvests seed material from an entropy source, feeds it into a
//! Blum-Blum-Shub bit generator, and validates the generator's output with
//! a battery of statistical tests loosely following NIST SP 800-22.
//!
//! # Architecture
//!
//! ```text
//! entropy → generator (modulus builder → BBS) → bits → analysis (battery)
//!                                                          ↓
//!                                                       metrics
//! ```
//!
//! # Design Principles
//!
//! - **Deterministic core**: identical modulus and seed always give identical bits
//! - **Single owner state**: a generator is a plain value; share it behind a lock
//! - **Pure tests**: every statistical test is a function of its input buffer
//! - **Sanity checks, not proofs**: passing the battery does not certify randomness
//!
//! # Example
//!
//! ```
//! use bbs_entropy::{
//!     analysis::Battery,
//!     entropy::RngSource,
//!     generator::{BbsGenerator, ModulusBuilder},
//! };
//!
//! let builder = ModulusBuilder::new(128).unwrap();
//! let mut source = RngSource::chacha(2024);
//! let mut bbs = BbsGenerator::from_source(&builder, &mut source).unwrap();
//!
//! let report = Battery::default().run_generator(&mut bbs);
//! assert_eq!(report.outcomes().len(), 5);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod bits;
pub mod config;
pub mod entropy;
pub mod generator;
pub mod metrics;

// Re-export commonly used types at crate root
pub use analysis::{Battery, BatteryConfig, BatteryReport, Significance, TestError, TestKind, TestVerdict};
pub use bits::BitBuffer;
pub use config::FileConfig;
pub use entropy::{DeviceSource, EntropyError, EntropySource, HarvestPool, ReplaySource, RngSource};
pub use generator::{BbsGenerator, GeneratorError, Modulus, ModulusBuilder};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
