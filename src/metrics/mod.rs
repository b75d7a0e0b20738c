//! Prometheus metrics for generator output and battery verdicts.
//!
//! # Metrics Exposed
//!
//! - `bbs_bits_generated_total` - Bits emitted by BBS generators
//! - `bbs_modulus_bits` - Bit length of the current modulus
//! - `bbs_test_p_value{test}` - Latest p-value per test
//! - `bbs_test_verdicts_total{test,outcome}` - Verdicts by outcome (`passed`, `failed`, `error`)
//!
//! # Example
//!
//! ```
//! use bbs_entropy::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.record_bits(6272);
//! assert!(registry.encode().unwrap().contains("bbs_bits_generated_total 6272"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
