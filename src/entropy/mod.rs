//! Entropy sources consumed by the modulus builder and generator seeding.
//!
//! Every source implements [`EntropySource`]. Library-backed sources
//! ([`RngSource`]) and replayed bytes ([`ReplaySource`]) answer immediately;
//! [`DeviceSource`] blocks on a bounded [`HarvestPool`] filled by one reader
//! thread per input device.

mod device;
mod pool;
mod source;

pub use device::{DeviceSource, ExtractionPolicy, Harvester, InputEvent, EVENT_SIZE, EV_KEY};
pub use pool::{HarvestPool, DEFAULT_POOL_CAPACITY};
pub use source::{EntropyError, EntropySource, ReplaySource, RngSource};
