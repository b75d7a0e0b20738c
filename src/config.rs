//! File configuration.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration.

use crate::analysis::BatteryConfig;
use crate::entropy::{ExtractionPolicy, DEFAULT_POOL_CAPACITY};
use crate::generator::{DEFAULT_MAX_PRIME_ATTEMPTS, DEFAULT_PRIMALITY_ROUNDS, MIN_MODULUS_BITS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid modulus size {0} (must be even and at least 16)")]
    InvalidModulusBits(u64),
    #[error("primality rounds must be at least 10")]
    InvalidRounds,
    #[error("block size must be positive")]
    InvalidBlockSize,
    #[error("sample size must be positive")]
    InvalidSampleSize,
    #[error("significance levels must lie strictly between 0 and 1")]
    InvalidSignificance,
    #[error("source kind {0:?} requires {1}")]
    MissingSourceSetting(SourceKind, &'static str),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Modulus construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Size of `n` in bits.
    pub modulus_bits: u64,
    /// Miller-Rabin rounds per candidate.
    pub primality_rounds: u32,
    /// Candidates per prime before giving up.
    pub max_prime_attempts: u64,
    /// Search both primes concurrently.
    pub parallel: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            modulus_bits: 512,
            primality_rounds: DEFAULT_PRIMALITY_ROUNDS,
            max_prime_attempts: DEFAULT_MAX_PRIME_ATTEMPTS,
            parallel: false,
        }
    }
}

/// Where seed material comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// ChaCha20 keyed from `seed`.
    #[default]
    Chacha,
    /// The operating system.
    Os,
    /// Harvested input device events.
    Devices,
    /// Bytes replayed from `path`.
    File,
}

/// Entropy source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// ChaCha seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Directory scanned for `event*` devices.
    pub device_dir: PathBuf,
    /// Seed extraction policy for device events.
    pub policy: ExtractionPolicy,
    /// Harvest pool capacity in bytes.
    pub capacity: usize,
    /// Replay file for the `file` source.
    pub path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            seed: None,
            device_dir: PathBuf::from("/dev/input"),
            policy: ExtractionPolicy::default(),
            capacity: DEFAULT_POOL_CAPACITY,
            path: None,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
}

impl FileConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bits = self.generator.modulus_bits;
        if bits < MIN_MODULUS_BITS || bits % 2 != 0 {
            return Err(ConfigError::InvalidModulusBits(bits));
        }
        if self.generator.primality_rounds < 10 {
            return Err(ConfigError::InvalidRounds);
        }
        if self.battery.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }
        if self.battery.sample_bits == 0 || self.battery.matrix_bits == 0 {
            return Err(ConfigError::InvalidSampleSize);
        }
        if !self.battery.significance.is_valid() {
            return Err(ConfigError::InvalidSignificance);
        }
        if self.source.kind == SourceKind::File && self.source.path.is_none() {
            return Err(ConfigError::MissingSourceSetting(SourceKind::File, "path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LongestRunVariant;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.battery.sample_bits, 6272);
        assert_eq!(config.battery.matrix_bits, 38_912);
        assert_eq!(config.source.capacity, 1000);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.generator.modulus_bits, 512);
        assert_eq!(config.source.kind, SourceKind::Chacha);
    }

    #[test]
    fn test_parse_sections() {
        let config = FileConfig::from_toml(
            r#"
            [generator]
            modulus_bits = 256
            parallel = true

            [source]
            kind = "devices"
            policy = "key_timestamp_nibbles"

            [battery]
            block_size = 128
            longest_run = "m8"

            [battery.significance]
            runs = 0.05
            "#,
        )
        .unwrap();

        assert_eq!(config.generator.modulus_bits, 256);
        assert!(config.generator.parallel);
        assert_eq!(config.source.kind, SourceKind::Devices);
        assert_eq!(config.source.policy, ExtractionPolicy::KeyTimestampNibbles);
        assert_eq!(config.battery.longest_run, LongestRunVariant::M8);
        assert_eq!(config.battery.significance.runs, 0.05);
        assert_eq!(config.battery.significance.frequency, 0.01);
    }

    #[test]
    fn test_odd_modulus_invalid() {
        let result = FileConfig::from_toml("[generator]\nmodulus_bits = 255\n");
        assert!(matches!(result, Err(ConfigError::InvalidModulusBits(255))));
    }

    #[test]
    fn test_file_source_requires_path() {
        let result = FileConfig::from_toml("[source]\nkind = \"file\"\n");
        assert!(matches!(
            result,
            Err(ConfigError::MissingSourceSetting(SourceKind::File, "path"))
        ));
    }

    #[test]
    fn test_bad_significance_invalid() {
        let result = FileConfig::from_toml("[battery.significance]\nfrequency = 0.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidSignificance)));
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result = FileConfig::from_toml("[battery]\nlongest_run = \"m64\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
