//! Metrics collection and registry.

use crate::analysis::BatteryReport;
use prometheus::{Encoder, GaugeVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus registry for generator and battery metrics.
pub struct MetricsRegistry {
    registry: Registry,
    bits_generated: IntCounter,
    modulus_bits: IntGauge,
    p_values: GaugeVec,
    verdicts: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a registry with every metric registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let bits_generated = IntCounter::new(
            "bbs_bits_generated_total",
            "Total bits emitted by BBS generators",
        )?;
        let modulus_bits = IntGauge::new("bbs_modulus_bits", "Bit length of the BBS modulus")?;
        let p_values = GaugeVec::new(
            Opts::new("bbs_test_p_value", "Latest p-value reported by each test"),
            &["test"],
        )?;
        let verdicts = IntCounterVec::new(
            Opts::new("bbs_test_verdicts_total", "Test outcomes by test and result"),
            &["test", "outcome"],
        )?;

        registry.register(Box::new(bits_generated.clone()))?;
        registry.register(Box::new(modulus_bits.clone()))?;
        registry.register(Box::new(p_values.clone()))?;
        registry.register(Box::new(verdicts.clone()))?;

        Ok(Self {
            registry,
            bits_generated,
            modulus_bits,
            p_values,
            verdicts,
        })
    }

    /// Counts emitted bits.
    pub fn record_bits(&self, bits: u64) {
        self.bits_generated.inc_by(bits);
    }

    /// Sets the modulus size.
    pub fn record_modulus(&self, bits: u64) {
        self.modulus_bits.set(bits as i64);
    }

    /// Records every outcome of a battery run.
    pub fn record_report(&self, report: &BatteryReport) {
        for (kind, outcome) in report.outcomes() {
            let outcome_label = match outcome {
                Ok(verdict) => {
                    self.p_values
                        .with_label_values(&[kind.label()])
                        .set(verdict.p_value);
                    if verdict.passed {
                        "passed"
                    } else {
                        "failed"
                    }
                }
                Err(_) => "error",
            };
            self.verdicts
                .with_label_values(&[kind.label(), outcome_label])
                .inc();
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
