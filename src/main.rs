//! BBS Randomness CLI
//!
//! Builds a Blum-Blum-Shub generator from the configured entropy source,
//! draws the battery samples and prints one line per test.

use bbs_entropy::{
    analysis::Battery,
    config::{ConfigError, FileConfig, SourceKind},
    entropy::{DeviceSource, EntropySource, ReplaySource, RngSource},
    generator::{BbsGenerator, ModulusBuilder},
    metrics::MetricsRegistry,
};
use clap::{Parser, ValueEnum};
use rand_core::{OsRng, RngCore};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

/// Seed a BBS generator and run the statistical test battery on its output.
#[derive(Debug, Parser)]
#[command(name = "bbs-entropy", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Entropy source for the modulus and seed.
    #[arg(short, long, value_enum)]
    source: Option<SourceArg>,

    /// ChaCha seed for the `chacha` source.
    #[arg(long)]
    seed: Option<u64>,

    /// Replay file for the `file` source.
    #[arg(long)]
    entropy_file: Option<PathBuf>,

    /// Modulus size in bits.
    #[arg(short, long)]
    modulus_bits: Option<u64>,

    /// Search both primes concurrently.
    #[arg(long)]
    parallel: bool,

    /// Print Prometheus metrics after the report.
    #[arg(long)]
    metrics: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Chacha,
    Os,
    Devices,
    File,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Chacha => SourceKind::Chacha,
            SourceArg::Os => SourceKind::Os,
            SourceArg::Devices => SourceKind::Devices,
            SourceArg::File => SourceKind::File,
        }
    }
}

type BoxedSource = Box<dyn EntropySource + Send>;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("BBS entropy v{}", bbs_entropy::VERSION);

    if let Err(e) = run(&config, cli.metrics) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    if let Some(source) = cli.source {
        config.source.kind = source.into();
    }
    if cli.seed.is_some() {
        config.source.seed = cli.seed;
    }
    if cli.entropy_file.is_some() {
        config.source.path = cli.entropy_file.clone();
    }
    if let Some(bits) = cli.modulus_bits {
        config.generator.modulus_bits = bits;
    }
    if cli.parallel {
        config.generator.parallel = true;
    }

    config.validate()?;
    Ok(config)
}

fn open_source(config: &FileConfig, stream: u64) -> Result<BoxedSource, Box<dyn std::error::Error>> {
    let source = &config.source;
    let boxed: BoxedSource = match source.kind {
        SourceKind::Chacha => {
            let seed = source.seed.unwrap_or_else(|| OsRng.next_u64());
            info!(seed, stream, "Using ChaCha20 entropy source");
            Box::new(RngSource::chacha(seed.wrapping_add(stream)))
        }
        SourceKind::Os => Box::new(RngSource::os()),
        SourceKind::Devices => {
            let devices = DeviceSource::open(&source.device_dir, source.policy, source.capacity)?;
            let pool = devices.pool();
            if let Err(e) = ctrlc::set_handler(move || pool.cancel()) {
                warn!("Failed to install interrupt handler: {}", e);
            }
            Box::new(devices)
        }
        SourceKind::File => {
            let path = source
                .path
                .as_ref()
                .ok_or(ConfigError::MissingSourceSetting(SourceKind::File, "path"))?;
            Box::new(ReplaySource::from_file(path)?)
        }
    };
    Ok(boxed)
}

fn run(config: &FileConfig, print_metrics: bool) -> Result<(), Box<dyn std::error::Error>> {
    let builder = ModulusBuilder::new(config.generator.modulus_bits)?
        .with_rounds(config.generator.primality_rounds)
        .with_max_attempts(config.generator.max_prime_attempts);

    let parallel = config.generator.parallel
        && matches!(config.source.kind, SourceKind::Chacha | SourceKind::Os);
    if config.generator.parallel && !parallel {
        warn!("Parallel prime search needs two independent sources; searching sequentially");
    }

    info!(bits = builder.bits(), parallel, "Building BBS modulus...");

    let mut generator = if parallel {
        let mut first = open_source(config, 0)?;
        let mut second = open_source(config, 1)?;
        BbsGenerator::from_parallel_sources(&builder, &mut first, &mut second)?
    } else {
        let mut source = open_source(config, 0)?;
        BbsGenerator::from_source(&builder, &mut source)?
    };

    let battery = Battery::new(config.battery.clone());
    let report = battery.run_generator(&mut generator);

    let stdout = io::stdout();
    report.write_to(&mut stdout.lock())?;

    info!(
        "Battery finished: {}/{} tests passed",
        report.passed(),
        report.outcomes().len()
    );

    if print_metrics {
        let registry = MetricsRegistry::new()?;
        registry.record_modulus(generator.modulus().bits());
        registry.record_bits(generator.bits_emitted());
        registry.record_report(&report);
        print!("{}", registry.encode()?);
    }

    Ok(())
}
