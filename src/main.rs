//! Train a sigmoid MLP on `y = sin(x)^2` and log every step.
//!
//! Usage: cargo run --release -- --iterations 20000 --output data.txt

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::Rng;
use tracing_subscriber::EnvFilter;

use dense_mlp::builder::DEFAULT_LEARNING_RATE;
use dense_mlp::train::{self, RecordSink, TextSink};
use dense_mlp::{AnomalyPolicy, Initializer, MlpBuilder, SineSquared, TrainConfig};

#[derive(Parser, Debug)]
#[command(name = "dense-mlp")]
#[command(about = "Train a sigmoid MLP on sin(x)^2 with single-sample backprop", long_about = None)]
struct Cli {
    /// Number of forward/backprop steps
    #[arg(long, default_value_t = 20_000)]
    iterations: usize,

    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f64,

    /// Units in every hidden layer
    #[arg(long, default_value_t = 8)]
    hidden_units: usize,

    #[arg(long, default_value_t = 3)]
    hidden_layers: usize,

    /// Seed for weights and samples (OS entropy when absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Per-iteration log file
    #[arg(short, long, default_value = "data.txt")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Size of the first/last loss windows in the summary
    #[arg(long, default_value_t = 100)]
    window: usize,

    /// Progress log interval in iterations (0 disables)
    #[arg(long, default_value_t = 1_000)]
    log_every: usize,

    /// Zero out gradient entries with magnitude below 1e-4
    #[arg(long)]
    clip_gradients: bool,

    #[arg(long, value_enum, default_value_t = Policy::Warn)]
    anomaly_policy: Policy,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// `loss input target prediction` per line
    Text,
    /// One JSON object per line
    #[cfg(feature = "serde")]
    Jsonl,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Ignore,
    Warn,
    AbortOnNan,
}

impl From<Policy> for AnomalyPolicy {
    fn from(value: Policy) -> Self {
        match value {
            Policy::Ignore => AnomalyPolicy::Ignore,
            Policy::Warn => AnomalyPolicy::Warn,
            Policy::AbortOnNan => AnomalyPolicy::AbortOnNan,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut init = match cli.seed {
        Some(seed) => Initializer::new(seed),
        None => Initializer::from_entropy(),
    };

    let mut mlp = MlpBuilder::uniform_hidden(1, 1, cli.hidden_units, cli.hidden_layers)?
        .learning_rate(cli.learning_rate)?
        .gradient_clipping(cli.clip_gradients)
        .build_with_initializer(&mut init)
        .context("failed to build model")?;

    // Samples come from a generator derived from the model's, so a seed pins both.
    let sample_seed: u64 = init.rng_mut().r#gen();
    let mut sampler = SineSquared::new(Initializer::new(sample_seed));

    let cfg = TrainConfig {
        iterations: cli.iterations,
        window: cli.window,
        log_every: cli.log_every,
        anomaly_policy: cli.anomaly_policy.into(),
    };

    let file = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let out = BufWriter::new(file);
    let mut sink: Box<dyn RecordSink> = match cli.format {
        Format::Text => Box::new(TextSink::new(out)),
        #[cfg(feature = "serde")]
        Format::Jsonl => Box::new(train::JsonLinesSink::new(out)),
    };

    let report = train::fit(&mut mlp, &mut sampler, sink.as_mut(), &cfg)
        .context("training failed")?;

    tracing::info!(
        output = %cli.output.display(),
        first_window_mean = report.first_window_mean,
        last_window_mean = report.last_window_mean,
        final_loss = report.final_loss,
        "done"
    );

    #[cfg(feature = "serde")]
    println!("{}", serde_json::to_string_pretty(&report)?);
    #[cfg(not(feature = "serde"))]
    println!("{report:?}");

    Ok(())
}
