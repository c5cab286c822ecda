//! summary-xai CLI — explain AI-generated summaries with LIME and SHAP.
//!
//! Reads an article and its summary bullets, prints per-bullet token
//! attributions and optionally writes them as a JSON report.

mod render;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use summary_xai_core::XaiConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Explain AI-generated summaries with LIME and SHAP.
#[derive(Parser, Debug)]
#[command(name = "summary-xai", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON payload containing article and summary
    #[arg(long, required_unless_present = "show_config")]
    input: Option<PathBuf>,

    /// Optional path to write the explanation report as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of top tokens to keep in the LIME report [default: 8]
    #[arg(long)]
    lime_top: Option<usize>,

    /// Number of top tokens to keep in the SHAP report [default: 8]
    #[arg(long)]
    shap_top: Option<usize>,

    /// Maximum number of model evaluations for SHAP [default: 300]
    #[arg(long)]
    shap_max_evals: Option<usize>,

    /// Number of perturbed samples for LIME [default: 5000]
    #[arg(long)]
    lime_samples: Option<usize>,

    /// Random seed for LIME sampling [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the daily JSON log files [default: platform data dir]
    #[arg(long, env = "SUMMARY_XAI_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    show_config: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut XaiConfig) {
        if let Some(top) = self.lime_top {
            config.lime.top_k = top;
        }
        if let Some(top) = self.shap_top {
            config.shap.top_k = top;
        }
        if let Some(max_evals) = self.shap_max_evals {
            config.shap.max_evals = max_evals;
        }
        if let Some(samples) = self.lime_samples {
            config.lime.num_samples = samples;
        }
        if let Some(seed) = self.seed {
            config.lime.seed = seed;
        }
    }
}

fn init_tracing(
    verbose: u8,
    quiet: bool,
    log_dir: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // The report goes to stdout; keep stderr quiet unless asked.
    let filter = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = log_dir.map(Path::to_path_buf).or_else(|| {
        directories::ProjectDirs::from("dev", "summary-xai", "summary-xai")
            .map(|d| d.data_dir().join("logs"))
    });
    let (json_layer, guard) = match log_dir {
        Some(dir) if std::fs::create_dir_all(&dir).is_ok() => {
            let file_appender = tracing_appender::rolling::daily(&dir, "summary-xai.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();
    guard
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.quiet, cli.log_dir.as_deref());

    let workspace = std::env::current_dir().ok();
    let mut config = summary_xai_core::load_config(workspace.as_deref(), cli.config.as_deref())
        .context("Configuration error")?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.show_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .context("--input is required")?;
    let payload = summary_xai_core::load_payload(input)
        .with_context(|| format!("Failed to load payload from {}", input.display()))?;
    tracing::info!(
        bullets = payload.bullets().len(),
        lime_samples = config.lime.num_samples,
        shap_max_evals = config.shap.max_evals,
        "Explaining summary"
    );
    let report = summary_xai_core::build_report(&payload, &config)?;

    print!("{}", render::render_report(&report));

    if let Some(output) = &cli.output {
        summary_xai_core::write_report(output, &report)
            .with_context(|| format!("Failed to write report to {}", output.display()))?;
        println!("Report written to {}", output.display());
    }

    Ok(())
}
