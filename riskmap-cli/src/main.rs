//! riskmap CLI: assess AI models against frontier safety frameworks and the
//! EU AI Act compute threshold, and explore the loaded catalog.

mod commands;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// riskmap: Frontier AI Risk Threshold Mapper
#[derive(Parser, Debug)]
#[command(name = "riskmap", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (config and relative data paths resolve here)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Directory holding frameworks.json, eu_compliance.json and compute_thresholds.json
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Assess a model against every loaded framework
    Assess {
        /// Model name
        #[arg(short, long, default_value = "GPT-5")]
        name: String,
        /// Training compute in FLOPs, e.g. 1e25
        #[arg(short, long, default_value = "1e25")]
        compute: String,
        /// Parameter count in billions
        #[arg(short, long)]
        parameters: Option<f64>,
        /// Demonstrated capability (repeatable), e.g. "Cyber offense"
        #[arg(long = "capability")]
        capabilities: Vec<String>,
        /// Passed evaluation (repeatable), e.g. "METR bio eval"
        #[arg(long = "evaluation")]
        evaluations: Vec<String>,
        /// Show which trigger selected each tier
        #[arg(long)]
        explain: bool,
        /// Emit the assessment as JSON
        #[arg(long)]
        json: bool,
    },
    /// List frameworks and their risk tiers
    Frameworks {
        #[arg(long)]
        json: bool,
    },
    /// Show capability coverage and tier counts across frameworks
    Coverage {
        #[arg(long)]
        json: bool,
    },
    /// Show the compute-threshold reference table
    Thresholds {
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "riskmap", "riskmap")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "riskmap.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let overrides = riskmap_core::ConfigOverrides {
        data_dir: cli.data_dir,
    };
    let config = riskmap_core::load_config(Some(&workspace), Some(&overrides))
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    tracing::debug!(
        workspace = %workspace.display(),
        data_dir = %config.data.data_dir.display(),
        "Configuration loaded"
    );

    commands::handle_command(cli.command, &config)
}
