// Entry point and high-level CLI flow.
//
// One invocation loads the trip dataset, builds every aggregate view, renders
// the report in the chosen format and writes it out. Nothing is kept between
// runs.
mod charts;
mod derive;
mod error;
mod loader;
mod output;
mod palette;
mod reports;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use output::OutputFormat;
use palette::{CategoryPolicy, Palette};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SOURCE: &str =
    "https://huggingface.co/datasets/almaqbalim/BikeShare/resolve/main/dataset.csv";

#[derive(Parser, Debug)]
#[command(name = "bikeshare_report")]
#[command(about = "Render a usage report from a bike-share trip CSV", long_about = None)]
struct Cli {
    /// Path or URL of the trip CSV
    #[arg(value_name = "FILE_OR_URL", default_value = DEFAULT_SOURCE)]
    source: String,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// Where to write the report ("-" for stdout) [default: report.<format extension>]
    #[arg(short, long)]
    output: Option<String>,

    /// Fail instead of using a fallback colour when a user type other than
    /// casual/member appears
    #[arg(long)]
    strict_categories: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let (records, _load_report) = loader::load_trips(&cli.source)?;
    let report = reports::generate_report(&records);
    info!(
        trips = report.overview.total_trips,
        user_types = report.overview.user_types.len(),
        "aggregates ready"
    );

    let policy = if cli.strict_categories {
        CategoryPolicy::Strict
    } else {
        CategoryPolicy::Fallback
    };
    let palette = Palette::resolve(&report.overview.user_types, policy)?;

    let rendered = output::render(cli.format, &report, &palette)?;
    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.format.default_output());
    output::write_output(&path, &rendered)
        .with_context(|| format!("writing report to {}", path))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli)
}
