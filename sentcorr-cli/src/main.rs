//! SentCorr CLI — run the price/sentiment correlation pipeline.
//!
//! Commands:
//! - `run` — fetch prices, derive sentiment, correlate, bin, and optionally
//!   export render artifacts
//! - `config` — print the effective configuration as TOML

mod export;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use sentcorr_core::data::{BinanceProvider, CsvProvider, PriceProvider, SyntheticProvider};
use sentcorr_core::domain::Timeframe;
use sentcorr_core::{AppConfig, PipelineOutput};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sentcorr",
    about = "SentCorr CLI — rolling correlation between price and return-derived sentiment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices and run the correlation pipeline.
    Run(RunArgs),
    /// Print the effective configuration (file plus overrides) as TOML.
    Config(ConfigArgs),
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Path to a TOML config file. Defaults reproduce the reference run.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trading pair, e.g. BTC/USDT.
    #[arg(long)]
    symbol: Option<String>,

    /// Candle interval: 1m, 5m, 15m, 30m, 1h, 4h, 1d.
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// Start of the range (YYYY-MM-DD or RFC 3339).
    #[arg(long)]
    start: Option<String>,

    /// End of the range (YYYY-MM-DD or RFC 3339).
    #[arg(long)]
    end: Option<String>,

    /// Maximum number of samples to fetch.
    #[arg(long)]
    limit: Option<usize>,

    /// Rolling correlation window, in samples.
    #[arg(long)]
    window: Option<usize>,

    /// Number of correlation buckets in the heatmap.
    #[arg(long)]
    bins: Option<usize>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: ConfigArgs,

    /// Import prices from a `timestamp,close` CSV instead of the exchange.
    #[arg(long, conflicts_with = "synthetic")]
    csv: Option<PathBuf>,

    /// Use a deterministic synthetic random walk instead of the exchange.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Write timeseries.csv, heatmap.json and manifest.json under this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run_cmd(args),
        Commands::Config(args) => config_cmd(&args),
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{e:#}"), "run failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let config = effective_config(&args.common)?;

    let provider: Box<dyn PriceProvider> = if let Some(path) = args.csv {
        Box::new(CsvProvider::new(path))
    } else if args.synthetic {
        Box::new(SyntheticProvider::new())
    } else {
        Box::new(BinanceProvider::new()?)
    };

    let output = sentcorr_core::run(
        provider.as_ref(),
        &config.fetch_request(),
        &config.pipeline_params(),
    )?;

    println!(
        "Fetched {} price points for {}",
        output.prices.len(),
        output.prices.symbol()
    );
    print_summary(&output);

    if let Some(dir) = args.output_dir {
        let run_dir = export::save_artifacts(&output, &config, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn config_cmd(args: &ConfigArgs) -> Result<()> {
    let config = effective_config(args)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Load the config file (or defaults) and apply command-line overrides.
fn effective_config(args: &ConfigArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(symbol) = &args.symbol {
        config.data.symbol = symbol.clone();
    }
    if let Some(timeframe) = args.timeframe {
        config.data.timeframe = timeframe;
    }
    if let Some(start) = &args.start {
        config.data.start = parse_time(start).context("invalid --start")?;
    }
    if let Some(end) = &args.end {
        config.data.end = parse_time(end).context("invalid --end")?;
    }
    if let Some(limit) = args.limit {
        config.data.limit = limit;
    }
    if let Some(window) = args.window {
        config.analysis.window = window;
    }
    if let Some(bins) = args.bins {
        config.analysis.n_bins = bins;
    }

    config.validate()?;
    Ok(config)
}

/// Accepts RFC 3339, or a bare date meaning midnight UTC.
fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => bail!("expected YYYY-MM-DD or RFC 3339, got '{s}'"),
    };
    match date.and_hms_opt(0, 0, 0) {
        Some(naive) => Ok(naive.and_utc()),
        None => bail!("invalid date '{s}'"),
    }
}

fn print_summary(output: &PipelineOutput) {
    let p = &output.params;
    println!();
    println!("=== Correlation Summary ===");
    if let (Some(first), Some(last)) = (
        output.prices.first_timestamp(),
        output.prices.last_timestamp(),
    ) {
        println!("Range:          {first} .. {last}");
    }
    println!(
        "Window:         {} samples, {} buckets, scale {}",
        p.window, p.n_bins, p.sentiment_scale
    );
    println!("Correlations:   {}", output.correlation.len());
    if output.correlation.degenerate_windows() > 0 {
        println!("Flat windows:   {}", output.correlation.degenerate_windows());
    }
    match output.correlation.mean() {
        Some(mean) => println!("Mean corr:      {mean:.4}"),
        None => println!("Mean corr:      n/a"),
    }
    println!("Dataset hash:   {}", output.dataset_hash);
    for diag in &output.diagnostics {
        println!("Note:           {diag}");
    }
}
