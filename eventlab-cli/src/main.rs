//! EventLab CLI: run event studies from the command line.
//!
//! Commands:
//! - `run`: batch study from a TOML config file, with artifacts on disk
//! - `single`: one event against CSV files or synthetic data

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use eventlab_core::data::FAMA_FRENCH;
use eventlab_core::{EventWindow, ModelKind, ReturnStore, WindowSpec};
use eventlab_runner::data_loader::{import_fama_french, import_returns, ReturnsImport};
use eventlab_runner::{
    car_distribution_table, error_report, export_json, run_batch, save_artifacts,
    synthetic_fama_french, synthetic_returns, Decimals, ResultsTable, StudyConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eventlab", about = "EventLab CLI: event studies on security returns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch study described by a TOML config file.
    Run {
        /// Path to the study TOML file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts; each study gets a subdirectory named by its id.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Decimals shown in the printed tables.
        #[arg(long, default_value_t = 3)]
        decimals: usize,

        /// Also print the CAR distribution table.
        #[arg(long, default_value_t = false)]
        distribution: bool,
    },
    /// Run one event study and print its results table.
    Single {
        /// Security ticker (column in the returns file).
        #[arg(long)]
        security: String,

        /// Market ticker, required by the market model.
        #[arg(long)]
        market: Option<String>,

        /// Event date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// market_model, constant_mean, fama_french_3factor or fama_french_5factor.
        #[arg(long, default_value = "market_model")]
        model: ModelKind,

        /// First offset of the event window.
        #[arg(long, default_value_t = -10, allow_hyphen_values = true)]
        start: i32,

        /// Last offset of the event window.
        #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
        end: i32,

        #[arg(long, default_value_t = 300)]
        estimation_size: usize,

        #[arg(long, default_value_t = 30)]
        buffer_size: usize,

        /// Returns (or prices, with --is-price) CSV with a `date` column.
        #[arg(long)]
        returns: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        is_price: bool,

        /// Convert prices to simple instead of log returns.
        #[arg(long, default_value_t = false)]
        simple_returns: bool,

        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,

        /// Fama-French factors CSV (in percent).
        #[arg(long)]
        fama_french: Option<PathBuf>,

        #[arg(long, default_value = "%Y%m%d")]
        ff_date_format: String,

        /// Use synthetic returns and factors instead of files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Confidence level of the CAR band to print (e.g. 0.90).
        #[arg(long)]
        confidence: Option<f64>,

        #[arg(long, default_value_t = 3)]
        decimals: usize,

        /// Print the full result as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            decimals,
            distribution,
        } => run_study(config, output_dir, decimals, distribution),
        Commands::Single {
            security,
            market,
            date,
            model,
            start,
            end,
            estimation_size,
            buffer_size,
            returns,
            is_price,
            simple_returns,
            date_format,
            fama_french,
            ff_date_format,
            synthetic,
            confidence,
            decimals,
            json,
        } => {
            let event_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("invalid event date '{date}'"))?;
            let spec = WindowSpec::new(EventWindow::new(start, end)?, estimation_size, buffer_size)?;
            if model.needs_market() && market.is_none() {
                bail!("--market is required by {model}");
            }

            let store = if synthetic {
                synthetic_store(&security, market.as_deref(), event_date, &spec)?
            } else {
                let Some(returns) = returns else {
                    bail!("one of --returns or --synthetic is required");
                };
                let mut store = ReturnStore::new();
                let opts = ReturnsImport {
                    is_price,
                    log_return: !simple_returns,
                    date_format,
                };
                store.insert(
                    import_returns(&returns, &opts)
                        .with_context(|| format!("failed to import {}", returns.display()))?,
                );
                if let Some(ff) = fama_french {
                    store.insert(
                        import_fama_french(&ff, true, &ff_date_format)
                            .with_context(|| format!("failed to import {}", ff.display()))?,
                    );
                }
                store
            };
            if model.needs_factors() && !store.contains(FAMA_FRENCH) {
                bail!("--fama-french is required by {model}");
            }

            let event = model.run(&store, &security, market.as_deref(), event_date, &spec, true)?;
            if json {
                println!("{}", export_json(&event)?);
                return Ok(());
            }

            if let Some(description) = event.description() {
                println!("{description}");
            }
            println!("{}", event.results_table(true, &Decimals::Uniform(decimals)));
            println!("Significance level: *** at 99%, ** at 95%, * at 90%");

            if let Some(level) = confidence {
                let band = event.confidence_band(level);
                println!("\nCAR confidence band at {:.0}%:", level * 100.0);
                for ((t, lower), upper) in event.event_window().offsets().zip(&band.lower).zip(&band.upper) {
                    println!("{t:>4}  [{lower:.decimals$}, {upper:.decimals$}]");
                }
            }
            Ok(())
        }
    }
}

fn run_study(config_path: PathBuf, output_dir: PathBuf, decimals: usize, distribution: bool) -> Result<()> {
    let config = StudyConfig::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let study_id = config.study_id();
    info!(study_id = %study_id, model = %config.model, "starting study");

    let store = config.load_store()?;
    let events = config.load_events()?;
    let result = run_batch(&store, &events, &config.batch_options()?)?;

    let decimals = Decimals::Uniform(decimals);
    println!("{}", result.results_table(true, &decimals));
    println!("Significance level: *** at 99%, ** at 95%, * at 90%");
    if distribution {
        println!("\n{}", car_distribution_table(&result, &decimals));
    }
    if !result.errors().is_empty() {
        println!("\n{}", error_report(result.errors()));
    }

    let run_dir = save_artifacts(&result, &study_id, &output_dir)?;
    println!("\nArtifacts saved to: {}", run_dir.display());
    Ok(())
}

/// Synthetic returns around `event_date`, long enough for `spec`.
fn synthetic_store(
    security: &str,
    market: Option<&str>,
    event_date: NaiveDate,
    spec: &WindowSpec,
) -> Result<ReturnStore> {
    // business days are ~5/7 of calendar days; start early enough to cover the lead
    let lead = spec.estimation_size + spec.buffer_size + spec.event_window.start.unsigned_abs() as usize;
    let lead_days = (lead * 7 / 5 + 30) as u64;
    let start = event_date
        .checked_sub_days(chrono::Days::new(lead_days))
        .context("event date too early for synthetic data")?;
    let days = lead + spec.event_window_size() + 60;

    let market = market.unwrap_or("MARKET");
    let mut store = ReturnStore::new();
    store.insert(synthetic_returns(&[market, security], start, days, 42)?);
    store.insert(synthetic_fama_french(start, days, 42)?);
    Ok(store)
}
