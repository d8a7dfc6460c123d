use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use hotelstat_core::catalog::default_catalog;
use hotelstat_core::config::{PipelineConfig, CONFIG_ENV};
use hotelstat_core::decompose::{DecompositionOutcome, DecompositionSkipped};
use hotelstat_core::fetch::HttpFetcher;
use hotelstat_core::frames::{decomposition_frame, series_frame, write_parquet};
use hotelstat_core::parser::TableExtractor;
use hotelstat_core::pipeline::{run_batch, BatchReport, SeriesOutcome, SeriesReport};
use hotelstat_core::summary::{MonthlyProfile, SeriesSummary};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "INSEE hotel occupancy series toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, align and decompose the configured series
    Run(RunArgs),
    /// List the built-in series catalog
    Catalog,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// TOML configuration file (defaults to $HOTELSTAT_CONFIG, then the built-in catalog)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write one parquet file per series and component table into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Print a JSON report instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Command::Run(args) => run(args, today),
        Command::Catalog => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Region", "Kind", "URL"]);
            for spec in default_catalog(today) {
                table.add_row(vec![
                    spec.region.to_string(),
                    spec.kind.to_string(),
                    spec.url,
                ]);
            }
            println!("{table}");
            Ok(())
        }
    }
}

fn run(args: RunArgs, today: chrono::NaiveDate) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let specs = config
        .resolve_series(today)
        .context("Failed to resolve configured series")?;
    if specs.is_empty() {
        bail!("No series configured");
    }

    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;
    let report = run_batch(&fetcher, &specs, &TableExtractor::new());

    if let Some(dir) = args.output_dir.as_deref() {
        export_frames(&report, dir)?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&JsonReport::from_batch(&report))
            .context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!("{}", summary_table(&report));
    }

    if report.all_unavailable() {
        bail!("All {} series are unavailable", report.len());
    }
    Ok(())
}

fn load_config(flag: Option<&Path>) -> Result<PipelineConfig> {
    let path = flag
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config
        .apply_overrides(|key| std::env::var(key).ok())
        .context("Invalid environment override")?;
    Ok(config)
}

fn export_frames(report: &BatchReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    for series in report.available() {
        let stem = file_stem(series);

        let observations = series_frame(&series.series)?;
        let path = dir.join(format!("{stem}_series.parquet"));
        write_parquet(&observations, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let components = decomposition_frame(&series.aligned, &series.decomposition)?;
        let path = dir.join(format!("{stem}_components.parquet"));
        write_parquet(&components, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(region = series.spec.region.as_str(), dir = %dir.display(), "Wrote parquet output");
    }
    Ok(())
}

fn file_stem(report: &SeriesReport) -> String {
    let region: String = report
        .spec
        .region
        .as_str()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{region}_{}", report.spec.kind)
}

fn decomposition_status(outcome: &DecompositionOutcome) -> String {
    match outcome {
        DecompositionOutcome::Decomposed(_) => "decomposed".to_string(),
        DecompositionOutcome::Skipped(DecompositionSkipped::InsufficientHistory {
            points,
            required,
        }) => format!("skipped ({points}/{required} points)"),
    }
}

fn summary_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "Region",
        "Kind",
        "Points",
        "First",
        "Last",
        "Mean",
        "Direction",
        "Decomposition",
    ]);

    for outcome in &report.outcomes {
        match outcome {
            SeriesOutcome::Available(series) => {
                let row = match SeriesSummary::from_series(&series.series) {
                    Some(summary) => vec![
                        summary.region.clone(),
                        summary.kind.to_string(),
                        summary.observations.to_string(),
                        format!("{} ({:.1})", summary.first_month.format("%Y-%m"), summary.first_value),
                        format!("{} ({:.1})", summary.last_month.format("%Y-%m"), summary.last_value),
                        format!("{:.2}", summary.mean),
                        summary.direction.as_str().to_string(),
                        decomposition_status(&series.decomposition),
                    ],
                    None => vec![series.spec.region.to_string(), series.spec.kind.to_string()],
                };
                table.add_row(row);
            }
            SeriesOutcome::Unavailable { spec, unavailable } => {
                table.add_row(vec![
                    spec.region.to_string(),
                    spec.kind.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    format!("unavailable: {}", unavailable.reason.as_str()),
                ]);
            }
        }
    }
    table
}

#[derive(Serialize)]
struct JsonReport<'a> {
    available: Vec<JsonSeries<'a>>,
    unavailable: Vec<JsonUnavailable<'a>>,
}

#[derive(Serialize)]
struct JsonSeries<'a> {
    region: &'a str,
    url: &'a str,
    archive_hash: &'a str,
    entry: &'a str,
    encoding: &'a str,
    dropped_rows: usize,
    imputed_months: usize,
    summary: Option<SeriesSummary>,
    profile: MonthlyProfile,
    decomposition: String,
    seasonal_indices: Option<Vec<f64>>,
}

#[derive(Serialize)]
struct JsonUnavailable<'a> {
    region: &'a str,
    url: &'a str,
    reason: &'a str,
    detail: &'a str,
}

impl<'a> JsonReport<'a> {
    fn from_batch(report: &'a BatchReport) -> Self {
        let available = report
            .available()
            .map(|series| JsonSeries {
                region: series.spec.region.as_str(),
                url: series.spec.url.as_str(),
                archive_hash: series.archive_hash.as_str(),
                entry: series.entry.as_str(),
                encoding: series.encoding,
                dropped_rows: series.dropped_rows,
                imputed_months: series.aligned.imputed_count(),
                summary: SeriesSummary::from_series(&series.series),
                profile: MonthlyProfile::from_series(&series.series),
                decomposition: decomposition_status(&series.decomposition),
                seasonal_indices: series
                    .decomposition
                    .decomposition()
                    .map(|d| d.seasonal_indices().to_vec()),
            })
            .collect();

        let unavailable = report
            .unavailable()
            .map(|(spec, unavailable)| JsonUnavailable {
                region: spec.region.as_str(),
                url: spec.url.as_str(),
                reason: unavailable.reason.as_str(),
                detail: unavailable.detail.as_str(),
            })
            .collect();

        Self {
            available,
            unavailable,
        }
    }
}
