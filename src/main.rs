//! CLI entry point for the EMLURB service-request dashboard.
//!
//! Provides subcommands for preparing the cleaned dataset, writing the
//! dashboard report, and logging each tab's KPI cards.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use emlurb_dashboard::config::PipelineConfig;
use emlurb_dashboard::dashboard::{DashboardFilter, Tab, build_report, tab_report};
use emlurb_dashboard::model::{Dataset, Status, Zone};
use emlurb_dashboard::{output, pipeline};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "emlurb_dashboard")]
#[command(about = "Prepares the 156 service-request log and computes dashboard aggregates", long_about = None)]
struct Cli {
    /// JSON pipeline config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source CSV (overrides config file and EMLURB_SOURCE_PATH)
    #[arg(short, long, global = true)]
    source: Option<PathBuf>,

    /// Target year (overrides config file and EMLURB_TARGET_YEAR)
    #[arg(long, global = true)]
    year: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write the cleaned dataset as CSV
    Prepare {
        /// CSV file to write
        #[arg(short, long, default_value = "chamados_tratados.csv")]
        output: PathBuf,
    },
    /// Compute every dashboard tab and write the report as JSON
    Report {
        /// JSON file to write, or "-" to log it
        #[arg(short, long, default_value = "dashboard.json")]
        output: String,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Log the KPI cards of every tab
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Sidebar selection. An omitted option selects every value present.
#[derive(Args)]
struct FilterArgs {
    /// Zone to include (repeatable), e.g. "Norte" or "Nao Informado"
    #[arg(long = "zone", value_name = "ZONE")]
    zones: Vec<Zone>,

    /// Month to include, 1-12 (repeatable)
    #[arg(
        long = "month",
        value_name = "MONTH",
        value_parser = clap::value_parser!(u32).range(1..=12)
    )]
    months: Vec<u32>,

    /// Status to include (repeatable), e.g. ATENDIDA
    #[arg(long = "status", value_name = "STATUS")]
    statuses: Vec<Status>,
}

impl FilterArgs {
    fn resolve(self, dataset: &Dataset) -> DashboardFilter {
        let mut filter = DashboardFilter::from_dataset(dataset);
        if !self.zones.is_empty() {
            filter = filter.with_zones(self.zones);
        }
        if !self.months.is_empty() {
            filter = filter.with_months(self.months);
        }
        if !self.statuses.is_empty() {
            filter = filter.with_statuses(self.statuses);
        }
        filter
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/emlurb_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("emlurb_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.source, cli.year)?;

    let dataset = pipeline::prepare(&config)?;

    match cli.command {
        Commands::Prepare { output: path } => {
            output::write_dataset(&path, &dataset)?;
            info!(path = %path.display(), rows = dataset.len(), "Cleaned dataset written");
        }
        Commands::Report {
            output: path,
            filter,
        } => {
            let filter = filter.resolve(&dataset);
            let report = build_report(&dataset, &filter, config.target_year);

            if path == "-" {
                output::print_json(&report)?;
            } else {
                output::write_report(&path, &report)?;
                info!(path = %path, tabs = report.tabs.len(), "Dashboard report written");
            }
        }
        Commands::Summary { filter } => {
            let filter = filter.resolve(&dataset);
            output::print_pretty(&filter);

            for tab in Tab::tabs_for(&dataset) {
                let report = tab_report(&dataset, tab, &filter);
                info!(
                    tab = %tab,
                    total = %report.cards.total_requests,
                    resolved = %report.cards.percent_resolved,
                    mean_days = %report.cards.mean_resolution_days,
                    "KPI"
                );
            }
        }
    }

    Ok(())
}

/// Config file, then `EMLURB_*` environment, then command-line flags.
fn resolve_config(
    path: Option<&Path>,
    source: Option<PathBuf>,
    year: Option<i32>,
) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let mut config = config.with_env_overrides()?;

    if let Some(source) = source {
        config.source_path = source;
    }
    if let Some(year) = year {
        config.target_year = year;
    }

    info!(
        source = %config.source_path.display(),
        encoding = config.encoding.name(),
        target_year = config.target_year,
        "Configuration resolved"
    );
    Ok(config)
}
