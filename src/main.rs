//! CLI entry point for the traffic week dashboard data tool.
//!
//! Provides subcommands for aggregating a report's worth of day exports into a
//! dashboard snapshot, summarizing a single day, and listing per-direction
//! speeds for a day.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use traffic_week::{
    aggregate::{aggregate_week, load_day, utility::hour_label},
    config::{DeploymentConfig, ReportKind, validate_speed_limit},
    fetch::source_for,
    output::{append_record, print_pretty, render_json, write_events, write_json},
    stats::{DayStats, direction_speeds},
};

#[derive(Parser)]
#[command(name = "traffic_week")]
#[command(about = "Aggregate intersection traffic sensor exports", long_about = None)]
struct Cli {
    /// Directory or http(s) base URL holding the day exports
    #[arg(short, long, global = true, env = "TRAFFIC_SOURCE", default_value = "data")]
    source: String,

    /// JSON deployment config; the built-in September 2017 week when omitted
    #[arg(short, long, global = true, env = "TRAFFIC_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a report's days into a dashboard snapshot
    Aggregate {
        /// Which days to cover
        #[arg(short, long, value_enum, default_value_t = ReportKind::Weekly)]
        report: ReportKind,

        /// Speed limit in km/h; defaults to the deployment's limit
        #[arg(short = 'l', long)]
        speed_limit: Option<f64>,

        /// Write the snapshot JSON here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Also write the high-speed event log as CSV
        #[arg(long)]
        events_csv: Option<String>,
    },
    /// Summarize one day and append the result to a CSV file
    Day {
        /// Day index from the deployment config
        #[arg(short, long)]
        day: usize,

        /// Speed limit in km/h; defaults to the deployment's limit
        #[arg(short = 'l', long)]
        speed_limit: Option<f64>,

        /// CSV file to append results to
        #[arg(short, long, default_value = "day_stats.csv")]
        output: String,
    },
    /// Show average speed and volume per approach direction for one day
    Directions {
        /// Day index from the deployment config
        #[arg(short, long)]
        day: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/traffic_week.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_week.log"));

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

    let config = match &cli.config {
        Some(path) => DeploymentConfig::load(path)
            .with_context(|| format!("failed to load deployment config {path}"))?,
        None => DeploymentConfig::reference(),
    };
    let fetcher = source_for(&cli.source)?;

    match cli.command {
        Commands::Aggregate {
            report,
            speed_limit,
            output,
            events_csv,
        } => {
            let speed_limit_kmh = validate_speed_limit(speed_limit.unwrap_or(config.speed_limit_kmh))?;
            let days = config.select(report);
            info!(
                report = ?report,
                days = days.len(),
                speed_limit_kmh,
                source = %cli.source,
                "Aggregating"
            );

            let aggregate = match aggregate_week(&days, speed_limit_kmh, &fetcher).await {
                Ok(aggregate) => aggregate,
                Err(e) => {
                    error!(identifier = %e.identifier, error = %e, "Aggregation failed");
                    return Err(e.into());
                }
            };
            print_pretty(&aggregate);

            if aggregate.total_vehicles == 0 {
                warn!("No valid observations found in any source");
            }
            for flow in &aggregate.top_flows_by_direction {
                info!(rank = flow.rank, direction = %flow.name, "{}", flow);
            }
            if let Some(peak) = aggregate
                .by_hour
                .iter()
                .enumerate()
                .max_by_key(|&(hour, h)| (h.count, std::cmp::Reverse(hour)))
                .filter(|(_, h)| h.count > 0)
            {
                info!(hour = %hour_label(peak.0), vehicles = peak.1.count, "Peak hour");
            }

            match output {
                Some(path) => write_json(&path, &aggregate)?,
                None => println!("{}", render_json(&aggregate)?),
            }
            if let Some(path) = events_csv {
                write_events(&path, &aggregate.high_speed_events)?;
            }
        }
        Commands::Day {
            day,
            speed_limit,
            output,
        } => {
            let day_source = config
                .day(day)
                .ok_or_else(|| anyhow!("no day with index {day} in deployment config"))?;
            let speed_limit_kmh = validate_speed_limit(speed_limit.unwrap_or(config.speed_limit_kmh))?;

            let rows = load_day(day_source, &fetcher).await?;
            let stats = DayStats::from_observations(&rows, speed_limit_kmh).with_day(day_source);
            info!(
                day = %stats.calendar_label,
                total_vehicles = stats.total_vehicles,
                avg_speed_mph = stats.avg_speed_mph,
                over_limit = stats.over_limit,
                over_limit_pct = stats.over_limit_pct(),
                "Day summarized"
            );

            append_record(&output, &stats)?;
        }
        Commands::Directions { day } => {
            let day_source = config
                .day(day)
                .ok_or_else(|| anyhow!("no day with index {day} in deployment config"))?;

            let rows = load_day(day_source, &fetcher).await?;
            let speeds = direction_speeds(&rows);
            let total: usize = speeds.iter().map(|s| s.volume).sum();
            info!(day = %day_source.calendar_label, vehicles = total, "Direction data loaded");

            for s in &speeds {
                info!(
                    direction = %s.label,
                    volume = s.volume,
                    avg_speed_kmh = s.avg_speed_kmh,
                    avg_speed_mph = s.avg_speed_mph,
                    "Direction"
                );
            }
        }
    }

    Ok(())
}
