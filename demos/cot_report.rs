use std::{env, fs, path::Path, time::Instant};

use anyhow::{Context, Result};
use cot_viewer::prelude::*;
use time::macros::format_description;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Usage: `cargo run --example cot_report -- [report.csv] [market] [window-weeks]`
fn main() -> Result<()> {
    let _guard = init_tracing()?;

    let mut args = env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/cot/input/cot_weekly.csv".to_string());
    let market = args.next();
    let weeks = args
        .next()
        .map(|w| w.parse::<u16>())
        .transpose()
        .context("Window must be a number of weeks")?
        .unwrap_or(52);

    let config = PipelineConfig::default().with_rolling_window(RollingWindow::new(weeks)?);

    let load_start = Instant::now();
    let mut cache = DatasetCache::new();
    let dashboard = Dashboard::open(&mut cache, &path, config)
        .with_context(|| format!("Failed to load COT report '{path}'"))?;
    let load_time = load_start.elapsed();

    let markets = dashboard.markets();
    let market = match market {
        Some(m) => m,
        None => markets.first().cloned().context("Report contains no markets")?,
    };

    let derive_start = Instant::now();
    let analysis = dashboard.analyze(&dashboard.default_selection(&market))?;
    let overview = dashboard.overview();
    let derive_time = derive_start.elapsed();

    for warning in &analysis.warnings {
        println!("warning: {warning}");
    }

    if let Some(kpi) = &analysis.kpi {
        println!("\n--- {market} ({} vs {}) ---", kpi.latest_date, kpi.previous_date);
        for m in &kpi.metrics {
            println!("{:<10} {:>12.0} {:>+10.0}", m.field.to_string(), m.value, m.delta);
        }
    }
    if let Some(s) = &analysis.latest_sentiment {
        println!(
            "Sentiment: {} ({:+.1}% over {} reports)",
            s.label,
            s.delta_pct,
            dashboard.config().lookback_periods()
        );
    }

    println!("\n--- Overview ({} markets) ---", overview.len());
    for row in &overview.latest {
        println!(
            "{:<50} {:>8.1} {}",
            row.market(),
            row.cot_index,
            row.sentiment_label().unwrap_or("-")
        );
    }

    let report = analysis.to_report()?;
    let written = report.to_csv(Path::new("demos/reports"), None, None)?;

    println!("\n--- Timings ---");
    println!("1. Load and normalize:  {load_time:?}");
    println!("2. Derive and overview: {derive_time:?}");
    println!("Report written to {}", written.display());

    drop(_guard);

    Ok(())
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

fn init_tracing() -> Result<Option<WorkerGuard>> {
    let app_name = "cot-viewer";

    let in_container =
        env::var("CONTAINER").is_ok() || std::path::Path::new("/.dockerenv").exists();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if in_container {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NONE)
            .with_current_span(true)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .init();

        info!("Logging to stdout (container mode)");
        Ok(None)
    } else {
        let log_dir = dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
            .context("Failed to find a state or home directory")?
            .join(app_name)
            .join("logs");
        fs::create_dir_all(&log_dir)?;

        let timestamp = time::OffsetDateTime::now_utc()
            .format(&format_description!(
                "[year][month][day]-[hour][minute][second]"
            ))
            .context("Failed to format timestamp")?;
        let file_name = format!("{app_name}-{timestamp}.log");
        let file_path = log_dir.join(&file_name);

        let file_appender = tracing_appender::rolling::never(&log_dir, &file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(non_blocking)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::NONE)
            .with_current_span(true)
            .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
            .init();

        info!(log_file = %file_path.display(), "Logging to file (local mode)");
        Ok(Some(guard))
    }
}
