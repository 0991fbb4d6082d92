use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

pub mod aggregate;
pub mod column_names;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod frame;
pub mod getter;
pub mod reconcile;
pub mod reference;
pub mod us;
pub mod writer;

pub use aggregate::{aggregate, aggregate_by, week_start, Granularity, Passthrough};
pub use config::Config;
pub use error::{PipelineError, Result};
pub use getter::Getter;
pub use reconcile::{reconcile, reconcile_report, DroppedRegions};
pub use us::UsCounties;

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub daily_path: PathBuf,
    pub daily_rows: usize,
    pub weekly_path: PathBuf,
    pub weekly_rows: usize,
    pub dropped: DroppedRegions,
}

/// Loads both sources, reconciles them and writes the daily and weekly
/// summaries under `config.output_dir`, stamped with `run_date`.
pub async fn run<G: Getter + ?Sized>(
    getter: &G,
    config: &Config,
    run_date: NaiveDate,
) -> Result<RunSummary> {
    let population = getter.population().await?;
    let reference = reference::load_reference(&population, &config.reference_columns)?;
    let cases = getter.cases().await?;
    let events = events::load_events(&cases, &config.event_columns)?;

    let reconciled = reconcile_report(&events, &reference)?;

    let daily = aggregate(&reconciled.records, Granularity::ExactDate, run_date);
    let daily_path =
        writer::write_summary(&daily, Granularity::ExactDate, &config.output_dir, run_date)?;
    let weekly = aggregate(&reconciled.records, Granularity::WeekStart, run_date);
    let weekly_path =
        writer::write_summary(&weekly, Granularity::WeekStart, &config.output_dir, run_date)?;

    info!(
        counties = reference.len(),
        case_rows = events.len(),
        dropped_rows = reconciled.dropped.rows,
        "run complete"
    );
    Ok(RunSummary {
        daily_path,
        daily_rows: daily.len(),
        weekly_path,
        weekly_rows: weekly.len(),
        dropped: reconciled.dropped,
    })
}
