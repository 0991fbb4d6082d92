use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use census::SummaryRecord;
use chrono::NaiveDate;
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use tempfile::NamedTempFile;
use tracing::info;

use crate::aggregate::{week_start, Granularity};
use crate::column_names::*;
use crate::error::{PipelineError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const FILE_PREFIX: &str = "nyt_covid_";

/// `<output_root>/<daily|weekly>/nyt_covid_<YYYYMMDD>.csv`
pub fn output_path(output_root: &Path, granularity: Granularity, run_date: NaiveDate) -> PathBuf {
    output_root.join(granularity.label()).join(format!(
        "{FILE_PREFIX}{}.csv",
        run_date.format("%Y%m%d")
    ))
}

/// Lays out summary rows as the columns of a summary file.
pub fn summary_frame(records: &[SummaryRecord], granularity: Granularity) -> Result<DataFrame> {
    let populations: Vec<Option<i64>> = records.iter().map(|record| record.population).collect();

    let region_key = text_series(REGION_KEY, records, |r| r.region_key.as_str());
    let county_name = text_series(COUNTY_NAME, records, |r| r.county_name.as_str());
    let state_name = text_series(STATE_NAME, records, |r| r.state_name.as_str());
    let population = Series::new(POPULATION, populations);
    let cases = count_series(CASES, records, |r| r.period_cases);
    let deaths = count_series(DEATHS, records, |r| r.period_deaths);
    let cumulative_cases = count_series(CUMULATIVE_CASES, records, |r| r.cumulative_cases);
    let cumulative_deaths = count_series(CUMULATIVE_DEATHS, records, |r| r.cumulative_deaths);
    let load_date = date_series(LOAD_DATE, records, |r| r.load_date);

    let columns = match granularity {
        Granularity::ExactDate => {
            let match_status: Vec<Option<&str>> = records
                .iter()
                .map(|record| record.match_status.map(|status| status.as_str()))
                .collect();
            vec![
                date_series(DATE, records, |r| r.period_key),
                region_key,
                county_name,
                state_name,
                cases,
                deaths,
                population,
                Series::new(MATCH_STATUS, match_status),
                date_series(WEEK_START, records, |r| week_start(r.period_key)),
                cumulative_cases,
                cumulative_deaths,
                load_date,
            ]
        }
        Granularity::WeekStart => vec![
            date_series(WEEK_START, records, |r| r.period_key),
            region_key,
            county_name,
            state_name,
            population,
            cases,
            deaths,
            cumulative_cases,
            cumulative_deaths,
            load_date,
        ],
    };
    Ok(DataFrame::new(columns)?)
}

fn text_series<F>(name: &str, records: &[SummaryRecord], value: F) -> Series
where
    F: Fn(&SummaryRecord) -> &str,
{
    let values: Vec<&str> = records.iter().map(value).collect();
    Series::new(name, values)
}

fn count_series<F>(name: &str, records: &[SummaryRecord], value: F) -> Series
where
    F: Fn(&SummaryRecord) -> i64,
{
    let values: Vec<i64> = records.iter().map(value).collect();
    Series::new(name, values)
}

fn date_series<F>(name: &str, records: &[SummaryRecord], value: F) -> Series
where
    F: Fn(&SummaryRecord) -> NaiveDate,
{
    let values: Vec<String> = records
        .iter()
        .map(|record| value(record).format(DATE_FORMAT).to_string())
        .collect();
    Series::new(name, values)
}

/// Writes a summary as CSV with a header row, replacing any file from an
/// earlier run on the same day.
pub fn write_summary(
    records: &[SummaryRecord],
    granularity: Granularity,
    output_root: &Path,
    run_date: NaiveDate,
) -> Result<PathBuf> {
    let path = output_path(output_root, granularity, run_date);
    let write_error = |source: io::Error| PipelineError::Write {
        path: path.clone(),
        source,
    };
    let dir = path
        .parent()
        .ok_or_else(|| write_error(io::Error::other("output path has no directory")))?;
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut df = summary_frame(records, granularity)?;
    // Written beside the target and moved over it, so readers never see half a file.
    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .map_err(|err| write_error(io::Error::other(err)))?;
    file.persist(&path).map_err(|err| write_error(err.error))?;

    info!(
        granularity = granularity.label(),
        rows = records.len(),
        path = %path.display(),
        "wrote summary"
    );
    Ok(path)
}
