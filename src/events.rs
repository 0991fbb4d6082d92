use census::EventRecord;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::config::EventColumns;
use crate::error::{PipelineError, Result};
use crate::frame::{cell, require_columns, text_column};

const SOURCE: &str = "cases";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Loads every case row. Region keys stay text and blank keys become `None`.
pub fn load_events(df: &DataFrame, columns: &EventColumns) -> Result<Vec<EventRecord>> {
    require_columns(
        df,
        &[
            columns.date.as_str(),
            columns.region_key.as_str(),
            columns.county_name.as_str(),
            columns.state_name.as_str(),
            columns.cases.as_str(),
            columns.deaths.as_str(),
        ],
        SOURCE,
    )?;
    let dates = text_column(df, &columns.date, SOURCE)?;
    let keys = text_column(df, &columns.region_key, SOURCE)?;
    let counties = text_column(df, &columns.county_name, SOURCE)?;
    let states = text_column(df, &columns.state_name, SOURCE)?;
    let cases = text_column(df, &columns.cases, SOURCE)?;
    let deaths = text_column(df, &columns.deaths, SOURCE)?;

    let mut records = Vec::with_capacity(df.height());
    let mut blank_counts = 0usize;
    for (row, (((((date, key), county), state), case_count), death_count)) in dates
        .into_iter()
        .zip(keys)
        .zip(counties)
        .zip(states)
        .zip(cases)
        .zip(deaths)
        .enumerate()
    {
        if cell(case_count).is_none() || cell(death_count).is_none() {
            blank_counts += 1;
        }
        records.push(EventRecord {
            date: parse_date(date, row)?,
            region_key: cell(key).map(str::to_string),
            county_name: cell(county).unwrap_or_default().to_string(),
            state_name: cell(state).unwrap_or_default().to_string(),
            cases: parse_count(case_count, &columns.cases, row)?,
            deaths: parse_count(death_count, &columns.deaths, row)?,
        });
    }
    debug!(rows = records.len(), blank_counts, "loaded case table");
    Ok(records)
}

fn parse_date(value: Option<&str>, row: usize) -> Result<NaiveDate> {
    let value = cell(value)
        .ok_or_else(|| PipelineError::data_format(SOURCE, format!("row {row}: date is empty")))?;
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        PipelineError::data_format(SOURCE, format!("row {row}: '{value}' is not a date"))
    })
}

/// Blank counts are zero: upstream leaves deaths empty where they are unknown.
fn parse_count(value: Option<&str>, column: &str, row: usize) -> Result<i64> {
    let Some(value) = cell(value) else {
        return Ok(0);
    };
    match value.parse::<i64>() {
        Ok(count) if count >= 0 => Ok(count),
        Ok(count) => Err(PipelineError::data_format(
            SOURCE,
            format!("row {row}: '{column}' is negative ({count})"),
        )),
        Err(_) => Err(PipelineError::data_format(
            SOURCE,
            format!("row {row}: '{column}' value '{value}' is not an integer"),
        )),
    }
}
