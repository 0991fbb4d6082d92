use std::collections::HashMap;

use census::{
    ReferenceRecord, COUNTY_CODE_WIDTH, COUNTY_SUMMARY_LEVEL, REGION_KEY_WIDTH, STATE_CODE_WIDTH,
};
use polars::prelude::DataFrame;
use tracing::debug;

use crate::config::ReferenceColumns;
use crate::error::{PipelineError, Result};
use crate::frame::{cell, require_columns, text_column};

const SOURCE: &str = "census";

/// Loads county-level population rows and checks their region keys.
///
/// State and county codes are kept as text. Digit-only codes shorter than their
/// width are left-padded with zeros so `1` + `1` becomes `01001`.
pub fn load_reference(df: &DataFrame, columns: &ReferenceColumns) -> Result<Vec<ReferenceRecord>> {
    require_columns(
        df,
        &[
            columns.summary_level.as_str(),
            columns.state_code.as_str(),
            columns.county_code.as_str(),
            columns.population.as_str(),
        ],
        SOURCE,
    )?;
    let levels = text_column(df, &columns.summary_level, SOURCE)?;
    let states = text_column(df, &columns.state_code, SOURCE)?;
    let counties = text_column(df, &columns.county_code, SOURCE)?;
    let populations = text_column(df, &columns.population, SOURCE)?;

    let mut records = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (row, (((level, state), county), population)) in levels
        .into_iter()
        .zip(states)
        .zip(counties)
        .zip(populations)
        .enumerate()
    {
        let summary_level = parse_integer(level, &columns.summary_level, row)?;
        if summary_level != COUNTY_SUMMARY_LEVEL {
            continue;
        }
        let record = ReferenceRecord {
            summary_level,
            state_code: normalize_code(state, STATE_CODE_WIDTH, &columns.state_code, row)?,
            county_code: normalize_code(county, COUNTY_CODE_WIDTH, &columns.county_code, row)?,
            population: parse_integer(population, &columns.population, row)?,
        };
        let key = record.region_key();
        if key.len() != REGION_KEY_WIDTH {
            return Err(PipelineError::data_format(
                SOURCE,
                format!("row {row}: region key '{key}' is not {REGION_KEY_WIDTH} characters"),
            ));
        }
        if let Some(first) = seen.insert(key.clone(), row) {
            return Err(PipelineError::data_format(
                SOURCE,
                format!("region key '{key}' appears on rows {first} and {row}"),
            ));
        }
        records.push(record);
    }
    debug!(rows = df.height(), counties = records.len(), "loaded census table");
    Ok(records)
}

fn parse_integer(value: Option<&str>, column: &str, row: usize) -> Result<i64> {
    let value = cell(value).ok_or_else(|| {
        PipelineError::data_format(SOURCE, format!("row {row}: '{column}' is empty"))
    })?;
    value.parse::<i64>().map_err(|_| {
        PipelineError::data_format(
            SOURCE,
            format!("row {row}: '{column}' value '{value}' is not an integer"),
        )
    })
}

fn normalize_code(value: Option<&str>, width: usize, column: &str, row: usize) -> Result<String> {
    let value = cell(value).ok_or_else(|| {
        PipelineError::data_format(SOURCE, format!("row {row}: '{column}' is empty"))
    })?;
    if value.len() > width || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(PipelineError::data_format(
            SOURCE,
            format!("row {row}: '{column}' value '{value}' is not a {width}-digit code"),
        ));
    }
    Ok(format!("{value:0>width$}"))
}
