use std::io::Cursor;

use polars::prelude::{CsvEncoding, CsvReader, DataFrame, SerReader, StringChunked};

use crate::error::{PipelineError, Result};

/// Parses CSV bytes into a dataframe with every column read as text.
///
/// Nothing is type-inferred, so codes like `01` keep their leading zeros and
/// blank cells stay null. The census file is latin-1, hence the lossy decoding.
pub fn read_csv(data: Vec<u8>) -> Result<DataFrame> {
    Ok(CsvReader::new(Cursor::new(data))
        .has_header(true)
        .infer_schema(Some(0))
        .with_encoding(CsvEncoding::LossyUtf8)
        .finish()?)
}

/// Fails with a data format error naming every absent column.
pub fn require_columns(df: &DataFrame, names: &[&str], source_name: &'static str) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !present.contains(name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::data_format(
            source_name,
            format!("missing columns {missing:?}"),
        ))
    }
}

pub fn text_column<'a>(
    df: &'a DataFrame,
    name: &str,
    source_name: &'static str,
) -> Result<&'a StringChunked> {
    let series = df.column(name).map_err(|_| {
        PipelineError::data_format(source_name, format!("missing column '{name}'"))
    })?;
    series.str().map_err(|_| {
        PipelineError::data_format(
            source_name,
            format!("column '{name}' is {} rather than text", series.dtype()),
        )
    })
}

/// Trimmed cell value, with blank cells treated as null.
pub fn cell(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_every_column_as_text() {
        let df = read_csv(b"STATE,COUNTY,POP\n01,001,55869\n".to_vec()).unwrap();
        let state = text_column(&df, "STATE", "census").unwrap();
        assert_eq!(state.get(0), Some("01"));
        let pop = text_column(&df, "POP", "census").unwrap();
        assert_eq!(pop.get(0), Some("55869"));
    }

    #[test]
    fn blank_cells_are_null() {
        let df = read_csv(b"date,fips\n2021-01-04,\n".to_vec()).unwrap();
        let fips = text_column(&df, "fips", "cases").unwrap();
        assert_eq!(cell(fips.get(0)), None);
    }

    #[test]
    fn reports_missing_columns() {
        let df = read_csv(b"date,fips\n2021-01-04,36061\n".to_vec()).unwrap();
        let err = require_columns(&df, &["date", "cases", "deaths"], "cases").unwrap_err();
        match err {
            PipelineError::DataFormat { details, .. } => {
                assert!(details.contains("cases"));
                assert!(details.contains("deaths"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
