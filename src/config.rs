use std::path::PathBuf;

/// New York Times case and death counts by county. Updated daily: new rows added.
pub const CASES_URL: &str =
    "https://raw.githubusercontent.com/nytimes/covid-19-data/master/us-counties.csv";
/// Census population estimates by county. Updated once a year: new columns added.
pub const CENSUS_URL: &str = "https://www2.census.gov/programs-surveys/popest/datasets/2010-2019/counties/totals/co-est2019-alldata.csv";

/// Column names of the census population table.
#[derive(Clone, Debug)]
pub struct ReferenceColumns {
    pub summary_level: String,
    pub state_code: String,
    pub county_code: String,
    pub population: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            summary_level: "SUMLEV".to_string(),
            state_code: "STATE".to_string(),
            county_code: "COUNTY".to_string(),
            population: "POPESTIMATE2019".to_string(),
        }
    }
}

/// Column names of the case table.
#[derive(Clone, Debug)]
pub struct EventColumns {
    pub date: String,
    pub region_key: String,
    pub county_name: String,
    pub state_name: String,
    pub cases: String,
    pub deaths: String,
}

impl Default for EventColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            region_key: "fips".to_string(),
            county_name: "county".to_string(),
            state_name: "state".to_string(),
            cases: "cases".to_string(),
            deaths: "deaths".to_string(),
        }
    }
}

/// Sources and locations for one run. Paths are relative to the run location.
#[derive(Clone, Debug)]
pub struct Config {
    pub cases_url: String,
    pub census_url: String,
    /// Local copy of the census file. Never invalidated: the upstream changes yearly.
    pub census_cache_path: PathBuf,
    /// Summaries go to `<output_dir>/daily` and `<output_dir>/weekly`.
    pub output_dir: PathBuf,
    pub reference_columns: ReferenceColumns,
    pub event_columns: EventColumns,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cases_url: CASES_URL.to_string(),
            census_url: CENSUS_URL.to_string(),
            census_cache_path: PathBuf::from("data")
                .join("census")
                .join("counties_est2019.csv"),
            output_dir: PathBuf::from("output"),
            reference_columns: ReferenceColumns::default(),
            event_columns: EventColumns::default(),
        }
    }
}
