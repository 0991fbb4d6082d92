//! Column names of the summary files. Daily and weekly files share every name
//! except that only daily files carry `date` and `match_status`.

pub const DATE: &str = "date";
pub const WEEK_START: &str = "week_start";
pub const REGION_KEY: &str = "region_key";
pub const COUNTY_NAME: &str = "county_name";
pub const STATE_NAME: &str = "state_name";
pub const POPULATION: &str = "population";
pub const MATCH_STATUS: &str = "match_status";

// Counts within the row's period
pub const CASES: &str = "cases";
pub const DEATHS: &str = "deaths";

pub const CUMULATIVE_CASES: &str = "cumulative_cases";
pub const CUMULATIVE_DEATHS: &str = "cumulative_deaths";
pub const LOAD_DATE: &str = "load_date";
