use std::fmt;

use chrono::NaiveDate;

/// Census summary level of a county row. State rows are level 40.
pub const COUNTY_SUMMARY_LEVEL: i64 = 50;

/// Width of a state code, zero-padded.
pub const STATE_CODE_WIDTH: usize = 2;
/// Width of a county code, zero-padded.
pub const COUNTY_CODE_WIDTH: usize = 3;
/// Width of a region key (state code followed by county code).
pub const REGION_KEY_WIDTH: usize = STATE_CODE_WIDTH + COUNTY_CODE_WIDTH;

/// County name the case data uses for the five New York City boroughs.
pub const SPECIAL_CASE_COUNTY: &str = "New York City";
/// Synthetic region key for New York City. Alphabetic, so it never equals a
/// real region key.
pub const SPECIAL_CASE_REGION_KEY: &str = "nycny";
/// Sum of the 2019 population estimates of the five boroughs.
pub const SPECIAL_CASE_POPULATION: i64 = 8_336_817;
/// Region keys of the boroughs making up New York City: Bronx, Kings, New
/// York, Queens and Richmond.
pub const SPECIAL_CASE_COMPONENTS: [&str; 5] = ["36005", "36047", "36061", "36081", "36085"];

/// One row of the census population estimates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceRecord {
    // 50 == county, 40 == state
    pub summary_level: i64,
    pub state_code: String,
    pub county_code: String,
    pub population: i64,
}

impl ReferenceRecord {
    pub fn region_key(&self) -> String {
        format!("{}{}", self.state_code, self.county_code)
    }
}

/// One row of the case data: a region on a given day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub date: NaiveDate,
    // Empty upstream for aggregate regions such as New York City
    pub region_key: Option<String>,
    pub county_name: String,
    pub state_name: String,
    pub cases: i64,
    pub deaths: i64,
}

impl EventRecord {
    /// True for the New York City aggregate, which has no census row.
    pub fn is_special_case(&self) -> bool {
        self.county_name == SPECIAL_CASE_COUNTY
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    Matched,
    Unmatched,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Matched => "matched",
            MatchStatus::Unmatched => "unmatched",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A case row joined to its population.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciledRecord {
    pub date: NaiveDate,
    pub region_key: String,
    pub county_name: String,
    pub state_name: String,
    pub cases: i64,
    pub deaths: i64,
    pub population: Option<i64>,
    pub match_status: MatchStatus,
}

/// One row of a daily or weekly summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryRecord {
    // Record date for daily rows, Monday of the week for weekly rows
    pub period_key: NaiveDate,
    pub region_key: String,
    pub county_name: String,
    pub state_name: String,
    pub population: Option<i64>,
    pub period_cases: i64,
    pub period_deaths: i64,
    pub cumulative_cases: i64,
    pub cumulative_deaths: i64,
    pub load_date: NaiveDate,
    // Only daily rows carry the full reconciled record
    pub match_status: Option<MatchStatus>,
}
