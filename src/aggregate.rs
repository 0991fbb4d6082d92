use std::collections::{BTreeMap, HashMap};

use census::{ReconciledRecord, SummaryRecord};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

/// Time bucket of a summary table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    ExactDate,
    WeekStart,
}

impl Granularity {
    pub const ALL: [Granularity; 2] = [Granularity::ExactDate, Granularity::WeekStart];

    pub fn period_key(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::ExactDate => date,
            Granularity::WeekStart => week_start(date),
        }
    }

    /// Directory label of the summary.
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::ExactDate => "daily",
            Granularity::WeekStart => "weekly",
        }
    }

    fn passthrough(&self) -> Passthrough {
        match self {
            Granularity::ExactDate => Passthrough::FullRecord,
            Granularity::WeekStart => Passthrough::GroupFields,
        }
    }
}

/// Which fields survive into summary rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Passthrough {
    /// One row per reconciled record, every field kept.
    FullRecord,
    /// One row per (period, region) with name and population of the region.
    GroupFields,
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn aggregate(
    records: &[ReconciledRecord],
    granularity: Granularity,
    load_date: NaiveDate,
) -> Vec<SummaryRecord> {
    let summary = aggregate_by(
        records,
        |date| granularity.period_key(date),
        granularity.passthrough(),
        load_date,
    );
    debug!(
        granularity = granularity.label(),
        rows = summary.len(),
        "aggregated summary"
    );
    summary
}

/// Sums cases and deaths per (region, period) and attaches running totals.
///
/// Cumulative values run over periods in ascending order within a region.
/// Rows come back ordered by period, then region; rows sharing both keep
/// their input order.
pub fn aggregate_by<F>(
    records: &[ReconciledRecord],
    period_of: F,
    passthrough: Passthrough,
    load_date: NaiveDate,
) -> Vec<SummaryRecord>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    let cumulative = cumulative_totals(records, &period_of);

    let mut rows = match passthrough {
        Passthrough::FullRecord => records
            .iter()
            .filter_map(|record| {
                let period_key = period_of(record.date);
                let totals = cumulative.get(&(record.region_key.as_str(), period_key))?;
                Some(SummaryRecord {
                    period_key,
                    region_key: record.region_key.clone(),
                    county_name: record.county_name.clone(),
                    state_name: record.state_name.clone(),
                    population: record.population,
                    period_cases: record.cases,
                    period_deaths: record.deaths,
                    cumulative_cases: totals.cases,
                    cumulative_deaths: totals.deaths,
                    load_date,
                    match_status: Some(record.match_status),
                })
            })
            .collect::<Vec<_>>(),
        Passthrough::GroupFields => group_rows(records, &period_of)
            .into_iter()
            .filter_map(|((period_key, region_key), group)| {
                let totals = cumulative.get(&(region_key, period_key))?;
                Some(SummaryRecord {
                    period_key,
                    region_key: region_key.to_string(),
                    county_name: group.county_name.to_string(),
                    state_name: group.state_name.to_string(),
                    population: group.population,
                    period_cases: group.totals.cases,
                    period_deaths: group.totals.deaths,
                    cumulative_cases: totals.cases,
                    cumulative_deaths: totals.deaths,
                    load_date,
                    match_status: None,
                })
            })
            .collect(),
    };
    rows.sort_by(|a, b| {
        a.period_key
            .cmp(&b.period_key)
            .then_with(|| a.region_key.cmp(&b.region_key))
    });
    rows
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Totals {
    cases: i64,
    deaths: i64,
}

impl Totals {
    fn add(&mut self, cases: i64, deaths: i64) {
        self.cases += cases;
        self.deaths += deaths;
    }
}

fn cumulative_totals<'a, F>(
    records: &'a [ReconciledRecord],
    period_of: &F,
) -> HashMap<(&'a str, NaiveDate), Totals>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    // Region first so each region's periods are contiguous and ascending.
    let mut per_period: BTreeMap<(&str, NaiveDate), Totals> = BTreeMap::new();
    for record in records {
        per_period
            .entry((record.region_key.as_str(), period_of(record.date)))
            .or_default()
            .add(record.cases, record.deaths);
    }

    let mut cumulative = HashMap::with_capacity(per_period.len());
    let mut running: Option<(&str, Totals)> = None;
    for ((region_key, period_key), totals) in per_period {
        let mut sum = match running {
            Some((current, sum)) if current == region_key => sum,
            _ => Totals::default(),
        };
        sum.add(totals.cases, totals.deaths);
        running = Some((region_key, sum));
        cumulative.insert((region_key, period_key), sum);
    }
    cumulative
}

struct Group<'a> {
    county_name: &'a str,
    state_name: &'a str,
    population: Option<i64>,
    totals: Totals,
    // Rows whose name or population differ from the first row of the group
    conflicts: usize,
}

impl Group<'_> {
    fn conflicts_with(&self, record: &ReconciledRecord) -> bool {
        self.county_name != record.county_name
            || self.state_name != record.state_name
            || self.population != record.population
    }
}

fn group_rows<'a, F>(
    records: &'a [ReconciledRecord],
    period_of: &F,
) -> BTreeMap<(NaiveDate, &'a str), Group<'a>>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    let mut groups: BTreeMap<(NaiveDate, &str), Group> = BTreeMap::new();
    for record in records {
        let key = (period_of(record.date), record.region_key.as_str());
        let group = groups.entry(key).or_insert_with(|| Group {
            county_name: &record.county_name,
            state_name: &record.state_name,
            population: record.population,
            totals: Totals::default(),
            conflicts: 0,
        });
        if group.conflicts_with(record) {
            group.conflicts += 1;
        }
        group.totals.add(record.cases, record.deaths);
    }
    for ((period_key, region_key), group) in &groups {
        if group.conflicts > 0 {
            warn!(
                region_key = %region_key,
                period = %period_key,
                rows = group.conflicts,
                kept = %format!("{}, {} ({:?})", group.county_name, group.state_name, group.population),
                "conflicting region details within one period; keeping the first"
            );
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use census::{MatchStatus, SPECIAL_CASE_POPULATION, SPECIAL_CASE_REGION_KEY};

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(day: NaiveDate, key: &str, cases: i64, deaths: i64) -> ReconciledRecord {
        ReconciledRecord {
            date: day,
            region_key: key.to_string(),
            county_name: "New York".to_string(),
            state_name: "New York".to_string(),
            cases,
            deaths,
            population: Some(1_628_701),
            match_status: MatchStatus::Matched,
        }
    }

    fn load_date() -> NaiveDate {
        date(2021, 2, 1)
    }

    #[test]
    fn week_start_is_monday() {
        // 2021-01-06 is a Wednesday
        assert_eq!(week_start(date(2021, 1, 6)), date(2021, 1, 4));
        assert_eq!(week_start(date(2021, 1, 4)), date(2021, 1, 4));
        assert_eq!(week_start(date(2021, 1, 10)), date(2021, 1, 4));
        // Crosses a year boundary
        assert_eq!(week_start(date(2021, 1, 1)), date(2020, 12, 28));
    }

    #[test]
    fn daily_summary_runs_cumulative_totals() {
        let records = vec![
            record(date(2021, 1, 4), "36061", 10, 1),
            record(date(2021, 1, 5), "36061", 15, 2),
        ];
        let rows = aggregate(&records, Granularity::ExactDate, load_date());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period_key, date(2021, 1, 4));
        assert_eq!((rows[0].cumulative_cases, rows[0].cumulative_deaths), (10, 1));
        assert_eq!((rows[1].cumulative_cases, rows[1].cumulative_deaths), (25, 3));
        assert_eq!((rows[1].period_cases, rows[1].period_deaths), (15, 2));
        assert!(rows.iter().all(|row| row.population == Some(1_628_701)));
        assert!(rows.iter().all(|row| row.load_date == load_date()));
        assert!(rows
            .iter()
            .all(|row| row.match_status == Some(MatchStatus::Matched)));
    }

    #[test]
    fn weekly_summary_groups_by_monday() {
        let records = vec![
            record(date(2021, 1, 4), "36061", 10, 1),
            record(date(2021, 1, 5), "36061", 15, 2),
        ];
        let rows = aggregate(&records, Granularity::WeekStart, load_date());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.period_key, date(2021, 1, 4));
        assert_eq!((row.period_cases, row.period_deaths), (25, 3));
        assert_eq!((row.cumulative_cases, row.cumulative_deaths), (25, 3));
        assert_eq!(row.county_name, "New York");
        assert_eq!(row.population, Some(1_628_701));
        assert_eq!(row.match_status, None);
    }

    #[test]
    fn cumulative_totals_are_per_region() {
        let mut nyc = record(date(2021, 1, 4), SPECIAL_CASE_REGION_KEY, 7, 1);
        nyc.population = Some(SPECIAL_CASE_POPULATION);
        nyc.county_name = "New York City".to_string();
        let records = vec![
            record(date(2021, 1, 11), "36061", 4, 0),
            nyc.clone(),
            record(date(2021, 1, 4), "36061", 2, 0),
            NaiveDate::from_ymd_opt(2021, 1, 12)
                .map(|day| ReconciledRecord { date: day, ..nyc })
                .unwrap(),
        ];
        let rows = aggregate(&records, Granularity::WeekStart, load_date());
        let cumulative: Vec<(&str, NaiveDate, i64)> = rows
            .iter()
            .map(|row| (row.region_key.as_str(), row.period_key, row.cumulative_cases))
            .collect();
        assert_eq!(
            cumulative,
            vec![
                ("36061", date(2021, 1, 4), 2),
                (SPECIAL_CASE_REGION_KEY, date(2021, 1, 4), 7),
                ("36061", date(2021, 1, 11), 6),
                (SPECIAL_CASE_REGION_KEY, date(2021, 1, 11), 14),
            ]
        );
    }

    #[test]
    fn duplicate_daily_rows_share_the_group_total() {
        let records = vec![
            record(date(2021, 1, 4), "36061", 3, 0),
            record(date(2021, 1, 4), "36061", 4, 1),
        ];
        let rows = aggregate(&records, Granularity::ExactDate, load_date());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period_cases, 3);
        assert_eq!(rows[1].period_cases, 4);
        assert!(rows.iter().all(|row| row.cumulative_cases == 7));
        assert!(rows.iter().all(|row| row.cumulative_deaths == 1));
    }

    #[test]
    fn cumulative_is_monotonic_and_ends_at_the_total() {
        let counts = [(5, 0), (0, 0), (12, 2), (3, 1), (0, 0), (9, 0), (1, 1)];
        let records: Vec<ReconciledRecord> = counts
            .iter()
            .enumerate()
            .map(|(offset, (cases, deaths))| {
                record(
                    date(2021, 1, 1) + Duration::days(offset as i64 * 3),
                    "36061",
                    *cases,
                    *deaths,
                )
            })
            .collect();
        for granularity in Granularity::ALL {
            let rows = aggregate(&records, granularity, load_date());
            for pair in rows.windows(2) {
                assert!(pair[0].period_key < pair[1].period_key);
                assert!(pair[0].cumulative_cases <= pair[1].cumulative_cases);
                assert!(pair[0].cumulative_deaths <= pair[1].cumulative_deaths);
            }
            let last = rows.last().unwrap();
            let period_cases: i64 = rows.iter().map(|row| row.period_cases).sum();
            assert_eq!(last.cumulative_cases, period_cases);
            assert_eq!(last.cumulative_cases, 30);
            assert_eq!(last.cumulative_deaths, 4);
        }
    }

    #[test]
    fn conflicting_names_keep_the_first() {
        let mut renamed = record(date(2021, 1, 5), "36061", 1, 0);
        renamed.county_name = "Manhattan".to_string();
        let records = vec![record(date(2021, 1, 4), "36061", 1, 0), renamed];
        let rows = aggregate(&records, Granularity::WeekStart, load_date());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].county_name, "New York");
        assert_eq!(rows[0].period_cases, 2);
    }

    #[test]
    fn conflicts_are_counted_once_per_group() {
        let mut matched_nyc = record(date(2021, 1, 4), SPECIAL_CASE_REGION_KEY, 1, 0);
        matched_nyc.county_name = "New York City".to_string();
        matched_nyc.population = Some(SPECIAL_CASE_POPULATION);
        let records = vec![
            matched_nyc.clone(),
            record(date(2021, 1, 5), SPECIAL_CASE_REGION_KEY, 1, 0),
            record(date(2021, 1, 6), SPECIAL_CASE_REGION_KEY, 1, 0),
            ReconciledRecord {
                date: date(2021, 1, 7),
                ..matched_nyc
            },
            record(date(2021, 1, 11), SPECIAL_CASE_REGION_KEY, 1, 0),
        ];
        let groups = group_rows(&records, &week_start);
        assert_eq!(groups.len(), 2);
        let first_week = &groups[&(date(2021, 1, 4), SPECIAL_CASE_REGION_KEY)];
        assert_eq!(first_week.conflicts, 2);
        assert_eq!(first_week.county_name, "New York City");
        assert_eq!(first_week.totals.cases, 4);
        let second_week = &groups[&(date(2021, 1, 11), SPECIAL_CASE_REGION_KEY)];
        assert_eq!(second_week.conflicts, 0);
    }

    #[test]
    fn custom_period_extraction() {
        let records = vec![
            record(date(2021, 1, 4), "36061", 1, 0),
            record(date(2021, 2, 9), "36061", 2, 0),
            record(date(2021, 2, 20), "36061", 3, 0),
        ];
        let month_start = |day: NaiveDate| day.with_day(1).unwrap();
        let rows = aggregate_by(&records, month_start, Passthrough::GroupFields, load_date());
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[1].period_key, rows[1].period_cases), (date(2021, 2, 1), 5));
        assert_eq!(rows[1].cumulative_cases, 6);
    }

    #[test]
    fn identical_inputs_give_identical_rows() {
        let records = vec![
            record(date(2021, 1, 5), "36061", 15, 2),
            record(date(2021, 1, 4), "36061", 10, 1),
        ];
        for granularity in Granularity::ALL {
            assert_eq!(
                aggregate(&records, granularity, load_date()),
                aggregate(&records, granularity, load_date())
            );
        }
    }
}
