use std::collections::{BTreeSet, HashMap};

use census::{
    EventRecord, MatchStatus, ReconciledRecord, ReferenceRecord, SPECIAL_CASE_COMPONENTS,
    SPECIAL_CASE_COUNTY, SPECIAL_CASE_POPULATION, SPECIAL_CASE_REGION_KEY,
};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Case rows that could not be joined to a population and were left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DroppedRegions {
    pub rows: usize,
    /// Distinct `county, state (key)` labels of the dropped rows.
    pub regions: BTreeSet<String>,
}

/// Reconciled rows along with what was dropped on the way.
#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub records: Vec<ReconciledRecord>,
    pub dropped: DroppedRegions,
}

/// Joins case rows to census population, see [`reconcile_report`].
pub fn reconcile(
    events: &[EventRecord],
    reference: &[ReferenceRecord],
) -> Result<Vec<ReconciledRecord>> {
    Ok(reconcile_report(events, reference)?.records)
}

/// Left-joins case rows to census population on region key.
///
/// New York City has no census row of its own; it gets the summed population
/// of its five boroughs and the synthetic key `nycny`. Every other row without
/// a population is dropped and counted in [`DroppedRegions`]. Rows keep their
/// input order.
pub fn reconcile_report(
    events: &[EventRecord],
    reference: &[ReferenceRecord],
) -> Result<Reconciliation> {
    let populations = population_index(reference)?;
    check_special_case_constant(&populations);

    let mut records = Vec::with_capacity(events.len());
    let mut dropped = DroppedRegions::default();
    let mut natural_special_matches = 0usize;
    for event in events {
        let population = event
            .region_key
            .as_deref()
            .and_then(|key| populations.get(key).copied());
        let special = event.is_special_case();

        let (population, region_key) = match (population, event.region_key.as_deref()) {
            (Some(population), Some(key)) => {
                if population < 0 {
                    return Err(PipelineError::Reconciliation {
                        region_key: key.to_string(),
                        details: format!("population is negative ({population})"),
                    });
                }
                if special {
                    natural_special_matches += 1;
                    (population, SPECIAL_CASE_REGION_KEY.to_string())
                } else {
                    (population, key.to_string())
                }
            }
            _ if special => (SPECIAL_CASE_POPULATION, SPECIAL_CASE_REGION_KEY.to_string()),
            _ => {
                dropped.rows += 1;
                dropped.regions.insert(format!(
                    "{}, {} ({})",
                    event.county_name,
                    event.state_name,
                    event.region_key.as_deref().unwrap_or("no key")
                ));
                continue;
            }
        };

        records.push(ReconciledRecord {
            date: event.date,
            region_key,
            county_name: event.county_name.clone(),
            state_name: event.state_name.clone(),
            cases: event.cases,
            deaths: event.deaths,
            population: Some(population),
            match_status: MatchStatus::Matched,
        });
    }

    if natural_special_matches > 0 {
        warn!(
            rows = natural_special_matches,
            "{SPECIAL_CASE_COUNTY} rows matched a census region; the backfilled population may need re-deriving"
        );
    }
    if dropped.rows > 0 {
        info!(
            rows = dropped.rows,
            regions = dropped.regions.len(),
            "dropped case rows without a census population"
        );
    }
    info!(kept = records.len(), "reconciled case rows");
    Ok(Reconciliation { records, dropped })
}

fn population_index(reference: &[ReferenceRecord]) -> Result<HashMap<String, i64>> {
    let mut populations = HashMap::with_capacity(reference.len());
    for record in reference {
        let key = record.region_key();
        if key == SPECIAL_CASE_REGION_KEY {
            return Err(PipelineError::Reconciliation {
                region_key: key,
                details: "census region collides with the synthetic key".to_string(),
            });
        }
        populations.insert(key, record.population);
    }
    Ok(populations)
}

/// Warns when the boroughs no longer add up to the hardcoded population and
/// returns their total in that case.
fn check_special_case_constant(populations: &HashMap<String, i64>) -> Option<i64> {
    let components: Option<i64> = SPECIAL_CASE_COMPONENTS
        .iter()
        .map(|key| populations.get(*key).copied())
        .sum();
    // Partial census tables need not carry all five boroughs.
    let total = components.filter(|total| *total != SPECIAL_CASE_POPULATION)?;
    warn!(
        total,
        expected = SPECIAL_CASE_POPULATION,
        "{SPECIAL_CASE_COUNTY} boroughs no longer sum to the backfilled population"
    );
    Some(total)
}
