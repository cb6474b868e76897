use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::hegemony::{HegemonyObservation, HegemonyQuery, HegemonySource};
use crate::population::PopulationEstimate;
use crate::shared::{HegeError, Result, ASN};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Drop observations of an origin AS on itself (transit-only ranking)
    pub remove_eyeball: bool,

    /// Use raw hegemony values instead of population-weighted ones
    pub no_weight: bool,
}

impl AggregationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remove_eyeball(mut self, remove_eyeball: bool) -> Self {
        self.remove_eyeball = remove_eyeball;
        self
    }

    pub fn with_no_weight(mut self, no_weight: bool) -> Self {
        self.no_weight = no_weight;
        self
    }
}

/// Normalized dependency score of every AS seen at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    /// Sorted ascending by score
    pub scores: Vec<(ASN, f64)>,
    pub denominator: f64,
    pub origin_asns_observed: BTreeSet<ASN>,
}

impl AggregateResult {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The `n` highest scores, best first.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &(ASN, f64)> {
        self.scores.iter().rev().take(n)
    }

    pub fn score(&self, asn: &ASN) -> Option<f64> {
        self.scores
            .iter()
            .find(|(candidate, _)| candidate == asn)
            .map(|&(_, score)| score)
    }
}

/// Fold one instant's observations into normalized per-AS scores.
pub fn aggregate(
    population: &PopulationEstimate,
    observations: &[HegemonyObservation],
    options: &AggregationOptions,
) -> Result<AggregateResult> {
    if observations.is_empty() {
        return Err(HegeError::NoData(
            "no hegemony observations for the requested instant".to_string(),
        ));
    }

    let mut totals: HashMap<ASN, f64> = HashMap::new();
    let mut origin_asns_observed = BTreeSet::new();

    for obs in observations {
        let percent = match population.percent(&obs.originasn) {
            Some(percent) => percent,
            None => {
                warn!(originasn = obs.originasn, asn = obs.asn, "observation for unknown origin AS ignored");
                continue;
            }
        };
        origin_asns_observed.insert(obs.originasn);

        if options.remove_eyeball && obs.is_self_observation() {
            continue;
        }

        let weight = if options.no_weight {
            obs.hege
        } else {
            obs.hege * percent
        };
        *totals.entry(obs.asn).or_insert(0.0) += weight;
    }

    if totals.is_empty() {
        return Err(HegeError::NoData(format!(
            "every observation of {} origin AS(es) was filtered out",
            origin_asns_observed.len()
        )));
    }

    let denominator = if options.no_weight {
        origin_asns_observed.len() as f64
    } else {
        origin_asns_observed
            .iter()
            .filter_map(|asn| population.percent(asn))
            .sum()
    };

    if denominator <= 0.0 || !denominator.is_finite() {
        return Err(HegeError::NoData(format!(
            "normalization base is {} for {} observed origin AS(es)",
            denominator,
            origin_asns_observed.len()
        )));
    }

    let mut scores: Vec<(ASN, f64)> = totals
        .into_iter()
        .map(|(asn, total)| (asn, total / denominator))
        .collect();
    scores.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    debug!(
        ases = scores.len(),
        origins = origin_asns_observed.len(),
        denominator,
        "aggregated hegemony"
    );

    Ok(AggregateResult {
        scores,
        denominator,
        origin_asns_observed,
    })
}

/// Query `source` for the one-minute window starting at `date` and aggregate it.
pub fn compute_hegemony(
    source: &dyn HegemonySource,
    population: &PopulationEstimate,
    date: DateTime<Utc>,
    options: &AggregationOptions,
) -> Result<AggregateResult> {
    if population.is_empty() {
        return Err(HegeError::NoData(format!(
            "no eyeball networks found in {}",
            population.country_code
        )));
    }

    let query = HegemonyQuery::new(population.origin_asns(), date, date + Duration::minutes(1));
    let observations = source.observations(&query)?;
    aggregate(population, &observations, options)
}
