use std::cell::RefCell;
use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use country_hegemony::aggregator::{aggregate, compute_hegemony, AggregationOptions};
use country_hegemony::hegemony::{HegemonyObservation, HegemonyQuery, HegemonySource};
use country_hegemony::population::{PopulationEstimate, PopulationRecord};
use country_hegemony::shared::{HegeError, Result};

/// Hands out canned observations and remembers the queries it saw
struct CannedSource {
    observations: Vec<HegemonyObservation>,
    queries: RefCell<Vec<HegemonyQuery>>,
}

impl CannedSource {
    fn new(observations: Vec<HegemonyObservation>) -> Self {
        CannedSource {
            observations,
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl HegemonySource for CannedSource {
    fn observations(&self, query: &HegemonyQuery) -> Result<Vec<HegemonyObservation>> {
        self.queries.borrow_mut().push(query.clone());
        Ok(self.observations.clone())
    }
}

fn two_eyeballs() -> PopulationEstimate {
    PopulationEstimate::from_records(
        "JP",
        vec![PopulationRecord::new(100, 0.6), PopulationRecord::new(200, 0.4)],
    )
}

fn scenario_observations() -> Vec<HegemonyObservation> {
    vec![
        HegemonyObservation::new(50, 100, 0.5),
        HegemonyObservation::new(50, 200, 0.5),
        HegemonyObservation::new(100, 100, 1.0),
    ]
}

fn d0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_weighted_scenario() {
    let result = aggregate(&two_eyeballs(), &scenario_observations(), &AggregationOptions::new()).unwrap();

    assert_close(result.denominator, 1.0);
    assert_eq!(result.scores.len(), 2);
    assert_eq!(result.scores[0].0, 50);
    assert_close(result.scores[0].1, 0.5);
    assert_eq!(result.scores[1].0, 100);
    assert_close(result.scores[1].1, 0.6);
}

#[test]
fn test_remove_eyeball_drops_self_observation() {
    let options = AggregationOptions::new().with_remove_eyeball(true);
    let result = aggregate(&two_eyeballs(), &scenario_observations(), &options).unwrap();

    assert_eq!(result.scores.len(), 1);
    assert_eq!(result.scores[0].0, 50);
    assert_close(result.scores[0].1, 0.5);
    // origins are still counted even when their only observation was dropped
    assert_close(result.denominator, 1.0);
    assert_eq!(result.origin_asns_observed, BTreeSet::from([100, 200]));
    assert!(result.score(&100).is_none());
}

#[test]
fn test_no_weight_denominator_counts_origins() {
    let population = PopulationEstimate::from_records(
        "JP",
        vec![PopulationRecord::new(100, 0.9), PopulationRecord::new(200, 0.05)],
    );
    let options = AggregationOptions::new().with_no_weight(true);
    let result = aggregate(&population, &scenario_observations(), &options).unwrap();

    assert_close(result.denominator, 2.0);
    // raw values: 50 -> 0.5 + 0.5, 100 -> 1.0
    assert_close(result.score(&50).unwrap(), 0.5);
    assert_close(result.score(&100).unwrap(), 0.5);
}

#[test]
fn test_weighted_denominator_only_uses_observed_origins() {
    let population = PopulationEstimate::from_records(
        "JP",
        vec![
            PopulationRecord::new(100, 0.5),
            PopulationRecord::new(200, 0.3),
            PopulationRecord::new(300, 0.2),
        ],
    );
    let observations = vec![
        HegemonyObservation::new(7, 100, 1.0),
        HegemonyObservation::new(7, 200, 0.5),
    ];
    let result = aggregate(&population, &observations, &AggregationOptions::new()).unwrap();

    assert_close(result.denominator, 0.8);
    assert_close(result.score(&7).unwrap(), (0.5 + 0.15) / 0.8);
}

#[test]
fn test_scores_sorted_and_non_negative() {
    let population = PopulationEstimate::from_records(
        "BR",
        vec![
            PopulationRecord::new(1, 0.2),
            PopulationRecord::new(2, 0.3),
            PopulationRecord::new(3, 0.5),
        ],
    );
    let observations = vec![
        HegemonyObservation::new(1, 1, 1.0),
        HegemonyObservation::new(2, 2, 1.0),
        HegemonyObservation::new(3, 3, 1.0),
        HegemonyObservation::new(10, 1, 0.9),
        HegemonyObservation::new(10, 2, 0.1),
        HegemonyObservation::new(11, 3, 0.7),
        HegemonyObservation::new(12, 3, 0.0),
    ];
    let result = aggregate(&population, &observations, &AggregationOptions::new()).unwrap();

    assert!(result.scores.iter().all(|&(_, score)| score >= 0.0));
    assert!(result.scores.windows(2).all(|pair| pair[0].1 <= pair[1].1));

    let top: Vec<u32> = result.top(2).map(|&(asn, _)| asn).collect();
    assert_eq!(top, vec![3, 11]);
}

#[test]
fn test_empty_observations_are_no_data() {
    let err = aggregate(&two_eyeballs(), &[], &AggregationOptions::new()).unwrap_err();
    assert!(matches!(err, HegeError::NoData(_)));

    let options = AggregationOptions::new().with_no_weight(true);
    let err = aggregate(&two_eyeballs(), &[], &options).unwrap_err();
    assert!(err.is_no_data());
}

#[test]
fn test_only_self_observations_with_remove_eyeball_is_no_data() {
    let observations = vec![
        HegemonyObservation::new(100, 100, 1.0),
        HegemonyObservation::new(200, 200, 1.0),
    ];
    let options = AggregationOptions::new().with_remove_eyeball(true);
    let err = aggregate(&two_eyeballs(), &observations, &options).unwrap_err();
    assert!(matches!(err, HegeError::NoData(_)));

    // without the flag the same observations rank the eyeballs themselves
    let result = aggregate(&two_eyeballs(), &observations, &AggregationOptions::new()).unwrap();
    assert_eq!(result.scores.len(), 2);
}

#[test]
fn test_compute_hegemony_queries_one_minute_window() {
    let source = CannedSource::new(scenario_observations());
    let result = compute_hegemony(&source, &two_eyeballs(), d0(), &AggregationOptions::new()).unwrap();

    assert_eq!(result.scores.len(), 2);
    let queries = source.queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].start, d0());
    assert_eq!(queries[0].end, d0() + Duration::minutes(1));
    assert_eq!(queries[0].origin_asns, BTreeSet::from([100, 200]));
}

#[test]
fn test_compute_hegemony_empty_population_skips_query() {
    let source = CannedSource::new(scenario_observations());
    let population = PopulationEstimate::new("JP");
    let err = compute_hegemony(&source, &population, d0(), &AggregationOptions::new()).unwrap_err();

    assert!(err.is_no_data());
    assert!(err.to_string().contains("no eyeball networks"));
    assert!(source.queries.borrow().is_empty());
}

#[test]
fn test_compute_hegemony_no_observations() {
    let source = CannedSource::new(Vec::new());
    let err = compute_hegemony(&source, &two_eyeballs(), d0(), &AggregationOptions::new()).unwrap_err();
    assert!(err.is_no_data());
}
