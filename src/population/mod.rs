pub mod apnic;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::shared::{Result, ASN};

pub use apnic::ApnicPopulationClient;

/// Share of a country's estimated user population served by one AS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    #[serde(rename = "as")]
    pub asn: ASN,

    /// Population share of this AS
    pub percent: f64,

    /// Remaining fields from the source, kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PopulationRecord {
    pub fn new(asn: ASN, percent: f64) -> Self {
        PopulationRecord {
            asn,
            percent,
            extra: serde_json::Map::new(),
        }
    }
}

/// Eyeball networks of one country, keyed by ASN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationEstimate {
    pub country_code: String,
    pub records: BTreeMap<ASN, PopulationRecord>,
}

impl PopulationEstimate {
    pub fn new(country_code: &str) -> Self {
        PopulationEstimate {
            country_code: country_code.to_string(),
            records: BTreeMap::new(),
        }
    }

    pub fn from_records(country_code: &str, records: Vec<PopulationRecord>) -> Self {
        let mut estimate = PopulationEstimate::new(country_code);
        for record in records {
            estimate.insert(record);
        }
        estimate
    }

    pub fn insert(&mut self, record: PopulationRecord) {
        self.records.insert(record.asn, record);
    }

    pub fn get(&self, asn: &ASN) -> Option<&PopulationRecord> {
        self.records.get(asn)
    }

    pub fn percent(&self, asn: &ASN) -> Option<f64> {
        self.records.get(asn).map(|record| record.percent)
    }

    pub fn contains(&self, asn: &ASN) -> bool {
        self.records.contains_key(asn)
    }

    pub fn origin_asns(&self) -> BTreeSet<ASN> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Anything able to produce the population estimate of a country.
pub trait PopulationSource {
    fn fetch(&self, country_code: &str, min_population: f64) -> Result<PopulationEstimate>;
}

/// Parse the JSON array served by the population endpoint.
pub fn parse_population(
    country_code: &str,
    body: &str,
) -> std::result::Result<PopulationEstimate, serde_json::Error> {
    let records: Vec<PopulationRecord> = serde_json::from_str(body)?;
    Ok(PopulationEstimate::from_records(country_code, records))
}
