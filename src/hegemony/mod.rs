pub mod ihr;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{Result, ASN};

pub use ihr::IhrHegemonyClient;

/// How much of the traffic from `originasn` transits `asn` at one time bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HegemonyObservation {
    #[serde(default)]
    pub timebin: String,
    pub asn: ASN,
    pub originasn: ASN,
    pub hege: f64,
    #[serde(default)]
    pub af: Option<u8>,
}

impl HegemonyObservation {
    pub fn new(asn: ASN, originasn: ASN, hege: f64) -> Self {
        HegemonyObservation {
            timebin: String::new(),
            asn,
            originasn,
            hege,
            af: None,
        }
    }

    pub fn is_self_observation(&self) -> bool {
        self.asn == self.originasn
    }
}

/// Hegemony values wanted for a set of origins over `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HegemonyQuery {
    pub origin_asns: BTreeSet<ASN>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl HegemonyQuery {
    pub fn new(origin_asns: BTreeSet<ASN>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        HegemonyQuery {
            origin_asns,
            start,
            end,
        }
    }
}

/// External analytics backend serving AS hegemony observations.
pub trait HegemonySource {
    fn observations(&self, query: &HegemonyQuery) -> Result<Vec<HegemonyObservation>>;
}
