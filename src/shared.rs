use std::fmt;

use thiserror::Error;

pub type ASN = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints;

impl Endpoints {
    pub const APNIC_ECONOMIES: &'static str =
        "http://v6data.data.labs.apnic.net/ipv6-measurement/Economies";
    pub const IHR_HEGEMONY: &'static str = "https://ihr.iijlab.net/ihr/api/hegemony/";
}

/// Address family of the hegemony graphs to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddressFamily {
    V4 = 4,
    V6 = 6,
}

impl AddressFamily {
    pub fn from_number(af: u8) -> Option<Self> {
        match af {
            4 => Some(AddressFamily::V4),
            6 => Some(AddressFamily::V6),
            _ => None,
        }
    }

    pub fn as_number(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        };
        write!(f, "{}", s)
    }
}

#[derive(Error, Debug)]
pub enum FetchFailure {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("origin AS{originasn} still has more results after {pages} pages")]
    PageLimit { originasn: ASN, pages: usize },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum HegeError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchFailure,
    },

    #[error("no data: {0}")]
    NoData(String),

    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("plot error: {0}")]
    Plot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HegeError {
    pub fn fetch(url: impl Into<String>, source: impl Into<FetchFailure>) -> Self {
        HegeError::Fetch {
            url: url.into(),
            source: source.into(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, HegeError::NoData(_))
    }
}

pub type Result<T> = std::result::Result<T, HegeError>;
