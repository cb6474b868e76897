use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::{debug, info};

use crate::hegemony::{HegemonyObservation, HegemonyQuery, HegemonySource};
use crate::shared::{AddressFamily, Endpoints, FetchFailure, HegeError, Result, ASN};

pub const DEFAULT_MAX_PAGES: usize = 1000;

#[derive(Debug, Deserialize)]
pub(crate) struct HegemonyPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    pub results: Vec<HegemonyObservation>,
}

pub(crate) fn parse_page(body: &str) -> std::result::Result<HegemonyPage, serde_json::Error> {
    serde_json::from_str(body)
}

/// Client for the IHR AS hegemony REST API.
pub struct IhrHegemonyClient {
    pub base_url: String,
    pub af: AddressFamily,
    /// Pages followed per origin AS before giving up
    pub max_pages: usize,
    client: reqwest::blocking::Client,
}

impl IhrHegemonyClient {
    pub fn new() -> Self {
        IhrHegemonyClient {
            base_url: Endpoints::IHR_HEGEMONY.to_string(),
            af: AddressFamily::V4,
            max_pages: DEFAULT_MAX_PAGES,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_af(mut self, af: AddressFamily) -> Self {
        self.af = af;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<HegemonyPage> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .map_err(|e| HegeError::fetch(url, e))?;
        if !response.status().is_success() {
            return Err(HegeError::fetch(url, FetchFailure::Status(response.status())));
        }
        let body = response.text().map_err(|e| HegeError::fetch(url, e))?;
        parse_page(&body).map_err(|e| HegeError::fetch(url, e))
    }

    /// All pages for a single origin AS.
    fn query_origin(&self, originasn: ASN, query: &HegemonyQuery) -> Result<Vec<HegemonyObservation>> {
        let params = vec![
            ("originasn", originasn.to_string()),
            ("timebin__gte", query.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("timebin__lt", query.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("af", self.af.as_number().to_string()),
            ("format", "json".to_string()),
        ];

        let mut observations = Vec::new();
        let mut page = self.get(&self.base_url, &params)?;
        let mut pages = 1;
        debug!(originasn, count = ?page.count, "hegemony page 1");

        loop {
            observations.append(&mut page.results);
            let next = match page.next.take() {
                Some(next) if !next.is_empty() => next,
                _ => break,
            };
            if pages >= self.max_pages {
                return Err(HegeError::fetch(
                    next,
                    FetchFailure::PageLimit { originasn, pages },
                ));
            }
            // `next` already carries every query parameter
            page = self.get(&next, &[])?;
            pages += 1;
            debug!(originasn, page = pages, "hegemony page");
        }

        Ok(observations)
    }
}

impl Default for IhrHegemonyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HegemonySource for IhrHegemonyClient {
    fn observations(&self, query: &HegemonyQuery) -> Result<Vec<HegemonyObservation>> {
        info!(
            origins = query.origin_asns.len(),
            start = %query.start,
            af = %self.af,
            "querying AS hegemony"
        );

        let mut observations = Vec::new();
        for &originasn in &query.origin_asns {
            observations.extend(self.query_origin(originasn, query)?);
        }
        Ok(observations)
    }
}
