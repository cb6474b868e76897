use tracing::{debug, info};

use crate::population::{parse_population, PopulationEstimate, PopulationSource};
use crate::shared::{Endpoints, FetchFailure, HegeError, Result};

/// Client for the APNIC per-economy AS population estimates.
pub struct ApnicPopulationClient {
    pub base_url: String,
    client: reqwest::blocking::Client,
}

impl ApnicPopulationClient {
    pub fn new() -> Self {
        ApnicPopulationClient {
            base_url: Endpoints::APNIC_ECONOMIES.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn url_for(&self, country_code: &str) -> String {
        let cc = country_code.to_uppercase();
        format!("{}/{cc}/{cc}.asns.json", self.base_url, cc = cc)
    }

    fn download(&self, url: &str, min_population: f64) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(&[("m", min_population.to_string())])
            .send()
            .map_err(|e| HegeError::fetch(url, e))?;
        if !response.status().is_success() {
            return Err(HegeError::fetch(url, FetchFailure::Status(response.status())));
        }
        response.text().map_err(|e| HegeError::fetch(url, e))
    }
}

impl Default for ApnicPopulationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PopulationSource for ApnicPopulationClient {
    fn fetch(&self, country_code: &str, min_population: f64) -> Result<PopulationEstimate> {
        let url = self.url_for(country_code);
        info!(%url, min_population, "fetching population estimate");

        let body = self.download(&url, min_population)?;
        debug!(bytes = body.len(), "population estimate downloaded");

        let estimate = parse_population(&country_code.to_uppercase(), &body)
            .map_err(|e| HegeError::fetch(url.as_str(), e))?;
        info!(networks = estimate.len(), "population estimate parsed");
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_templated_by_upper_case_country() {
        let client = ApnicPopulationClient::new();
        assert_eq!(
            client.url_for("jp"),
            "http://v6data.data.labs.apnic.net/ipv6-measurement/Economies/JP/JP.asns.json"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ApnicPopulationClient::new().with_base_url("http://localhost:8080/".to_string());
        assert_eq!(client.url_for("FR"), "http://localhost:8080/FR/FR.asns.json");
    }
}
