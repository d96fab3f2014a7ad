use crate::error::{OwnregError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.opencorporates.com/";
pub const DEFAULT_API_VERSION: &str = "v0.4.6";

/// Every OpenCorporates response wraps its payload in `results`
#[derive(Deserialize)]
struct Envelope<T> {
    results: T,
}

#[derive(Deserialize)]
struct JurisdictionResults {
    jurisdiction: Option<Jurisdiction>,
}

#[derive(Deserialize)]
struct Jurisdiction {
    code: Option<String>,
}

#[derive(Deserialize)]
struct CompanyResults {
    company: Company,
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    companies: Vec<CompanyResults>,
}

/// Company record as returned by OpenCorporates (sparse fields only)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Company {
    pub name: String,
    pub company_number: String,
    pub jurisdiction_code: String,
    pub incorporation_date: Option<String>,
    pub dissolution_date: Option<String>,
    pub company_type: Option<String>,
    pub current_status: Option<String>,
    pub registered_address_in_full: Option<String>,
}

/// OpenCorporates API client
///
/// Used to enrich imported companies. A non-success HTTP status is logged
/// and reported as "no data"; only transport failures are errors.
pub struct OpencorporatesClient {
    client: Client,
    api_url: Url,
    api_version: String,
    api_token: String,
}

impl OpencorporatesClient {
    /// Create a client against the public API
    pub fn new(api_token: String) -> Result<Self> {
        Self::with_base_url(
            api_token,
            DEFAULT_API_URL,
            DEFAULT_API_VERSION,
            Duration::from_secs(30),
        )
    }

    /// Create a client against a custom base URL and API version
    pub fn with_base_url(
        api_token: String,
        api_url: &str,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let api_url = Url::parse(api_url).map_err(|e| {
            OwnregError::Config(format!("Invalid OpenCorporates URL {}: {}", api_url, e))
        })?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url,
            api_version: api_version.to_string(),
            api_token,
        })
    }

    /// Match a free-text jurisdiction name (e.g. "United Kingdom") to its code
    pub async fn get_jurisdiction_code(&self, name: &str) -> Result<Option<String>> {
        let url = self.build_url("jurisdictions/match", &[("q", name)])?;
        let results: Option<JurisdictionResults> = self.get(url).await?;
        Ok(results.and_then(|r| r.jurisdiction).and_then(|j| j.code))
    }

    /// Fetch a single company
    pub async fn get_company(
        &self,
        jurisdiction_code: &str,
        company_number: &str,
        sparse: bool,
    ) -> Result<Option<Company>> {
        let path = format!("companies/{}/{}", jurisdiction_code, company_number);
        let params = if sparse { vec![("sparse", "true")] } else { Vec::new() };
        let url = self.build_url(&path, &params)?;
        let results: Option<CompanyResults> = self.get(url).await?;
        Ok(results.map(|r| r.company))
    }

    /// Search a jurisdiction for companies matching a company number, best score first
    pub async fn search_companies(
        &self,
        jurisdiction_code: &str,
        company_number: &str,
    ) -> Result<Vec<Company>> {
        let url = self.build_url(
            "companies/search",
            &[
                ("q", company_number),
                ("jurisdiction_code", jurisdiction_code),
                ("fields", "company_number"),
                ("order", "score"),
            ],
        )?;
        let results: Option<SearchResults> = self.get(url).await?;
        Ok(results
            .map(|r| r.companies.into_iter().map(|c| c.company).collect())
            .unwrap_or_default())
    }

    /// `{api_url}/{version}/{path}?{params}&api_token=...`, each segment escaped
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| {
                    OwnregError::Config(format!(
                        "OpenCorporates URL cannot be a base: {}",
                        self.api_url
                    ))
                })?;
            segments.pop_if_empty().push(&self.api_version);
            for segment in path.split('/') {
                segments.push(segment);
            }
        }
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("api_token", &self.api_token);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        let path = url.path().to_string();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            log::info!("Received {} from OpenCorporates when calling {}", status.as_u16(), path);
            return Ok(None);
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(Some(envelope.results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpencorporatesClient {
        OpencorporatesClient::new("secret".to_string()).unwrap()
    }

    #[test]
    fn test_company_url() {
        let url = client().build_url("companies/gb/07711111", &[("sparse", "true")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.opencorporates.com/v0.4.6/companies/gb/07711111?sparse=true&api_token=secret"
        );
    }

    #[test]
    fn test_url_escapes_segments_and_params() {
        let url = client()
            .build_url("companies/us_de/12 34", &[("q", "A&B Holdings")])
            .unwrap();
        assert_eq!(url.path(), "/v0.4.6/companies/us_de/12%2034");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "A&B Holdings".to_string()),
                ("api_token".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_custom_base_url_with_path() {
        let client = OpencorporatesClient::with_base_url(
            "t".to_string(),
            "http://localhost:8080/proxy/",
            "v0.4.8",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = client.build_url("jurisdictions/match", &[("q", "Slovakia")]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/proxy/v0.4.8/jurisdictions/match?q=Slovakia&api_token=t"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = OpencorporatesClient::with_base_url(
            "t".to_string(),
            "not a url",
            DEFAULT_API_VERSION,
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(OwnregError::Config(_))));
    }

    #[test]
    fn test_parse_company_response() {
        let body = r#"{
            "api_version": "0.4.6",
            "results": {
                "company": {
                    "name": "FLAGSTAFF 1 LIMITED",
                    "company_number": "07711111",
                    "jurisdiction_code": "gb",
                    "incorporation_date": "2011-07-19",
                    "current_status": "Active"
                }
            }
        }"#;
        let envelope: Envelope<CompanyResults> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.results.company.name, "FLAGSTAFF 1 LIMITED");
        assert_eq!(envelope.results.company.current_status.as_deref(), Some("Active"));
        assert!(envelope.results.company.dissolution_date.is_none());
    }

    #[test]
    fn test_parse_search_response() {
        let body = r#"{"results": {"companies": [
            {"company": {"name": "A", "company_number": "1", "jurisdiction_code": "gb"}},
            {"company": {"name": "B", "company_number": "10", "jurisdiction_code": "gb"}}
        ]}}"#;
        let envelope: Envelope<SearchResults> = serde_json::from_str(body).unwrap();
        let numbers: Vec<_> = envelope
            .results
            .companies
            .iter()
            .map(|c| c.company.company_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["1", "10"]);
    }

    #[test]
    fn test_parse_jurisdiction_response() {
        let body = r#"{"results": {"jurisdiction": {"code": "gb", "name": "United Kingdom"}}}"#;
        let envelope: Envelope<JurisdictionResults> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.results.jurisdiction.and_then(|j| j.code).as_deref(), Some("gb"));
    }
}
