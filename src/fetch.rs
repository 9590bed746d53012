use crate::errors::FetchError;
use crate::models::ApiEnvelope;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// One request against the statistics API: area filters plus the field
/// projection the API should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiQuery {
    filters: Vec<(String, String)>,
    structure: Vec<(String, String)>,
}

impl ApiQuery {
    pub fn new(filters: &[(&str, &str)], structure: &[(&str, &str)]) -> Self {
        Self {
            filters: owned_pairs(filters),
            structure: owned_pairs(structure),
        }
    }

    pub fn nation_series(area_name: &str) -> Self {
        Self::new(
            &[("areaType", "nation"), ("areaName", area_name)],
            &[
                ("date", "date"),
                ("newCases", "newCasesByPublishDate"),
                ("newDeaths", "newDeaths28DaysByPublishDate"),
            ],
        )
    }

    pub fn sex_breakdown(area_name: &str) -> Self {
        Self::new(
            &[("areaType", "nation"), ("areaName", area_name)],
            &[("male", "maleCases"), ("female", "femaleCases")],
        )
    }

    pub fn regional_cases(date: NaiveDate) -> Self {
        let date = date.format("%Y-%m-%d").to_string();
        Self::new(
            &[("areaType", "ltla"), ("date", &date)],
            &[
                ("date", "date"),
                ("newCases", "newCasesByPublishDate"),
                ("areaName", "areaName"),
            ],
        )
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn requests_field(&self, key: &str) -> bool {
        self.structure.iter().any(|(k, _)| k == key)
    }

    pub fn filters_param(&self) -> String {
        self.filters
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    pub fn structure_param(&self) -> String {
        let fields = self
            .structure
            .iter()
            .map(|(k, v)| format!("{}:{}", json_string(k), json_string(v)))
            .collect::<Vec<_>>()
            .join(",");
        format!("{{{fields}}}")
    }

    pub fn to_url(&self, base: &str) -> String {
        format!(
            "{base}?filters={}&structure={}",
            self.filters_param(),
            self.structure_param()
        )
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Where raw response bodies come from. `Ok(None)` means the API answered
/// successfully with nothing to report.
pub trait DataSource {
    /// Base the query parameters are appended to; used in error reports.
    fn base_url(&self) -> &str;

    fn fetch_body(
        &self,
        query: &ApiQuery,
    ) -> impl Future<Output = Result<Option<String>, FetchError>>;
}

pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl DataSource for HttpSource {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_body(&self, query: &ApiQuery) -> Result<Option<String>, FetchError> {
        let url = query.to_url(&self.base_url);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::from_transport(&url, err))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|err| FetchError::from_transport(&url, err))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }
}

/// Result of one acquisition step, consumed uniformly by every chart builder.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Data(T),
    Empty,
    Failed(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Data(value) => FetchOutcome::Data(f(value)),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(err) => FetchOutcome::Failed(err),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchOutcome::Data(value) => Some(value),
            _ => None,
        }
    }
}

pub async fn fetch_records<S, T>(source: &S, query: &ApiQuery) -> FetchOutcome<Vec<T>>
where
    S: DataSource,
    T: DeserializeOwned,
{
    let body = match source.fetch_body(query).await {
        Ok(Some(body)) => body,
        Ok(None) => return FetchOutcome::Empty,
        Err(err) => {
            warn!("fetch failed: {err}");
            return FetchOutcome::Failed(err);
        }
    };

    match serde_json::from_str::<ApiEnvelope<T>>(&body) {
        Ok(envelope) if envelope.data.is_empty() => FetchOutcome::Empty,
        Ok(envelope) => FetchOutcome::Data(envelope.data),
        Err(decode) => {
            let err = FetchError::Decode {
                url: query.to_url(source.base_url()),
                source: decode,
            };
            warn!("fetch failed: {err}");
            FetchOutcome::Failed(err)
        }
    }
}
