use crate::errors::ConfigError;
use chrono::{Local, NaiveDate};
use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_API_BASE: &str = "https://api.coronavirus.data.gov.uk/v1/data";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base: String,
    pub geojson_path: PathBuf,
    pub fetch_timeout: Duration,
    pub area_name: String,
    pub as_of: NaiveDate,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let as_of = match lookup("DASHBOARD_DATE") {
            Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                ConfigError::Invalid {
                    key: "DASHBOARD_DATE",
                    value,
                }
            })?,
            None => Local::now().date_naive(),
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 8080)?,
            api_base: lookup("COVID_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            geojson_path: lookup("GEOJSON_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("geo.json")),
            fetch_timeout: Duration::from_secs(parse_or(&lookup, "FETCH_TIMEOUT_SECS", 10)?),
            area_name: lookup("AREA_NAME").unwrap_or_else(|| "england".to_string()),
            as_of,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
