use serde::{Deserialize, Serialize};

/// Response body of the statistics API. A body without `data` counts as empty.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub new_cases: Option<i64>,
    #[serde(default)]
    pub new_deaths: Option<i64>,
    #[serde(default)]
    pub area_name: Option<String>,
}

/// A side reported as `null` is treated the same as a missing one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BreakdownRecord {
    #[serde(default)]
    pub male: Option<Vec<AgeBand>>,
    #[serde(default)]
    pub female: Option<Vec<AgeBand>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgeBand {
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn title(self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryCard {
    pub id: String,
    pub title: String,
    pub value: String,
    pub description: String,
}
