use crate::errors::GeoError;
use geojson::{FeatureCollection, GeoJson};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::fs;

/// Property of each boundary feature that holds the local authority name.
pub const FEATURE_ID_KEY: &str = "properties.lad15nm";
const NAME_PROPERTY: &str = "lad15nm";

/// Local authority boundaries the choropleth maps are drawn against.
#[derive(Debug, Clone)]
pub struct GeoReference {
    collection: FeatureCollection,
    names: BTreeSet<String>,
}

impl GeoReference {
    pub async fn load(path: &Path) -> Result<Self, GeoError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path)
            .await
            .map_err(|source| GeoError::Read {
                path: display.clone(),
                source,
            })?;
        let geojson = contents
            .parse::<GeoJson>()
            .map_err(|source| GeoError::Parse {
                path: display.clone(),
                source,
            })?;
        Self::from_geojson(geojson).ok_or(GeoError::NotFeatureCollection { path: display })
    }

    pub fn from_geojson(geojson: GeoJson) -> Option<Self> {
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return None,
        };
        let names = collection
            .features
            .iter()
            .filter_map(|feature| feature.property(NAME_PROPERTY)?.as_str())
            .map(str::to_string)
            .collect();
        Some(Self { collection, names })
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn contains(&self, area: &str) -> bool {
        self.names.contains(area)
    }

    pub fn feature_count(&self) -> usize {
        self.collection.features.len()
    }

    /// Area names that have no boundary feature to be drawn on.
    pub fn unmatched<'a>(&self, areas: &'a [Option<String>]) -> Vec<&'a str> {
        areas
            .iter()
            .flatten()
            .map(String::as_str)
            .filter(|area| !self.contains(area))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GeoJson {
        GeoJson::from_json_value(value).unwrap()
    }

    #[test]
    fn collects_feature_names() {
        let geo = GeoReference::from_geojson(parse(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"lad15nm": "Camden"}, "geometry": null},
                {"type": "Feature", "properties": {"other": 1}, "geometry": null}
            ]
        })))
        .unwrap();
        assert_eq!(geo.feature_count(), 2);
        assert!(geo.contains("Camden"));
        assert!(!geo.contains("Leeds"));
    }

    #[test]
    fn unmatched_skips_known_and_missing_names() {
        let geo = GeoReference::from_geojson(parse(json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "properties": {"lad15nm": "Camden"}, "geometry": null}]
        })))
        .unwrap();
        let areas = vec![
            Some("Camden".to_string()),
            None,
            Some("Leeds".to_string()),
        ];
        assert_eq!(geo.unmatched(&areas), vec!["Leeds"]);
    }

    #[test]
    fn rejects_non_collections() {
        let feature = parse(json!({"type": "Feature", "properties": null, "geometry": null}));
        assert!(GeoReference::from_geojson(feature).is_none());
    }

    #[test]
    fn collection_serializes_for_plotly() {
        let geo = GeoReference::from_geojson(parse(json!({
            "type": "FeatureCollection",
            "features": []
        })))
        .unwrap();
        let value = serde_json::to_value(geo.collection()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = GeoReference::load(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::Read { .. }));
    }

    #[tokio::test]
    async fn non_geojson_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("covid_geo_{}.json", std::process::id()));
        tokio::fs::write(&path, b"{\"type\": \"Nonsense\"}").await.unwrap();
        let err = GeoReference::load(&path).await.unwrap_err();
        let _ = tokio::fs::remove_file(&path).await;
        assert!(matches!(err, GeoError::Parse { .. }));
    }
}
