//! Place-Suggest Capability
//!
//! This module defines the contract for looking up points of interest around
//! a coordinate and provides the production implementation against a
//! Yandex-style geosuggest HTTP endpoint.

use crate::place::{Coordinate, PlaceCandidate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Upstream result limit per lookup.
const RESULT_LIMIT: u32 = 10;

/// Longitude/latitude span of the bounding box the search is restricted to.
const BBOX_SPAN: (f64, f64) = (0.012, 0.008);

/// Defines the contract for any service that can list places near a point.
///
/// The production implementation talks to a geosuggest HTTP API; tests use a
/// canned stub. Implementations return the raw upstream candidates — the
/// distance threshold and ordering are applied by the finder on top.
#[async_trait]
pub trait PlaceSuggest: Send + Sync {
    /// Looks up candidates around `center`, optionally steered by a
    /// free-text category hint (e.g. "museum").
    async fn suggest(&self, center: Coordinate, hint: Option<&str>) -> Result<Vec<PlaceCandidate>>;
}

/// A `PlaceSuggest` implementation backed by a Yandex-style suggest endpoint.
pub struct GeoSuggestClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    lang: String,
}

impl GeoSuggestClient {
    /// Creates a client for the given endpoint and credential.
    ///
    /// `lang` selects the language of returned titles and is fixed per
    /// deployment.
    pub fn new(base_url: String, api_key: String, lang: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            lang,
        }
    }
}

#[async_trait]
impl PlaceSuggest for GeoSuggestClient {
    async fn suggest(&self, center: Coordinate, hint: Option<&str>) -> Result<Vec<PlaceCandidate>> {
        let ll = format!("{},{}", center.longitude, center.latitude);
        let spn = format!("{},{}", BBOX_SPAN.0, BBOX_SPAN.1);
        let results = RESULT_LIMIT.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("apikey", &self.api_key),
            ("ll", &ll),
            ("spn", &spn),
            ("results", &results),
            ("lang", &self.lang),
            ("attrs", "uri"),
        ];
        if let Some(text) = hint {
            query.push(("text", text));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .context("suggest request failed")?
            .error_for_status()
            .context("suggest request rejected")?;

        let payload: SuggestResponse = response
            .json()
            .await
            .context("suggest response was not valid JSON")?;

        Ok(parse_candidates(payload))
    }
}

// --- Wire Types ---

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    results: Vec<SuggestItem>,
}

#[derive(Debug, Deserialize)]
struct SuggestItem {
    title: Option<TextField>,
    subtitle: Option<TextField>,
    distance: Option<DistanceField>,
}

#[derive(Debug, Deserialize)]
struct TextField {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DistanceField {
    value: f64,
    text: String,
}

/// Converts the wire payload into candidates, skipping items that are
/// missing a title or a reported distance.
fn parse_candidates(payload: SuggestResponse) -> Vec<PlaceCandidate> {
    payload
        .results
        .into_iter()
        .filter_map(|item| {
            let title = item.title?;
            let distance = item.distance?;
            Some(PlaceCandidate {
                title: title.text,
                subtitle: item.subtitle.map(|s| s.text).unwrap_or_default(),
                distance_m: distance.value,
                distance_text: distance.text,
            })
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_results() {
        let raw = r#"{
            "results": [
                {
                    "title": {"text": "Old Fort"},
                    "subtitle": {"text": "Fortress"},
                    "distance": {"value": 50.0, "text": "50 m"}
                },
                {
                    "title": {"text": "City Museum"},
                    "distance": {"value": 120.5, "text": "120 m"}
                }
            ]
        }"#;

        let payload: SuggestResponse = serde_json::from_str(raw).unwrap();
        let candidates = parse_candidates(payload);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "Old Fort");
        assert_eq!(candidates[0].subtitle, "Fortress");
        assert_eq!(candidates[1].subtitle, "");
        assert_eq!(candidates[1].distance_m, 120.5);
    }

    #[test]
    fn skips_items_without_title_or_distance() {
        let raw = r#"{
            "results": [
                {"subtitle": {"text": "no title"}, "distance": {"value": 10.0, "text": "10 m"}},
                {"title": {"text": "no distance"}},
                {"title": {"text": "Chapel"}, "distance": {"value": 80.0, "text": "80 m"}}
            ]
        }"#;

        let payload: SuggestResponse = serde_json::from_str(raw).unwrap();
        let candidates = parse_candidates(payload);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Chapel");
    }

    #[test]
    fn tolerates_missing_results_field() {
        let payload: SuggestResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_candidates(payload).is_empty());
    }
}
