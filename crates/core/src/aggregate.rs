//! Candidate Aggregation
//!
//! One suggest pass per category hint, merged and deduplicated by exact
//! title. The hint sweep is deliberately sequential — the whole pipeline is
//! plain sequential glue and the suggest backend is close enough that the
//! extra latency does not matter.

use crate::finder::NearbyFinder;
use crate::place::{Coordinate, PlaceCandidate};
use std::collections::HashSet;

/// Category hints swept on every location event. The no-hint pass picks up
/// whatever the suggest backend itself considers notable around the point.
pub const CATEGORY_HINTS: [Option<&str>; 5] = [
    None,
    Some("tourist attraction"),
    Some("museum"),
    Some("monument"),
    Some("park"),
];

pub struct CandidateAggregator {
    finder: NearbyFinder,
}

impl CandidateAggregator {
    pub fn new(finder: NearbyFinder) -> Self {
        Self { finder }
    }

    /// Runs the full hint sweep around `center` and returns the unique
    /// candidates. The list is unordered; distance sorting happens after
    /// interest filtering. An empty result means "nothing nearby".
    pub async fn collect(&self, center: Coordinate) -> Vec<PlaceCandidate> {
        let mut merged = Vec::new();
        for hint in CATEGORY_HINTS {
            merged.extend(self.finder.find(center, hint).await);
        }
        dedup_by_title(merged)
    }
}

/// Keeps the first candidate seen for each title.
pub fn dedup_by_title(candidates: Vec<PlaceCandidate>) -> Vec<PlaceCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.title.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::test_support::StubSuggest;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn candidate(title: &str, distance_m: f64) -> PlaceCandidate {
        PlaceCandidate {
            title: title.to_string(),
            subtitle: String::new(),
            distance_m,
            distance_text: format!("{distance_m} m"),
        }
    }

    #[test]
    fn dedup_keeps_one_entry_per_title() {
        let deduped = dedup_by_title(vec![
            candidate("Old Fort", 50.0),
            candidate("City Museum", 80.0),
            candidate("Old Fort", 55.0),
            candidate("Old Fort", 48.0),
        ]);

        let titles: Vec<&str> = deduped.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Old Fort", "City Museum"]);

        // The survivor's distance is one of the original duplicates'.
        let fort = &deduped[0];
        assert!([50.0, 55.0, 48.0].contains(&fort.distance_m));
    }

    #[test]
    fn dedup_of_empty_list_is_empty() {
        assert!(dedup_by_title(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn collect_sweeps_every_hint_and_merges() {
        let mut map = HashMap::new();
        map.insert(None, vec![candidate("Old Fort", 50.0)]);
        map.insert(
            Some("museum".to_string()),
            vec![candidate("City Museum", 80.0), candidate("Old Fort", 50.0)],
        );
        let stub = Arc::new(StubSuggest::per_hint(map));

        let aggregator = CandidateAggregator::new(NearbyFinder::new(stub.clone()));
        let collected = aggregator.collect(Coordinate::new(55.75, 37.61)).await;

        assert_eq!(stub.calls(), CATEGORY_HINTS.len());
        let titles: Vec<&str> = collected.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Old Fort", "City Museum"]);
    }

    #[tokio::test]
    async fn collect_is_empty_when_backend_fails() {
        let aggregator = CandidateAggregator::new(NearbyFinder::new(Arc::new(
            StubSuggest::failing(),
        )));

        let collected = aggregator.collect(Coordinate::new(0.0, 0.0)).await;

        assert!(collected.is_empty());
    }
}
