//! Nearby-Place Finder
//!
//! Wraps the raw suggest capability with the walking-distance policy: only
//! candidates within [`MAX_DISTANCE_M`] survive, ordered nearest-first.
//! Upstream failures degrade to an empty result — a broken suggest backend
//! must never take the whole pipeline down.

use crate::place::{Coordinate, PlaceCandidate};
use crate::suggest::PlaceSuggest;
use std::sync::Arc;
use tracing::warn;

/// Candidates further away than this are not worth narrating.
pub const MAX_DISTANCE_M: f64 = 150.0;

pub struct NearbyFinder {
    suggest: Arc<dyn PlaceSuggest>,
}

impl NearbyFinder {
    pub fn new(suggest: Arc<dyn PlaceSuggest>) -> Self {
        Self { suggest }
    }

    /// Returns candidates within walking distance of `center`, nearest first.
    ///
    /// Fail-soft: a failed or malformed upstream call is logged and treated
    /// as "nothing found".
    pub async fn find(&self, center: Coordinate, hint: Option<&str>) -> Vec<PlaceCandidate> {
        let mut found = match self.suggest.suggest(center, hint).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(hint = hint.unwrap_or("<none>"), error = %e, "suggest lookup failed, treating as empty");
                return Vec::new();
            }
        };

        found.retain(|c| c.distance_m <= MAX_DISTANCE_M);
        found.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        found
    }
}
