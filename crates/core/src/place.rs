use serde::{Deserialize, Serialize};

/// A latitude/longitude pair as delivered by the chat transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A point of interest returned by the suggest capability.
///
/// Candidates have no identity beyond their title; deduplication and the
/// told-places memory both key on exact title equality. The struct is
/// serde-round-trippable because the interest filter sends candidates to
/// the model and parses the same shape back out of its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub title: String,
    pub subtitle: String,
    /// Straight-line distance from the user, in meters.
    pub distance_m: f64,
    /// Human-readable distance as reported upstream (e.g. "50 m").
    pub distance_text: String,
}
