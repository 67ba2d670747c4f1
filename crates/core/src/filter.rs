//! Interest Filter
//!
//! Narrows a candidate list to the places a tourist would actually care
//! about by asking the language model to pick a subset. The model is an
//! advisor, not a gatekeeper: any failure or unusable answer keeps the full
//! list, and the branch taken is part of the result so callers and tests
//! can see it.

use crate::llm::LanguageModel;
use crate::place::PlaceCandidate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

const FILTER_INSTRUCTION: &str = "You pick out the places a tourist would find interesting \
(sights, history, culture, unusual spots) from a list of nearby places. \
Respond with a single JSON object of the form {\"places\": [...]}, where each kept \
place preserves every field exactly as given in the input. Keep only interesting \
places; drop mundane ones like offices, shops and bus stops.";

/// Which branch produced the surviving candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSource {
    /// The model returned a usable non-empty selection.
    Model,
    /// Zero or one candidate — the model was never consulted.
    Skipped,
    /// The model call failed or returned something unusable; the full
    /// input list survives.
    Fallback(String),
}

#[derive(Debug, Clone)]
pub struct FilterResult {
    pub candidates: Vec<PlaceCandidate>,
    pub source: FilterSource,
}

#[derive(Debug, Deserialize)]
struct FilteredPlaces {
    #[serde(default)]
    places: Vec<PlaceCandidate>,
}

pub struct InterestFilter {
    model: Arc<dyn LanguageModel>,
}

impl InterestFilter {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Shrinks `candidates` to the tourist-interesting subset.
    ///
    /// Never fails and never returns an empty list for a non-empty input.
    pub async fn narrow(&self, candidates: Vec<PlaceCandidate>) -> FilterResult {
        if candidates.len() <= 1 {
            return FilterResult {
                candidates,
                source: FilterSource::Skipped,
            };
        }

        let serialized = match serde_json::to_string(&candidates) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "could not serialize candidates, keeping full list");
                return FilterResult {
                    candidates,
                    source: FilterSource::Fallback(format!("serialize: {e}")),
                };
            }
        };

        match self.model.complete_json(FILTER_INSTRUCTION, &serialized).await {
            Ok(raw) => match serde_json::from_str::<FilteredPlaces>(&raw) {
                Ok(parsed) if !parsed.places.is_empty() => FilterResult {
                    candidates: parsed.places,
                    source: FilterSource::Model,
                },
                Ok(_) => {
                    warn!("interest filter returned an empty selection, keeping full list");
                    FilterResult {
                        candidates,
                        source: FilterSource::Fallback("empty selection".to_string()),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "interest filter response was not valid JSON, keeping full list");
                    FilterResult {
                        candidates,
                        source: FilterSource::Fallback(format!("parse: {e}")),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "interest filter call failed, keeping full list");
                FilterResult {
                    candidates,
                    source: FilterSource::Fallback(format!("model: {e}")),
                }
            }
        }
    }
}
