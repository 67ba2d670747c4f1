//! Narration Generation
//!
//! Turns the chosen place plus the user's raw coordinates into a short
//! spoken-style story. The coordinates let the model disambiguate which
//! "Old Fort" this is without the persona ever naming the city back.

use crate::llm::LanguageModel;
use crate::place::{Coordinate, PlaceCandidate};
use std::sync::Arc;
use tracing::warn;

const GUIDE_PERSONA: &str = "You are a helpful tour guide walking alongside the traveler. \
You are in the middle of an ongoing conversation, so never greet or introduce yourself — \
just keep talking. Describe the place vividly in a few sentences; local legends, lore and \
curious details are welcome. Use the coordinates only to work out which exact place this \
is; never state the city, town or the coordinates themselves.";

/// The outcome of a narration attempt. `Unavailable` carries the reason so
/// callers can log it and tests can assert on the branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    Narrated(String),
    Unavailable(String),
}

pub struct Narrator {
    model: Arc<dyn LanguageModel>,
}

impl Narrator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Produces the narration for `place` as seen from `at`. Fail-soft: a
    /// failed call or blank answer becomes `Unavailable`, never an error.
    pub async fn describe(&self, place: &PlaceCandidate, at: Coordinate) -> NarrationOutcome {
        let prompt = format!(
            "The traveler is standing at latitude {:.6}, longitude {:.6}. \
             The nearest point of interest is \"{}\"{}, about {} away. \
             Tell the traveler about this place.",
            at.latitude,
            at.longitude,
            place.title,
            if place.subtitle.is_empty() {
                String::new()
            } else {
                format!(" ({})", place.subtitle)
            },
            place.distance_text,
        );

        match self.model.complete(GUIDE_PERSONA, &prompt).await {
            Ok(text) if !text.trim().is_empty() => NarrationOutcome::Narrated(text.trim().to_string()),
            Ok(_) => NarrationOutcome::Unavailable("model returned empty text".to_string()),
            Err(e) => {
                warn!(place = %place.title, error = %e, "narration call failed");
                NarrationOutcome::Unavailable(e.to_string())
            }
        }
    }
}
