//! The Guide Pipeline
//!
//! Sequential glue over the capabilities: cooldown gate → candidate sweep →
//! told-places exclusion → interest filter → nearest pick → narration →
//! dispatch. Each stage degrades to a fixed message rather than an error;
//! the only errors that leave this module are transport failures, which the
//! service's top-level handler logs.

use crate::aggregate::CandidateAggregator;
use crate::dispatch::{ChatPort, ResponseDispatcher};
use crate::filter::{FilterSource, InterestFilter};
use crate::narrate::{NarrationOutcome, Narrator};
use crate::place::Coordinate;
use crate::session::{SessionStore, UserId};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a location reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationEventKind {
    /// A discrete location share.
    Shared,
    /// A live-tracking update, delivered as an edited message. User-visible
    /// notices are suppressed for these; side effects are not.
    LiveUpdate,
}

impl LocationEventKind {
    fn is_live(self) -> bool {
        matches!(self, LocationEventKind::LiveUpdate)
    }
}

pub const COOLDOWN_NOTICE: &str =
    "Hold on — I'm still catching my breath. Send me a location again in a minute.";
pub const NOTHING_NEARBY: &str =
    "I couldn't spot anything worth a story right here. Try again a little further along.";
pub const NOTHING_NEW: &str =
    "We've covered this spot already. Walk on a bit and ask me again.";
pub const NO_STORY: &str =
    "There's a place right next to you, but I couldn't dig up anything to tell about it.";

pub struct GuidePipeline {
    sessions: SessionStore,
    aggregator: CandidateAggregator,
    filter: InterestFilter,
    narrator: Narrator,
    dispatcher: ResponseDispatcher,
    chat: Arc<dyn ChatPort>,
}

impl GuidePipeline {
    pub fn new(
        sessions: SessionStore,
        aggregator: CandidateAggregator,
        filter: InterestFilter,
        narrator: Narrator,
        dispatcher: ResponseDispatcher,
        chat: Arc<dyn ChatPort>,
    ) -> Self {
        Self {
            sessions,
            aggregator,
            filter,
            narrator,
            dispatcher,
            chat,
        }
    }

    /// Entry point for both location shares and live-tracking updates.
    pub async fn handle_location(
        &self,
        user: UserId,
        at: Coordinate,
        kind: LocationEventKind,
    ) -> Result<()> {
        if let Err(remaining) = self.sessions.check_cooldown(user).await {
            debug!(user, remaining_s = remaining.as_secs(), "cooldown active, dropping event");
            if !kind.is_live() {
                self.chat.send_text(user, COOLDOWN_NOTICE).await?;
            }
            return Ok(());
        }

        self.chat.send_typing(user).await?;
        let candidates = self.aggregator.collect(at).await;
        if candidates.is_empty() {
            info!(user, "no candidates near the coordinate");
            if !kind.is_live() {
                self.chat.send_text(user, NOTHING_NEARBY).await?;
            }
            return Ok(());
        }

        // Drop places this user already heard about.
        let mut fresh = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !self.sessions.is_told(user, &candidate.title).await {
                fresh.push(candidate);
            }
        }
        if fresh.is_empty() {
            info!(user, "every nearby candidate was already told");
            if !kind.is_live() {
                self.chat.send_text(user, NOTHING_NEW).await?;
            }
            return Ok(());
        }

        if fresh.len() > 1 {
            self.chat.send_typing(user).await?;
        }
        let filtered = self.filter.narrow(fresh).await;
        if let FilterSource::Fallback(reason) = &filtered.source {
            debug!(user, %reason, "interest filter fell back to the full list");
        }

        let mut picks = filtered.candidates;
        picks.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        let Some(place) = picks.into_iter().next() else {
            if !kind.is_live() {
                self.chat.send_text(user, NOTHING_NEARBY).await?;
            }
            return Ok(());
        };

        if !self.sessions.mark_told(user, &place.title).await {
            // Lost a race against another in-flight event for this user.
            info!(user, place = %place.title, "chosen place was told concurrently");
            if !kind.is_live() {
                self.chat.send_text(user, NOTHING_NEW).await?;
            }
            return Ok(());
        }

        self.chat.send_typing(user).await?;
        match self.narrator.describe(&place, at).await {
            NarrationOutcome::Narrated(text) => {
                info!(user, place = %place.title, "delivering narration");
                self.dispatcher.deliver(user, &place, &text).await
            }
            NarrationOutcome::Unavailable(reason) => {
                warn!(user, place = %place.title, %reason, "narration unavailable");
                if !kind.is_live() {
                    self.chat.send_text(user, NO_STORY).await?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MockChatPort;
    use crate::finder::NearbyFinder;
    use crate::llm::{LanguageModel, MockLanguageModel};
    use crate::place::PlaceCandidate;
    use crate::suggest::test_support::StubSuggest;
    use std::time::Duration;
    use tokio::time::advance;

    const USER: UserId = 42;

    fn candidate(title: &str, distance_m: f64) -> PlaceCandidate {
        PlaceCandidate {
            title: title.to_string(),
            subtitle: "Fortress".to_string(),
            distance_m,
            distance_text: format!("{distance_m} m"),
        }
    }

    fn here() -> Coordinate {
        Coordinate::new(55.751, 37.617)
    }

    fn build(
        sessions: SessionStore,
        stub: Arc<StubSuggest>,
        model: MockLanguageModel,
        chat: MockChatPort,
    ) -> GuidePipeline {
        let chat: Arc<dyn ChatPort> = Arc::new(chat);
        let model: Arc<dyn LanguageModel> = Arc::new(model);
        GuidePipeline::new(
            sessions,
            CandidateAggregator::new(NearbyFinder::new(stub)),
            InterestFilter::new(model.clone()),
            Narrator::new(model),
            ResponseDispatcher::new(chat.clone(), None),
            chat,
        )
    }

    /// Single fresh candidate: the filter is skipped and the reply is a
    /// text message with a search button for the place.
    #[tokio::test]
    async fn narrates_the_single_nearby_candidate() {
        let stub = Arc::new(StubSuggest::returning(vec![candidate("Old Fort", 50.0)]));

        let mut model = MockLanguageModel::new();
        model.expect_complete_json().times(0);
        model
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok("A weathered bastion with a story.".to_string()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text().times(0);
        chat.expect_send_text_with_link()
            .times(1)
            .withf(|user, text, _, url| {
                *user == USER
                    && text == "A weathered bastion with a story."
                    && url.contains("Old+Fort")
            })
            .returning(|_, _, _, _| Ok(()));

        let pipeline = build(SessionStore::new(), stub, model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }

    /// A second event 10 s later: cooldown message once, no new upstream
    /// calls.
    #[tokio::test(start_paused = true)]
    async fn repeat_within_cooldown_is_rejected_without_upstream_calls() {
        let stub = Arc::new(StubSuggest::returning(vec![candidate("Old Fort", 50.0)]));

        let mut model = MockLanguageModel::new();
        model.expect_complete_json().times(0);
        model
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok("A weathered bastion.".to_string()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text_with_link()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        chat.expect_send_text()
            .times(1)
            .withf(|user, text| *user == USER && text == COOLDOWN_NOTICE)
            .returning(|_, _| Ok(()));

        let pipeline = build(SessionStore::new(), stub.clone(), model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
        let upstream_calls = stub.calls();

        advance(Duration::from_secs(10)).await;
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();

        assert_eq!(stub.calls(), upstream_calls);
    }

    /// Live-tracking updates are rate limited identically but rejected
    /// silently.
    #[tokio::test(start_paused = true)]
    async fn live_update_cooldown_rejection_is_silent() {
        let stub = Arc::new(StubSuggest::returning(Vec::new()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        // One "nothing nearby"-free run: live mode never sends plain text.
        chat.expect_send_text().times(0);

        let pipeline = build(
            SessionStore::new(),
            stub,
            MockLanguageModel::new(),
            chat,
        );
        pipeline
            .handle_location(USER, here(), LocationEventKind::LiveUpdate)
            .await
            .unwrap();

        advance(Duration::from_secs(10)).await;
        pipeline
            .handle_location(USER, here(), LocationEventKind::LiveUpdate)
            .await
            .unwrap();
    }

    /// Empty candidate sweep: fixed message, no model involvement.
    #[tokio::test]
    async fn nothing_nearby_sends_fixed_message_and_skips_the_model() {
        let stub = Arc::new(StubSuggest::returning(Vec::new()));

        let mut model = MockLanguageModel::new();
        model.expect_complete().times(0);
        model.expect_complete_json().times(0);

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text()
            .times(1)
            .withf(|_, text| text == NOTHING_NEARBY)
            .returning(|_, _| Ok(()));

        let pipeline = build(SessionStore::new(), stub, model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }

    /// Candidates exist but were all narrated recently: "nothing new", no
    /// narration call.
    #[tokio::test]
    async fn already_told_candidates_yield_nothing_new() {
        let stub = Arc::new(StubSuggest::returning(vec![candidate("Old Fort", 50.0)]));

        let mut model = MockLanguageModel::new();
        model.expect_complete().times(0);
        model.expect_complete_json().times(0);

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text()
            .times(1)
            .withf(|_, text| text == NOTHING_NEW)
            .returning(|_, _| Ok(()));

        let sessions = SessionStore::new();
        sessions.mark_told(USER, "Old Fort").await;

        let pipeline = build(sessions, stub, model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }

    /// A told place is excluded, leaving the other candidate to be
    /// narrated (and, being the only one left, the filter is skipped).
    #[tokio::test]
    async fn told_place_is_excluded_from_candidates() {
        let stub = Arc::new(StubSuggest::returning(vec![
            candidate("Old Fort", 50.0),
            candidate("Chapel", 90.0),
        ]));

        let mut model = MockLanguageModel::new();
        model.expect_complete_json().times(0);
        model
            .expect_complete()
            .times(1)
            .withf(|_, prompt| prompt.contains("\"Chapel\""))
            .returning(|_, _| Ok("A quiet chapel.".to_string()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text_with_link()
            .times(1)
            .withf(|_, _, _, url| url.contains("Chapel"))
            .returning(|_, _, _, _| Ok(()));

        let sessions = SessionStore::new();
        sessions.mark_told(USER, "Old Fort").await;

        let pipeline = build(sessions, stub, model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }

    /// With several fresh candidates the filter runs, and the nearest of
    /// its selection is narrated. A garbage filter answer must not shrink
    /// the list.
    #[tokio::test]
    async fn filter_garbage_keeps_full_list_and_nearest_wins() {
        let stub = Arc::new(StubSuggest::returning(vec![
            candidate("Chapel", 90.0),
            candidate("Old Fort", 50.0),
        ]));

        let mut model = MockLanguageModel::new();
        model
            .expect_complete_json()
            .times(1)
            .returning(|_, _| Ok("not json at all".to_string()));
        model
            .expect_complete()
            .times(1)
            .withf(|_, prompt| prompt.contains("\"Old Fort\""))
            .returning(|_, _| Ok("A weathered bastion.".to_string()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text_with_link()
            .times(1)
            .withf(|_, _, _, url| url.contains("Old+Fort"))
            .returning(|_, _, _, _| Ok(()));

        let pipeline = build(SessionStore::new(), stub, model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }

    /// Narration failure degrades to the fixed "no story" message.
    #[tokio::test]
    async fn unavailable_narration_sends_no_story_message() {
        let stub = Arc::new(StubSuggest::returning(vec![candidate("Old Fort", 50.0)]));

        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok(String::new()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text_with_link().times(0);
        chat.expect_send_text()
            .times(1)
            .withf(|_, text| text == NO_STORY)
            .returning(|_, _| Ok(()));

        let pipeline = build(SessionStore::new(), stub, model, chat);
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }

    /// The narrated place is recorded, so the next sweep (after the
    /// cooldown window) skips it.
    #[tokio::test(start_paused = true)]
    async fn narrated_place_is_recorded_as_told() {
        let stub = Arc::new(StubSuggest::returning(vec![candidate("Old Fort", 50.0)]));

        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok("A weathered bastion.".to_string()));

        let mut chat = MockChatPort::new();
        chat.expect_send_typing().returning(|_| Ok(()));
        chat.expect_send_text_with_link()
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        chat.expect_send_text()
            .times(1)
            .withf(|_, text| text == NOTHING_NEW)
            .returning(|_, _| Ok(()));

        let sessions = SessionStore::new();
        let pipeline = build(sessions.clone(), stub, model, chat);

        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
        assert!(sessions.is_told(USER, "Old Fort").await);

        advance(Duration::from_secs(61)).await;
        pipeline
            .handle_location(USER, here(), LocationEventKind::Shared)
            .await
            .unwrap();
    }
}
