//! Response Dispatch
//!
//! The last pipeline stage: deliver a finished narration to the user, as a
//! voice note when synthesis is configured, otherwise as text with a single
//! "find out more" link button. The chat transport itself sits behind the
//! `ChatPort` trait so the core stays free of any bot framework.

use crate::place::PlaceCandidate;
use crate::session::UserId;
use crate::speech::SpeechSynthesizer;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Label of the inline search button under text replies.
pub const LINK_LABEL: &str = "Find out more";

/// Defines the contract for everything the core sends back through the
/// chat transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn send_text(&self, user: UserId, text: &str) -> Result<()>;

    /// Text reply with one inline URL button.
    async fn send_text_with_link(
        &self,
        user: UserId,
        text: &str,
        label: &str,
        url: &str,
    ) -> Result<()>;

    /// Sends the audio file at `audio` as a voice attachment.
    async fn send_voice(&self, user: UserId, audio: &Path) -> Result<()>;

    /// Typing indicator shown while an upstream call is in flight.
    async fn send_typing(&self, user: UserId) -> Result<()>;
}

/// Web search link for a place, with the query form-encoded into the URL.
pub fn search_url(place: &PlaceCandidate) -> String {
    let query = if place.subtitle.is_empty() {
        place.title.clone()
    } else {
        format!("{} {}", place.title, place.subtitle)
    };
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://www.google.com/search?q={encoded}")
}

pub struct ResponseDispatcher {
    chat: Arc<dyn ChatPort>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ResponseDispatcher {
    pub fn new(chat: Arc<dyn ChatPort>, speech: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { chat, speech }
    }

    /// Delivers `narration` about `place` to `user`.
    ///
    /// Voice first when enabled; any synthesis or delivery error falls back
    /// to the text path. Transport errors on the text path propagate to the
    /// caller's top-level handler.
    pub async fn deliver(
        &self,
        user: UserId,
        place: &PlaceCandidate,
        narration: &str,
    ) -> Result<()> {
        if let Some(speech) = &self.speech {
            match self.deliver_voice(speech.as_ref(), user, narration).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(user, error = %e, "voice delivery failed, falling back to text");
                }
            }
        }

        let url = search_url(place);
        self.chat
            .send_text_with_link(user, narration, LINK_LABEL, &url)
            .await
    }

    async fn deliver_voice(
        &self,
        speech: &dyn SpeechSynthesizer,
        user: UserId,
        narration: &str,
    ) -> Result<()> {
        self.chat.send_typing(user).await?;
        let audio = speech.synthesize(narration).await?;

        let path = voice_file_path();
        tokio::fs::write(&path, &audio).await?;

        let sent = self.chat.send_voice(user, &path).await;

        // The file is removed whether or not the send succeeded.
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "failed to remove temporary voice file");
        }

        sent
    }
}

/// A unique temp-file name so concurrent syntheses never collide.
fn voice_file_path() -> PathBuf {
    std::env::temp_dir().join(format!("wanderlore-voice-{}.ogg", Uuid::new_v4()))
}
