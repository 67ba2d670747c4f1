//! Per-User Session State
//!
//! The only shared mutable state in the process: a per-user cooldown stamp
//! and the set of places already narrated to that user. Everything lives in
//! memory and is lost on restart.
//!
//! Told places carry an expiry deadline on a monotonic clock rather than a
//! per-entry removal timer; a single periodic sweep reclaims expired
//! entries, and `is_told`/`mark_told` compare deadlines directly so
//! behaviour never depends on sweep timing. The sweep task handle is owned
//! by the caller and must be aborted on shutdown.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// Telegram chat identifier.
pub type UserId = i64;

/// Minimum interval between processed location events per user.
pub const COOLDOWN: Duration = Duration::from_secs(60);

/// How long a narrated place stays suppressed for a user.
pub const TOLD_RETENTION: Duration = Duration::from_secs(60 * 60);

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct UserSession {
    last_request_at: Option<Instant>,
    /// Title → deadline after which the place may be narrated again.
    told_places: HashMap<String, Instant>,
}

/// In-memory session store keyed by user id. Cloning is cheap and shares
/// the underlying map.
#[derive(Clone, Default)]
pub struct SessionStore {
    users: Arc<Mutex<HashMap<UserId, UserSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cooldown gate. Accepts the event and stamps the current instant,
    /// or rejects it with the remaining wait time.
    ///
    /// The stamp is written inside the lock at acceptance — before any
    /// upstream call starts — which bounds concurrent in-flight pipelines
    /// per user to one in all but pathological races.
    pub async fn check_cooldown(&self, user: UserId) -> Result<(), Duration> {
        let mut users = self.users.lock().await;
        let session = users.entry(user).or_default();
        let now = Instant::now();

        if let Some(last) = session.last_request_at {
            let elapsed = now.duration_since(last);
            if elapsed < COOLDOWN {
                return Err(COOLDOWN - elapsed);
            }
        }

        session.last_request_at = Some(now);
        Ok(())
    }

    /// Whether `title` was narrated to `user` within the retention window.
    pub async fn is_told(&self, user: UserId, title: &str) -> bool {
        let users = self.users.lock().await;
        users
            .get(&user)
            .and_then(|session| session.told_places.get(title))
            .is_some_and(|deadline| *deadline > Instant::now())
    }

    /// Records `title` as narrated to `user` for the retention window.
    ///
    /// Returns `false` when the title is already live — the write-once
    /// guard the pipeline uses to abort instead of re-narrating.
    pub async fn mark_told(&self, user: UserId, title: &str) -> bool {
        let mut users = self.users.lock().await;
        let session = users.entry(user).or_default();
        let now = Instant::now();

        match session.told_places.get(title) {
            Some(deadline) if *deadline > now => false,
            _ => {
                session
                    .told_places
                    .insert(title.to_string(), now + TOLD_RETENTION);
                true
            }
        }
    }

    /// Drops told-place entries whose deadline has passed.
    pub async fn sweep_expired(&self) {
        let now = Instant::now();
        let mut users = self.users.lock().await;
        let mut dropped = 0usize;
        for session in users.values_mut() {
            let before = session.told_places.len();
            session.told_places.retain(|_, deadline| *deadline > now);
            dropped += before - session.told_places.len();
        }
        if dropped > 0 {
            debug!(dropped, "swept expired told-place entries");
        }
    }

    /// Spawns the periodic sweep. Abort the returned handle on shutdown.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SWEEP_INTERVAL);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                store.sweep_expired().await;
            }
        })
    }

    #[cfg(test)]
    pub(crate) async fn told_count(&self, user: UserId) -> usize {
        let users = self.users.lock().await;
        users
            .get(&user)
            .map(|session| session.told_places.len())
            .unwrap_or(0)
    }
}
