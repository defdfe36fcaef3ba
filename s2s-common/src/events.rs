//! Per-session event fan-out
//!
//! Server-generated events (checkpoint saved, transcript fragment,
//! coaching result) are pushed to at most one live client connection per
//! session. Delivery is fire-and-forget: publishing to a session with no
//! subscriber is a no-op, and a failed delivery unregisters the dead
//! subscriber instead of surfacing an error to the publisher.
//!
//! Register/unregister/publish never await; the lock is a short-lived
//! std `RwLock` so publishers inside request handlers and background
//! tasks stay cheap relative to their external-call suspension points.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::CoachResponse;

/// Events delivered over a session's live connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A checkpoint was durably created
    CheckpointSaved { checkpoint_id: String },

    /// A transcript fragment was attached by background transcription
    TranscriptDelta {
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// A coaching turn completed
    CoachResponse { analysis: CoachResponse },
}

impl SessionEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::CheckpointSaved { .. } => "checkpoint_saved",
            SessionEvent::TranscriptDelta { .. } => "transcript_delta",
            SessionEvent::CoachResponse { .. } => "coach_response",
        }
    }
}

struct Subscriber {
    /// Generation id, so a replaced connection's teardown cannot evict
    /// the subscriber that replaced it
    id: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

/// Session-keyed registry of live subscribers, one per session.
///
/// Registering for a session silently replaces any prior subscriber
/// (last-register-wins); the replaced subscriber's receiver goes quiet.
/// No events are queued for absent subscribers and nothing is replayed.
pub struct SessionChannel {
    subscribers: RwLock<HashMap<String, Subscriber>>,
    next_id: AtomicU64,
}

impl SessionChannel {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Bind the calling connection as the sole subscriber for a session.
    ///
    /// The returned [`Subscription`] yields events until it is dropped or
    /// replaced by a later `register` for the same session. Dropping it
    /// unregisters the binding (unless it was already replaced).
    pub fn register(self: Arc<Self>, session_id: impl Into<String>) -> Subscription {
        let session_id = session_id.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        if subs.insert(session_id.clone(), Subscriber { id, tx }).is_some() {
            debug!(session_id = %session_id, "replaced existing event subscriber");
        }
        drop(subs);

        Subscription {
            channel: self,
            session_id,
            id,
            rx,
        }
    }

    /// Remove the binding for a session, if any.
    pub fn unregister(&self, session_id: &str) {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.remove(session_id);
    }

    /// Attempt delivery to the session's current subscriber.
    ///
    /// Best-effort: an absent subscriber is a silent no-op, and a dead
    /// subscriber (receiver dropped) is unregistered as a side effect.
    /// Never blocks and never returns an error to the publisher.
    pub fn publish(&self, session_id: &str, event: SessionEvent) {
        let stale = {
            let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            match subs.get(session_id) {
                Some(sub) => sub.tx.send(event).err().map(|_| sub.id),
                None => None,
            }
        };

        if let Some(id) = stale {
            self.remove_if(session_id, id);
            debug!(session_id = %session_id, "dropped dead event subscriber");
        }
    }

    /// Whether a session currently has a live subscriber
    pub fn has_subscriber(&self, session_id: &str) -> bool {
        let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        subs.contains_key(session_id)
    }

    /// Remove the binding only if it still belongs to the given generation
    fn remove_if(&self, session_id: &str, id: u64) {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        if subs.get(session_id).map(|s| s.id) == Some(id) {
            subs.remove(session_id);
        }
    }
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to one session's events
pub struct Subscription {
    channel: Arc<SessionChannel>,
    session_id: String,
    id: u64,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Subscription {
    /// Receive the next event. Returns `None` once this subscription has
    /// been replaced by a newer one for the same session.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll for an already-delivered event
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.channel.remove_if(&self.session_id, self.id);
    }
}
