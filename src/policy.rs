//! Invocation policy
//!
//! Decides when the engine runs. New-message events for a conversation arrive
//! in bursts, so recomputation is debounced: only the latest snapshot is kept
//! and it is released once no newer snapshot has arrived for the window.
//!
//! Time is passed in explicitly (`now_ms`), which keeps the policy
//! deterministic and independent of any async runtime.

use crate::types::{Message, ParticipantPair};

/// Default debounce window in milliseconds
pub const DEFAULT_DEBOUNCE_MS: i64 = 1_200;

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    due_at_ms: i64,
}

/// Trailing-edge debouncer holding at most one pending value
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window_ms: i64,
    pending: Option<Pending<T>>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl<T> Debouncer<T> {
    /// Create a debouncer; negative windows are treated as zero
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms: window_ms.max(0),
            pending: None,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Replace any pending value and restart the window
    pub fn offer(&mut self, value: T, now_ms: i64) {
        self.pending = Some(Pending {
            value,
            due_at_ms: now_ms.saturating_add(self.window_ms),
        });
    }

    /// Release the pending value if its window has elapsed
    pub fn poll(&mut self, now_ms: i64) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now_ms >= p.due_at_ms);
        if due {
            self.pending.take().map(|p| p.value)
        } else {
            None
        }
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes due, if any
    pub fn deadline_ms(&self) -> Option<i64> {
        self.pending.as_ref().map(|p| p.due_at_ms)
    }
}

/// A watched conversation: its canonical participants and pending snapshot
#[derive(Debug, Clone)]
pub struct ConversationWatch {
    conversation_id: String,
    participants: ParticipantPair,
    debouncer: Debouncer<Vec<Message>>,
}

impl ConversationWatch {
    /// Watch a conversation from the point of view of `current_user`.
    ///
    /// The pair is stored in canonical order, so both participants' clients
    /// write the same `user_a` / `user_b`.
    pub fn new(
        conversation_id: impl Into<String>,
        current_user: impl Into<String>,
        other_user: impl Into<String>,
        debounce_ms: i64,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            participants: ParticipantPair::canonical(current_user, other_user),
            debouncer: Debouncer::new(debounce_ms),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn participants(&self) -> &ParticipantPair {
        &self.participants
    }

    /// Record the latest message snapshot
    pub fn on_messages(&mut self, snapshot: Vec<Message>, now_ms: i64) {
        self.debouncer.offer(snapshot, now_ms);
    }

    /// Take the snapshot if it is due for recomputation
    pub fn take_due(&mut self, now_ms: i64) -> Option<Vec<Message>> {
        self.debouncer.poll(now_ms)
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
