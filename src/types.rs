//! Conversation data types
//!
//! This module defines the messages fed into the analytics engine and the
//! insight records it produces.

use serde::{Deserialize, Serialize};

/// A single direct message as supplied by the message source.
///
/// Only `sender_id` and `timestamp` take part in the computation; the other
/// fields are carried so that documents from the chat store deserialize as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Sender user id
    #[serde(default, alias = "senderId")]
    pub sender_id: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
    /// Message document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "senderName", skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, alias = "receiverId", skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<String>,
    /// Message text
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Message {
    /// Create a message with only the fields the engine reads
    pub fn new(sender_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sender_id: sender_id.into(),
            timestamp,
            ..Self::default()
        }
    }

    /// Attach message text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// The two participants of a conversation in canonical order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    pub user_a: String,
    pub user_b: String,
}

impl ParticipantPair {
    /// Order two participant ids lexicographically so that every client
    /// derives the same `(user_a, user_b)` for a conversation.
    pub fn canonical(first: impl Into<String>, second: impl Into<String>) -> Self {
        let first = first.into();
        let second = second.into();
        if first <= second {
            Self {
                user_a: first,
                user_b: second,
            }
        } else {
            Self {
                user_a: second,
                user_b: first,
            }
        }
    }
}

/// Request envelope for the JSON, FFI and CLI entry points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    #[serde(alias = "conversationId")]
    pub conversation_id: String,
    #[serde(alias = "userA")]
    pub user_a: String,
    #[serde(alias = "userB")]
    pub user_b: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Message totals per participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageCounts {
    /// All messages, including those from neither participant
    pub total: u64,
    pub a_sent: u64,
    pub b_sent: u64,
}

/// Burst segmentation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BurstStats {
    /// Number of bursts
    pub total: u64,
    /// Bursts started by user A
    pub a_starts: u64,
    /// Bursts started by user B
    pub b_starts: u64,
    /// Bursts where user A sent the final message
    pub a_last: u64,
    /// Bursts where user B sent the final message
    pub b_last: u64,
}

/// Summary metrics for one two-party conversation.
///
/// A fresh value is produced on every computation; stores merge it by
/// `conversation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationInsights {
    #[serde(alias = "conversationId")]
    pub conversation_id: String,
    #[serde(alias = "userA")]
    pub user_a: String,
    #[serde(alias = "userB")]
    pub user_b: String,

    /// Number of input messages
    #[serde(alias = "totalMessages")]
    pub total_messages: u64,
    /// Messages sent by user A
    #[serde(alias = "aSent")]
    pub a_sent: u64,
    /// Messages sent by user B
    #[serde(alias = "bSent")]
    pub b_sent: u64,

    /// Balance between the participants (0-1)
    pub reciprocity: f64,
    /// Median gap between alternating-sender replies, if any reply exists
    #[serde(alias = "medianReplyTimeMs")]
    pub median_reply_time_ms: Option<i64>,
    /// Weighted composite of volume, reciprocity and responsiveness (0-1)
    #[serde(alias = "activityScore")]
    pub activity_score: f64,

    #[serde(alias = "burstsTotal")]
    pub bursts_total: u64,
    #[serde(alias = "aBurstStarts")]
    pub a_burst_starts: u64,
    #[serde(alias = "bBurstStarts")]
    pub b_burst_starts: u64,
    #[serde(alias = "aLastWord")]
    pub a_last_word: u64,
    #[serde(alias = "bLastWord")]
    pub b_last_word: u64,

    /// When the record was computed (ms since epoch)
    #[serde(alias = "updatedAt")]
    pub updated_at: i64,
}
