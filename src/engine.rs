//! Conversation analytics engine
//!
//! Turns an unordered two-party message history into a `ConversationInsights`
//! record. The computation is pure and total: every input, including an empty
//! one, produces a complete record, and nothing is kept between calls.
//!
//! Stages: sort → counts → reciprocity / reply latency / bursts → activity score

use chrono::Utc;

use crate::bursts::segment_bursts;
use crate::config::InsightsConfig;
use crate::counting::{count_messages, sort_by_timestamp};
use crate::error::InsightsError;
use crate::latency::median_reply_time_ms;
use crate::reciprocity::reciprocity;
use crate::scoring::ActivityScorer;
use crate::types::{ConversationInsights, ConversationSnapshot, Message};

/// Compute insights with the default tuning parameters.
///
/// # Example
/// ```
/// use campus_insights::{compute, Message};
///
/// let messages = vec![Message::new("alice", 0), Message::new("bob", 5_000)];
/// let insights = compute("conv-1", &messages, "alice", "bob");
/// assert_eq!(insights.median_reply_time_ms, Some(5_000));
/// ```
pub fn compute(
    conversation_id: &str,
    messages: &[Message],
    user_a: &str,
    user_b: &str,
) -> ConversationInsights {
    InsightsEngine::default().compute(conversation_id, messages, user_a, user_b)
}

/// Analytics engine holding an immutable, validated configuration
#[derive(Debug, Clone, Default)]
pub struct InsightsEngine {
    config: InsightsConfig,
}

impl InsightsEngine {
    /// Create an engine with a custom configuration
    pub fn with_config(config: InsightsConfig) -> Result<Self, InsightsError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    /// Compute insights for one conversation.
    ///
    /// `user_a` and `user_b` are passed through unchanged; callers are
    /// expected to supply them in canonical order.
    pub fn compute(
        &self,
        conversation_id: &str,
        messages: &[Message],
        user_a: &str,
        user_b: &str,
    ) -> ConversationInsights {
        // Stage 1: Order the timeline
        let sorted = sort_by_timestamp(messages);

        // Stage 2: Per-sender totals
        let counts = count_messages(&sorted, user_a, user_b);

        // Stage 3: Balance, latency and bursts
        let reciprocity = reciprocity(counts.a_sent, counts.b_sent);
        let median_reply_time_ms = median_reply_time_ms(&sorted);
        let bursts = segment_bursts(&sorted, user_a, user_b, self.config.burst_gap_ms);

        // Stage 4: Composite score
        let activity_score =
            ActivityScorer::from_validated(self.config).score(counts.total, reciprocity, median_reply_time_ms);

        ConversationInsights {
            conversation_id: conversation_id.to_string(),
            user_a: user_a.to_string(),
            user_b: user_b.to_string(),
            total_messages: counts.total,
            a_sent: counts.a_sent,
            b_sent: counts.b_sent,
            reciprocity,
            median_reply_time_ms,
            activity_score,
            bursts_total: bursts.total,
            a_burst_starts: bursts.a_starts,
            b_burst_starts: bursts.b_starts,
            a_last_word: bursts.a_last,
            b_last_word: bursts.b_last,
            updated_at: Utc::now().timestamp_millis(),
        }
    }

    /// Compute insights for a request envelope
    pub fn compute_snapshot(&self, snapshot: &ConversationSnapshot) -> ConversationInsights {
        self.compute(
            &snapshot.conversation_id,
            &snapshot.messages,
            &snapshot.user_a,
            &snapshot.user_b,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINUTE: i64 = 60_000;

    fn without_timestamp(mut insights: ConversationInsights) -> ConversationInsights {
        insights.updated_at = 0;
        insights
    }

    #[test]
    fn test_reference_conversation() {
        let messages = vec![
            Message::new("A", 0),
            Message::new("B", 60_000),
            Message::new("A", 125_000),
        ];

        let insights = compute("conv-1", &messages, "A", "B");

        assert_eq!(insights.conversation_id, "conv-1");
        assert_eq!(insights.total_messages, 3);
        assert_eq!(insights.a_sent, 2);
        assert_eq!(insights.b_sent, 1);
        assert_eq!(insights.reciprocity, 0.5);
        assert_eq!(insights.median_reply_time_ms, Some(62_500));
        assert_eq!(insights.bursts_total, 1);
        assert_eq!(insights.a_burst_starts, 1);
        assert_eq!(insights.b_burst_starts, 0);
        assert_eq!(insights.a_last_word, 1);
        assert_eq!(insights.b_last_word, 0);
        assert!((insights.activity_score - 0.531).abs() < 0.001);
        assert!(insights.updated_at > 0);
    }

    #[test]
    fn test_empty_conversation() {
        let insights = compute("empty", &[], "A", "B");

        assert_eq!(insights.total_messages, 0);
        assert_eq!(insights.a_sent, 0);
        assert_eq!(insights.b_sent, 0);
        assert_eq!(insights.reciprocity, 0.0);
        assert_eq!(insights.median_reply_time_ms, None);
        assert_eq!(insights.activity_score, 0.0);
        assert_eq!(insights.bursts_total, 0);
        assert_eq!(insights.a_last_word + insights.b_last_word, 0);
    }

    #[test]
    fn test_two_alternating_messages() {
        let messages = vec![Message::new("A", 0), Message::new("B", 5000)];
        let insights = compute("c", &messages, "A", "B");
        assert_eq!(insights.median_reply_time_ms, Some(5000));
        assert_eq!(insights.reciprocity, 1.0);
    }

    #[test]
    fn test_gap_of_21_minutes_gives_two_bursts() {
        let messages = vec![Message::new("A", 0), Message::new("B", 21 * MINUTE)];
        let insights = compute("c", &messages, "A", "B");
        assert_eq!(insights.bursts_total, 2);
        assert_eq!(insights.a_burst_starts, 1);
        assert_eq!(insights.b_burst_starts, 1);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let messages = vec![
            Message::new("B", 9 * MINUTE),
            Message::new("A", 0),
            Message::new("A", 3 * MINUTE),
            Message::new("B", 95 * MINUTE),
            Message::new("A", 95 * MINUTE),
        ];

        let first = compute("c", &messages, "A", "B");
        let second = compute("c", &messages, "A", "B");
        assert_eq!(without_timestamp(first), without_timestamp(second));
    }

    #[test]
    fn test_input_order_does_not_matter_for_distinct_timestamps() {
        let messages = vec![
            Message::new("A", 0),
            Message::new("B", 2 * MINUTE),
            Message::new("A", 50 * MINUTE),
            Message::new("B", 51 * MINUTE),
        ];
        let mut reversed = messages.clone();
        reversed.reverse();

        assert_eq!(
            without_timestamp(compute("c", &messages, "A", "B")),
            without_timestamp(compute("c", &reversed, "A", "B"))
        );
    }

    #[test]
    fn test_invariants_hold_with_foreign_senders() {
        let messages = vec![
            Message::new("A", 0),
            Message::new("admin", MINUTE),
            Message::new("B", 2 * MINUTE),
            Message::new("", 200 * MINUTE),
            Message::new("A", 201 * MINUTE),
        ];

        let insights = compute("c", &messages, "A", "B");
        assert_eq!(insights.total_messages, messages.len() as u64);
        assert!(insights.a_sent + insights.b_sent < insights.total_messages);
        assert!(insights.a_burst_starts + insights.b_burst_starts < insights.bursts_total);
        assert!(insights.a_last_word + insights.b_last_word <= insights.bursts_total);
        assert!((0.0..=1.0).contains(&insights.reciprocity));
        assert!((0.0..=1.0).contains(&insights.activity_score));
    }

    #[test]
    fn test_scores_stay_bounded_for_large_histories() {
        let messages: Vec<Message> = (0..500)
            .map(|i| Message::new(if i % 2 == 0 { "A" } else { "B" }, i * 1000))
            .collect();

        let insights = compute("busy", &messages, "A", "B");
        assert_eq!(insights.total_messages, 500);
        assert_eq!(insights.reciprocity, 1.0);
        assert_eq!(insights.median_reply_time_ms, Some(1000));
        assert!(insights.activity_score <= 1.0);
        assert!(insights.activity_score > 0.99);
    }

    #[test]
    fn test_custom_burst_gap() {
        let engine = InsightsEngine::with_config(InsightsConfig {
            burst_gap_ms: MINUTE,
            ..InsightsConfig::default()
        })
        .unwrap();

        let messages = vec![
            Message::new("A", 0),
            Message::new("B", 2 * MINUTE),
            Message::new("A", 4 * MINUTE),
        ];
        assert_eq!(engine.compute("c", &messages, "A", "B").bursts_total, 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = InsightsEngine::with_config(InsightsConfig {
            volume_weight: 0.9,
            ..InsightsConfig::default()
        });
        assert!(matches!(result, Err(InsightsError::InvalidConfig(_))));
    }

    #[test]
    fn test_compute_snapshot() {
        let snapshot = ConversationSnapshot {
            conversation_id: "snap".to_string(),
            user_a: "A".to_string(),
            user_b: "B".to_string(),
            messages: vec![Message::new("B", 10), Message::new("A", 20)],
        };

        let insights = InsightsEngine::default().compute_snapshot(&snapshot);
        assert_eq!(insights.conversation_id, "snap");
        assert_eq!(insights.b_burst_starts, 1);
        assert_eq!(insights.a_last_word, 1);
        assert_eq!(insights.median_reply_time_ms, Some(10));
    }
}
