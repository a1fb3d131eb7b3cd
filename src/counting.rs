//! Message ordering and per-sender totals

use crate::types::{Message, MessageCounts};

/// Sort messages by timestamp, oldest first.
///
/// The sort is stable: messages sharing a timestamp keep their input order,
/// which keeps reply and burst attribution reproducible.
pub fn sort_by_timestamp(messages: &[Message]) -> Vec<&Message> {
    let mut sorted: Vec<&Message> = messages.iter().collect();
    sorted.sort_by_key(|m| m.timestamp);
    sorted
}

/// Count all messages and those sent by each participant.
///
/// Messages from any other sender only contribute to `total`.
pub fn count_messages(messages: &[&Message], user_a: &str, user_b: &str) -> MessageCounts {
    let mut counts = MessageCounts {
        total: messages.len() as u64,
        ..MessageCounts::default()
    };

    for message in messages {
        if message.sender_id == user_a {
            counts.a_sent += 1;
        }
        if message.sender_id == user_b {
            counts.b_sent += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let messages = vec![
            Message::new("b", 2000),
            Message::new("a", 1000).with_text("first"),
            Message::new("b", 1000).with_text("second"),
            Message::new("a", 500),
        ];

        let sorted = sort_by_timestamp(&messages);
        let order: Vec<(&str, i64)> = sorted
            .iter()
            .map(|m| (m.sender_id.as_str(), m.timestamp))
            .collect();

        assert_eq!(order, vec![("a", 500), ("a", 1000), ("b", 1000), ("b", 2000)]);
        assert_eq!(sorted[1].text.as_deref(), Some("first"));
        assert_eq!(sorted[2].text.as_deref(), Some("second"));
    }

    #[test]
    fn test_counts_ignore_third_party_senders() {
        let messages = vec![
            Message::new("a", 1),
            Message::new("b", 2),
            Message::new("system", 3),
            Message::new("a", 4),
        ];
        let sorted = sort_by_timestamp(&messages);

        let counts = count_messages(&sorted, "a", "b");
        assert_eq!(counts.total, 4);
        assert_eq!(counts.a_sent, 2);
        assert_eq!(counts.b_sent, 1);
        assert!(counts.a_sent + counts.b_sent < counts.total);
    }

    #[test]
    fn test_empty_input_counts_zero() {
        let counts = count_messages(&[], "a", "b");
        assert_eq!(counts, MessageCounts::default());
    }
}
