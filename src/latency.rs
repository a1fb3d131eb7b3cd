//! Reply latency analysis
//!
//! A reply is a message whose sender differs from the sender of the message
//! right before it. Latency is measured over the whole history.

use crate::types::Message;

/// Collect the gaps (ms) between consecutive messages from different senders.
///
/// `sorted` must be ordered by timestamp. Pairs with a blank sender id, the
/// same sender on both sides, or a non-positive gap are skipped.
pub fn reply_latencies(sorted: &[&Message]) -> Vec<i64> {
    sorted
        .windows(2)
        .filter_map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            if prev.sender_id.trim().is_empty() || curr.sender_id.trim().is_empty() {
                return None;
            }
            if prev.sender_id == curr.sender_id {
                return None;
            }
            let gap = curr.timestamp.saturating_sub(prev.timestamp);
            (gap > 0).then_some(gap)
        })
        .collect()
}

/// Median of the gaps, or `None` when there are none.
///
/// For an even count this is the floor of the mean of the two middle values,
/// in integer arithmetic.
pub fn median_ms(mut gaps: Vec<i64>) -> Option<i64> {
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_unstable();

    let mid = gaps.len() / 2;
    if gaps.len() % 2 == 1 {
        Some(gaps[mid])
    } else {
        let (low, high) = (gaps[mid - 1], gaps[mid]);
        // gaps are positive and low <= high, so this is (low + high) / 2 without overflow
        Some(low + (high - low) / 2)
    }
}

/// Median reply time over all qualifying reply gaps
pub fn median_reply_time_ms(sorted: &[&Message]) -> Option<i64> {
    median_ms(reply_latencies(sorted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::sort_by_timestamp;

    fn median_of(messages: &[Message]) -> Option<i64> {
        median_reply_time_ms(&sort_by_timestamp(messages))
    }

    #[test]
    fn test_no_messages_or_single_message() {
        assert_eq!(median_of(&[]), None);
        assert_eq!(median_of(&[Message::new("a", 100)]), None);
    }

    #[test]
    fn test_monologue_has_no_replies() {
        let messages = vec![
            Message::new("a", 0),
            Message::new("a", 1000),
            Message::new("a", 90_000),
        ];
        assert_eq!(median_of(&messages), None);
    }

    #[test]
    fn test_single_reply() {
        let messages = vec![Message::new("a", 0), Message::new("b", 5000)];
        assert_eq!(median_of(&messages), Some(5000));
    }

    #[test]
    fn test_even_count_uses_floor_mean() {
        let messages = vec![
            Message::new("a", 0),
            Message::new("b", 60_000),
            Message::new("a", 125_000),
        ];
        let sorted = sort_by_timestamp(&messages);
        assert_eq!(reply_latencies(&sorted), vec![60_000, 65_000]);
        assert_eq!(median_reply_time_ms(&sorted), Some(62_500));

        // 3 + 4 = 7, floor(3.5) = 3
        assert_eq!(median_ms(vec![4, 3]), Some(3));
    }

    #[test]
    fn test_odd_count_takes_middle() {
        assert_eq!(median_ms(vec![900, 100, 300]), Some(300));
    }

    #[test]
    fn test_skips_blank_senders_and_duplicate_timestamps() {
        let messages = vec![
            Message::new("a", 0),
            Message::new("  ", 1000),
            Message::new("b", 2000),
            Message::new("a", 2000),
            Message::new("b", 7000),
        ];
        let sorted = sort_by_timestamp(&messages);

        // a->blank and blank->b skipped, b->a has zero gap, a->b counts
        assert_eq!(reply_latencies(&sorted), vec![5000]);
    }

    #[test]
    fn test_out_of_order_input_is_sorted_first() {
        let messages = vec![
            Message::new("b", 3000),
            Message::new("a", 1000),
            Message::new("a", 6000),
        ];
        assert_eq!(median_of(&messages), Some(2500));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        assert_eq!(median_ms(vec![i64::MAX, i64::MAX - 1]), Some(i64::MAX - 1));

        let messages = vec![Message::new("a", i64::MIN), Message::new("b", i64::MAX)];
        assert_eq!(median_of(&messages), Some(i64::MAX));
    }
}
