//! Burst segmentation
//!
//! A burst is a maximal run of messages where each message arrives within the
//! gap threshold of the one before it. It models one sitting of conversation.
//! For every burst we record who opened it and who had the last word.

use crate::types::{BurstStats, Message};

/// Attribution bookkeeping for closed bursts
struct BurstTally<'a> {
    user_a: &'a str,
    user_b: &'a str,
    stats: BurstStats,
}

impl<'a> BurstTally<'a> {
    fn new(user_a: &'a str, user_b: &'a str) -> Self {
        Self {
            user_a,
            user_b,
            stats: BurstStats::default(),
        }
    }

    /// Close a burst. Senders other than the two participants are counted in
    /// the total but attributed to nobody.
    fn close(&mut self, start_sender: &str, last_sender: &str) {
        self.stats.total += 1;

        if start_sender == self.user_a {
            self.stats.a_starts += 1;
        } else if start_sender == self.user_b {
            self.stats.b_starts += 1;
        }

        if last_sender == self.user_a {
            self.stats.a_last += 1;
        } else if last_sender == self.user_b {
            self.stats.b_last += 1;
        }
    }
}

/// Partition a timestamp-sorted timeline into bursts.
///
/// A gap strictly greater than `gap_ms` starts a new burst. The previous burst
/// is closed when the boundary is seen, and the burst still open after the
/// last message is closed once at the end.
pub fn segment_bursts(sorted: &[&Message], user_a: &str, user_b: &str, gap_ms: i64) -> BurstStats {
    let mut tally = BurstTally::new(user_a, user_b);

    let mut prev_timestamp: Option<i64> = None;
    let mut burst_start_sender: Option<&str> = None;
    let mut last_sender: Option<&str> = None;

    for message in sorted {
        let is_new_burst = match prev_timestamp {
            None => true,
            Some(prev) => message.timestamp.saturating_sub(prev) > gap_ms,
        };

        if is_new_burst {
            if let (Some(start), Some(last)) = (burst_start_sender, last_sender) {
                tally.close(start, last);
            }
            burst_start_sender = Some(message.sender_id.as_str());
        }

        last_sender = Some(message.sender_id.as_str());
        prev_timestamp = Some(message.timestamp);
    }

    if let (Some(start), Some(last)) = (burst_start_sender, last_sender) {
        tally.close(start, last);
    }

    tally.stats
}
