//! Conversational balance between the two participants

/// Compute reciprocity as `min(a, b) / max(a, b)`.
///
/// 1.0 is a perfectly even split; 0.0 is a one-sided or silent conversation.
pub fn reciprocity(a_sent: u64, b_sent: u64) -> f64 {
    let max = a_sent.max(b_sent);
    if max == 0 {
        return 0.0;
    }
    let min = a_sent.min(b_sent);
    min as f64 / max as f64
}
