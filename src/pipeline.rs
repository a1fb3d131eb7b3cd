//! Insights pipeline orchestration
//!
//! This module provides the public entry points around the engine: a stateless
//! JSON call, and a stateful processor that debounces message snapshots per
//! conversation, computes insights when due and hands them to a sink.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::InsightsEngine;
use crate::error::InsightsError;
use crate::policy::{ConversationWatch, DEFAULT_DEBOUNCE_MS};
use crate::sink::{persist_best_effort, InsightsSink};
use crate::types::{ConversationInsights, ConversationSnapshot, Message};

/// Convert a conversation snapshot JSON into insights JSON (stateless, one-shot).
///
/// # Arguments
/// * `snapshot_json` - `{ conversation_id, user_a, user_b, messages: [...] }`
///
/// # Returns
/// `ConversationInsights` JSON string
///
/// # Example
/// ```ignore
/// let insights_json = compute_json(snapshot_json)?;
/// ```
pub fn compute_json(snapshot_json: &str) -> Result<String, InsightsError> {
    compute_json_with(&InsightsEngine::default(), snapshot_json)
}

/// Same as [`compute_json`] with a configured engine
pub fn compute_json_with(engine: &InsightsEngine, snapshot_json: &str) -> Result<String, InsightsError> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let insights = engine.compute_snapshot(&snapshot);
    Ok(serde_json::to_string(&insights)?)
}

/// Parse a conversation snapshot JSON string
pub fn parse_snapshot(json: &str) -> Result<ConversationSnapshot, InsightsError> {
    serde_json::from_str(json)
        .map_err(|e| InsightsError::Parse(format!("Failed to parse conversation snapshot: {}", e)))
}

/// Parse either one snapshot object or an array of snapshots
pub fn parse_snapshot_batch(json: &str) -> Result<Vec<ConversationSnapshot>, InsightsError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| InsightsError::Parse(format!("Failed to parse snapshot batch: {}", e)))?;
    let parsed = if value.is_array() {
        serde_json::from_value::<Vec<ConversationSnapshot>>(value)
    } else {
        serde_json::from_value::<ConversationSnapshot>(value).map(|snapshot| vec![snapshot])
    };
    parsed.map_err(|e| InsightsError::Parse(format!("Failed to parse conversation snapshot: {}", e)))
}

/// Parse newline-delimited snapshots. Blank lines are skipped; errors name the
/// 1-based line number.
pub fn parse_snapshot_lines(ndjson: &str) -> Result<Vec<ConversationSnapshot>, InsightsError> {
    let mut snapshots = Vec::new();
    for (index, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let snapshot = serde_json::from_str(trimmed)
            .map_err(|e| InsightsError::Parse(format!("line {}: {}", index + 1, e)))?;
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

/// Counters for processor activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorStats {
    /// Insight records computed
    pub computed: u64,
    /// Records the sink accepted
    pub persisted: u64,
    /// Records the sink rejected
    pub sink_failures: u64,
}

/// Stateful processor that recomputes insights for watched conversations.
///
/// Computation never fails; sink failures are logged and counted but never
/// returned to the caller.
pub struct InsightsProcessor<S: InsightsSink> {
    engine: InsightsEngine,
    sink: S,
    debounce_ms: i64,
    watches: HashMap<String, ConversationWatch>,
    stats: ProcessorStats,
}

impl<S: InsightsSink> InsightsProcessor<S> {
    /// Create a processor with the default engine and debounce window (1.2s)
    pub fn new(sink: S) -> Self {
        Self::with_engine(InsightsEngine::default(), sink, DEFAULT_DEBOUNCE_MS)
    }

    /// Create a processor with a specific engine and debounce window
    pub fn with_engine(engine: InsightsEngine, sink: S, debounce_ms: i64) -> Self {
        Self {
            engine,
            sink,
            debounce_ms,
            watches: HashMap::new(),
            stats: ProcessorStats::default(),
        }
    }

    /// Start watching a conversation. Restarting a watch drops its pending
    /// snapshot.
    pub fn watch(&mut self, conversation_id: &str, current_user: &str, other_user: &str) {
        let watch = ConversationWatch::new(conversation_id, current_user, other_user, self.debounce_ms);
        if let Some(mut previous) = self.watches.insert(conversation_id.to_string(), watch) {
            previous.cancel();
        }
    }

    /// Stop watching a conversation, cancelling any pending recomputation
    pub fn unwatch(&mut self, conversation_id: &str) -> bool {
        match self.watches.remove(conversation_id) {
            Some(mut watch) => {
                watch.cancel();
                true
            }
            None => false,
        }
    }

    /// Offer the latest message snapshot for a conversation.
    ///
    /// Returns `false` if the conversation is not watched.
    pub fn on_messages(&mut self, conversation_id: &str, snapshot: Vec<Message>, now_ms: i64) -> bool {
        match self.watches.get_mut(conversation_id) {
            Some(watch) => {
                watch.on_messages(snapshot, now_ms);
                true
            }
            None => {
                tracing::debug!(
                    conversation_id = %conversation_id,
                    "Ignoring messages for unwatched conversation"
                );
                false
            }
        }
    }

    /// Compute and persist every conversation whose debounce window elapsed
    pub fn poll(&mut self, now_ms: i64) -> Vec<ConversationInsights> {
        let mut results = Vec::new();

        for watch in self.watches.values_mut() {
            let Some(snapshot) = watch.take_due(now_ms) else {
                continue;
            };

            let participants = watch.participants();
            let insights = self.engine.compute(
                watch.conversation_id(),
                &snapshot,
                &participants.user_a,
                &participants.user_b,
            );
            self.stats.computed += 1;

            if persist_best_effort(&self.sink, &insights) {
                self.stats.persisted += 1;
            } else {
                self.stats.sink_failures += 1;
            }

            results.push(insights);
        }

        results
    }

    /// Number of conversations with a pending recomputation
    pub fn pending_count(&self) -> usize {
        self.watches.values().filter(|w| w.is_pending()).count()
    }

    pub fn is_watching(&self, conversation_id: &str) -> bool {
        self.watches.contains_key(conversation_id)
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
