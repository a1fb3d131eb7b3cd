//! Campus Insights - Conversation analytics engine for two-party chats
//!
//! Turns a direct-message history between two people into summary metrics
//! through a deterministic pipeline: ordering → per-sender counts →
//! reciprocity / reply latency / burst segmentation → activity score.
//!
//! ## Modules
//!
//! - **Engine**: The pure computation (`compute`, `InsightsEngine`)
//! - **Sink**: Merge-upsert stores for computed insights, best-effort persistence
//! - **Policy**: Participant canonicalization and debounced recomputation
//! - **Pipeline**: JSON entry point and the stateful `InsightsProcessor`

pub mod bursts;
pub mod config;
pub mod counting;
pub mod engine;
pub mod error;
pub mod latency;
pub mod pipeline;
pub mod policy;
pub mod reciprocity;
pub mod scoring;
pub mod sink;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::InsightsConfig;
pub use engine::{compute, InsightsEngine};
pub use error::InsightsError;
pub use pipeline::{compute_json, InsightsProcessor, ProcessorStats};
pub use policy::{ConversationWatch, Debouncer};
pub use sink::{persist_best_effort, InsightsSink, JsonFileInsightsStore, MemoryInsightsStore};
pub use types::{ConversationInsights, ConversationSnapshot, Message, ParticipantPair};

/// Library version embedded in CLI and FFI output
pub const INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "campus-insights";
