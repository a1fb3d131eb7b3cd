//! Insight persistence
//!
//! Sinks store insight records as documents keyed by conversation id. An
//! upsert merges the record's fields into the existing document and leaves
//! every other field of that document untouched.
//!
//! Persistence is best-effort: callers on the messaging path should go through
//! [`persist_best_effort`] so a failing store never interrupts the chat flow.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::error::InsightsError;
use crate::types::ConversationInsights;

/// A stored document: field name → value
pub type Document = Map<String, Value>;

/// Destination for computed insights
pub trait InsightsSink: Send + Sync {
    /// Merge the record into the document keyed by its conversation id
    fn upsert(&self, insights: &ConversationInsights) -> Result<(), InsightsError>;
}

impl<S: InsightsSink + ?Sized> InsightsSink for Arc<S> {
    fn upsert(&self, insights: &ConversationInsights) -> Result<(), InsightsError> {
        (**self).upsert(insights)
    }
}

/// Upsert and swallow any failure. Returns whether the write succeeded.
pub fn persist_best_effort<S: InsightsSink + ?Sized>(sink: &S, insights: &ConversationInsights) -> bool {
    match sink.upsert(insights) {
        Ok(()) => {
            tracing::debug!(
                conversation_id = %insights.conversation_id,
                total_messages = insights.total_messages,
                "Persisted conversation insights"
            );
            true
        }
        Err(e) => {
            tracing::warn!(
                conversation_id = %insights.conversation_id,
                error = %e,
                "Failed to persist conversation insights"
            );
            false
        }
    }
}

/// Merge the insight fields into `document`, overwriting only those fields.
///
/// Records are stored under snake_case names. A camelCase copy of the same
/// field, as written by the mobile app, is replaced rather than kept beside it.
fn merge_into(document: &mut Document, insights: &ConversationInsights) -> Result<(), InsightsError> {
    match serde_json::to_value(insights)? {
        Value::Object(fields) => {
            for (key, value) in fields {
                let legacy = camel_case(&key);
                if legacy != key {
                    document.remove(&legacy);
                }
                document.insert(key, value);
            }
            Ok(())
        }
        other => Err(InsightsError::Store(format!(
            "insights serialized to a non-object value: {}",
            other
        ))),
    }
}

/// `median_reply_time_ms` → `medianReplyTimeMs`
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, InsightsError> {
    mutex
        .lock()
        .map_err(|_| InsightsError::Store("store lock poisoned".to_string()))
}

/// In-memory insights collection
#[derive(Debug, Default)]
pub struct MemoryInsightsStore {
    documents: Mutex<BTreeMap<String, Document>>,
}

impl MemoryInsightsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a whole document, e.g. to seed fields owned by
    /// other features
    pub fn insert_document(&self, conversation_id: &str, document: Document) -> Result<(), InsightsError> {
        lock(&self.documents)?.insert(conversation_id.to_string(), document);
        Ok(())
    }

    /// Raw stored document for a conversation
    pub fn document(&self, conversation_id: &str) -> Result<Option<Document>, InsightsError> {
        Ok(lock(&self.documents)?.get(conversation_id).cloned())
    }

    /// Stored insights for a conversation
    pub fn get(&self, conversation_id: &str) -> Result<Option<ConversationInsights>, InsightsError> {
        match self.document(conversation_id)? {
            Some(document) => Ok(Some(serde_json::from_value(Value::Object(document))?)),
            None => Ok(None),
        }
    }

    /// Number of stored documents
    pub fn len(&self) -> Result<usize, InsightsError> {
        Ok(lock(&self.documents)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, InsightsError> {
        Ok(self.len()? == 0)
    }

    /// Serialize the collection to JSON for persistence
    pub fn to_json(&self) -> Result<String, InsightsError> {
        Ok(serde_json::to_string_pretty(&*lock(&self.documents)?)?)
    }

    /// Load a collection from JSON
    pub fn from_json(json: &str) -> Result<Self, InsightsError> {
        let documents: BTreeMap<String, Document> = serde_json::from_str(json)?;
        Ok(Self {
            documents: Mutex::new(documents),
        })
    }
}

impl InsightsSink for MemoryInsightsStore {
    fn upsert(&self, insights: &ConversationInsights) -> Result<(), InsightsError> {
        let mut documents = lock(&self.documents)?;
        let document = documents.entry(insights.conversation_id.clone()).or_default();
        merge_into(document, insights)
    }
}

/// Insights collection kept in a JSON file.
///
/// The file holds one object keyed by conversation id. A missing file is an
/// empty collection. Each upsert reads, merges and replaces the file through a
/// temporary file in the same directory, so a failed write leaves the previous
/// contents in place.
#[derive(Debug)]
pub struct JsonFileInsightsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileInsightsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every document in the file
    pub fn load(&self) -> Result<BTreeMap<String, Document>, InsightsError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            InsightsError::Store(format!(
                "cannot parse insights file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Stored insights for a conversation
    pub fn get(&self, conversation_id: &str) -> Result<Option<ConversationInsights>, InsightsError> {
        match self.load()?.remove(conversation_id) {
            Some(document) => Ok(Some(serde_json::from_value(Value::Object(document))?)),
            None => Ok(None),
        }
    }
}

impl InsightsSink for JsonFileInsightsStore {
    fn upsert(&self, insights: &ConversationInsights) -> Result<(), InsightsError> {
        let _guard = lock(&self.write_lock)?;

        let mut documents = self.load()?;
        let document = documents.entry(insights.conversation_id.clone()).or_default();
        merge_into(document, insights)?;

        let content = serde_json::to_string_pretty(&documents)?;
        replace_file(&self.path, |file| file.write_all(content.as_bytes()))
    }
}

/// Write a new version of `path` via a sibling temp file renamed into place
fn replace_file<F>(path: &Path, write: F) -> Result<(), InsightsError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
