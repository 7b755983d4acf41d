//! Domain records: documents and chunks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for a source item that produced one or more chunks.
///
/// The `metadata` map conventionally carries `namespace`, `conversation_id`,
/// `role`, `message_id`, `type`, and `file_path`, plus any freeform caller
/// keys, per the data model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Caller-supplied identifier, unique within the metadata store.
    pub id: String,
    /// Source descriptor, e.g. a file path or `"chat"`.
    pub source: String,
    /// Unix timestamp (seconds) used for recency scoring.
    pub timestamp: i64,
    /// Open string-to-value attribute map.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    /// Reads the `namespace` attribute from `metadata`, if present and a string.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.get("namespace").and_then(Value::as_str)
    }
}

/// A unit of retrievable content. Its vector lives at the same id in the
/// vector store — the chunk record never carries the vector itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Id assigned by the vector store at ingest time; never reused.
    pub id: u64,
    /// Id of the owning [`Document`].
    pub doc_id: String,
    /// Chunk text content.
    pub content: String,
    /// First line number for code chunks, if applicable.
    #[serde(default)]
    pub start_line: Option<u32>,
    /// Last line number for code chunks, if applicable.
    #[serde(default)]
    pub end_line: Option<u32>,
    /// Caller-supplied token count, used for budget packing.
    pub token_count: u32,
}
