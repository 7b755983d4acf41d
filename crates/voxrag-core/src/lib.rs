//! # `VoxRAG` Core
//!
//! Embeddable semantic-retrieval engine for local coding-agent IDEs: a
//! memory-mapped vector store, an HNSW approximate-nearest-neighbor index,
//! a log-structured metadata store, and a token-budgeted retrieval pipeline
//! that combines similarity and recency.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use voxrag_core::{Engine, EngineConfig, IngestRequest};
//!
//! let mut config = EngineConfig::load()?;
//! config.data_dir = "./data".into();
//! config.dim = 1536;
//!
//! let engine = Engine::open(config)?;
//! let response = engine.retrieve(RetrieveRequest {
//!     namespace: None,
//!     query: vec![0.0; 1536],
//!     max_tokens: 2000,
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod models;
pub mod retrieval;
pub mod storage;


use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use index::HnswGraph;
pub use models::{Chunk, Document};
pub use retrieval::ScoredChunk;
pub use storage::{MetadataStore, MmapStorage};

const DEFAULT_MAX_TOKENS: usize = 2000;

/// Body of `POST /ingest`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestChunkInput {
    /// Id of the document this chunk belongs to.
    pub doc_id: String,
    /// Embedding vector; must match the engine's dimension.
    pub vector: Vec<f32>,
    /// Chunk text content.
    pub content: String,
    /// First line number, for code chunks.
    #[serde(default)]
    pub start_line: Option<u32>,
    /// Last line number, for code chunks.
    #[serde(default)]
    pub end_line: Option<u32>,
    /// Caller-supplied token count.
    pub token_count: u32,
}

/// The `document` field of `POST /ingest`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocumentInput {
    /// Document id.
    pub id: String,
    /// Source descriptor.
    pub source: String,
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    /// Attribute map.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// Body of `POST /ingest`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    /// Merged into `document.metadata.namespace` if that key is absent.
    #[serde(default)]
    pub namespace: Option<String>,
    /// The document this ingest call is attaching chunks to.
    pub document: IngestDocumentInput,
    /// Chunks to persist and index.
    pub chunks: Vec<IngestChunkInput>,
}

/// Response of `POST /ingest`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    /// Always `"ingested"`.
    pub status: &'static str,
    /// Echo of the ingested document's id.
    pub doc_id: String,
    /// Ids assigned to the ingested chunks, in request order.
    pub chunk_ids: Vec<u64>,
    /// Number of vectors appended.
    pub vector_count: usize,
}

/// Body of `POST /ingest_message`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestMessageRequest {
    /// Required namespace for this message.
    pub namespace: String,
    /// Conversation this message belongs to.
    pub conversation_id: String,
    /// Message role (e.g. `"user"`, `"assistant"`).
    pub role: String,
    /// Message text.
    pub content: String,
    /// Embedding vector; must match the engine's dimension.
    pub vector: Vec<f32>,
    /// Caller-supplied token count.
    pub token_count: u32,
    /// Defaults to a time-based id if absent.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Defaults to the current time if absent.
    #[serde(default)]
    pub timestamp_utc: Option<i64>,
    /// Defaults to `"chat"` if absent.
    #[serde(default)]
    pub source: Option<String>,
}

/// Response of `POST /ingest_message`.
#[derive(Debug, Clone, Serialize)]
pub struct IngestMessageResponse {
    /// Always `"ingested_message"`.
    pub status: &'static str,
    /// Synthesized `chat:{conversation_id}:{message_id}` document id.
    pub doc_id: String,
    /// Id assigned to the message's single chunk.
    pub chunk_id: u64,
    /// Always `1`.
    pub vector_count: usize,
    /// The message id used (caller-supplied or generated).
    pub message_id: String,
    /// Echo of the request's conversation id.
    pub conversation_id: String,
    /// Echo of the request's namespace.
    pub namespace: String,
}

/// Body of `POST /retrieve`.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
    /// Restricts results to documents whose `metadata.namespace` matches.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Query embedding; must be non-empty and match the engine's dimension.
    pub query: Vec<f32>,
    /// Token budget; values `<= 0` fall back to the engine default.
    #[serde(default)]
    pub max_tokens: i64,
}

/// Response of `POST /retrieve`.
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResponse {
    /// Admitted chunks, sorted by combined score descending.
    pub chunks: Vec<ScoredChunk>,
    /// Sum of `token_count` across admitted chunks.
    pub total_tokens: u32,
    /// Set if any candidate was dropped solely for exceeding the budget.
    pub truncated: bool,
}

/// Owns the vector store, metadata store, and HNSW index for one data
/// directory, and exposes the ingest/retrieve operations both adapters
/// (HTTP server and CLI) call into.
pub struct Engine {
    config: EngineConfig,
    vectors: MmapStorage,
    metadata: MetadataStore,
    index: HnswGraph,
}

impl Engine {
    /// Opens (or creates) the engine's data directory and replays the
    /// vector store into a fresh HNSW index in store order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleStore`] if the vector store was created
    /// with a different dimension, or [`Error::Io`]/[`Error::Serialization`]
    /// on filesystem failure.
    pub fn open(config: EngineConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let vectors = MmapStorage::open(
            std::path::Path::new(&config.data_dir).join("vectors.bin"),
            config.dim as u64,
        )?;
        let metadata = MetadataStore::open(&config.data_dir)?;
        let index = HnswGraph::new(config.hnsw);

        let count = vectors.count();
        for id in 0..count {
            let vector = vectors.get(id)?;
            index.add(id as usize, &vector, &vectors)?;
        }
        tracing::info!(vector_count = count, "rebuilt HNSW index with {count} vectors");

        Ok(Self {
            config,
            vectors,
            metadata,
            index,
        })
    }

    /// Number of vectors currently persisted.
    #[must_use]
    pub fn vector_count(&self) -> u64 {
        self.vectors.count()
    }

    /// Clears the in-memory HNSW graph. Does not touch the vector or
    /// metadata stores: a subsequent retrieval returns nothing until the
    /// process is restarted and the index is replayed from the vector
    /// store again.
    pub fn reset(&self) {
        self.index.reset();
        tracing::debug!("reset in-memory index");
    }

    /// Persists `request.document`, appends each chunk's vector, writes its
    /// chunk record, and inserts it into the index, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if a chunk vector's length
    /// doesn't match the engine's dimension, or a storage/index error if a
    /// write fails partway through (earlier chunks remain persisted; the
    /// engine does not roll back).
    pub fn ingest_document(&self, request: IngestRequest) -> Result<IngestResponse> {
        let mut metadata_map = request.document.metadata;
        if let Some(namespace) = request.namespace {
            metadata_map
                .entry("namespace".to_string())
                .or_insert(Value::String(namespace));
        }

        let document = Document {
            id: request.document.id.clone(),
            source: request.document.source,
            timestamp: request.document.timestamp,
            metadata: metadata_map,
        };
        self.metadata.save_document(&document)?;

        let mut chunk_ids = Vec::with_capacity(request.chunks.len());
        for input in request.chunks {
            let id = self.vectors.append(&input.vector)?;
            let chunk = Chunk {
                id,
                doc_id: input.doc_id,
                content: input.content,
                start_line: input.start_line,
                end_line: input.end_line,
                token_count: input.token_count,
            };
            self.metadata.save_chunk(&chunk)?;
            self.index.add(id as usize, &input.vector, &self.vectors)?;
            chunk_ids.push(id);
        }

        Ok(IngestResponse {
            status: "ingested",
            doc_id: document.id,
            chunk_ids: chunk_ids.clone(),
            vector_count: chunk_ids.len(),
        })
    }

    /// Ingests exactly one document and one chunk for a chat message,
    /// synthesizing `doc_id = "chat:{conversation_id}:{message_id}"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `namespace`, `conversation_id`,
    /// `role`, `content`, or `vector` is empty, or a storage/index error on
    /// write failure.
    pub fn ingest_message(&self, request: IngestMessageRequest) -> Result<IngestMessageResponse> {
        if request.namespace.is_empty() {
            return Err(Error::InvalidInput("namespace is required".into()));
        }
        if request.conversation_id.is_empty() {
            return Err(Error::InvalidInput("conversation_id is required".into()));
        }
        if request.role.is_empty() {
            return Err(Error::InvalidInput("role is required".into()));
        }
        if request.content.is_empty() {
            return Err(Error::InvalidInput("content is required".into()));
        }
        if request.vector.is_empty() {
            return Err(Error::InvalidInput("vector is required".into()));
        }

        let now = current_unix_time();
        let message_id = request
            .message_id
            .unwrap_or_else(|| format!("m{}", current_unix_nanos()));
        let timestamp = request.timestamp_utc.unwrap_or(now);
        let source = request.source.unwrap_or_else(|| "chat".to_string());
        let doc_id = format!("chat:{}:{}", request.conversation_id, message_id);

        let mut metadata_map = HashMap::new();
        metadata_map.insert(
            "namespace".to_string(),
            Value::String(request.namespace.clone()),
        );
        metadata_map.insert(
            "conversation_id".to_string(),
            Value::String(request.conversation_id.clone()),
        );
        metadata_map.insert("role".to_string(), Value::String(request.role));
        metadata_map.insert("message_id".to_string(), Value::String(message_id.clone()));
        metadata_map.insert("type".to_string(), Value::String("chat_message".to_string()));

        let document = Document {
            id: doc_id.clone(),
            source,
            timestamp,
            metadata: metadata_map,
        };
        self.metadata.save_document(&document)?;

        let chunk_id = self.vectors.append(&request.vector)?;
        let chunk = Chunk {
            id: chunk_id,
            doc_id: doc_id.clone(),
            content: request.content,
            start_line: None,
            end_line: None,
            token_count: request.token_count,
        };
        self.metadata.save_chunk(&chunk)?;
        self.index
            .add(chunk_id as usize, &request.vector, &self.vectors)?;

        Ok(IngestMessageResponse {
            status: "ingested_message",
            doc_id,
            chunk_id,
            vector_count: 1,
            message_id,
            conversation_id: request.conversation_id,
            namespace: request.namespace,
        })
    }

    /// Runs ANN search, namespace filtering, combined scoring, and greedy
    /// token-budget packing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `request.query` is empty,
    /// [`Error::DimensionMismatch`] if its length doesn't match the
    /// engine's dimension, or [`Error::Index`] if the index itself is
    /// inconsistent.
    pub fn retrieve(&self, request: RetrieveRequest) -> Result<RetrieveResponse> {
        if request.query.is_empty() {
            return Err(Error::InvalidInput("query vector is required".into()));
        }
        if request.query.len() as u64 != self.vectors.dimension() {
            return Err(Error::DimensionMismatch {
                expected: self.vectors.dimension() as usize,
                actual: request.query.len(),
            });
        }

        let mut retrieval_config = self.config.retrieval.clone();
        retrieval_config.max_tokens = if request.max_tokens <= 0 {
            DEFAULT_MAX_TOKENS
        } else {
            request.max_tokens as usize
        };

        let now = current_unix_time();
        let result = retrieval::retrieve(
            &request.query,
            &retrieval_config,
            request.namespace.as_deref(),
            now,
            &self.index,
            &self.vectors,
            &self.metadata,
        )?;

        Ok(RetrieveResponse {
            chunks: result.chunks,
            total_tokens: result.total_tokens,
            truncated: result.truncated,
        })
    }
}

fn current_unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn current_unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
