//! Scoring and token-budget packing for a retrieval request.

use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::index::HnswGraph;
use crate::models::Chunk;
use crate::storage::{MetadataStore, MmapStorage};

/// One admitted chunk paired with its scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    /// The admitted chunk.
    pub chunk: Chunk,
    /// `1 / (1 + distance)`.
    pub similarity: f32,
    /// `1 / (1 + hours_since_document_timestamp / 24)`, or the 0.5 fallback.
    pub recency: f32,
}

/// Result of a retrieval call.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// Admitted chunks, sorted by combined score descending.
    pub chunks: Vec<ScoredChunk>,
    /// Sum of `token_count` across admitted chunks.
    pub total_tokens: u32,
    /// Set if any candidate was dropped solely for exceeding the token budget.
    pub truncated: bool,
}

struct Candidate {
    chunk: Chunk,
    similarity: f32,
    recency: f32,
    final_score: f32,
}

/// Runs candidate gathering, namespace filtering, scoring, and greedy
/// token-budget packing, per the retrieval procedure.
///
/// `now_unix` is the caller-supplied current time (seconds since epoch),
/// threaded in rather than read from the clock so retrieval stays
/// deterministic given identical stored state.
///
/// # Errors
///
/// Returns an error only if the index search itself fails (e.g. a node
/// reachable from the entry point is missing from the vector store); a
/// missing chunk or document for an individual candidate is not an error —
/// that candidate is silently skipped.
pub fn retrieve(
    query: &[f32],
    config: &RetrievalConfig,
    namespace: Option<&str>,
    now_unix: i64,
    index: &HnswGraph,
    vectors: &MmapStorage,
    metadata: &MetadataStore,
) -> crate::error::Result<RetrievalResult> {
    let candidates_ids = index.search(query, config.top_k_candidates, vectors)?;

    let mut candidates: Vec<Candidate> = Vec::new();

    for (id, distance) in candidates_ids {
        let Ok(chunk) = metadata.get_chunk(id as u64) else {
            continue;
        };

        let document = metadata.get_document(&chunk.doc_id).ok();

        if let Some(ns) = namespace {
            match &document {
                Some(doc) if doc.namespace() == Some(ns) => {}
                _ => continue,
            }
        }

        let similarity = 1.0 / (1.0 + distance);
        let recency = match &document {
            Some(doc) => {
                let hours_since = ((now_unix - doc.timestamp).max(0) as f32) / 3600.0;
                1.0 / (1.0 + hours_since / 24.0)
            }
            None => 0.5,
        };
        let final_score =
            similarity * config.similarity_weight + recency * config.recency_weight;

        candidates.push(Candidate {
            chunk,
            similarity,
            recency,
            final_score,
        });
    }

    candidates.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then(a.chunk.id.cmp(&b.chunk.id))
    });

    let mut admitted = Vec::new();
    let mut total_tokens: u32 = 0;
    let mut truncated = false;

    for candidate in candidates {
        if total_tokens + candidate.chunk.token_count <= config.max_tokens as u32 {
            total_tokens += candidate.chunk.token_count;
            admitted.push(ScoredChunk {
                chunk: candidate.chunk,
                similarity: candidate.similarity,
                recency: candidate.recency,
            });
        } else {
            truncated = true;
        }
    }

    Ok(RetrievalResult {
        chunks: admitted,
        total_tokens,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HnswConfig;
    use crate::models::Document;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct Fixture {
        vectors: MmapStorage,
        metadata: MetadataStore,
        index: HnswGraph,
        _dir: tempfile::TempDir,
    }

    fn setup(dim: u64) -> Fixture {
        let dir = tempdir().unwrap();
        let vectors = MmapStorage::open(dir.path().join("vectors.bin"), dim).unwrap();
        let metadata = MetadataStore::open(dir.path()).unwrap();
        let index = HnswGraph::new(HnswConfig::default());
        Fixture {
            vectors,
            metadata,
            index,
            _dir: dir,
        }
    }

    fn ingest(
        fx: &Fixture,
        doc_id: &str,
        namespace: Option<&str>,
        timestamp: i64,
        vector: &[f32],
        token_count: u32,
    ) -> u64 {
        let mut metadata_map = HashMap::new();
        if let Some(ns) = namespace {
            metadata_map.insert(
                "namespace".to_string(),
                serde_json::Value::String(ns.to_string()),
            );
        }
        fx.metadata
            .save_document(&Document {
                id: doc_id.to_string(),
                source: "chat".into(),
                timestamp,
                metadata: metadata_map,
            })
            .unwrap();

        let id = fx.vectors.append(vector).unwrap();
        fx.metadata
            .save_chunk(&Chunk {
                id,
                doc_id: doc_id.to_string(),
                content: "hello".into(),
                start_line: None,
                end_line: None,
                token_count,
            })
            .unwrap();
        fx.index.add(id as usize, vector, &fx.vectors).unwrap();
        id
    }

    #[test]
    fn empty_store_returns_nothing() {
        let fx = setup(4);
        let config = RetrievalConfig::default();
        let result = retrieve(
            &[1.0, 0.0, 0.0, 0.0],
            &config,
            None,
            0,
            &fx.index,
            &fx.vectors,
            &fx.metadata,
        )
        .unwrap();
        assert!(result.chunks.is_empty());
        assert_eq!(result.total_tokens, 0);
        assert!(!result.truncated);
    }

    #[test]
    fn round_trip_ingest_then_retrieve() {
        let fx = setup(4);
        ingest(&fx, "doc-A", None, 0, &[1.0, 0.0, 0.0, 0.0], 10);

        let config = RetrievalConfig {
            max_tokens: 50,
            ..RetrievalConfig::default()
        };
        let result = retrieve(
            &[1.0, 0.0, 0.0, 0.0],
            &config,
            None,
            0,
            &fx.index,
            &fx.vectors,
            &fx.metadata,
        )
        .unwrap();

        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].chunk.doc_id, "doc-A");
        assert_eq!(result.total_tokens, 10);
        assert!(!result.truncated);
    }

    #[test]
    fn namespace_filter_isolates_documents() {
        let fx = setup(4);
        ingest(&fx, "doc-X", Some("proj1"), 0, &[1.0, 0.0, 0.0, 0.0], 10);
        ingest(&fx, "doc-Y", Some("proj2"), 0, &[1.0, 0.1, 0.0, 0.0], 10);

        let config = RetrievalConfig::default();
        let result = retrieve(
            &[1.0, 0.0, 0.0, 0.0],
            &config,
            Some("proj1"),
            0,
            &fx.index,
            &fx.vectors,
            &fx.metadata,
        )
        .unwrap();

        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].chunk.doc_id, "doc-X");
    }

    #[test]
    fn budget_packing_truncates_when_a_candidate_does_not_fit() {
        let fx = setup(4);
        ingest(&fx, "doc-big", None, 0, &[1.0, 0.0, 0.0, 0.0], 200);
        ingest(&fx, "doc-small", None, 0, &[0.9, 0.0, 0.0, 0.0], 100);

        let config = RetrievalConfig {
            max_tokens: 150,
            top_k_candidates: 50,
            ..RetrievalConfig::default()
        };
        let result = retrieve(
            &[1.0, 0.0, 0.0, 0.0],
            &config,
            None,
            0,
            &fx.index,
            &fx.vectors,
            &fx.metadata,
        )
        .unwrap();

        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].chunk.doc_id, "doc-small");
        assert_eq!(result.total_tokens, 100);
        assert!(result.truncated);
    }

    #[test]
    fn recency_breaks_ties_between_identical_vectors() {
        let fx = setup(4);
        let now = 1_000_000i64;
        ingest(&fx, "doc-old", None, now - 24 * 3600, &[1.0, 0.0, 0.0, 0.0], 10);
        ingest(&fx, "doc-new", None, now, &[1.0, 0.0, 0.0, 0.0], 10);

        let config = RetrievalConfig::default();
        let result = retrieve(
            &[1.0, 0.0, 0.0, 0.0],
            &config,
            None,
            now,
            &fx.index,
            &fx.vectors,
            &fx.metadata,
        )
        .unwrap();

        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.chunks[0].chunk.doc_id, "doc-new");
        assert_eq!(result.chunks[1].chunk.doc_id, "doc-old");
    }

    #[test]
    fn missing_chunk_is_silently_skipped() {
        let fx = setup(4);
        let id = fx.vectors.append(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        fx.index.add(id as usize, &[1.0, 0.0, 0.0, 0.0], &fx.vectors).unwrap();

        let config = RetrievalConfig::default();
        let result = retrieve(
            &[1.0, 0.0, 0.0, 0.0],
            &config,
            None,
            0,
            &fx.index,
            &fx.vectors,
            &fx.metadata,
        )
        .unwrap();
        assert!(result.chunks.is_empty());
    }
}
