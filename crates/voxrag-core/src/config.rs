//! Engine configuration.
//!
//! Settings load from, in increasing priority: built-in defaults, an
//! optional `voxrag.toml` file, then `VOX_*` environment variables — the
//! same three-source [`figment`] layering the rest of this ecosystem uses
//! for its own configuration.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The merged configuration failed to parse or validate.
    #[error("failed to load configuration: {0}")]
    Invalid(String),
}

/// Retrieval scoring and packing settings (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Token budget applied when the caller doesn't supply one.
    pub max_tokens: usize,
    /// ANN beam width fetched before metadata lookup and scoring.
    pub top_k_candidates: usize,
    /// Weight given to similarity in the combined score. Must be >= 0 and
    /// sum with `recency_weight` to 1.0.
    pub similarity_weight: f32,
    /// Weight given to recency in the combined score.
    pub recency_weight: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            top_k_candidates: 50,
            similarity_weight: 0.8,
            recency_weight: 0.2,
        }
    }
}

/// HNSW index settings (spec §4.3). Exposed for tests and tuning; the
/// shipped adapters use [`HnswConfig::default`] which matches the spec's
/// fixed reference parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Neighbors per node above layer 0 (`M`).
    pub m: usize,
    /// Neighbors per node at layer 0 (`M0`).
    pub m0: usize,
    /// Beam width during construction.
    pub ef_construction: usize,
    /// Beam width during search.
    pub ef_search: usize,
    /// Maximum layer a node may be assigned.
    pub max_level: usize,
    /// Per-node level retention probability (geometric distribution parameter).
    pub level_retention_probability: f64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            m0: 32,
            ef_construction: 40,
            ef_search: 50,
            max_level: 16,
            level_retention_probability: 0.5,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding `vectors.bin` and the metadata store's files.
    pub data_dir: String,
    /// Vector dimension, established at open time.
    pub dim: usize,
    /// Retrieval scoring/packing defaults.
    pub retrieval: RetrievalConfig,
    /// HNSW parameters.
    pub hnsw: HnswConfig,
}

impl EngineConfig {
    /// Loads configuration from defaults, an optional `voxrag.toml`, and
    /// `VOX_*` environment variables (`VOX_DATA_DIR`, `VOX_DIM`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a source fails to parse or a
    /// merged value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("voxrag.toml")
    }

    /// Like [`EngineConfig::load`], but reads the TOML layer from an
    /// explicit path instead of the default `voxrag.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a source fails to parse or a
    /// merged value fails validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VOX_").split("_").lowercase(false));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field invariants the spec requires (§4.4: weights
    /// non-negative and summing to 1).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retrieval;
        if r.similarity_weight < 0.0 || r.recency_weight < 0.0 {
            return Err(ConfigError::Invalid(
                "retrieval weights must be non-negative".into(),
            ));
        }
        let sum = r.similarity_weight + r.recency_weight;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::Invalid(format!(
                "retrieval.similarity_weight + retrieval.recency_weight must sum to 1.0, got {sum}"
            )));
        }
        if r.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.max_tokens must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_spec_reference_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.retrieval.max_tokens, 2000);
        assert_eq!(cfg.retrieval.top_k_candidates, 50);
        assert!((cfg.retrieval.similarity_weight - 0.8).abs() < f32::EPSILON);
        assert!((cfg.retrieval.recency_weight - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.hnsw.m, 16);
        assert_eq!(cfg.hnsw.m0, 32);
        assert_eq!(cfg.hnsw.ef_construction, 40);
        assert_eq!(cfg.hnsw.ef_search, 50);
        assert_eq!(cfg.hnsw.max_level, 16);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let mut cfg = EngineConfig::default();
        cfg.retrieval.similarity_weight = 0.5;
        cfg.retrieval.recency_weight = 0.3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_override_wins_over_file_and_defaults() {
        std::env::set_var("VOX_DIM", "256");
        let cfg = EngineConfig::load_from_path("does-not-exist.toml").unwrap();
        assert_eq!(cfg.dim, 256);
        std::env::remove_var("VOX_DIM");
    }
}
