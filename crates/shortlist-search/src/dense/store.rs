//! The vector-store seam used by the dense retriever.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shortlist_core::config::VectorConfig;
use shortlist_core::{CandidateId, CandidateRecord, IndexServiceError};

/// Similarity metric of an index. Only cosine is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
}

impl Metric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
        }
    }
}

/// Shape of an index to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
    pub cloud: String,
    pub region: String,
}

impl From<&VectorConfig> for IndexSpec {
    fn from(config: &VectorConfig) -> Self {
        Self {
            name: config.index_name.clone(),
            dimension: config.dimension,
            metric: Metric::Cosine,
            cloud: config.cloud.clone(),
            region: config.region.clone(),
        }
    }
}

/// Structured attributes stored next to each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub candidate_id: CandidateId,
    pub name: String,
    pub experience_years: u32,
    pub skills: BTreeSet<String>,
}

impl From<&CandidateRecord> for VectorMetadata {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            candidate_id: record.id,
            name: record.name.clone(),
            experience_years: record.experience_years,
            skills: record.skills.clone(),
        }
    }
}

/// One vector to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: CandidateId,
    pub values: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// One nearest-neighbor hit. `score` is a similarity: higher is closer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorMatch {
    pub id: CandidateId,
    pub score: f32,
}

/// An external (or local) vector similarity service.
///
/// Calls are blocking. Implementations apply their own timeouts and surface
/// every failure as an [`IndexServiceError`]; none of them retry.
pub trait VectorStore: Send + Sync {
    /// Names of existing indexes.
    ///
    /// # Errors
    ///
    /// Returns an error when the service cannot be reached.
    fn list_indexes(&self) -> Result<Vec<String>, IndexServiceError>;

    /// Drop an index and every vector in it.
    ///
    /// # Errors
    ///
    /// Returns an error when the index cannot be deleted.
    fn delete_index(&self, name: &str) -> Result<(), IndexServiceError>;

    /// Create an empty index and wait until it accepts writes.
    ///
    /// # Errors
    ///
    /// Returns an error when creation fails or the index never becomes ready.
    fn create_index(&self, spec: &IndexSpec) -> Result<(), IndexServiceError>;

    /// Insert or overwrite vectors.
    ///
    /// # Errors
    ///
    /// Returns an error when the write is rejected.
    fn upsert(&self, index: &str, vectors: &[VectorRecord]) -> Result<(), IndexServiceError>;

    /// The `top_k` nearest vectors to `vector`, most similar first.
    ///
    /// # Errors
    ///
    /// Returns an error when the index is missing or the query fails.
    fn query(
        &self,
        index: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, IndexServiceError>;
}

/// Sort hits by descending score, breaking ties by ascending id.
pub(crate) fn sort_matches(matches: &mut [VectorMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}
