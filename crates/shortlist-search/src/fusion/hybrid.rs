//! Hybrid retrieval orchestration across the dense, sparse and metadata
//! channels.
//!
//! The three channels read the same immutable corpus snapshot and run
//! concurrently. Unlike keyword-only fallbacks, a dense failure is not
//! degraded away: it fails the whole retrieval.

use std::collections::HashMap;

use shortlist_core::config::RetrievalConfig;
use shortlist_core::{CandidateId, CandidateRecord, IndexServiceError, JobRequirement};
use tracing::{info, instrument, warn};

use super::fuse::{FusedCandidateSet, RetrievalResult, fuse};
use crate::dense::{DenseRetriever, IndexHandle};
use crate::metadata::filter_min_experience;
use crate::sparse::{self, Bm25Params};

/// Knobs for one hybrid retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Cap on the dense and sparse channels. Metadata is never truncated.
    pub top_k: usize,
    pub bm25: Bm25Params,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            bm25: Bm25Params::default(),
        }
    }
}

impl From<&RetrievalConfig> for RetrievalParams {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            bm25: Bm25Params::from(config),
        }
    }
}

/// Run all three channels for `job` and fuse their results.
///
/// # Errors
///
/// Returns the dense channel's [`IndexServiceError`]; sparse scoring and
/// metadata filtering cannot fail.
#[instrument(skip_all, fields(candidates = corpus.len(), top_k = params.top_k))]
pub fn hybrid_retrieve<'a>(
    corpus: &'a [CandidateRecord],
    job: &JobRequirement,
    dense: &DenseRetriever,
    handle: &IndexHandle,
    params: &RetrievalParams,
) -> Result<FusedCandidateSet<'a>, IndexServiceError> {
    let (dense_ids, (sparse_hits, metadata_hits)) = rayon::join(
        || dense.query(handle, &job.text, params.top_k),
        || {
            rayon::join(
                || sparse::top_k(&job.text, corpus, params.bm25, params.top_k),
                || filter_min_experience(corpus, job.min_experience_years),
            )
        },
    );

    let dense_hits = resolve_ids(corpus, &dense_ids?);
    let dense_result = RetrievalResult::new(dense_hits);
    let sparse_result = RetrievalResult::new(sparse_hits);
    let metadata_result = RetrievalResult::new(metadata_hits);

    let fused = fuse(&dense_result, &sparse_result, &metadata_result);
    info!(
        dense = dense_result.len(),
        sparse = sparse_result.len(),
        metadata = metadata_result.len(),
        fused = fused.len(),
        "hybrid retrieval complete"
    );
    Ok(fused)
}

/// Map dense hits back to records, keeping hit order.
fn resolve_ids<'a>(corpus: &'a [CandidateRecord], ids: &[CandidateId]) -> Vec<&'a CandidateRecord> {
    let by_id: HashMap<CandidateId, &CandidateRecord> =
        corpus.iter().map(|record| (record.id, record)).collect();
    ids.iter()
        .filter_map(|id| {
            let hit = by_id.get(id).copied();
            if hit.is_none() {
                warn!(%id, "dense index returned an id outside the current corpus");
            }
            hit
        })
        .collect()
}
