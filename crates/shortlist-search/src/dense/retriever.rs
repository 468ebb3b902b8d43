//! Dense channel over a [`VectorStore`].
//!
//! Indexing is a destructive rebuild: an existing index with the configured
//! name is deleted before a fresh one is created and filled. Queries return
//! candidate ids only, most similar first, with duplicates dropped.

use shortlist_core::{CandidateId, CandidateRecord, IndexServiceError};
use tracing::{debug, info, instrument};

use super::store::{IndexSpec, VectorMetadata, VectorRecord, VectorStore};
use crate::semantic::Embedder;

/// A built index, returned by [`DenseRetriever::index`] and required for
/// queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHandle {
    pub name: String,
    pub dimension: usize,
    /// Vectors written during the rebuild.
    pub size: usize,
}

/// Dense channel: embeds candidate text and delegates nearest-neighbor search
/// to a [`VectorStore`].
pub struct DenseRetriever {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    spec: IndexSpec,
}

impl std::fmt::Debug for DenseRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseRetriever")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl DenseRetriever {
    /// # Errors
    ///
    /// Returns [`IndexServiceError::DimensionMismatch`] when the embedder's
    /// width differs from the index dimension.
    pub fn new(
        embedder: Box<dyn Embedder>,
        store: Box<dyn VectorStore>,
        spec: IndexSpec,
    ) -> Result<Self, IndexServiceError> {
        if embedder.dimension() != spec.dimension {
            return Err(IndexServiceError::DimensionMismatch {
                expected: spec.dimension,
                actual: embedder.dimension(),
            });
        }
        Ok(Self {
            embedder,
            store,
            spec,
        })
    }

    #[must_use]
    pub const fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    /// Destructively rebuild the index from `corpus`.
    ///
    /// Any index with the configured name is deleted first, then a fresh one
    /// is created and every candidate's `text` is embedded and upserted.
    ///
    /// # Errors
    ///
    /// Any failure of the embedder or store is fatal and returned as-is.
    #[instrument(skip_all, fields(index = %self.spec.name, candidates = corpus.len()))]
    pub fn index(&self, corpus: &[CandidateRecord]) -> Result<IndexHandle, IndexServiceError> {
        let existing = self.store.list_indexes()?;
        if existing.iter().any(|name| name == &self.spec.name) {
            debug!("deleting existing index before rebuild");
            self.store.delete_index(&self.spec.name)?;
        }
        self.store.create_index(&self.spec)?;

        if !corpus.is_empty() {
            let texts: Vec<&str> = corpus.iter().map(|record| record.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            if embeddings.len() != corpus.len() {
                return Err(IndexServiceError::Rebuild {
                    index: self.spec.name.clone(),
                    detail: format!(
                        "embedding batch length mismatch: expected {}, got {}",
                        corpus.len(),
                        embeddings.len()
                    ),
                });
            }

            let vectors = corpus
                .iter()
                .zip(embeddings)
                .map(|(record, values)| {
                    self.check_dimension(values.len())?;
                    Ok(VectorRecord {
                        id: record.id,
                        values,
                        metadata: VectorMetadata::from(record),
                    })
                })
                .collect::<Result<Vec<_>, IndexServiceError>>()?;
            self.store.upsert(&self.spec.name, &vectors)?;
        }

        info!(size = corpus.len(), "dense index rebuilt");
        Ok(IndexHandle {
            name: self.spec.name.clone(),
            dimension: self.spec.dimension,
            size: corpus.len(),
        })
    }

    /// Ids of the `top_k` candidates most similar to `text`, most similar
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error when embedding or the store query fails.
    #[instrument(skip(self, text), fields(index = %handle.name))]
    pub fn query(
        &self,
        handle: &IndexHandle,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<CandidateId>, IndexServiceError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(text)?;
        self.check_dimension(vector.len())?;

        let mut matches = self.store.query(&handle.name, &vector, top_k)?;
        super::store::sort_matches(&mut matches);

        let mut ids: Vec<CandidateId> = Vec::with_capacity(top_k);
        for hit in matches {
            if !ids.contains(&hit.id) {
                ids.push(hit.id);
            }
            if ids.len() == top_k {
                break;
            }
        }
        debug!(hits = ids.len(), "dense query complete");
        Ok(ids)
    }

    fn check_dimension(&self, actual: usize) -> Result<(), IndexServiceError> {
        if actual == self.spec.dimension {
            Ok(())
        } else {
            Err(IndexServiceError::DimensionMismatch {
                expected: self.spec.dimension,
                actual,
            })
        }
    }
}
