#![forbid(unsafe_code)]
//! shortlist-search library.
//!
//! Hybrid candidate retrieval: BM25 keyword scoring, dense vector search
//! behind a [`dense::VectorStore`], a metadata threshold filter, and the
//! ordered fusion of all three.
//!
//! # Conventions
//!
//! - **Errors**: the dense channel returns `IndexServiceError`; the other
//!   channels and fusion are infallible.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod dense;
pub mod fusion;
pub mod metadata;
pub mod semantic;
pub mod sparse;

pub use dense::{DenseRetriever, IndexHandle};
pub use fusion::{FusedCandidateSet, RetrievalParams, RetrievalResult, fuse, hybrid_retrieve};
pub use semantic::{Embedder, HashEmbedder};
