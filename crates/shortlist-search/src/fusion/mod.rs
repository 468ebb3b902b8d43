//! Fusion of the dense, sparse and metadata channels into one candidate set.
//!
//! Fusion is an ordered union with first-seen-wins deduplication; there is
//! no score blending.

mod fuse;
pub mod hybrid;

pub use fuse::{Channel, ChannelRanks, FusedCandidate, FusedCandidateSet, RetrievalResult, fuse};
pub use hybrid::{RetrievalParams, hybrid_retrieve};
