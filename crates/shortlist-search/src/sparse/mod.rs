//! Sparse keyword-frequency retrieval.

mod bm25;

pub use bm25::{Bm25Index, Bm25Params, score, tokenize, top_k};
