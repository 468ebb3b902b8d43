//! Text embedding for the dense channel.

mod embed;

pub use embed::{Embedder, HashEmbedder, cosine_similarity, encode_embedding_json};
