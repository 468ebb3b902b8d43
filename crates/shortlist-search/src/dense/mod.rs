//! Dense retrieval: embeddings plus an external vector-similarity index.

mod pinecone;
mod retriever;
mod sqlite;
mod store;

pub use pinecone::PineconeStore;
pub use retriever::{DenseRetriever, IndexHandle};
pub use sqlite::SqliteVecStore;
pub use store::{IndexSpec, Metric, VectorMatch, VectorMetadata, VectorRecord, VectorStore};
