use sha2::{Digest, Sha256};
use shortlist_core::IndexServiceError;

/// Turns candidate and job text into fixed-width vectors.
///
/// Implementations must be deterministic for a given model and must always
/// return vectors of [`Embedder::dimension`] entries.
pub trait Embedder: Send + Sync {
    /// Width of every vector this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexServiceError`] when the embedding backend fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexServiceError>;

    /// Embed several texts, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexServiceError`] when any text fails to embed.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexServiceError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Offline embedder based on signed feature hashing.
///
/// Each lower-cased whitespace token and each character trigram inside it is
/// hashed with SHA-256 into one bucket with a sign taken from the digest. The
/// vector is then L2-normalized. Texts that share vocabulary land close
/// together under cosine similarity, which is enough for tests and for running
/// the pipeline without network access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0_u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = u64::from_le_bytes(bucket_bytes) % self.dimension as u64;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        // The modulo keeps the index below `dimension`.
        #[allow(clippy::cast_possible_truncation)]
        let slot = bucket as usize;
        vector[slot] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexServiceError> {
        if self.dimension == 0 {
            return Err(IndexServiceError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut vector = vec![0.0_f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            self.accumulate(&mut vector, token, 1.0);

            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let gram: String = window.iter().collect();
                self.accumulate(&mut vector, &format!("#{gram}"), 0.5);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

/// Cosine similarity in `[-1, 1]`, or `None` for mismatched or zero vectors.
#[must_use]
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f32> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut dot = 0.0_f32;
    let mut left_norm_sq = 0.0_f32;
    let mut right_norm_sq = 0.0_f32;

    for (a, b) in left.iter().zip(right) {
        dot += a * b;
        left_norm_sq += a * a;
        right_norm_sq += b * b;
    }

    let denom = left_norm_sq.sqrt() * right_norm_sq.sqrt();
    if denom <= f32::EPSILON {
        return None;
    }

    Some((dot / denom).clamp(-1.0, 1.0))
}

/// JSON array encoding accepted by `vec_f32()`.
#[must_use]
pub fn encode_embedding_json(embedding: &[f32]) -> String {
    let mut encoded = String::with_capacity(embedding.len() * 8 + 2);
    encoded.push('[');
    for (idx, value) in embedding.iter().enumerate() {
        if idx != 0 {
            encoded.push(',');
        }
        encoded.push_str(&value.to_string());
    }
    encoded.push(']');
    encoded
}
