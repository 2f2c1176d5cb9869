//! Deterministic offline provider: hashed bag-of-words, L2-normalized.
//! No network, no model weights. Overlapping texts land near each other,
//! which is exactly what tests and air-gapped dev need from it.

use std::time::Duration;

use engram_core::errors::EmbeddingError;
use engram_core::traits::{EmbeddingVector, IEmbeddingProvider};

pub struct HashedEmbeddingProvider {
    dimensions: usize,
    model: String,
}

impl HashedEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            model: "hashed-bow-v1".to_string(),
        }
    }
}

impl IEmbeddingProvider for HashedEmbeddingProvider {
    fn embed(&self, text: &str, _deadline: Duration) -> Result<EmbeddingVector, EmbeddingError> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % self.dimensions;
            // Sign from a second hash byte spreads tokens across the
            // sphere instead of the positive orthant.
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        Ok(EmbeddingVector {
            dimensions: self.dimensions,
            vector,
            model: self.model.clone(),
            elapsed_ms: 0,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
