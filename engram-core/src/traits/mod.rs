//! Seam traits between the crates: storage, embedding provider, and the
//! optional external fingerprint labeler.

mod embedding;
mod labeler;
mod storage;

pub use embedding::{EmbeddingVector, IEmbeddingProvider};
pub use labeler::IFingerprintLabeler;
pub use storage::IMemoryStore;
