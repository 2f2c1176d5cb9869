//! Embedding providers behind the `IEmbeddingProvider` seam.

mod hashed;
mod http;

pub use hashed::HashedEmbeddingProvider;
pub use http::HttpEmbeddingProvider;
