//! # engram-embeddings
//!
//! The embedding side of the store: a deadline-bounded HTTP client for
//! the provider API, a per-user query-embedding cache, a deterministic
//! offline provider for tests and air-gapped runs, and the resumable
//! backfill worker that finishes what store-time embedding could not.

pub mod backfill;
pub mod cache;
pub mod client;
pub mod providers;

pub use backfill::BackfillWorker;
pub use cache::QueryEmbeddingCache;
pub use client::EmbeddingClient;
