//! # engram
//!
//! The assembled memory store: `MemoryService` wires storage,
//! embeddings, fingerprinting, token counting, retrieval, and telemetry
//! into the public operation surface a chat orchestrator calls around
//! each user turn.

mod request;
mod service;

pub use request::StoreRequest;
pub use service::MemoryService;

// The types callers need alongside the service.
pub use engram_core::config::EngramConfig;
pub use engram_core::memory::{EmbeddingStatus, MemoryMetadata, MemoryRecord, Mode};
pub use engram_core::models::{
    BackfillOptions, BackfillReport, CleanupReport, ConstraintReport, RetrievalOptions,
    RetrievalOutcome, StoreReceipt,
};
pub use engram_core::{EngramError, EngramResult};
