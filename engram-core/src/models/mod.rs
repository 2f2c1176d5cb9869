//! Cross-crate data carriers: operation inputs, receipts, telemetry.

mod backfill;
mod candidate_filter;
mod draft;
mod fingerprint;
mod maintenance;
mod retrieval_options;
mod retrieval_telemetry;
mod store_receipt;

pub use backfill::{BackfillOptions, BackfillReport};
pub use candidate_filter::CandidateFilter;
pub use draft::MemoryDraft;
pub use fingerprint::{FingerprintDecision, FingerprintMethod};
pub use maintenance::{CleanupReport, ConstraintReport};
pub use retrieval_options::RetrievalOptions;
pub use retrieval_telemetry::{PhaseLatency, RetrievalOutcome, RetrievalTelemetry, RetrievedMemory};
pub use store_receipt::StoreReceipt;
