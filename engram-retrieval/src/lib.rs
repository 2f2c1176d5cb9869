//! # engram-retrieval
//!
//! The retrieval pipeline: query analysis (safety domains, recall
//! intent, synonym expansion), query embedding, SQL prefilter with a
//! cross-user sentinel, embedding-lag augmentation, cosine and
//! text-heuristic scoring, the ordered boost pipeline, threshold,
//! token-budget selection, and telemetry for every call.

pub mod boosts;
pub mod budget;
pub mod domain;
pub mod engine;
pub mod expansion;
pub mod recall;
pub mod scoring;

pub use engine::RetrievalEngine;
