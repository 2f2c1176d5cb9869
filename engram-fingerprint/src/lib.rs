//! # engram-fingerprint
//!
//! Maps free-text content to a canonical fact key. Two stages: an
//! ordered deterministic rule pass (no external calls), then an optional
//! bounded classifier fallback. Every candidate, deterministic or
//! model, must also satisfy the fingerprint's value signature before a
//! decision is emitted; "I don't have a phone" never becomes
//! `user_phone_number`.

mod classifier;
mod rules;
mod signature;

pub use classifier::FingerprintClassifier;
pub use rules::{known_fingerprints, FingerprintRule};
pub use signature::ValueSignature;
