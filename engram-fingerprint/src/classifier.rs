//! The two-stage classifier: deterministic rules, then (optionally) one
//! bounded external call. Both stages answer to the value-signature
//! guard.

use std::time::Duration;

use tracing::{debug, warn};

use engram_core::constants::MODEL_CONFIDENCE_CAP;
use engram_core::errors::FingerprintError;
use engram_core::models::{FingerprintDecision, FingerprintMethod};
use engram_core::traits::IFingerprintLabeler;

use crate::rules::{default_rules, known_fingerprints, FingerprintRule};
use crate::signature::ValueSignature;

/// Deadline for the classifier fallback call.
const LABELER_DEADLINE: Duration = Duration::from_secs(2);

pub struct FingerprintClassifier {
    rules: Vec<FingerprintRule>,
    labeler: Option<Box<dyn IFingerprintLabeler>>,
    labeler_deadline: Duration,
}

impl FingerprintClassifier {
    /// Deterministic-only classifier.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            labeler: None,
            labeler_deadline: LABELER_DEADLINE,
        }
    }

    /// Attach the bounded classifier fallback.
    pub fn with_labeler(mut self, labeler: Box<dyn IFingerprintLabeler>) -> Self {
        self.labeler = Some(labeler);
        self
    }

    /// Classify one piece of content. Cannot fail: fallback timeouts and
    /// unknown labels collapse to a no-fingerprint decision with the
    /// matching method tag.
    pub fn classify(&self, content: &str) -> FingerprintDecision {
        let content = content.trim();
        if content.is_empty() {
            return FingerprintDecision::none();
        }

        // Stage 1: ordered deterministic pass. A cue match whose value
        // signature fails is rejected and scanning continues.
        let mut saw_rejection = false;
        for rule in &self.rules {
            if !rule.cue_matches(content) {
                continue;
            }
            if rule.signature.matches(content) {
                debug!(
                    fingerprint = rule.fingerprint,
                    confidence = rule.confidence,
                    "deterministic fingerprint match"
                );
                return FingerprintDecision {
                    fingerprint: Some(rule.fingerprint.to_string()),
                    confidence: rule.confidence,
                    method: FingerprintMethod::Deterministic,
                    value_signature: true,
                };
            }
            debug!(
                fingerprint = rule.fingerprint,
                "cue matched but value signature failed, continuing"
            );
            saw_rejection = true;
        }

        // Stage 2: one bounded external call, only when enabled.
        if let Some(labeler) = &self.labeler {
            match labeler.label(content, self.labeler_deadline) {
                Ok(Some(label)) => return self.accept_model_label(content, &label),
                Ok(None) => {}
                Err(FingerprintError::LabelerTimeout { deadline_ms }) => {
                    warn!(deadline_ms, "fingerprint fallback timed out");
                    return FingerprintDecision {
                        fingerprint: None,
                        confidence: 0.0,
                        method: FingerprintMethod::Timeout,
                        value_signature: false,
                    };
                }
                Err(e) => {
                    warn!(error = %e, "fingerprint fallback failed");
                }
            }
        }

        FingerprintDecision {
            fingerprint: None,
            confidence: 0.0,
            method: if saw_rejection {
                FingerprintMethod::Rejected
            } else {
                FingerprintMethod::None
            },
            value_signature: false,
        }
    }

    /// Validate a fallback label: it must be in the closed set and its
    /// signature must hold; confidence is capped.
    fn accept_model_label(&self, content: &str, label: &str) -> FingerprintDecision {
        if !known_fingerprints().contains(&label) {
            warn!(label, "fingerprint fallback returned unknown label");
            return FingerprintDecision::none();
        }
        let signature = self
            .rules
            .iter()
            .find(|r| r.fingerprint == label)
            .map(|r| r.signature)
            .unwrap_or(ValueSignature::FreeText);
        if !signature.matches(content) {
            debug!(label, "fallback label rejected by value signature");
            return FingerprintDecision {
                fingerprint: None,
                confidence: 0.0,
                method: FingerprintMethod::Rejected,
                value_signature: false,
            };
        }
        FingerprintDecision {
            fingerprint: Some(label.to_string()),
            confidence: MODEL_CONFIDENCE_CAP,
            method: FingerprintMethod::Model,
            value_signature: true,
        }
    }
}

impl Default for FingerprintClassifier {
    fn default() -> Self {
        Self::new()
    }
}
