use serde::{Deserialize, Serialize};

/// How a fingerprint decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMethod {
    /// Matched an ordered deterministic rule and its value signature.
    Deterministic,
    /// Came from the bounded external classifier fallback.
    Model,
    /// Nothing matched.
    None,
    /// The classifier fallback ran out of deadline.
    Timeout,
    /// A rule or the classifier matched but the value signature failed.
    Rejected,
}

/// The classifier's verdict on one piece of content.
///
/// `fingerprint` is only ever `Some` when `value_signature` is true:
/// the guard is applied before a decision is emitted, not after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintDecision {
    pub fingerprint: Option<String>,
    pub confidence: f64,
    pub method: FingerprintMethod,
    pub value_signature: bool,
}

impl FingerprintDecision {
    /// The no-match decision.
    pub fn none() -> Self {
        Self {
            fingerprint: None,
            confidence: 0.0,
            method: FingerprintMethod::None,
            value_signature: false,
        }
    }

    /// Whether this decision clears the supersession safety gate at the
    /// given confidence floor: fingerprint present and not the sentinel,
    /// confidence at or above the floor, value signature true.
    pub fn clears_gate(&self, min_confidence: f64) -> bool {
        match &self.fingerprint {
            Some(fp) => {
                fp != crate::constants::FINGERPRINT_NONE
                    && self.confidence >= min_confidence
                    && self.value_signature
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_requires_all_three_conditions() {
        let decision = FingerprintDecision {
            fingerprint: Some("user_phone_number".to_string()),
            confidence: 0.95,
            method: FingerprintMethod::Deterministic,
            value_signature: true,
        };
        assert!(decision.clears_gate(0.85));

        let low = FingerprintDecision {
            confidence: 0.80,
            ..decision.clone()
        };
        assert!(!low.clears_gate(0.85));

        let unsigned = FingerprintDecision {
            value_signature: false,
            ..decision.clone()
        };
        assert!(!unsigned.clears_gate(0.85));

        let sentinel = FingerprintDecision {
            fingerprint: Some("none".to_string()),
            ..decision
        };
        assert!(!sentinel.clears_gate(0.85));

        assert!(!FingerprintDecision::none().clears_gate(0.85));
    }
}
