//! The ordered deterministic rule table. First rule whose cue pattern
//! matches proposes a fingerprint; the proposal stands only if the
//! rule's value signature also holds. More specific cues come first so
//! that a rejected specific match can fall through to a broader one
//! ("call me at ..." vs. "call me Ishmael").

use regex::Regex;

use crate::signature::ValueSignature;

/// One deterministic classification rule.
pub struct FingerprintRule {
    pub fingerprint: &'static str,
    pub patterns: Vec<Regex>,
    pub confidence: f64,
    pub signature: ValueSignature,
}

impl FingerprintRule {
    fn new(
        fingerprint: &'static str,
        confidence: f64,
        signature: ValueSignature,
        patterns: &[&str],
    ) -> Self {
        Self {
            fingerprint,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("static rule pattern"))
                .collect(),
            confidence,
            signature,
        }
    }

    /// Whether any cue pattern matches the content.
    pub fn cue_matches(&self, content: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(content))
    }
}

/// The closed canonical fact-key set, for validating fallback labels.
pub fn known_fingerprints() -> &'static [&'static str] {
    &[
        "user_phone_number",
        "user_email",
        "user_salary",
        "user_age",
        "user_marital_status",
        "user_meeting_time",
        "user_timezone",
        "user_favorite_color",
        "user_spouse_name",
        "user_children_count",
        "user_employer",
        "user_job_title",
        "user_residence",
        "user_name",
        "user_pet",
    ]
}

/// Build the ordered rule table.
pub fn default_rules() -> Vec<FingerprintRule> {
    vec![
        FingerprintRule::new(
            "user_phone_number",
            0.95,
            ValueSignature::PhoneDigits,
            &[
                r"(?i)\b(my|our)\s+(phone|cell|mobile)(\s+number)?\b",
                r"(?i)\bphone\s+number\b",
                r"(?i)\b(call|text|reach)\s+me\b",
            ],
        ),
        FingerprintRule::new(
            "user_email",
            0.95,
            ValueSignature::EmailAddress,
            &[
                r"(?i)\bmy\s+e?mail(\s+address)?\b",
                r"(?i)\be?mail\s+address\b",
            ],
        ),
        FingerprintRule::new(
            "user_salary",
            0.90,
            ValueSignature::Money,
            &[
                r"(?i)\b(my\s+)?(salary|compensation|base pay)\b",
                r"(?i)\bi\s+(make|earn)\b",
            ],
        ),
        FingerprintRule::new(
            "user_age",
            0.90,
            ValueSignature::SmallNumber,
            &[
                r"(?i)\bi('m| am)\s+\d{1,3}\s+years?\s+old\b",
                r"(?i)\bmy\s+age\b",
            ],
        ),
        FingerprintRule::new(
            "user_marital_status",
            0.90,
            ValueSignature::MaritalWord,
            &[
                r"(?i)\bi('m| am)\s+(married|single|divorced|widowed|engaged|separated)\b",
                r"(?i)\bmarital\s+status\b",
            ],
        ),
        FingerprintRule::new(
            "user_meeting_time",
            0.85,
            ValueSignature::ClockTime,
            &[
                r"(?i)\b(meeting|standup|sync)\s+(time\s+)?is\b",
                r"(?i)\bwe\s+meet\s+at\b",
                r"(?i)\bmy\s+(meeting|standup)\b",
            ],
        ),
        FingerprintRule::new(
            "user_timezone",
            0.85,
            ValueSignature::TimezoneToken,
            &[
                r"(?i)\b(my\s+)?(timezone|time\s+zone)\b",
                r"(?i)\bi('m| am)\s+(in|on)\s+[A-Z]{2,4}T\b",
            ],
        ),
        FingerprintRule::new(
            "user_favorite_color",
            0.90,
            ValueSignature::ColorWord,
            &[r"(?i)\bfavou?rite\s+colou?r\b"],
        ),
        FingerprintRule::new(
            "user_spouse_name",
            0.85,
            ValueSignature::ProperToken,
            &[r"(?i)\bmy\s+(wife|husband|spouse|partner)('s\s+name)?\s+is\b"],
        ),
        FingerprintRule::new(
            "user_children_count",
            0.85,
            ValueSignature::SmallNumber,
            &[
                r"(?i)\b(i|we)\s+have\s+\S+\s+(kids?|children)\b",
                r"(?i)\bnumber\s+of\s+(kids|children)\b",
            ],
        ),
        FingerprintRule::new(
            "user_employer",
            0.85,
            ValueSignature::ProperToken,
            &[
                r"(?i)\bi\s+work\s+(at|for)\b",
                r"(?i)\bmy\s+(employer|company)\s+is\b",
            ],
        ),
        FingerprintRule::new(
            "user_job_title",
            0.85,
            ValueSignature::FreeText,
            &[
                r"(?i)\bi\s+work\s+as\b",
                r"(?i)\bmy\s+(job|role|title)\s+is\b",
                r"(?i)\bi('m| am)\s+an?\s+(\w+\s+)?(engineer|developer|programmer|manager|designer|analyst|teacher|nurse|doctor|lawyer|writer|consultant|scientist|accountant|architect)\b",
            ],
        ),
        FingerprintRule::new(
            "user_residence",
            0.85,
            ValueSignature::FreeText,
            &[
                r"(?i)\bi\s+live\s+(in|at)\b",
                r"(?i)\bmy\s+(address|home)\s+is\b",
                r"(?i)\bi('m| am)\s+based\s+in\b",
            ],
        ),
        FingerprintRule::new(
            "user_name",
            0.90,
            ValueSignature::ProperToken,
            &[r"(?i)\bmy\s+name\s+is\b", r"(?i)\bcall\s+me\b"],
        ),
        FingerprintRule::new(
            "user_pet",
            0.80,
            ValueSignature::FreeText,
            &[
                r"(?i)\bmy\s+(dog|cat|pet|puppy|kitten|bird|fish)\b",
                r"(?i)\bi\s+have\s+a\s+(dog|cat|pet|puppy|kitten|bird|fish)\b",
            ],
        ),
    ]
}
