//! The boost pipeline. Order is correctness-relevant and fixed:
//! safety-critical boost, then ordinal boost/penalty, then the
//! explicit-recall boost, then the hybrid composition (recency +
//! confidence + optional centroid affinity).

use chrono::{DateTime, Utc};

use engram_core::config::RetrievalConfig;
use engram_core::memory::MemoryRecord;

use crate::domain::HEALTH_CATEGORY;
use crate::scoring::cosine_similarity;

/// Ordinal indicator words, strongest cue for lexically separating
/// near-identical facts ("first code" vs "second code").
const ORDINALS: &[&str] = &[
    "first", "second", "third", "fourth", "fifth", "last", "previous", "next",
];

const SAFETY_ALLERGY_BOOST: f64 = 0.25;
const SAFETY_MEDICATION_BOOST: f64 = 0.20;
const SAFETY_CONDITION_BOOST: f64 = 0.15;

const ORDINAL_MATCH_BOOST: f64 = 0.40;
const ORDINAL_MISMATCH_PENALTY: f64 = -0.20;

const EXPLICIT_RECALL_BOOST: f64 = 0.70;

/// Find the first ordinal word in a text, if any.
pub fn find_ordinal(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    ORDINALS.iter().copied().find(|o| words.contains(o))
}

/// Safety-critical boost for health rows, strongest marker wins.
/// Ensures allergy information reaches the top of a dining query even
/// when its baseline similarity is lower.
pub fn safety_boost(record: &MemoryRecord) -> f64 {
    if record.category.as_deref() != Some(HEALTH_CATEGORY) {
        return 0.0;
    }
    let content = record.content.to_lowercase();
    if content.contains("allerg") || content.contains("anaphyla") || content.contains("epipen") {
        SAFETY_ALLERGY_BOOST
    } else if content.contains("medication")
        || content.contains("medicine")
        || content.contains("prescri")
        || content.contains("insulin")
        || content.contains("dosage")
    {
        SAFETY_MEDICATION_BOOST
    } else if content.contains("condition")
        || content.contains("diabet")
        || content.contains("asthma")
        || content.contains("epilep")
        || content.contains("hypertension")
    {
        SAFETY_CONDITION_BOOST
    } else {
        0.0
    }
}

/// Ordinal boost: matching ordinal promotes, a different ordinal
/// penalizes, no ordinal leaves the score unchanged.
pub fn ordinal_boost(query_ordinal: Option<&str>, record: &MemoryRecord) -> f64 {
    let Some(wanted) = query_ordinal else {
        return 0.0;
    };
    match find_ordinal(&record.content) {
        Some(found) if found == wanted => ORDINAL_MATCH_BOOST,
        Some(_) => ORDINAL_MISMATCH_PENALTY,
        None => 0.0,
    }
}

/// Explicit-recall boost: the user asked "what did I ask you to
/// remember?" and this row was an explicit storage request.
pub fn explicit_recall_boost(recall_mode: bool, record: &MemoryRecord) -> f64 {
    if recall_mode && record.metadata.explicit_storage_request {
        EXPLICIT_RECALL_BOOST
    } else {
        0.0
    }
}

/// Recency component. Recall mode uses aggressive tiers; otherwise a
/// smooth decay over the configured window.
pub fn recency_component(
    record: &MemoryRecord,
    recall_mode: bool,
    config: &RetrievalConfig,
    now: DateTime<Utc>,
) -> f64 {
    let age = now - record.created_at;
    let age_secs = age.num_seconds().max(0);
    if recall_mode {
        if age_secs < 15 * 60 {
            0.50
        } else if age_secs < (2.4 * 3600.0) as i64 {
            0.35
        } else if age_secs < 24 * 3600 {
            0.20
        } else {
            0.0
        }
    } else {
        let age_days = age_secs as f64 / 86_400.0;
        config.recency_boost_weight * (-age_days / config.recency_boost_days).exp()
    }
}

/// Confidence component: a small weight on fingerprint confidence.
pub fn confidence_component(record: &MemoryRecord, config: &RetrievalConfig) -> f64 {
    config.confidence_weight * record.fingerprint_confidence.unwrap_or(0.0)
}

/// Optional adaptive-centroid affinity.
pub fn centroid_component(
    record: &MemoryRecord,
    centroid: Option<&[f32]>,
    config: &RetrievalConfig,
) -> f64 {
    match (centroid, &record.embedding) {
        (Some(centroid), Some(embedding)) if config.adaptive_centroid => {
            config.centroid_boost_weight * cosine_similarity(embedding, centroid)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::memory::{EmbeddingStatus, MemoryMetadata, Mode};

    fn record(content: &str, category: Option<&str>) -> MemoryRecord {
        MemoryRecord {
            id: 1,
            user_id: "u1".to_string(),
            mode: Mode::general(),
            category: category.map(str::to_string),
            content: content.to_string(),
            token_count: 10,
            embedding: None,
            embedding_status: EmbeddingStatus::Pending,
            embedding_model: None,
            embedding_updated_at: None,
            fact_fingerprint: None,
            fingerprint_confidence: None,
            is_current: true,
            superseded_by: None,
            superseded_at: None,
            relevance_score: 0.5,
            usage_frequency: 0,
            last_accessed: None,
            created_at: Utc::now(),
            metadata: MemoryMetadata::default(),
        }
    }

    #[test]
    fn allergy_marker_outranks_medication_and_condition() {
        let allergy = record("severe peanut allergy, carries an epipen", Some(HEALTH_CATEGORY));
        let medication = record("takes blood pressure medication daily", Some(HEALTH_CATEGORY));
        let condition = record("manages asthma with an inhaler", Some(HEALTH_CATEGORY));
        assert!(safety_boost(&allergy) > safety_boost(&medication));
        assert!(safety_boost(&medication) > safety_boost(&condition));
        assert!(safety_boost(&condition) > 0.0);
    }

    #[test]
    fn safety_boost_requires_health_category() {
        let uncategorized = record("severe peanut allergy", None);
        assert_eq!(safety_boost(&uncategorized), 0.0);
    }

    #[test]
    fn ordinal_separation() {
        let first = record("my first access code is AAA-111", None);
        let second = record("my second access code is BBB-222", None);
        let wanted = find_ordinal("what's my second code?");
        assert_eq!(wanted, Some("second"));
        assert_eq!(ordinal_boost(wanted, &second), ORDINAL_MATCH_BOOST);
        assert_eq!(ordinal_boost(wanted, &first), ORDINAL_MISMATCH_PENALTY);

        let plain = record("my access code is CCC-333", None);
        assert_eq!(ordinal_boost(wanted, &plain), 0.0);
        assert_eq!(ordinal_boost(None, &first), 0.0);
    }

    #[test]
    fn recall_recency_is_tiered() {
        let config = RetrievalConfig::default();
        let now = Utc::now();
        let mut fresh = record("just stored", None);
        fresh.created_at = now - chrono::Duration::minutes(5);
        let mut older = record("stored earlier", None);
        older.created_at = now - chrono::Duration::hours(3);

        assert_eq!(recency_component(&fresh, true, &config, now), 0.50);
        assert_eq!(recency_component(&older, true, &config, now), 0.20);

        // Outside recall mode: smooth decay bounded by the weight.
        let smooth = recency_component(&fresh, false, &config, now);
        assert!(smooth > 0.0 && smooth <= config.recency_boost_weight);
    }

    #[test]
    fn explicit_recall_needs_both_flags() {
        let mut explicit = record("remember token X", None);
        explicit.metadata.explicit_storage_request = true;
        assert_eq!(explicit_recall_boost(true, &explicit), EXPLICIT_RECALL_BOOST);
        assert_eq!(explicit_recall_boost(false, &explicit), 0.0);
        let plain = record("ordinary note", None);
        assert_eq!(explicit_recall_boost(true, &plain), 0.0);
    }
}
