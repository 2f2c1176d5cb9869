//! Candidate scoring: cosine similarity for embedded rows, and the
//! token-match heuristic that bridges the embedding lag for rows whose
//! vector does not exist yet.

use chrono::{DateTime, Utc};
use regex::Regex;

use engram_core::memory::MemoryRecord;

/// Recency bonus window for heuristic scoring.
const HEURISTIC_RECENCY_SECS: i64 = 600;

/// Cosine similarity between two vectors. Accumulates in f64 so long
/// vectors don't lose precision.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn anchor_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    // Hyphenated upper/digit runs like ZEBRA-ANCHOR-123 or AAA-111.
    RE.get_or_init(|| Regex::new(r"\b[A-Z0-9]{2,}(?:-[A-Z0-9]{2,})+\b").expect("static pattern"))
}

/// Extract high-entropy anchor tokens (codes, identifiers).
pub fn extract_anchor_tokens(text: &str) -> Vec<String> {
    anchor_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

const STOPWORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "what", "your", "have", "about", "from", "will",
    "would", "could", "should", "tell", "told", "know", "remember", "please", "just", "which",
    "when", "where", "there", "their", "them", "then", "than", "were", "been", "being",
];

/// Lowercased content-bearing terms (length ≥ 4, no stopwords).
pub fn significant_terms(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 4 && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Token-match score for a row that has no embedding yet. Three
/// strategies, strongest first: exact anchor match, significant-term
/// overlap, plain overlap ratio with a small recency bonus. In recall
/// mode an explicit-storage row overrides everything.
pub fn text_match_score(
    query: &str,
    record: &MemoryRecord,
    recall_mode: bool,
    now: DateTime<Utc>,
) -> f64 {
    if recall_mode && record.metadata.explicit_storage_request {
        return 0.99;
    }

    // (a) exact high-entropy token match.
    let query_anchors = extract_anchor_tokens(query);
    if !query_anchors.is_empty() {
        let content_anchors = extract_anchor_tokens(&record.content);
        let stored_anchors = &record.metadata.anchors;
        if query_anchors
            .iter()
            .any(|a| content_anchors.contains(a) || stored_anchors.contains(a))
        {
            return 0.95;
        }
    }

    let query_terms = significant_terms(query);
    if query_terms.is_empty() {
        return 0.0;
    }
    let memory_terms = significant_terms(&record.content);
    let overlap = query_terms
        .iter()
        .filter(|t| memory_terms.contains(t))
        .count();
    let ratio = overlap as f64 / query_terms.len() as f64;

    // (b) exact term overlap over significant terms.
    if overlap >= 2 && ratio >= 0.5 {
        return 0.70 + 0.20 * ((ratio - 0.5) / 0.5).min(1.0);
    }

    // (c) plain overlap ratio plus a small recency bonus.
    let age_secs = (now - record.created_at).num_seconds();
    let recency_bonus = if age_secs >= 0 && age_secs <= HEURISTIC_RECENCY_SECS {
        0.15
    } else {
        0.0
    };
    ratio * 0.5 + recency_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use engram_core::memory::{EmbeddingStatus, MemoryMetadata, Mode};

    fn record(content: &str, created_at: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord {
            id: 1,
            user_id: "u1".to_string(),
            mode: Mode::general(),
            category: None,
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
            created_at,
            metadata: MemoryMetadata::default(),
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.5_f32, -0.25, 1.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_handles_zero_and_mismatched() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn anchor_tokens_are_extracted() {
        let anchors = extract_anchor_tokens("remember token ZEBRA-ANCHOR-123 please");
        assert_eq!(anchors, vec!["ZEBRA-ANCHOR-123".to_string()]);
        assert!(extract_anchor_tokens("no codes here").is_empty());
    }

    #[test]
    fn anchor_match_scores_high() {
        let now = Utc::now();
        let m = record("my first access code is AAA-111", now);
        let score = text_match_score("what's my AAA-111 code?", &m, false, now);
        assert!((score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn explicit_storage_overrides_in_recall_mode() {
        let now = Utc::now();
        let mut m = record("remember token ZEBRA-ANCHOR-123", now);
        m.metadata.explicit_storage_request = true;
        let score = text_match_score("what did I tell you to remember?", &m, true, now);
        assert!((score - 0.99).abs() < 1e-9);
        // Outside recall mode the override does not apply.
        let score = text_match_score("completely unrelated", &m, false, now);
        assert!(score < 0.99);
    }

    #[test]
    fn term_overlap_scores_by_ratio() {
        let now = Utc::now();
        let m = record("my favorite color is ultramarine blue", now);
        let high = text_match_score("favorite color ultramarine", &m, false, now);
        assert!(high >= 0.70);

        let low = text_match_score("favorite restaurants downtown maybe", &m, false, now);
        assert!(low < high);
    }

    #[test]
    fn fresh_rows_get_a_recency_bonus() {
        let now = Utc::now();
        let fresh = record("discussed the garden project", now);
        let stale = record(
            "discussed the garden project",
            now - chrono::Duration::hours(2),
        );
        let q = "garden";
        let fresh_score = text_match_score(q, &fresh, false, now);
        let stale_score = text_match_score(q, &stale, false, now);
        assert!(fresh_score > stale_score);
    }
}
