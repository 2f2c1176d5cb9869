//! Query intent flags: explicit memory-recall ("what did I tell you to
//! remember?") and personal-fact queries (first person + personal noun).

use regex::Regex;

fn recall_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(what|which)\s+(did|have)\s+i\s+(tell|told|ask|asked)\s+you\s+to\s+remember|what\s+(phrase|word|code|token)\s+did\s+i|do\s+you\s+remember\s+what\s+i\s+(said|told|asked)|what\s+did\s+you\s+remember",
        )
        .expect("static recall pattern")
    })
}

fn first_person_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(my|mine|i|me|am i|do i)\b").expect("static pattern"))
}

fn personal_noun_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(name|phone|email|address|home|color|colour|birthday|age|wife|husband|spouse|partner|kids?|children|pet|dog|cat|job|work|employer|salary|timezone|meeting|allerg\w*|medication)\b",
        )
        .expect("static pattern")
    })
}

/// Whether the user is explicitly asking what they asked us to remember.
pub fn is_memory_recall(query: &str) -> bool {
    recall_re().is_match(query)
}

/// Whether the query is about a personal fact (first person plus a
/// personal noun). Lowers the similarity floor.
pub fn is_personal_query(query: &str) -> bool {
    first_person_re().is_match(query) && personal_noun_re().is_match(query)
}
