//! Synonym expansion for personal-fact terms. Expansions are appended
//! to the embedding input only; the user-facing query never changes.

use std::collections::HashMap;

/// Personal-fact synonym map.
fn synonym_map() -> HashMap<&'static str, &'static [&'static str]> {
    let mut m = HashMap::new();
    m.insert("phone", &["telephone", "cell", "mobile", "number"][..]);
    m.insert("email", &["mail", "address", "inbox"]);
    m.insert("address", &["home", "residence", "live", "location"]);
    m.insert("home", &["address", "residence", "live"]);
    m.insert("job", &["work", "occupation", "career", "role", "title"]);
    m.insert("work", &["job", "employer", "company", "office"]);
    m.insert("salary", &["pay", "income", "compensation", "earnings"]);
    m.insert("wife", &["spouse", "partner", "married"]);
    m.insert("husband", &["spouse", "partner", "married"]);
    m.insert("kids", &["children", "family", "son", "daughter"]);
    m.insert("children", &["kids", "family", "son", "daughter"]);
    m.insert("color", &["colour", "favorite", "preference"]);
    m.insert("colour", &["color", "favourite", "preference"]);
    m.insert("birthday", &["birth", "born", "age"]);
    m.insert("pet", &["dog", "cat", "animal"]);
    m.insert("timezone", &["time", "zone", "local"]);
    m.insert("allergy", &["allergic", "allergies", "reaction", "intolerance"]);
    m.insert("allergies", &["allergic", "allergy", "reaction", "intolerance"]);
    m
}

/// Expand a query with personal-fact synonyms for the embedding input.
/// Bounded so a synonym-dense query does not drown the original terms.
pub fn expand_for_embedding(query: &str) -> String {
    let map = synonym_map();
    let words: Vec<&str> = query.split_whitespace().collect();
    let mut expansions: Vec<&str> = Vec::new();

    for word in &words {
        let lower: String = word
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        if let Some(synonyms) = map.get(lower.as_str()) {
            for syn in *synonyms {
                if !words.iter().any(|w| w.eq_ignore_ascii_case(syn))
                    && !expansions.contains(syn)
                {
                    expansions.push(syn);
                }
            }
        }
    }

    if expansions.is_empty() {
        return query.to_string();
    }

    expansions.truncate(5);
    format!("{} {}", query, expansions.join(" "))
}
