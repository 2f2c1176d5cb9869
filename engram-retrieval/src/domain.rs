//! Safety-critical domain detection. A closed table of query domains
//! whose matches pull health categories into the prefilter. Strictly
//! additive: a null (all-categories) request is never narrowed.

use regex::Regex;

/// Category injected by every current safety domain.
pub const HEALTH_CATEGORY: &str = "health_wellness";

pub struct SafetyDomain {
    pub domain: &'static str,
    patterns: Vec<Regex>,
    pub injected_categories: &'static [&'static str],
    pub reason: &'static str,
}

impl SafetyDomain {
    fn new(
        domain: &'static str,
        reason: &'static str,
        injected: &'static [&'static str],
        patterns: &[&str],
    ) -> Self {
        Self {
            domain,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("static domain pattern"))
                .collect(),
            injected_categories: injected,
            reason,
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(query))
    }
}

/// The closed safety-domain table.
pub fn default_domains() -> Vec<SafetyDomain> {
    vec![
        SafetyDomain::new(
            "food_dining",
            "dietary restrictions and allergies must surface for food queries",
            &[HEALTH_CATEGORY],
            &[
                r"(?i)\b(eat|food|dinner|lunch|breakfast|restaurant|meal|snack|cook|recipe|menu|dish|cuisine)\b",
            ],
        ),
        SafetyDomain::new(
            "physical_activity",
            "conditions and limitations must surface for exertion queries",
            &[HEALTH_CATEGORY],
            &[
                r"(?i)\b(run|running|workout|exercise|gym|hike|hiking|swim|swimming|sport|training|marathon|yoga)\b",
            ],
        ),
        SafetyDomain::new(
            "medical",
            "medications and conditions must surface for medical queries",
            &[HEALTH_CATEGORY],
            &[
                r"(?i)\b(doctor|medication|medicine|pill|symptom|pain|sick|illness|health|hospital|pharmacy|dose|allergy|allergic)\b",
            ],
        ),
    ]
}

/// Outcome of safety detection for one query.
pub struct SafetyDetection {
    pub detected: bool,
    pub matched_domains: Vec<&'static str>,
    /// The effective category filter after additive widening.
    pub categories: Option<Vec<String>>,
}

/// Union matched domains' categories into the requested filter. A
/// `None` request already includes everything and stays `None`.
pub fn detect(query: &str, requested: Option<Vec<String>>) -> SafetyDetection {
    let mut matched = Vec::new();
    let mut injected: Vec<&'static str> = Vec::new();
    for domain in default_domains() {
        if domain.matches(query) {
            matched.push(domain.domain);
            for category in domain.injected_categories {
                if !injected.contains(category) {
                    injected.push(category);
                }
            }
        }
    }

    let categories = match requested {
        None => None,
        Some(mut list) => {
            for category in &injected {
                if !list.iter().any(|c| c == category) {
                    list.push((*category).to_string());
                }
            }
            Some(list)
        }
    };

    SafetyDetection {
        detected: !matched.is_empty(),
        matched_domains: matched,
        categories,
    }
}
