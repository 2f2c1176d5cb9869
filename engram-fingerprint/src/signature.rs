//! Value signatures: what kind of literal a fingerprint's content must
//! contain. A rule match without a passing signature is rejected, which
//! keeps negations and hypotheticals out of the fact table.

use regex::Regex;

/// The literal-value predicate attached to each fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSignature {
    /// A phone-shaped digit run (7+ digits with optional separators).
    PhoneDigits,
    /// An `@`-bearing address.
    EmailAddress,
    /// A currency amount or a 4+ digit / `NNk` figure.
    Money,
    /// A small integer (1–3 digits) or a count word.
    SmallNumber,
    /// A clock time (`3pm`, `15:30`, `9:00 am`).
    ClockTime,
    /// A named color word.
    ColorWord,
    /// A marital-status word.
    MaritalWord,
    /// A timezone token (`UTC`, `PST`, `Europe/Berlin`, `GMT+2`).
    TimezoneToken,
    /// A capitalized proper-noun token somewhere after the matched cue.
    ProperToken,
    /// Any non-trivial word content (weakest guard, for free-form facts
    /// like residence or job title).
    FreeText,
}

impl ValueSignature {
    /// Whether `content` carries a literal consistent with this
    /// signature.
    pub fn matches(&self, content: &str) -> bool {
        match self {
            Self::PhoneDigits => phone_re().is_match(content),
            Self::EmailAddress => email_re().is_match(content),
            Self::Money => money_re().is_match(content),
            Self::SmallNumber => {
                small_number_re().is_match(content) || count_word_re().is_match(content)
            }
            Self::ClockTime => clock_re().is_match(content),
            Self::ColorWord => color_re().is_match(content),
            Self::MaritalWord => marital_re().is_match(content),
            Self::TimezoneToken => timezone_re().is_match(content),
            Self::ProperToken => proper_re().is_match(content),
            Self::FreeText => content.split_whitespace().count() >= 2,
        }
    }
}

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("static regex"))
        }
    };
}

cached_regex!(phone_re, r"\+?\d[\d\s().-]{5,}\d");
cached_regex!(email_re, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}");
cached_regex!(money_re, r"[$€£]\s?\d[\d,.]*|\b\d{1,3}\s?[kK]\b|\b\d{4,}\b");
cached_regex!(small_number_re, r"\b\d{1,3}\b");
cached_regex!(
    count_word_re,
    r"(?i)\b(one|two|three|four|five|six|seven|eight|nine|ten|no|zero)\b"
);
cached_regex!(
    clock_re,
    r"(?i)\b\d{1,2}:\d{2}\s?(am|pm)?\b|\b\d{1,2}\s?(am|pm)\b|\b(noon|midnight)\b"
);
cached_regex!(
    color_re,
    r"(?i)\b(red|orange|yellow|green|blue|purple|violet|pink|black|white|gray|grey|brown|teal|cyan|magenta|turquoise|indigo|maroon|navy|gold|silver)\b"
);
cached_regex!(
    marital_re,
    r"(?i)\b(married|single|divorced|widowed|engaged|separated|partnered)\b"
);
cached_regex!(
    timezone_re,
    r"\b(UTC|GMT)([+-]\d{1,2}(:\d{2})?)?\b|\b[A-Z]{2,4}T\b|\b[A-Za-z]+/[A-Za-z_]+\b"
);
cached_regex!(proper_re, r"\b[A-Z][a-z]+\b");
