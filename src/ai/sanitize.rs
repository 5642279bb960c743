//! Privacy redaction and pattern extraction.
//!
//! Everything that enters the knowledge base goes through `sanitize` first:
//! an ordered list of regex rules, each replacing its matches with a
//! placeholder token distinct per category. Rules run in listed order and
//! each rule operates on the output of the previous one, so earlier rules
//! win on overlapping text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Redaction rules, applied in order. The placeholder tokens are stable:
/// downstream pattern matching relies on them being plain words after
/// lower-casing.
static REDACTION_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            "[EMAIL]",
        ),
        (
            Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap(),
            "[PHONE]",
        ),
        (
            Regex::new(r"\b(?:\d[ -]*?){13,16}\b").unwrap(),
            "[CARD]",
        ),
        (
            Regex::new(r"\b\d{3}-?\d{2}-?\d{4}\b").unwrap(),
            "[SSN]",
        ),
        (
            Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap(),
            "[IP]",
        ),
        (
            Regex::new(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b").unwrap(),
            "[NAME]",
        ),
        (
            Regex::new(r"(?i)\b\d+ [A-Za-z]+ (?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd)\b")
                .unwrap(),
            "[ADDRESS]",
        ),
        (
            Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap(),
            "[DATE]",
        ),
        (
            Regex::new(r"\b(?:in|at|from|to) [A-Z][a-zA-Z]+(?:,? [A-Z][a-zA-Z]+)*\b").unwrap(),
            "[LOCATION]",
        ),
        (
            Regex::new(r"\b\d{5,}\b").unwrap(),
            "[NUMBER]",
        ),
        (
            Regex::new(r"https?://\S+").unwrap(),
            "[URL]",
        ),
    ]
});

/// Patterns that make a raw message too sensitive to forward to the
/// completion provider at all (email, phone, card, SSN).
static SENSITIVE_GUARDS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
        Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap(),
        Regex::new(r"\b(?:\d[ -]*?){13,16}\b").unwrap(),
        Regex::new(r"\b\d{3}-?\d{2}-?\d{4}\b").unwrap(),
    ]
});

/// Replace personal or sensitive spans with per-category placeholders.
/// Pure and deterministic; applies every rule, not just the first match.
pub fn sanitize(text: &str) -> String {
    let mut sanitized = text.to_string();
    for (rule, placeholder) in REDACTION_RULES.iter() {
        sanitized = rule.replace_all(&sanitized, *placeholder).into_owned();
    }
    sanitized
}

/// True when a raw message contains data that should never leave the device,
/// even redacted. Used by the orchestrator to short-circuit the turn.
pub fn contains_sensitive(text: &str) -> bool {
    SENSITIVE_GUARDS.iter().any(|rule| rule.is_match(text))
}

/// Lossy normalization used as the knowledge-base lookup key: lowercase,
/// sanitize, digits to `#`, strip everything that is not a lowercase letter,
/// `#`, or whitespace, then trim.
///
/// Intentionally generalizes across superficially different phrasings of the
/// same intent.
pub fn pattern_of(text: &str) -> String {
    sanitize(text)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_digit() { '#' } else { c })
        .filter(|c| c.is_ascii_lowercase() || *c == '#' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

// ── Tests ──────────────────────────────────────────────────
