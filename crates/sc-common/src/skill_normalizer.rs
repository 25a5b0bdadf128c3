use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Decimal digits in any script; full-width forms are already folded by NFKC.
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Canonical form of a skill title for comparison.
///
/// NFKC folding, then digits (version numbers such as "Django 5") are removed, surrounding
/// whitespace is trimmed and the result is lower-cased. Never fails; blank input yields "".
pub fn normalize_skill(skill: &str) -> String {
    let folded: String = skill.nfkc().collect();
    DIGITS.replace_all(&folded, "").trim().to_lowercase()
}

/// True when a title carries nothing comparable once normalized ("", "  ", "2024").
///
/// Blank titles match everything through the substring rule, so the matcher skips them.
pub fn is_blank_skill(skill: &str) -> bool {
    normalize_skill(skill).is_empty()
}
