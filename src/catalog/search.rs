//! Case- and accent-insensitive text folding for catalog search
//!
//! The same fold is applied to the search term in Rust and to catalog columns
//! inside SQLite (registered as the `fold_text` SQL function), so matching is
//! identical on both sides.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Name of the SQL function registered on every catalog connection
pub const FOLD_SQL_FUNCTION: &str = "fold_text";

/// Decompose, drop combining marks, lowercase
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether `needle` occurs in `haystack` after folding both
pub fn folded_contains(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_case() {
        assert_eq!(fold("NDA"), "nda");
    }

    #[test]
    fn test_fold_accents() {
        assert_eq!(fold("Décision Générale"), "decision generale");
        assert_eq!(fold("Ångström"), "angstrom");
    }

    #[test]
    fn test_folded_contains() {
        assert!(folded_contains("Accord de confidentialité", "CONFIDENTIALITE"));
        assert!(folded_contains("NDA", "nd"));
        assert!(!folded_contains("MSA", "nda"));
    }
}
