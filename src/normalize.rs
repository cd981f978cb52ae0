//! Text normalization for entity and keyword matching
//!
//! Portuguese input is full of diacritics the user may or may not type
//! ("João" vs "joao"), so all matching in the pipeline goes through the
//! same fold: NFD decomposition, combining-mark removal, lowercase,
//! whitespace trim. The fold is idempotent.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize text for case/accent-insensitive containment matching.
///
/// # Examples
///
/// ```
/// use fotiva_assistant::normalize::fold;
///
/// assert_eq!(fold("João"), "joao");
/// assert_eq!(fold("  PRÓXIMA Semana "), "proxima semana");
/// assert_eq!(fold(&fold("Conceição")), fold("Conceição"));
/// ```
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Case/accent-insensitive substring containment
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold(haystack).contains(&fold(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_diacritics() {
        assert_eq!(fold("João"), "joao");
        assert_eq!(fold("Conceição"), "conceicao");
        assert_eq!(fold("AMANHÃ"), "amanha");
    }

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(fold("  Maria Silva  "), "maria silva");
        assert_eq!(fold("JOÃO"), "joao");
    }

    #[test]
    fn containment_is_accent_insensitive() {
        assert!(contains_folded("Maria da Conceição", "conceicao"));
        assert!(contains_folded("joão pedro", "JOÃO"));
        assert!(!contains_folded("Maria Silva", "joão"));
    }

    proptest! {
        #[test]
        fn fold_is_idempotent(s in "[a-zA-ZÀ-ÿ0-9 ]{0,40}") {
            let once = fold(&s);
            prop_assert_eq!(fold(&once), once);
        }
    }
}
