//! Text normalization shared by the classifier cache, alias index and rule tiers.
//!
//! Folds case and diacritics so "Próximo JOGO do São Paulo?" and
//! "proximo jogo do sao paulo" compare equal.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, strip diacritics, turn punctuation into spaces and collapse whitespace.
///
/// `×` is kept as a standalone `x` so fixture expressions survive normalization.
pub fn normalize_text(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c == '×' {
            folded.push_str(" x ");
            continue;
        }
        for lower in c.to_lowercase() {
            folded.push(if lower.is_alphanumeric() { lower } else { ' ' });
        }
    }
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `needle` occurs in `haystack` starting at a word boundary.
/// Both sides must already be normalized.
pub fn contains_at_word_start(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(i, _)| is_word_start(haystack, i))
}

/// True when `needle` occurs in `haystack` as whole words on both ends.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(i, m)| {
        let end = i + m.len();
        is_word_start(haystack, i) && (end == haystack.len() || haystack[end..].starts_with(' '))
    })
}

fn is_word_start(haystack: &str, i: usize) -> bool {
    i == 0 || haystack[..i].ends_with(' ')
}

/// True when any of `words` is present as a whole word.
pub fn has_any_word(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| contains_word(haystack, w))
}

/// Capitalize each word ("gabriel barbosa" -> "Gabriel Barbosa").
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_diacritics() {
        assert_eq!(normalize_text("Próximo JOGO do São Paulo?"), "proximo jogo do sao paulo");
        assert_eq!(normalize_text("  Grêmio!!  "), "gremio");
        assert_eq!(normalize_text("Transmissão"), "transmissao");
    }

    #[test]
    fn keeps_multiplication_sign_as_separator() {
        assert_eq!(normalize_text("Bahia×Fluminense"), "bahia x fluminense");
        assert_eq!(normalize_text("Bahia × Fluminense"), "bahia x fluminense");
    }

    #[test]
    fn word_matching() {
        assert!(contains_word("jogo do sp hoje", "sp"));
        assert!(!contains_word("jogo do spfc hoje", "sp"));
        assert!(contains_at_word_start("jogo do spfc hoje", "sp"));
        assert!(!contains_at_word_start("canal de esporte", "sport"));
        assert!(contains_word("sao paulo", "sao paulo"));
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("gabriel barbosa"), "Gabriel Barbosa");
    }
}
