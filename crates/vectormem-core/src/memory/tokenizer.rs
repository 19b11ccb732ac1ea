//! Approximate tokenizer used for partitioning text before embedding.
//!
//! Splits on whitespace and common punctuation. This does NOT reproduce any
//! model's real (BPE) tokenizer: counts are an estimate, good enough to size
//! chunks against a model's input limit, and must not be relied on for
//! anything stricter.

const SEPARATORS: &[char] = &[
    ' ', '\t', '\n', '\r', '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '<', '>',
    '/', '\\', '"', '\'',
];

/// Split `text` into approximate tokens, dropping empty fragments.
pub fn tokens(text: &str) -> Vec<&str> {
    text.split(SEPARATORS).filter(|t| !t.is_empty()).collect()
}

/// Approximate token count of `text`.
pub fn count_tokens(text: &str) -> usize {
    text.split(SEPARATORS).filter(|t| !t.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_tokens() {
        assert_eq!(count_tokens(""), 0);
        assert!(tokens("").is_empty());
        assert_eq!(count_tokens("  \n\t "), 0);
    }

    #[test]
    fn test_splits_on_whitespace_and_punctuation() {
        let text = "Hoy es 1 de abril de 2025. ¿Qué (fecha) es?";
        assert_eq!(
            tokens(text),
            vec!["Hoy", "es", "1", "de", "abril", "de", "2025", "¿Qué", "fecha", "es"]
        );
        assert_eq!(count_tokens(text), 10);
    }

    #[test]
    fn test_paths_and_quotes_are_split() {
        assert_eq!(tokens(r#"src/lib.rs "quoted" it's"#), vec!["src", "lib", "rs", "quoted", "it", "s"]);
    }
}
