//! Lyric text normalization applied before vectorization.

use std::collections::HashSet;
use std::sync::OnceLock;

/// English stopword list.
/// Apostrophes are stripped before filtering, so only bare forms are listed.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

fn english_stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH_STOPWORDS.iter().copied().collect())
}

/// Clean raw lyrics with the English stopword set.
///
/// ```
/// use lyric_recommender::cleaner::clean;
/// assert_eq!(clean("Let it be, let it BE!\nWhisper words of wisdom"), "let let whisper words wisdom");
/// ```
pub fn clean(raw_text: &str) -> String {
    clean_with(raw_text, english_stopwords())
}

/// Keep ASCII letters and whitespace, lowercase, split on whitespace, drop
/// stopwords, rejoin with single spaces.
pub fn clean_with(raw_text: &str, stopwords: &HashSet<&str>) -> String {
    let stripped: String = raw_text
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    stripped
        .split_whitespace()
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_digits_and_case() {
        assert_eq!(clean("Hello, World!! 2024 rock'n'roll"), "hello world rocknroll");
    }

    #[test]
    fn drops_stopwords_after_stripping() {
        // "don't" -> "dont" is not a stopword, "the" is
        assert_eq!(clean("Don't stop the music"), "dont stop music");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("  love\n\n\tlove \r\n heart  "), "love love heart");
    }

    #[test]
    fn empty_and_stopword_only_inputs_yield_empty_string() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("I am what I am, and you are"), "");
    }

    #[test]
    fn non_ascii_letters_are_removed() {
        assert_eq!(clean("café naïve"), "caf nave");
    }

    #[test]
    fn custom_stopwords() {
        let stop: HashSet<&str> = ["love"].into_iter().collect();
        assert_eq!(clean_with("Love me tender", &stop), "me tender");
    }

    #[test]
    fn deterministic() {
        let text = "Yesterday, all my troubles seemed so far away";
        assert_eq!(clean(text), clean(text));
        assert_eq!(clean(text), "yesterday troubles seemed far away");
    }
}
