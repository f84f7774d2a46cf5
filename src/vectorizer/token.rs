use indexmap::IndexMap;

/// Token frequency of a single document.
/// Counts token occurrences inside one cleaned document.
/// Insertion order is kept so iteration over a document is deterministic.
///
/// # Examples
/// ```
/// use lyric_recommender::TokenFrequency;
/// let freq = TokenFrequency::from_text("love night love a", 2);
/// assert_eq!(freq.token_count("love"), 2);
/// assert_eq!(freq.token_count("a"), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenFrequency {
    token_count: IndexMap<String, u32>,
}

impl TokenFrequency {
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
        }
    }

    /// Count every whitespace separated token of `text` that is at least
    /// `min_len` characters long.
    pub fn from_text(text: &str, min_len: usize) -> Self {
        let tokens: Vec<&str> = text
            .split_whitespace()
            .filter(|token| token.chars().count() >= min_len)
            .collect();
        let mut freq = Self::new();
        freq.add_tokens(&tokens);
        freq
    }

    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        let count = self.token_count.entry(token.to_string()).or_insert(0);
        *count += 1;
        self
    }

    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }

    /// Occurrences of `token`, zero when absent
    #[inline]
    pub fn token_count(&self, token: &str) -> u32 {
        *self.token_count.get(token).unwrap_or(&0)
    }

    /// Iterate (token, count) in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.token_count.iter().map(|(t, &c)| (t.as_str(), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_track_duplicates_in_first_seen_order() {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["a", "b", "a", "c", "a"]);
        assert_eq!(freq.token_count("a"), 3);
        assert_eq!(freq.token_count("zzz"), 0);
        assert_eq!(freq.iter().collect::<Vec<_>>(), vec![("a", 3), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn from_text_drops_short_tokens() {
        let freq = TokenFrequency::from_text("i love my x dog  love", 2);
        assert_eq!(freq.token_count("i"), 0);
        assert_eq!(freq.token_count("x"), 0);
        assert_eq!(freq.token_count("love"), 2);
        assert_eq!(freq.token_count("my"), 1);
        assert_eq!(freq.iter().count(), 3);
    }
}
