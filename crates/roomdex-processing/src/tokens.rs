//! Heuristic token estimation for chunk sizing and usage accounting
//!
//! Exact tokenizer counts are not needed here: chunk budgets and usage
//! accumulators tolerate a few percent of error, and a character-class
//! heuristic avoids shipping a tokenizer model.

/// Fast token estimator based on character patterns
///
/// Roughly 4 characters per token for English prose, with punctuation and
/// non-ASCII symbols weighted up since they usually tokenize separately.
#[derive(Debug, Clone)]
pub struct TokenEstimator {
    chars_per_token: f64,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: 4.0,
        }
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the base chars-per-token ratio
    pub const fn with_ratio(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }

    /// Estimate the token count of a text span
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let mut word_chars = 0usize;
        let mut whitespace = 0usize;
        let mut punctuation = 0usize;
        let mut other = 0usize;

        for ch in text.chars() {
            if ch.is_alphabetic() || ch.is_numeric() {
                word_chars += 1;
            } else if ch.is_whitespace() {
                whitespace += 1;
            } else if ch.is_ascii_punctuation() {
                punctuation += 1;
            } else {
                other += 1;
            }
        }

        // Punctuation mostly becomes its own token; whitespace is usually
        // absorbed into the preceding token
        #[allow(clippy::cast_precision_loss)]
        let estimated = (word_chars as f64 / self.chars_per_token)
            + (punctuation as f64 * 0.8)
            + (other as f64 * 0.9)
            + (whitespace as f64 * 0.1);

        estimated.ceil() as usize
    }
}
