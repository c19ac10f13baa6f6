//! Literal token substitution for text modules.
//!
//! Tokens are replaced as literal strings, never as regex. When one token is
//! a substring of another, the longer token is applied first; disjoint tokens
//! are order-independent.

use std::path::Path;

use crate::store::ContentType;

/// Replaces configured token strings in text-classified file content.
///
/// Immutable during a run; binary files and invalid UTF-8 pass through
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct TokenReplacer {
    // Sorted longest-token-first, ties lexicographic, so overlapping
    // tokens apply deterministically
    tokens: Vec<(String, String)>,
}

impl TokenReplacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token and its replacement
    pub fn with_token(mut self, token: impl Into<String>, replacement: impl Into<String>) -> Self {
        let token = token.into();
        self.tokens.retain(|(t, _)| *t != token);
        self.tokens.push((token, replacement.into()));
        self.tokens
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    /// Build from (token, replacement) pairs
    pub fn from_pairs<I, T, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, R)>,
        T: Into<String>,
        R: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |replacer, (token, replacement)| {
                replacer.with_token(token, replacement)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Replace every token occurrence in a text string
    pub fn replace(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (token, replacement) in &self.tokens {
            result = result.replace(token.as_str(), replacement);
        }
        result
    }

    /// Transform file content.
    ///
    /// Only files classified as text by extension are touched; everything
    /// else comes back byte-identical.
    pub fn transform(&self, path: &Path, content: Vec<u8>) -> Vec<u8> {
        if self.tokens.is_empty() || !ContentType::from_path(path).is_text() {
            return content;
        }

        match String::from_utf8(content) {
            Ok(text) => self.replace(&text).into_bytes(),
            Err(err) => err.into_bytes(),
        }
    }
}
