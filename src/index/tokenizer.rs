//! Splits entity names into searchable sub-tokens

use std::collections::HashSet;

/// Structural separators found in runtime type and member names
pub const SEPARATORS: &[char] = &['.', '_', '<', '>', '`', ' '];

/// Default minimum sub-token length; shorter fragments are noise
/// (generic arity markers, operator stubs like `op`).
pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;

/// Produces the keys a name is registered under
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    min_token_len: usize,
}

impl Tokenizer {
    pub fn new(min_token_len: usize) -> Self {
        Self { min_token_len }
    }

    /// Sub-tokens of `name`, excluding the full name itself.
    ///
    /// Each distinct token (compared case-insensitively) is yielded once, in
    /// order of first appearance.
    pub fn sub_tokens<'a>(&self, name: &'a str) -> Vec<&'a str> {
        let mut tokens: Vec<&'a str> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for token in name.split(SEPARATORS) {
            if token == name || token.chars().count() < self.min_token_len {
                continue;
            }
            // Same folding as the index keys, so non-ASCII case variants collapse.
            if !seen.insert(normalize_key(token)) {
                continue;
            }
            tokens.push(token);
        }

        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TOKEN_LEN)
    }
}

/// Storage form of a key
pub fn normalize_key(term: &str) -> String {
    term.to_lowercase()
}
