//! Inverted index from lower-cased search keys to result records

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::result::SearchResult;
use super::tokenizer::{normalize_key, Tokenizer};

/// A record filed under a key, with the original-case term that produced it
#[derive(Debug, Clone)]
pub struct Posting {
    pub term: Arc<str>,
    pub result: Arc<SearchResult>,
}

/// Mapping from search key to the records whose names produced it.
///
/// Keys are stored lower-cased. Every stored list is non-empty. Rendered
/// paths live in a separate table that only answers exact lookups; they are
/// never split into tokens and never scanned for substrings.
#[derive(Debug, Default)]
pub struct SearchIndex {
    entries: HashMap<String, Vec<Posting>>,
    paths: HashMap<String, Vec<Posting>>,
    tokenizer: Tokenizer,
    index_paths: bool,
    record_count: usize,
}

impl SearchIndex {
    pub fn new(tokenizer: Tokenizer, index_paths: bool) -> Self {
        Self {
            entries: HashMap::new(),
            paths: HashMap::new(),
            tokenizer,
            index_paths,
            record_count: 0,
        }
    }

    /// Index a record under its leaf name and, if enabled and different,
    /// file its rendered path for exact lookup.
    ///
    /// Records whose leaf name is blank are skipped.
    pub fn insert(&mut self, result: Arc<SearchResult>) -> bool {
        let name = result.name().trim();
        if name.is_empty() {
            return false;
        }

        let name = name.to_string();
        self.register(&name, &result);
        if self.index_paths && result.path() != name {
            let path: Arc<str> = Arc::from(result.path());
            push_posting(&mut self.paths, path, &result);
        }

        self.record_count += 1;
        true
    }

    /// File `result` under `name` and every qualifying sub-token of it
    pub fn register(&mut self, name: &str, result: &Arc<SearchResult>) {
        if name.trim().is_empty() {
            return;
        }

        push_posting(&mut self.entries, Arc::from(name), result);
        for token in self.tokenizer.sub_tokens(name) {
            push_posting(&mut self.entries, Arc::from(token), result);
        }
    }

    /// Postings for an exact (case-insensitive) name key
    pub fn get(&self, term: &str) -> Option<&[Posting]> {
        self.entries.get(&normalize_key(term)).map(Vec::as_slice)
    }

    /// Postings for an exact (case-insensitive) rendered path
    pub fn get_path(&self, path: &str) -> Option<&[Posting]> {
        self.paths.get(&normalize_key(path)).map(Vec::as_slice)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[Posting])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every distinct record, in no particular order
    pub fn records(&self) -> impl Iterator<Item = &Arc<SearchResult>> {
        let mut seen = HashSet::new();
        self.entries
            .values()
            .flatten()
            .map(|posting| &posting.result)
            .filter(move |result| seen.insert(Arc::as_ptr(*result)))
    }

    pub(crate) fn raw_entries(&self) -> &HashMap<String, Vec<Posting>> {
        &self.entries
    }

    /// Name keys plus path keys
    pub fn key_count(&self) -> usize {
        self.entries.len() + self.paths.len()
    }

    /// Number of distinct records indexed
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn push_posting(
    table: &mut HashMap<String, Vec<Posting>>,
    term: Arc<str>,
    result: &Arc<SearchResult>,
) {
    let postings = table.entry(normalize_key(&term)).or_default();

    // A name and one of its own tokens can fold to the same key.
    if postings.last().is_some_and(|p| Arc::ptr_eq(&p.result, result)) {
        return;
    }

    postings.push(Posting {
        term,
        result: result.clone(),
    });
}
