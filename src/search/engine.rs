//! Query execution against the published index

use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::flags::SearchFlags;
use crate::config::SearchConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::tokenizer::normalize_key;
use crate::index::{IndexStore, Posting, SearchIndex, SearchResult};
use crate::metrics::{SEARCH_LATENCY, SEARCH_REQUESTS, SEARCH_RESULTS};

/// Runs exact and substring queries against whatever index is currently
/// published in the [`IndexStore`].
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<IndexStore>,
    config: SearchConfig,
}

impl QueryEngine {
    pub fn new(store: Arc<IndexStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// Search the published index.
    ///
    /// `max_results == 0` means unlimited. Fails with [`IndexError::NotBuilt`]
    /// when nothing has been published yet. Surrounding whitespace is ignored
    /// and a blank query matches nothing.
    pub fn search(
        &self,
        query: &str,
        flags: SearchFlags,
        max_results: usize,
    ) -> IndexResult<Vec<Arc<SearchResult>>> {
        let snapshot = self.store.snapshot().ok_or(IndexError::NotBuilt)?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        SEARCH_REQUESTS.inc();
        let start = Instant::now();

        let results = if flags.is_exact() {
            exact_lookup(&snapshot.index, query, flags, max_results)
        } else {
            substring_search(
                &snapshot.index,
                query,
                flags,
                max_results,
                self.config.parallel_scan_threshold,
            )
        };

        let elapsed = start.elapsed();
        SEARCH_LATENCY.observe(elapsed.as_secs_f64());
        SEARCH_RESULTS.observe(results.len() as f64);

        debug!(
            query,
            flags = ?flags,
            results = results.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "Metadata search finished"
        );

        Ok(results)
    }

    /// Same as [`search`](Self::search), run on a blocking worker thread
    pub async fn search_async(
        &self,
        query: String,
        flags: SearchFlags,
        max_results: usize,
    ) -> IndexResult<Vec<Arc<SearchResult>>> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.search(&query, flags, max_results))
            .await
            .map_err(|e| IndexError::Worker(format!("search task failed: {}", e)))?
    }

    /// The type definition whose own name (or full path) is `name`, if any.
    ///
    /// Types that only carry `name` as a token, like `Core` in
    /// `Core_Helper`, do not count.
    pub fn find_type_by_name(&self, name: &str) -> IndexResult<Option<Arc<SearchResult>>> {
        let wanted = normalize_key(name.trim());
        let candidates = self.search(name, SearchFlags::CLASSES | SearchFlags::EXACT_MATCH, 0)?;

        Ok(candidates.into_iter().find(|r| {
            normalize_key(r.name()) == wanted || normalize_key(r.path()) == wanted
        }))
    }

    pub fn find_methods_by_name(&self, name: &str) -> IndexResult<Vec<Arc<SearchResult>>> {
        self.search(name, SearchFlags::METHODS, self.config.default_limit)
    }

    pub fn find_fields_by_name(&self, name: &str) -> IndexResult<Vec<Arc<SearchResult>>> {
        self.search(name, SearchFlags::FIELDS, self.config.default_limit)
    }
}

/// Name key, then path key; discovery order, stops at the cap
pub fn exact_lookup(
    index: &SearchIndex,
    query: &str,
    flags: SearchFlags,
    max_results: usize,
) -> Vec<Arc<SearchResult>> {
    let names = index.get(query).unwrap_or_default();
    let paths = index.get_path(query).unwrap_or_default();

    let mut collector = Collector::new(flags);
    for posting in names.iter().chain(paths) {
        if flags.is_case_sensitive() && &*posting.term != query {
            continue;
        }
        collector.offer(posting);
        if max_results > 0 && collector.results.len() >= max_results {
            break;
        }
    }
    collector.results
}

/// Scan every name key for `query` as a substring, then rank and truncate
pub fn substring_search(
    index: &SearchIndex,
    query: &str,
    flags: SearchFlags,
    max_results: usize,
    parallel_threshold: usize,
) -> Vec<Arc<SearchResult>> {
    let needle = normalize_key(query);
    let entries = index.raw_entries();

    let mut matched: Vec<(&str, &[Posting])> = if entries.len() >= parallel_threshold {
        entries
            .par_iter()
            .filter(|(key, _)| key.contains(needle.as_str()))
            .map(|(key, postings)| (key.as_str(), postings.as_slice()))
            .collect()
    } else {
        entries
            .iter()
            .filter(|(key, _)| key.contains(needle.as_str()))
            .map(|(key, postings)| (key.as_str(), postings.as_slice()))
            .collect()
    };
    // Map iteration order is arbitrary; fix it so the first-wins dedup below
    // does not depend on it.
    matched.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut collector = Collector::new(flags);
    for (_, postings) in matched {
        for posting in postings {
            if flags.is_case_sensitive() && !posting.term.contains(query) {
                continue;
            }
            collector.offer(posting);
        }
    }

    let mut results = rank(collector.results, query, flags.is_case_sensitive());
    if max_results > 0 {
        results.truncate(max_results);
    }
    results
}

/// Order candidates: exact leaf name, then leaf prefix, then shorter leaf
/// names, then path.
fn rank(
    candidates: Vec<Arc<SearchResult>>,
    query: &str,
    case_sensitive: bool,
) -> Vec<Arc<SearchResult>> {
    let folded_query = normalize_key(query);

    let mut keyed: Vec<(u8, usize, Arc<SearchResult>)> = candidates
        .into_iter()
        .map(|result| {
            let name = result.name();
            let (exact, prefix) = if case_sensitive {
                (name == query, name.starts_with(query))
            } else {
                let folded = normalize_key(name);
                (folded == folded_query, folded.starts_with(&folded_query))
            };
            let class = if exact {
                0
            } else if prefix {
                1
            } else {
                2
            };
            (class, name.chars().count(), result)
        })
        .collect();

    keyed.sort_by(|a, b| (a.0, a.1, a.2.path()).cmp(&(b.0, b.1, b.2.path())));
    keyed.into_iter().map(|(_, _, result)| result).collect()
}

/// Kind filter plus first-wins dedup by rendered path
struct Collector<'a> {
    kinds: SearchFlags,
    seen: HashSet<&'a str>,
    results: Vec<Arc<SearchResult>>,
}

impl<'a> Collector<'a> {
    fn new(flags: SearchFlags) -> Self {
        Self {
            kinds: flags.kinds(),
            seen: HashSet::new(),
            results: Vec::new(),
        }
    }

    fn offer(&mut self, posting: &'a Posting) {
        let result = &posting.result;
        if !self.kinds.contains(result.kind().flag()) {
            return;
        }
        if self.seen.insert(result.path()) {
            self.results.push(result.clone());
        }
    }
}
