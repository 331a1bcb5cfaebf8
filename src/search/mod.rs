//! Search primitives: term normalization and cached, escaped regex
//! compilation.
//!
//! User-typed terms are always matched literally; every regex metacharacter
//! is escaped before compilation. Compiled regexes and full result sets are
//! memoized in small LRU caches that callers can clear on demand — nothing
//! here invalidates implicitly on data changes.

use crate::model::{Phrase, PhraseId};
use regex::{Regex, RegexBuilder};
use std::time::Duration;

pub mod cache;

pub use cache::LruCache;

/// Terms shorter than this (after normalization) do not run a search.
pub const MIN_SEARCH_LENGTH: usize = 2;
/// Stricter gate once the dataset crosses [`LARGE_DATASET_THRESHOLD`].
pub const LARGE_DATASET_MIN_SEARCH_LENGTH: usize = 3;
pub const LARGE_DATASET_THRESHOLD: usize = 1000;

pub const OPTIMAL_DEBOUNCE_DELAY: Duration = Duration::from_millis(400);
pub const LARGE_DATASET_DEBOUNCE_DELAY: Duration = Duration::from_millis(600);

const REGEX_CACHE_CAPACITY: usize = 50;
const RESULT_CACHE_CAPACITY: usize = 100;

/// Trim and collapse internal whitespace runs. Case is left alone; the
/// compiled regex handles case-insensitivity.
pub fn normalize_search_term(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compile a case-insensitive literal matcher for the term, or `None` when
/// the normalized term is below [`MIN_SEARCH_LENGTH`].
pub fn create_search_regex(term: &str) -> Option<Regex> {
    let normalized = normalize_search_term(term);
    if normalized.chars().count() < MIN_SEARCH_LENGTH {
        return None;
    }
    RegexBuilder::new(&regex::escape(&normalized))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Does the phrase match in any of its searchable fields?
pub fn phrase_matches(phrase: &Phrase, regex: &Regex) -> bool {
    regex.is_match(&phrase.text)
        || phrase.tags.iter().any(|tag| regex.is_match(tag))
        || phrase.author.as_deref().is_some_and(|a| regex.is_match(a))
        || phrase.category.as_deref().is_some_and(|c| regex.is_match(c))
}

/// LRU cache over compiled search regexes, keyed by the raw (unnormalized)
/// term. Below-threshold terms cache `None` so repeated short inputs skip
/// normalization too.
#[derive(Debug)]
pub struct RegexCache {
    cache: LruCache<String, Option<Regex>>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(REGEX_CACHE_CAPACITY),
        }
    }

    pub fn get_or_create(&mut self, term: &str) -> Option<Regex> {
        if let Some(hit) = self.cache.get(&term.to_string()) {
            return hit.clone();
        }
        let compiled = create_search_regex(term);
        self.cache.insert(term.to_string(), compiled.clone());
        compiled
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheap signature of a phrase list: the store's phrase generation plus
/// length and first/last ids. The shape fields alone cannot see an in-place
/// content edit (same length, same edge ids), so the generation counter is
/// what makes edits distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DataFingerprint {
    generation: u64,
    len: usize,
    first: Option<PhraseId>,
    last: Option<PhraseId>,
}

impl DataFingerprint {
    pub fn of(phrases: &[Phrase], generation: u64) -> Self {
        Self {
            generation,
            len: phrases.len(),
            first: phrases.first().map(|p| p.id.clone()),
            last: phrases.last().map(|p| p.id.clone()),
        }
    }
}

/// LRU cache of full filtered result sets keyed by `(term, fingerprint)`.
#[derive(Debug)]
pub struct ResultCache {
    cache: LruCache<(String, DataFingerprint), Vec<Phrase>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(RESULT_CACHE_CAPACITY),
        }
    }

    pub fn get(&mut self, term: &str, fingerprint: &DataFingerprint) -> Option<Vec<Phrase>> {
        self.cache
            .get(&(term.to_string(), fingerprint.clone()))
            .cloned()
    }

    pub fn insert(&mut self, term: &str, fingerprint: DataFingerprint, results: Vec<Phrase>) {
        self.cache.insert((term.to_string(), fingerprint), results);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of cache occupancy, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub regex_entries: usize,
    pub result_entries: usize,
}
