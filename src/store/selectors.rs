//! Pure derived views over the application state: the filter/sort pipeline
//! and aggregate statistics.

use crate::model::{AppState, Phrase, SortBy, SortOrder};
use crate::search::{self, DataFingerprint};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Filter by the state's raw search string, then stable-sort by the state's
/// sort settings. Terms that normalize below the minimum search length
/// apply no filtering.
pub fn select_filtered_and_sorted_phrases(state: &AppState) -> Vec<Phrase> {
    let mut result = filter_phrases(&state.phrases, &state.filter);
    sort_phrases(&mut result, state.sort_by, state.sort_order);
    result
}

pub fn filter_phrases(phrases: &[Phrase], filter: &str) -> Vec<Phrase> {
    match search::create_search_regex(filter) {
        Some(regex) => phrases
            .iter()
            .filter(|p| search::phrase_matches(p, &regex))
            .cloned()
            .collect(),
        None => phrases.to_vec(),
    }
}

/// Stable sort; descending order inverts the comparator, so ties keep their
/// original relative order either way.
pub fn sort_phrases(phrases: &mut [Phrase], sort_by: SortBy, sort_order: SortOrder) {
    phrases.sort_by(|a, b| {
        let ordering = compare_phrases(a, b, sort_by);
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare_phrases(a: &Phrase, b: &Phrase, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Date => a.created_at.cmp(&b.created_at),
        SortBy::Text => compare_text(&a.text, &b.text),
        SortBy::Likes => a.likes.cmp(&b.likes),
        // Missing author sorts as the empty string, i.e. first ascending.
        SortBy::Author => compare_text(
            a.author.as_deref().unwrap_or(""),
            b.author.as_deref().unwrap_or(""),
        ),
    }
}

// Case-insensitive lexicographic ordering stands in for locale collation,
// which the standard library does not provide.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Single-slot memo over [`select_filtered_and_sorted_phrases`].
///
/// Recomputation is skipped while the `(phrases, filter, sort_by,
/// sort_order)` inputs are unchanged. Phrase-list identity is the store's
/// generation counter plus the list's structural fingerprint; the shape
/// fields alone would miss in-place content edits. Exactly one previous
/// result is kept.
#[derive(Debug, Default)]
pub struct Selector {
    memo: Option<MemoSlot>,
}

#[derive(Debug)]
struct MemoSlot {
    key: MemoKey,
    output: Vec<Phrase>,
}

#[derive(Debug, PartialEq)]
struct MemoKey {
    fingerprint: DataFingerprint,
    filter: String,
    sort_by: SortBy,
    sort_order: SortOrder,
}

impl MemoKey {
    fn of(state: &AppState, generation: u64) -> Self {
        Self {
            fingerprint: DataFingerprint::of(&state.phrases, generation),
            filter: state.filter.clone(),
            sort_by: state.sort_by,
            sort_order: state.sort_order,
        }
    }
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filtered_and_sorted(&mut self, state: &AppState, generation: u64) -> &[Phrase] {
        let key = MemoKey::of(state, generation);
        if self.memo.as_ref().map_or(true, |slot| slot.key != key) {
            self.memo = Some(MemoSlot {
                output: select_filtered_and_sorted_phrases(state),
                key,
            });
        }
        match &self.memo {
            Some(slot) => &slot.output,
            None => &[],
        }
    }

    pub fn invalidate(&mut self) {
        self.memo = None;
    }
}

/// Fixed-shape aggregate view of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub filtered: usize,
    pub selected: usize,
    pub avg_length: usize,
    pub total_tags: usize,
    pub categories: usize,
    pub authors: usize,
}

pub fn select_stats(state: &AppState) -> Stats {
    let filtered = select_filtered_and_sorted_phrases(state).len();
    let total = state.phrases.len();

    let avg_length = if total > 0 {
        let sum: usize = state.phrases.iter().map(|p| p.text.chars().count()).sum();
        (sum as f64 / total as f64).round() as usize
    } else {
        0
    };

    let categories: HashSet<&str> = state
        .phrases
        .iter()
        .filter_map(|p| p.category.as_deref())
        .filter(|c| !c.is_empty())
        .collect();
    let authors: HashSet<&str> = state
        .phrases
        .iter()
        .filter_map(|p| p.author.as_deref())
        .filter(|a| !a.is_empty())
        .collect();

    Stats {
        total,
        filtered,
        selected: state.selected_phrases.len(),
        avg_length,
        total_tags: state.phrases.iter().map(|p| p.tags.len()).sum(),
        categories: categories.len(),
        authors: authors.len(),
    }
}
