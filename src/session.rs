//! Coordination between user input timing and the search/persistence
//! machinery.
//!
//! [`SearchSession`] keeps the live filter responsive — every keystroke
//! lands in state immediately — while the expensive pipeline only runs once
//! the term has been quiet for a while. [`AutoSave`] coalesces rapid state
//! changes into a single trailing write.

use crate::debounce::Debouncer;
use crate::model::{AppState, Phrase};
use crate::persist::{KeyValueStore, StorageGateway};
use crate::search::{
    self, CacheStats, DataFingerprint, RegexCache, ResultCache, LARGE_DATASET_DEBOUNCE_DELAY,
    LARGE_DATASET_MIN_SEARCH_LENGTH, LARGE_DATASET_THRESHOLD, MIN_SEARCH_LENGTH,
    OPTIMAL_DEBOUNCE_DELAY,
};
use crate::store::{selectors, Action, Store};
use std::time::{Duration, Instant};
use tracing::warn;

/// Quiet period before a dirty state is flushed to storage.
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

/// Debounced search over the phrase list.
///
/// The live term and the settled (debounced) term are tracked separately;
/// while they differ the session reports `is_searching` so a caller can
/// show a pending indicator without ever blocking input.
pub struct SearchSession {
    debouncer: Debouncer<String>,
    live_term: String,
    settled_term: String,
    regex_cache: RegexCache,
    result_cache: ResultCache,
    results: Vec<Phrase>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            debouncer: Debouncer::with_settled(OPTIMAL_DEBOUNCE_DELAY, String::new()),
            live_term: String::new(),
            settled_term: String::new(),
            regex_cache: RegexCache::new(),
            result_cache: ResultCache::new(),
            results: Vec::new(),
        }
    }

    /// Update the live filter. The store sees the raw term immediately; the
    /// result pipeline only sees it after the quiet period. Large datasets
    /// get a longer quiet period.
    pub fn set_term(&mut self, store: &mut Store, term: &str, now: Instant) {
        store.dispatch(Action::SetFilter(term.to_string()));
        self.live_term = term.to_string();

        let quiet = if store.state().phrases.len() > LARGE_DATASET_THRESHOLD {
            LARGE_DATASET_DEBOUNCE_DELAY
        } else {
            OPTIMAL_DEBOUNCE_DELAY
        };
        self.debouncer.set_quiet_period(quiet);
        self.debouncer.set(term.to_string(), now);
    }

    /// Advance the debounce clock. When the term settles, recompute results
    /// and record the search in the persisted history if it was successful.
    /// Returns true when the results were refreshed.
    pub fn poll<S: KeyValueStore>(
        &mut self,
        state: &AppState,
        generation: u64,
        gateway: &mut StorageGateway<S>,
        now: Instant,
    ) -> bool {
        if !self.debouncer.poll(now) {
            return false;
        }

        self.settled_term = self
            .debouncer
            .value()
            .cloned()
            .unwrap_or_default();
        self.recompute(state, generation);

        let normalized = search::normalize_search_term(&self.settled_term);
        let searched = normalized.chars().count() >= self.min_search_length(state);
        if searched && !self.results.is_empty() {
            if let Err(e) = gateway.push_recent_search(&self.settled_term) {
                warn!(error = %e, "failed to record recent search");
            }
        }
        true
    }

    /// Recompute results for the current settled term, e.g. after the
    /// phrase list or sort settings changed. The store's generation keys the
    /// result cache, so a content-only edit cannot resurface a stale entry.
    pub fn refresh(&mut self, state: &AppState, generation: u64) {
        self.recompute(state, generation);
    }

    fn recompute(&mut self, state: &AppState, generation: u64) {
        let fingerprint = DataFingerprint::of(&state.phrases, generation);
        if let Some(hit) = self.result_cache.get(&self.settled_term, &fingerprint) {
            self.results = hit;
            return;
        }

        let normalized = search::normalize_search_term(&self.settled_term);
        let regex = if normalized.chars().count() >= self.min_search_length(state) {
            self.regex_cache.get_or_create(&self.settled_term)
        } else {
            // Below the gate the full list is the valid result.
            None
        };

        let mut filtered = match regex {
            Some(regex) => state
                .phrases
                .iter()
                .filter(|p| search::phrase_matches(p, &regex))
                .cloned()
                .collect(),
            None => state.phrases.clone(),
        };
        selectors::sort_phrases(&mut filtered, state.sort_by, state.sort_order);

        self.result_cache
            .insert(&self.settled_term, fingerprint, filtered.clone());
        self.results = filtered;
    }

    fn min_search_length(&self, state: &AppState) -> usize {
        if state.phrases.len() > LARGE_DATASET_THRESHOLD {
            LARGE_DATASET_MIN_SEARCH_LENGTH
        } else {
            MIN_SEARCH_LENGTH
        }
    }

    /// True while the settled term lags the live one.
    pub fn is_searching(&self) -> bool {
        self.live_term != self.settled_term
    }

    pub fn live_term(&self) -> &str {
        &self.live_term
    }

    pub fn settled_term(&self) -> &str {
        &self.settled_term
    }

    pub fn results(&self) -> &[Phrase] {
        &self.results
    }

    pub fn clear_caches(&mut self) {
        self.regex_cache.clear();
        self.result_cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            regex_entries: self.regex_cache.len(),
            result_entries: self.result_cache.len(),
        }
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Trailing-debounce persistence of the current state.
///
/// Every dispatch marks the state dirty; the actual write happens once the
/// state has been quiet for [`AUTOSAVE_DELAY`], so bursts of actions
/// coalesce into a single write of the latest state.
pub struct AutoSave {
    debouncer: Debouncer<()>,
}

impl AutoSave {
    pub fn new() -> Self {
        Self {
            debouncer: Debouncer::new(AUTOSAVE_DELAY),
        }
    }

    /// Schedule (or reschedule) a flush.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.debouncer.set((), now);
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Flush if the quiet period has elapsed. Returns true when a write
    /// actually happened.
    pub fn poll<S: KeyValueStore>(
        &mut self,
        state: &AppState,
        gateway: &mut StorageGateway<S>,
        now: Instant,
    ) -> Result<bool, crate::error::AppError> {
        if !self.debouncer.poll(now) {
            return Ok(false);
        }
        self.write(state, gateway)?;
        Ok(true)
    }

    /// Unconditional write, cancelling any pending timer. Used at shutdown.
    pub fn flush<S: KeyValueStore>(
        &mut self,
        state: &AppState,
        gateway: &mut StorageGateway<S>,
    ) -> Result<(), crate::error::AppError> {
        self.debouncer.cancel();
        self.write(state, gateway)
    }

    fn write<S: KeyValueStore>(
        &mut self,
        state: &AppState,
        gateway: &mut StorageGateway<S>,
    ) -> Result<(), crate::error::AppError> {
        gateway.save_phrases(&state.phrases)?;
        gateway.save_theme(state.theme)?;
        gateway.save_preferences(&crate::persist::Preferences {
            sort_by: state.sort_by,
            sort_order: state.sort_order,
            view_mode: state.view_mode,
        })?;
        Ok(())
    }
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new()
    }
}
