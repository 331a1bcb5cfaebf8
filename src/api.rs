//! # API Facade
//!
//! Single entry point for all phrase-manager operations, generic over the
//! storage backend so tests run against [`crate::persist::MemoryBackend`]
//! and production against [`crate::persist::FileBackend`].
//!
//! The facade stays thin: it validates and normalizes input, dispatches
//! actions, and drives the debounce/autosave clocks. Business rules live
//! in the reducer, selectors, and gateway. Time is threaded through as
//! explicit `Instant`s so coalescing behavior is deterministic under test.

use crate::error::AppError;
use crate::model::{
    AppState, Locale, Phrase, PhraseId, PhraseImport, SortBy, SortOrder, ViewMode,
};
use crate::persist::{KeyValueStore, StorageGateway};
use crate::search::CacheStats;
use crate::session::{AutoSave, SearchSession};
use crate::store::{
    select_stats, Action, PhraseUpdates, Selector, Stats, Store, SubscriptionId,
};
use crate::validation::{parse_tags, sanitize_input, validate_phrase_form, PhraseForm,
    ValidationResult};
use std::time::Instant;
use tracing::warn;

pub struct PhraseApp<S: KeyValueStore> {
    store: Store,
    gateway: StorageGateway<S>,
    selector: Selector,
    search: SearchSession,
    autosave: AutoSave,
}

impl<S: KeyValueStore> PhraseApp<S> {
    /// Build the initial state from whatever the backend holds. Corrupt or
    /// missing data degrades to defaults; a load failure is recorded in
    /// `state.error` instead of aborting startup.
    pub fn new(backend: S) -> Self {
        let gateway = StorageGateway::new(backend);
        let mut state = AppState::default();

        match gateway.load_phrases() {
            Ok(phrases) => state.phrases = phrases,
            Err(e) => {
                warn!(error = %e, "failed to load phrases, starting empty");
                state.error = Some(e.to_string());
            }
        }
        state.theme = gateway.load_theme();
        match gateway.load_preferences() {
            Ok(Some(preferences)) => {
                state.sort_by = preferences.sort_by;
                state.sort_order = preferences.sort_order;
                state.view_mode = preferences.view_mode;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to load preferences, using defaults"),
        }

        let store = Store::new(state);
        let mut search = SearchSession::new();
        search.refresh(store.state(), store.generation());

        Self {
            store,
            gateway,
            selector: Selector::new(),
            search,
            autosave: AutoSave::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn gateway(&self) -> &StorageGateway<S> {
        &self.gateway
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&AppState) + 'static) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// The filtered and sorted view of the live state, memoized.
    pub fn phrases(&mut self) -> &[Phrase] {
        self.selector
            .filtered_and_sorted(self.store.state(), self.store.generation())
    }

    pub fn stats(&self) -> Stats {
        select_stats(self.store.state())
    }

    /// Results of the debounced search pipeline (lags the live filter).
    pub fn search_results(&self) -> &[Phrase] {
        self.search.results()
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_searching()
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.gateway.load_recent_searches()
    }

    /// Validate the form and add the phrase. Failed validation comes back
    /// as data; nothing is dispatched in that case.
    pub fn create_phrase(
        &mut self,
        form: &PhraseForm,
        now: Instant,
    ) -> Result<Phrase, ValidationResult> {
        let outcome = validate_phrase_form(form);
        if !outcome.is_valid() {
            return Err(outcome);
        }

        let mut phrase = Phrase::new(sanitize_input(&form.text));
        phrase.tags = parse_tags(&form.tags);
        let author = sanitize_input(&form.author);
        if !author.is_empty() {
            phrase.author = Some(author);
        }
        let category = sanitize_input(&form.category);
        if !category.is_empty() {
            phrase.category = Some(category);
        }

        self.store.dispatch(Action::AddPhrase(phrase.clone()));
        self.after_dispatch(now);
        Ok(phrase)
    }

    /// `PhraseUpdates` has no identity fields, so `id` and `created_at`
    /// cannot change through this path.
    pub fn update_phrase(&mut self, id: &PhraseId, updates: PhraseUpdates, now: Instant) {
        self.store.dispatch(Action::UpdatePhrase {
            id: id.clone(),
            updates,
        });
        self.after_dispatch(now);
    }

    pub fn delete_phrase(&mut self, id: &PhraseId, now: Instant) {
        self.store.dispatch(Action::DeletePhrase(id.clone()));
        self.after_dispatch(now);
    }

    pub fn batch_delete(&mut self, ids: Vec<PhraseId>, now: Instant) {
        self.store.dispatch(Action::BatchDelete(ids));
        self.after_dispatch(now);
    }

    /// Delete everything currently selected.
    pub fn delete_selected(&mut self, now: Instant) {
        let ids: Vec<PhraseId> = self.store.state().selected_phrases.iter().cloned().collect();
        self.batch_delete(ids, now);
    }

    /// Likes only go up; there is no decrement.
    pub fn like_phrase(&mut self, id: &PhraseId, now: Instant) {
        let likes = self
            .store
            .state()
            .phrases
            .iter()
            .find(|p| &p.id == id)
            .map(|p| p.likes);
        if let Some(likes) = likes {
            self.store.dispatch(Action::UpdatePhrase {
                id: id.clone(),
                updates: PhraseUpdates {
                    likes: Some(likes + 1),
                    ..PhraseUpdates::default()
                },
            });
            self.after_dispatch(now);
        }
    }

    /// Copy an existing phrase under a fresh identity.
    pub fn duplicate_phrase(&mut self, id: &PhraseId, now: Instant) -> Option<Phrase> {
        let original = self.store.state().phrases.iter().find(|p| &p.id == id)?;
        let mut copy = Phrase::new(original.text.clone()).with_tags(original.tags.clone());
        copy.author = original.author.clone();
        copy.category = original.category.clone();

        self.store.dispatch(Action::AddPhrase(copy.clone()));
        self.after_dispatch(now);
        Some(copy)
    }

    pub fn toggle_selection_mode(&mut self, now: Instant) {
        self.store.dispatch(Action::ToggleSelectionMode);
        self.after_dispatch(now);
    }

    pub fn toggle_phrase_selection(&mut self, id: &PhraseId, now: Instant) {
        self.store.dispatch(Action::TogglePhraseSelection(id.clone()));
        self.after_dispatch(now);
    }

    pub fn clear_selection(&mut self, now: Instant) {
        self.store.dispatch(Action::ClearSelection);
        self.after_dispatch(now);
    }

    pub fn select_all(&mut self, now: Instant) {
        if !self.store.state().selection_mode {
            self.store.dispatch(Action::ToggleSelectionMode);
        }
        let unselected: Vec<PhraseId> = self
            .store
            .state()
            .phrases
            .iter()
            .filter(|p| !self.store.state().selected_phrases.contains(&p.id))
            .map(|p| p.id.clone())
            .collect();
        for id in unselected {
            self.store.dispatch(Action::TogglePhraseSelection(id));
        }
        self.after_dispatch(now);
    }

    /// Raw keystrokes land in state immediately; the search pipeline sees
    /// the term after the quiet period.
    pub fn set_filter(&mut self, term: &str, now: Instant) {
        self.search.set_term(&mut self.store, term, now);
    }

    pub fn set_sort(&mut self, sort_by: SortBy, sort_order: SortOrder, now: Instant) {
        self.store.dispatch(Action::SetSort {
            sort_by,
            sort_order,
        });
        self.after_dispatch(now);
    }

    pub fn set_view_mode(&mut self, mode: ViewMode, now: Instant) {
        self.store.dispatch(Action::SetViewMode(mode));
        self.after_dispatch(now);
    }

    pub fn toggle_theme(&mut self, now: Instant) {
        self.store.dispatch(Action::ToggleTheme);
        self.after_dispatch(now);
    }

    /// The locale is written through immediately; it is not part of the
    /// reduced state.
    pub fn set_locale(&mut self, locale: Locale) -> Result<(), AppError> {
        self.gateway.save_locale(locale)
    }

    pub fn locale(&self) -> Locale {
        self.gateway.load_locale()
    }

    /// Import a JSON array of phrase-shaped objects. Phrases missing an id
    /// or creation date get fresh ones; a malformed payload leaves state
    /// untouched. Returns how many phrases were imported.
    pub fn import_phrases_json(&mut self, json: &str, now: Instant) -> Result<usize, AppError> {
        let imports: Vec<PhraseImport> = serde_json::from_str(json)
            .map_err(|e| AppError::parsing("Invalid phrases file").with_source(e))?;
        let phrases: Vec<Phrase> = imports.into_iter().map(PhraseImport::into_phrase).collect();
        let count = phrases.len();

        self.store.dispatch(Action::ImportPhrases(phrases));
        self.after_dispatch(now);
        Ok(count)
    }

    /// The user-facing export: a JSON array of phrases.
    pub fn export_phrases_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(&self.store.state().phrases)
            .map_err(|e| AppError::storage("Failed to serialize phrases").with_source(e))
    }

    /// Backup-style export: the full envelope, reflecting the live state.
    pub fn export_backup(&mut self) -> Result<String, AppError> {
        self.autosave
            .flush(self.store.state(), &mut self.gateway)?;
        self.gateway.export_data()
    }

    /// Restore a backup envelope into both storage and the live state.
    /// A failed import leaves everything untouched.
    pub fn import_backup(&mut self, json: &str, now: Instant) -> Result<(), AppError> {
        // Flush first so sections absent from the envelope keep their
        // current (not stale) values when re-read below.
        self.autosave
            .flush(self.store.state(), &mut self.gateway)?;
        self.gateway.import_data(json)?;

        let phrases = self.gateway.load_phrases()?;
        let theme = self.gateway.load_theme();
        let preferences = self.gateway.load_preferences()?;

        let existing: Vec<PhraseId> = self
            .store
            .state()
            .phrases
            .iter()
            .map(|p| p.id.clone())
            .collect();
        self.store.dispatch(Action::BatchDelete(existing));
        self.store.dispatch(Action::ImportPhrases(phrases));
        if self.store.state().theme != theme {
            self.store.dispatch(Action::ToggleTheme);
        }
        if let Some(preferences) = preferences {
            self.store.dispatch(Action::SetSort {
                sort_by: preferences.sort_by,
                sort_order: preferences.sort_order,
            });
            self.store.dispatch(Action::SetViewMode(preferences.view_mode));
        }

        self.after_dispatch(now);
        Ok(())
    }

    /// Advance the debounce clocks: settle a pending search and flush a
    /// quiet dirty state.
    pub fn poll(&mut self, now: Instant) -> Result<(), AppError> {
        self.search
            .poll(self.store.state(), self.store.generation(), &mut self.gateway, now);
        self.autosave
            .poll(self.store.state(), &mut self.gateway, now)?;
        Ok(())
    }

    /// Final flush; call before dropping the app.
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        self.autosave.flush(self.store.state(), &mut self.gateway)
    }

    pub fn clear_search_caches(&mut self) {
        self.search.clear_caches();
    }

    pub fn search_cache_stats(&self) -> CacheStats {
        self.search.cache_stats()
    }

    fn after_dispatch(&mut self, now: Instant) {
        self.search.refresh(self.store.state(), self.store.generation());
        self.autosave.mark_dirty(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Theme;
    use crate::persist::MemoryBackend;
    use crate::session::AUTOSAVE_DELAY;
    use crate::validation::ValidationCode;

    fn app() -> PhraseApp<MemoryBackend> {
        PhraseApp::new(MemoryBackend::new())
    }

    fn valid_form(text: &str) -> PhraseForm {
        PhraseForm {
            text: text.to_string(),
            tags: "rust, testing".to_string(),
            author: "Ada Lovelace".to_string(),
            category: "technology".to_string(),
        }
    }

    #[test]
    fn create_assigns_identity_and_prepends() {
        let now = Instant::now();
        let mut app = app();

        let first = app.create_phrase(&valid_form("First phrase"), now).unwrap();
        let second = app.create_phrase(&valid_form("Second phrase"), now).unwrap();

        assert!(!first.id.as_str().is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(app.state().phrases[0].id, second.id);
        assert_eq!(first.tags, vec!["rust", "testing"]);
        assert_eq!(first.author.as_deref(), Some("Ada Lovelace"));
        assert_eq!(first.likes, 0);
    }

    #[test]
    fn create_rejects_invalid_forms_without_dispatching() {
        let now = Instant::now();
        let mut app = app();

        let errors = app
            .create_phrase(&PhraseForm::default(), now)
            .unwrap_err();
        assert_eq!(errors.errors[0].code, ValidationCode::Required);
        assert!(app.state().phrases.is_empty());
    }

    #[test]
    fn create_sanitizes_free_text() {
        let now = Instant::now();
        let mut app = app();
        let form = PhraseForm {
            text: "  spaced   out <b>text</b>  ".to_string(),
            ..PhraseForm::default()
        };

        let phrase = app.create_phrase(&form, now).unwrap();
        assert_eq!(phrase.text, "spaced out btextb");
    }

    #[test]
    fn memoized_view_reflects_content_updates() {
        let now = Instant::now();
        let mut app = app();
        let phrase = app.create_phrase(&valid_form("Original wording"), now).unwrap();

        // Prime the memo, then edit without changing the list's shape.
        assert_eq!(app.phrases()[0].text, "Original wording");
        app.update_phrase(
            &phrase.id,
            PhraseUpdates {
                text: Some("Updated wording".to_string()),
                ..PhraseUpdates::default()
            },
            now,
        );

        assert_eq!(app.state().phrases[0].text, "Updated wording");
        assert_eq!(app.phrases()[0].text, "Updated wording");
    }

    #[test]
    fn settled_search_results_reflect_likes() {
        use crate::search::OPTIMAL_DEBOUNCE_DELAY;

        let mut now = Instant::now();
        let mut app = app();
        let phrase = app.create_phrase(&valid_form("Likable wording"), now).unwrap();

        app.set_filter("likable", now);
        now += OPTIMAL_DEBOUNCE_DELAY;
        app.poll(now).unwrap();
        assert_eq!(app.search_results()[0].likes, 0);

        app.like_phrase(&phrase.id, now);
        assert_eq!(app.search_results()[0].likes, 1);
    }

    #[test]
    fn update_cannot_change_identity() {
        let now = Instant::now();
        let mut app = app();
        let phrase = app.create_phrase(&valid_form("Immutable identity"), now).unwrap();

        app.update_phrase(
            &phrase.id,
            PhraseUpdates {
                text: Some("New text".to_string()),
                ..PhraseUpdates::default()
            },
            now,
        );

        let stored = &app.state().phrases[0];
        assert_eq!(stored.text, "New text");
        assert_eq!(stored.id, phrase.id);
        assert_eq!(stored.created_at, phrase.created_at);
    }

    #[test]
    fn like_increments_monotonically() {
        let now = Instant::now();
        let mut app = app();
        let phrase = app.create_phrase(&valid_form("Likable"), now).unwrap();

        app.like_phrase(&phrase.id, now);
        app.like_phrase(&phrase.id, now);
        assert_eq!(app.state().phrases[0].likes, 2);

        // Unknown ids are ignored.
        app.like_phrase(&PhraseId::new("ghost"), now);
        assert_eq!(app.state().phrases[0].likes, 2);
    }

    #[test]
    fn duplicate_gets_a_fresh_identity() {
        let now = Instant::now();
        let mut app = app();
        let original = app.create_phrase(&valid_form("Copy me"), now).unwrap();

        let copy = app.duplicate_phrase(&original.id, now).unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.text, original.text);
        assert_eq!(copy.author, original.author);
        assert_eq!(app.state().phrases.len(), 2);
    }

    #[test]
    fn delete_selected_uses_the_selection_set() {
        let now = Instant::now();
        let mut app = app();
        let keep = app.create_phrase(&valid_form("Keeper"), now).unwrap();
        let drop_a = app.create_phrase(&valid_form("Dropped A"), now).unwrap();
        let drop_b = app.create_phrase(&valid_form("Dropped B"), now).unwrap();

        app.toggle_selection_mode(now);
        app.toggle_phrase_selection(&drop_a.id, now);
        app.toggle_phrase_selection(&drop_b.id, now);
        app.delete_selected(now);

        assert_eq!(app.state().phrases.len(), 1);
        assert_eq!(app.state().phrases[0].id, keep.id);
        assert!(app.state().selected_phrases.is_empty());
        assert!(!app.state().selection_mode);
    }

    #[test]
    fn select_all_enters_selection_mode_and_selects_everything() {
        let now = Instant::now();
        let mut app = app();
        app.create_phrase(&valid_form("One"), now).unwrap();
        app.create_phrase(&valid_form("Two"), now).unwrap();

        app.select_all(now);

        assert!(app.state().selection_mode);
        assert_eq!(app.state().selected_phrases.len(), 2);
    }

    #[test]
    fn import_fills_missing_identity_and_preserves_existing() {
        let now = Instant::now();
        let mut app = app();

        let json = r#"[
            {"id":"keep-this","text":"with identity","createdAt":"2024-01-01T00:00:00Z"},
            {"text":"needs identity"}
        ]"#;
        let count = app.import_phrases_json(json, now).unwrap();
        assert_eq!(count, 2);

        let phrases = &app.state().phrases;
        assert_eq!(phrases[0].id.as_str(), "keep-this");
        assert_eq!(
            phrases[0].created_at.to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert!(!phrases[1].id.as_str().is_empty());
        assert_ne!(phrases[1].id.as_str(), "keep-this");
    }

    #[test]
    fn malformed_import_leaves_state_untouched() {
        let now = Instant::now();
        let mut app = app();
        app.create_phrase(&valid_form("Untouched"), now).unwrap();

        let err = app.import_phrases_json("{\"not\":\"an array\"}", now);
        assert!(err.is_err());
        assert_eq!(app.state().phrases.len(), 1);
    }

    #[test]
    fn export_then_import_round_trips_phrases() {
        let now = Instant::now();
        let mut app = app();
        app.create_phrase(&valid_form("Round trip"), now).unwrap();

        let exported = app.export_phrases_json().unwrap();

        let mut other = self::app();
        let count = other.import_phrases_json(&exported, now).unwrap();
        assert_eq!(count, 1);
        assert_eq!(other.state().phrases[0].text, "Round trip");
    }

    #[test]
    fn backup_restores_phrases_theme_and_preferences() {
        let now = Instant::now();
        let mut app = app();
        app.create_phrase(&valid_form("Backed up"), now).unwrap();
        app.toggle_theme(now);
        app.set_sort(SortBy::Likes, SortOrder::Asc, now);

        let backup = app.export_backup().unwrap();

        let mut restored = self::app();
        restored.create_phrase(&valid_form("To be replaced"), now).unwrap();
        restored.import_backup(&backup, now).unwrap();

        assert_eq!(restored.state().phrases.len(), 1);
        assert_eq!(restored.state().phrases[0].text, "Backed up");
        assert_eq!(restored.state().theme, Theme::Light);
        assert_eq!(restored.state().sort_by, SortBy::Likes);
    }

    #[test]
    fn locale_round_trips_through_storage() {
        let mut app = app();
        assert_eq!(app.locale(), Locale::En);
        app.set_locale(Locale::Es).unwrap();
        assert_eq!(app.locale(), Locale::Es);
    }

    #[test]
    fn state_survives_a_restart_via_autosave() {
        let now = Instant::now();
        let mut app = app();
        app.create_phrase(&valid_form("Persisted"), now).unwrap();
        app.poll(now + AUTOSAVE_DELAY).unwrap();

        // Simulate a restart on the same backend contents.
        let exported = app.gateway().export_data().unwrap();
        let mut fresh_backend = MemoryBackend::new();
        {
            let envelope: crate::persist::ExportEnvelope =
                serde_json::from_str(&exported).unwrap();
            let phrases = serde_json::to_string(&envelope.phrases.unwrap()).unwrap();
            fresh_backend
                .set(crate::persist::keys::PHRASES, &phrases)
                .unwrap();
        }

        let restarted = PhraseApp::new(fresh_backend);
        assert_eq!(restarted.state().phrases.len(), 1);
        assert_eq!(restarted.state().phrases[0].text, "Persisted");
    }

    #[test]
    fn loading_corrupt_storage_degrades_to_defaults() {
        let mut backend = MemoryBackend::new();
        backend
            .set(crate::persist::keys::PHRASES, "this is not json")
            .unwrap();

        let app = PhraseApp::new(backend);
        assert!(app.state().phrases.is_empty());
        assert!(app.state().error.is_some());
    }
}
