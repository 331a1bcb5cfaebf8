use super::{keys, KeyValueStore, KvError};
use crate::error::AppError;
use crate::model::{Locale, Phrase, SortBy, SortOrder, Theme, ViewMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How many phrases survive a quota-triggered cleanup pass.
pub const CLEANUP_RETAIN_COUNT: usize = 100;
/// Upper bound on the persisted recent-search history.
pub const MAX_RECENT_SEARCHES: usize = 10;

/// The sort/view settings persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub view_mode: ViewMode,
}

/// Backup envelope for export/import. Every section is optional on the way
/// in; a partial envelope applies whatever is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrases: Option<Vec<Phrase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

/// Domain-level persistence over an abstract [`KeyValueStore`].
///
/// Every failure comes back as a tagged [`AppError`]; loading degrades to
/// the valid subset of the data rather than failing outright.
pub struct StorageGateway<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> StorageGateway<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Serialize and write the full phrase list. On quota exhaustion, prune
    /// to the [`CLEANUP_RETAIN_COUNT`] most recent phrases and retry once.
    pub fn save_phrases(&mut self, phrases: &[Phrase]) -> Result<(), AppError> {
        let serialized = serde_json::to_string(phrases)
            .map_err(|e| AppError::storage("Failed to serialize phrases").with_source(e))?;

        match self.backend.set(keys::PHRASES, &serialized) {
            Ok(()) => Ok(()),
            Err(KvError::QuotaExceeded { .. }) => {
                warn!(
                    retain = CLEANUP_RETAIN_COUNT,
                    "storage quota exceeded, pruning to most recent phrases"
                );
                let pruned = prune_to_most_recent(phrases, CLEANUP_RETAIN_COUNT);
                let retry = serde_json::to_string(&pruned).map_err(|e| {
                    AppError::storage("Failed to serialize pruned phrases").with_source(e)
                })?;
                self.backend.set(keys::PHRASES, &retry).map_err(|e| {
                    AppError::storage("Failed to save phrases after cleanup").with_source(e)
                })
            }
            Err(e) => Err(AppError::storage("Failed to save phrases").with_source(e)),
        }
    }

    /// Load the stored phrase list. Absence yields an empty list; elements
    /// failing the structural check are dropped with a warning rather than
    /// failing the whole load.
    pub fn load_phrases(&self) -> Result<Vec<Phrase>, AppError> {
        let stored = self
            .backend
            .get(keys::PHRASES)
            .map_err(|e| AppError::storage("Failed to load phrases from storage").with_source(e))?;
        let Some(stored) = stored else {
            return Ok(Vec::new());
        };

        let parsed: serde_json::Value = serde_json::from_str(&stored)
            .map_err(|e| AppError::parsing("Stored phrases data is not valid JSON").with_source(e))?;
        let serde_json::Value::Array(items) = parsed else {
            return Err(AppError::parsing("Stored phrases data is not an array"));
        };

        let total = items.len();
        let phrases: Vec<Phrase> = items
            .into_iter()
            .filter(has_phrase_shape)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        let dropped = total - phrases.len();
        if dropped > 0 {
            warn!(dropped, "invalid phrases found and filtered out");
        }

        Ok(phrases)
    }

    pub fn save_theme(&mut self, theme: Theme) -> Result<(), AppError> {
        self.backend
            .set(keys::THEME, theme.as_token())
            .map_err(|e| AppError::storage("Failed to save theme").with_source(e))
    }

    /// Raw token read; absent or unreadable values fall back to the default.
    pub fn load_theme(&self) -> Theme {
        match self.backend.get(keys::THEME) {
            Ok(Some(token)) => Theme::from_token(&token),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!(error = %e, "failed to load theme, using default");
                Theme::default()
            }
        }
    }

    pub fn save_preferences(&mut self, preferences: &Preferences) -> Result<(), AppError> {
        let serialized = serde_json::to_string(preferences)
            .map_err(|e| AppError::storage("Failed to serialize preferences").with_source(e))?;
        self.backend
            .set(keys::PREFERENCES, &serialized)
            .map_err(|e| AppError::storage("Failed to save preferences").with_source(e))
    }

    /// All three preference keys must be present and well-formed; a
    /// malformed object is an error, not a partial result.
    pub fn load_preferences(&self) -> Result<Option<Preferences>, AppError> {
        let stored = self
            .backend
            .get(keys::PREFERENCES)
            .map_err(|e| AppError::storage("Failed to load preferences").with_source(e))?;
        let Some(stored) = stored else {
            return Ok(None);
        };

        let preferences = serde_json::from_str(&stored).map_err(|e| {
            AppError::parsing("Preferences data has invalid structure").with_source(e)
        })?;
        Ok(Some(preferences))
    }

    pub fn save_locale(&mut self, locale: Locale) -> Result<(), AppError> {
        self.backend
            .set(keys::LOCALE, locale.as_token())
            .map_err(|e| AppError::storage("Failed to save locale").with_source(e))
    }

    pub fn load_locale(&self) -> Locale {
        match self.backend.get(keys::LOCALE) {
            Ok(Some(token)) => Locale::from_token(&token),
            Ok(None) => Locale::default(),
            Err(e) => {
                warn!(error = %e, "failed to load locale, using default");
                Locale::default()
            }
        }
    }

    pub fn save_recent_searches(&mut self, searches: &[String]) -> Result<(), AppError> {
        let serialized = serde_json::to_string(searches)
            .map_err(|e| AppError::storage("Failed to serialize recent searches").with_source(e))?;
        self.backend
            .set(keys::RECENT_SEARCHES, &serialized)
            .map_err(|e| AppError::storage("Failed to save recent searches").with_source(e))
    }

    /// Unreadable history degrades to empty.
    pub fn load_recent_searches(&self) -> Vec<String> {
        let stored = match self.backend.get(keys::RECENT_SEARCHES) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to load recent searches");
                return Vec::new();
            }
        };
        match serde_json::from_str(&stored) {
            Ok(searches) => searches,
            Err(e) => {
                warn!(error = %e, "recent searches are corrupt, discarding");
                Vec::new()
            }
        }
    }

    /// Record a successful search, most recent first. An existing entry
    /// moves to the front instead of duplicating.
    pub fn push_recent_search(&mut self, term: &str) -> Result<(), AppError> {
        let mut recent = self.load_recent_searches();
        recent.retain(|t| t != term);
        recent.insert(0, term.to_string());
        recent.truncate(MAX_RECENT_SEARCHES);
        self.save_recent_searches(&recent)
    }

    /// Remove every key this subsystem owns.
    pub fn clear_all(&mut self) -> Result<(), AppError> {
        for key in keys::ALL {
            self.backend
                .remove(key)
                .map_err(|e| AppError::storage(format!("Failed to remove {key}")).with_source(e))?;
        }
        Ok(())
    }

    /// Bundle everything currently persisted into a JSON envelope.
    pub fn export_data(&self) -> Result<String, AppError> {
        let envelope = ExportEnvelope {
            phrases: Some(self.load_phrases()?),
            theme: Some(self.load_theme()),
            preferences: self.load_preferences()?,
            export_date: Some(Utc::now()),
        };
        serde_json::to_string_pretty(&envelope)
            .map_err(|e| AppError::storage("Failed to serialize export data").with_source(e))
    }

    /// Apply whichever envelope sections are present. Succeeds only if at
    /// least one section was actually imported.
    pub fn import_data(&mut self, json: &str) -> Result<(), AppError> {
        if json.trim().is_empty() {
            return Err(AppError::validation(
                "Import data must be a non-empty string",
            ));
        }

        let envelope: ExportEnvelope = serde_json::from_str(json)
            .map_err(|e| AppError::parsing("Import data must be a valid JSON object").with_source(e))?;

        let mut imported = false;

        if let Some(phrases) = &envelope.phrases {
            self.save_phrases(phrases)?;
            imported = true;
        }
        if let Some(theme) = envelope.theme {
            self.save_theme(theme)?;
            imported = true;
        }
        if let Some(preferences) = &envelope.preferences {
            self.save_preferences(preferences)?;
            imported = true;
        }

        if !imported {
            return Err(AppError::validation("No valid data found to import"));
        }
        Ok(())
    }
}

// Every required field must be present with the right JSON type; serde
// defaults must not paper over a missing `tags` array.
fn has_phrase_shape(value: &serde_json::Value) -> bool {
    value.get("id").is_some_and(serde_json::Value::is_string)
        && value.get("text").is_some_and(serde_json::Value::is_string)
        && value
            .get("createdAt")
            .is_some_and(serde_json::Value::is_string)
        && value.get("tags").is_some_and(serde_json::Value::is_array)
}

fn prune_to_most_recent(phrases: &[Phrase], count: usize) -> Vec<Phrase> {
    let mut sorted = phrases.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.truncate(count);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::persist::MemoryBackend;
    use chrono::TimeZone;

    fn gateway() -> StorageGateway<MemoryBackend> {
        StorageGateway::new(MemoryBackend::new())
    }

    fn phrase_at(text: &str, year: i32) -> Phrase {
        let mut p = Phrase::new(text);
        p.created_at = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        p
    }

    #[test]
    fn phrases_round_trip() {
        let mut gw = gateway();
        let phrases = vec![
            Phrase::new("first").with_tags(vec!["x".to_string()]),
            Phrase::new("second").with_author("Ada"),
        ];

        gw.save_phrases(&phrases).unwrap();
        assert_eq!(gw.load_phrases().unwrap(), phrases);
    }

    #[test]
    fn loading_nothing_yields_empty_list() {
        assert!(gateway().load_phrases().unwrap().is_empty());
    }

    #[test]
    fn corrupt_elements_are_dropped_not_fatal() {
        let mut gw = gateway();
        let good = Phrase::new("valid one");
        let json = format!(
            "[{}, {{\"bogus\": true}}, 42]",
            serde_json::to_string(&good).unwrap()
        );
        gw.backend.set(keys::PHRASES, &json).unwrap();

        let loaded = gw.load_phrases().unwrap();
        assert_eq!(loaded, vec![good]);
    }

    #[test]
    fn element_missing_its_tags_array_is_dropped() {
        let mut gw = gateway();
        let good = Phrase::new("has every field");
        let json = format!(
            "[{}, {{\"id\":\"x\",\"text\":\"no tags\",\"createdAt\":\"2024-01-01T00:00:00Z\"}}]",
            serde_json::to_string(&good).unwrap()
        );
        gw.backend.set(keys::PHRASES, &json).unwrap();

        let loaded = gw.load_phrases().unwrap();
        assert_eq!(loaded, vec![good]);
    }

    #[test]
    fn non_array_payload_is_a_parsing_error() {
        let mut gw = gateway();
        gw.backend.set(keys::PHRASES, "{\"not\":\"array\"}").unwrap();

        let err = gw.load_phrases().unwrap_err();
        assert_eq!(err.category, ErrorCategory::Parsing);
    }

    #[test]
    fn quota_overflow_prunes_to_most_recent_and_retries() {
        // Room for roughly 120 phrases of this shape, not 150.
        let phrases: Vec<Phrase> = (0..150)
            .map(|i| phrase_at(&format!("phrase number {i:04} padded out to a fixed width"), 2000 + (i as i32 % 30)))
            .collect();
        let all = serde_json::to_string(&phrases).unwrap();
        let capacity = all.len() * 4 / 5;

        let mut gw = StorageGateway::new(MemoryBackend::with_capacity_bytes(capacity));
        gw.save_phrases(&phrases).unwrap();

        let survivors = gw.load_phrases().unwrap();
        assert_eq!(survivors.len(), CLEANUP_RETAIN_COUNT);

        // Newest-first by creation date.
        for pair in survivors.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        let oldest_kept = survivors.last().unwrap().created_at;
        let dropped_max = phrases
            .iter()
            .filter(|p| !survivors.iter().any(|s| s.id == p.id))
            .map(|p| p.created_at)
            .max()
            .unwrap();
        assert!(dropped_max <= oldest_kept);
    }

    #[test]
    fn theme_defaults_to_dark_when_absent() {
        let mut gw = gateway();
        assert_eq!(gw.load_theme(), Theme::Dark);

        gw.save_theme(Theme::Light).unwrap();
        assert_eq!(gw.load_theme(), Theme::Light);
    }

    #[test]
    fn preferences_round_trip_and_reject_missing_keys() {
        let mut gw = gateway();
        assert_eq!(gw.load_preferences().unwrap(), None);

        let prefs = Preferences {
            sort_by: SortBy::Likes,
            sort_order: SortOrder::Asc,
            view_mode: ViewMode::List,
        };
        gw.save_preferences(&prefs).unwrap();
        assert_eq!(gw.load_preferences().unwrap(), Some(prefs));

        gw.backend
            .set(keys::PREFERENCES, "{\"sortBy\":\"date\"}")
            .unwrap();
        let err = gw.load_preferences().unwrap_err();
        assert_eq!(err.category, ErrorCategory::Parsing);
    }

    #[test]
    fn recent_searches_deduplicate_by_moving_to_front() {
        let mut gw = gateway();
        for term in ["alpha", "beta", "gamma", "alpha"] {
            gw.push_recent_search(term).unwrap();
        }

        let recent = gw.load_recent_searches();
        assert_eq!(recent, vec!["alpha", "gamma", "beta"]);
    }

    #[test]
    fn recent_searches_are_capped() {
        let mut gw = gateway();
        for i in 0..15 {
            gw.push_recent_search(&format!("term {i}")).unwrap();
        }

        let recent = gw.load_recent_searches();
        assert_eq!(recent.len(), MAX_RECENT_SEARCHES);
        assert_eq!(recent[0], "term 14");
    }

    #[test]
    fn clear_all_removes_every_owned_key() {
        let mut gw = gateway();
        gw.save_phrases(&[Phrase::new("going away")]).unwrap();
        gw.save_theme(Theme::Light).unwrap();
        gw.push_recent_search("bye").unwrap();

        gw.clear_all().unwrap();

        assert!(gw.load_phrases().unwrap().is_empty());
        assert_eq!(gw.load_theme(), Theme::Dark);
        assert!(gw.load_recent_searches().is_empty());
    }

    #[test]
    fn export_then_import_round_trips_the_envelope() {
        let mut gw = gateway();
        let phrases = vec![phrase_at("bundled", 2024)];
        gw.save_phrases(&phrases).unwrap();
        gw.save_theme(Theme::Light).unwrap();
        gw.save_preferences(&Preferences {
            sort_by: SortBy::Text,
            sort_order: SortOrder::Asc,
            view_mode: ViewMode::Virtual,
        })
        .unwrap();

        let exported = gw.export_data().unwrap();

        let mut fresh = gateway();
        fresh.import_data(&exported).unwrap();
        assert_eq!(fresh.load_phrases().unwrap(), phrases);
        assert_eq!(fresh.load_theme(), Theme::Light);
        assert_eq!(
            fresh.load_preferences().unwrap().map(|p| p.view_mode),
            Some(ViewMode::Virtual)
        );
    }

    #[test]
    fn partial_envelope_applies_present_sections_only() {
        let mut gw = gateway();
        gw.import_data("{\"theme\":\"light\"}").unwrap();

        assert_eq!(gw.load_theme(), Theme::Light);
        assert!(gw.load_phrases().unwrap().is_empty());
    }

    #[test]
    fn empty_envelope_is_rejected() {
        let mut gw = gateway();

        let err = gw.import_data("{}").unwrap_err();
        assert_eq!(err.category, ErrorCategory::Validation);

        let blank = gw.import_data("   ").unwrap_err();
        assert_eq!(blank.category, ErrorCategory::Validation);

        let garbage = gw.import_data("not json at all").unwrap_err();
        assert_eq!(garbage.category, ErrorCategory::Parsing);
    }
}
