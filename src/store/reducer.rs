//! The pure state transition function.
//!
//! `reduce` never mutates its input: it clones the current state and edits
//! the copy, so dispatching the same `(state, action)` twice yields equal
//! results and the original state is untouched.

use super::{Action, PhraseUpdates};
use crate::model::{AppState, Phrase};

pub fn reduce(state: &AppState, action: &Action) -> AppState {
    let mut next = state.clone();

    match action {
        Action::AddPhrase(phrase) => {
            next.phrases.insert(0, phrase.clone());
        }

        Action::DeletePhrase(id) => {
            next.phrases.retain(|p| &p.id != id);
            next.selected_phrases.remove(id);
        }

        Action::BatchDelete(ids) => {
            next.phrases.retain(|p| !ids.contains(&p.id));
            next.selected_phrases.clear();
            next.selection_mode = false;
        }

        Action::UpdatePhrase { id, updates } => {
            if let Some(phrase) = next.phrases.iter_mut().find(|p| &p.id == id) {
                apply_updates(phrase, updates);
            }
        }

        Action::SetFilter(filter) => {
            next.filter = filter.clone();
        }

        Action::SetSort {
            sort_by,
            sort_order,
        } => {
            next.sort_by = *sort_by;
            next.sort_order = *sort_order;
        }

        Action::ToggleSelectionMode => {
            next.selection_mode = !next.selection_mode;
            // Leaving selection mode drops the selection.
            if !next.selection_mode {
                next.selected_phrases.clear();
            }
        }

        Action::TogglePhraseSelection(id) => {
            if !next.selected_phrases.remove(id) {
                next.selected_phrases.insert(id.clone());
            }
        }

        Action::ClearSelection => {
            next.selected_phrases.clear();
            next.selection_mode = false;
        }

        Action::ImportPhrases(list) => {
            // Prepended, no de-duplication by id: importing the same file
            // twice yields duplicates.
            let mut merged = list.clone();
            merged.append(&mut next.phrases);
            next.phrases = merged;
        }

        Action::ToggleTheme => {
            next.theme = next.theme.toggled();
        }

        Action::SetViewMode(mode) => {
            next.view_mode = *mode;
        }

        Action::SetLoading(loading) => {
            next.is_loading = *loading;
        }

        Action::SetError(error) => {
            next.error = error.clone();
        }
    }

    next
}

fn apply_updates(phrase: &mut Phrase, updates: &PhraseUpdates) {
    if let Some(text) = &updates.text {
        phrase.text = text.clone();
    }
    if let Some(tags) = &updates.tags {
        phrase.tags = tags.clone();
    }
    if let Some(author) = &updates.author {
        phrase.author = Some(author.clone());
    }
    if let Some(category) = &updates.category {
        phrase.category = Some(category.clone());
    }
    if let Some(likes) = updates.likes {
        phrase.likes = likes;
    }
}
