//! The survey draft: create/edit state machine and its reconciliation with
//! the backend.
//!
//! A draft without `uuid` is in create mode and `save` posts it; once the
//! backend assigns a uuid, `save` updates it in place. Persisted choices
//! removed locally are remembered in the pending-deletion set and sent as
//! `choices_to_delete` with the next save. The set only shrinks when a save
//! succeeds, so a failed save can simply be retried.

use std::{collections::BTreeSet, sync::Arc};

use serde_json::Value;
use shared::models::{
    ApiEnvelope, Choice, CreatedSurvey, StateUpdate, SurveyDraft, SurveyRecord, SurveyState,
    SurveyTemplate,
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use super::{
    Tracked,
    survey_list::{ADMIN_SURVEYS, SurveyListStore, admin_survey_path},
    tracked,
};
use crate::{
    api::{HttpClient, expect_success, unwrap_envelope},
    error::{ClientError, ClientResult},
};

/// A draft field and its new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    /// Survey title.
    Name(String),
    /// Free text shown under the title.
    Description(String),
    /// Publication state.
    State(SurveyState),
    /// Icon identifier, e.g. `twemoji:pizza`.
    Icon(String),
}

/// Snapshot of the draft editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftState {
    /// The survey being edited.
    pub draft: SurveyDraft,
    /// Ids of persisted choices removed locally and not yet deleted remotely.
    pub pending_deletions: BTreeSet<String>,
    /// Some request of this store is still running.
    pub loading: bool,
    /// Message of the last failed operation, cleared when the next one starts.
    pub error: String,
    /// Bumped whenever the draft is replaced, so a late save response does
    /// not land on a different draft.
    pub generation: u64,
    in_flight: usize,
}

impl DraftState {
    fn replace(&mut self, draft: SurveyDraft) {
        self.draft = draft;
        self.pending_deletions.clear();
        self.error.clear();
        self.generation += 1;
    }
}

impl Tracked for DraftState {
    fn in_flight(&mut self) -> &mut usize {
        &mut self.in_flight
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn set_error(&mut self, error: String) {
        self.error = error;
    }
}

/// Editor state for one survey draft, reconciled with the backend on save.
#[derive(Debug)]
pub struct SurveyDraftStore {
    api: HttpClient,
    surveys: Arc<SurveyListStore>,
    state: watch::Sender<DraftState>,
    saving: Mutex<()>,
}

impl SurveyDraftStore {
    /// `api` should be the authenticated client; `surveys` receives state
    /// changes made through [`finalize`](Self::finalize).
    #[must_use]
    pub fn new(api: HttpClient, surveys: Arc<SurveyListStore>) -> Self {
        let (state, _) = watch::channel(DraftState::default());
        Self {
            api,
            surveys,
            state,
            saving: Mutex::new(()),
        }
    }

    /// Fetches a stored survey and makes it the active draft, in edit mode.
    ///
    /// # Errors
    /// Returns the request or envelope failure after recording it in `error`;
    /// the current draft is left untouched.
    pub async fn load(&self, uuid: &str) -> ClientResult<SurveyDraft> {
        let record = tracked(&self.state, async {
            let envelope: ApiEnvelope<SurveyRecord> =
                self.api.get(&admin_survey_path(uuid)).await?;
            unwrap_envelope(envelope)
        })
        .await?;

        let draft = SurveyDraft::from(record);
        debug!(uuid, choices = draft.choices.len(), "draft loaded");
        let loaded = draft.clone();
        self.state.send_modify(|s| s.replace(loaded));
        Ok(draft)
    }

    /// Starts a new create-mode draft seeded from `template`.
    pub fn initialize_from_template(&self, template: &SurveyTemplate) {
        let draft = SurveyDraft {
            name: template.title.clone(),
            icon: template.icon.clone(),
            choices: template
                .choices
                .iter()
                .map(|choice| Choice {
                    id: None,
                    title: choice.title.clone(),
                    image: choice.image.clone(),
                })
                .collect(),
            ..SurveyDraft::default()
        };
        debug!(template = %template.key, "draft seeded from template");
        self.state.send_modify(|s| s.replace(draft));
    }

    /// Sets one field of the draft. Values are not validated here.
    pub fn update_field(&self, field: DraftField) {
        self.state.send_modify(|s| match field {
            DraftField::Name(name) => s.draft.name = name,
            DraftField::Description(description) => s.draft.description = description,
            DraftField::State(state) => s.draft.state = state,
            DraftField::Icon(icon) => s.draft.icon = icon,
        });
    }

    /// Appends a choice, or the placeholder choice when `None`.
    pub fn add_choice(&self, choice: Option<Choice>) {
        let choice = choice.unwrap_or_else(Choice::placeholder);
        self.state.send_modify(|s| s.draft.choices.push(choice));
    }

    /// Edits the text and image of the choice at `index`, keeping its id.
    ///
    /// # Errors
    /// Returns [`ClientError::IndexOutOfRange`] when there is no such choice.
    pub fn update_choice(
        &self,
        index: usize,
        title: impl Into<String>,
        image: Option<String>,
    ) -> ClientResult<()> {
        let title = title.into();
        let mut result = Ok(());
        self.state.send_if_modified(|s| {
            let len = s.draft.choices.len();
            match s.draft.choices.get_mut(index) {
                Some(choice) => {
                    choice.title = title;
                    choice.image = image;
                    true
                }
                None => {
                    result = Err(ClientError::IndexOutOfRange { index, len });
                    false
                }
            }
        });
        result
    }

    /// Removes the choice at `index`, scheduling its deletion on the backend
    /// when it was persisted.
    ///
    /// # Errors
    /// Returns [`ClientError::IndexOutOfRange`] when there is no such choice.
    pub fn remove_choice(&self, index: usize) -> ClientResult<Choice> {
        let mut result = Err(ClientError::IndexOutOfRange { index, len: 0 });
        self.state.send_if_modified(|s| {
            let len = s.draft.choices.len();
            if index >= len {
                result = Err(ClientError::IndexOutOfRange { index, len });
                return false;
            }
            let removed = s.draft.choices.remove(index);
            if let Some(id) = &removed.id {
                s.pending_deletions.insert(id.clone());
            }
            result = Ok(removed);
            true
        });
        result
    }

    /// Persists the draft and returns its uuid.
    ///
    /// Create mode posts the draft and adopts the returned uuid; edit mode
    /// updates the stored survey. On success the deletions that were sent
    /// leave the pending set.
    ///
    /// # Errors
    /// Returns [`ClientError::SaveInFlight`] while another save of this store
    /// is running, otherwise the request or envelope failure (recorded in
    /// `error`, pending deletions kept).
    pub async fn save(&self) -> ClientResult<String> {
        let Ok(_saving) = self.saving.try_lock() else {
            warn!("save rejected, previous save still running");
            return Err(ClientError::SaveInFlight);
        };

        let (payload, uuid, generation) = {
            let s = self.state.borrow();
            let deletions = s.pending_deletions.iter().cloned().collect();
            (
                s.draft.to_payload(deletions),
                s.draft.uuid.clone(),
                s.generation,
            )
        };

        let saved_uuid = tracked(&self.state, async {
            match &uuid {
                Some(uuid) => {
                    let envelope: ApiEnvelope<Value> =
                        self.api.put(&admin_survey_path(uuid), &payload).await?;
                    expect_success(envelope)?;
                    Ok(uuid.clone())
                }
                None => {
                    let envelope: ApiEnvelope<CreatedSurvey> =
                        self.api.post(&ADMIN_SURVEYS, &payload).await?;
                    Ok(unwrap_envelope(envelope)?.uuid)
                }
            }
        })
        .await?;

        let sent = payload.choices_to_delete;
        let adopted = saved_uuid.clone();
        let reconciled = self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            if s.draft.uuid.is_none() {
                s.draft.uuid = Some(adopted);
            }
            for id in &sent {
                s.pending_deletions.remove(id);
            }
            true
        });
        if reconciled {
            info!(uuid = %saved_uuid, created = uuid.is_none(), "draft saved");
        } else {
            warn!(uuid = %saved_uuid, "draft replaced while saving, response not applied");
        }
        Ok(saved_uuid)
    }

    /// Closes a stored survey (state `disabled`) and mirrors the change into
    /// the active draft and the cached listing.
    ///
    /// # Errors
    /// Returns the request or envelope failure after recording it in `error`.
    pub async fn finalize(&self, uuid: &str) -> ClientResult<()> {
        tracked(&self.state, async {
            let envelope: ApiEnvelope<Value> = self
                .api
                .put(
                    &admin_survey_path(uuid),
                    &StateUpdate {
                        state: SurveyState::Disabled,
                    },
                )
                .await?;
            expect_success(envelope)
        })
        .await?;

        self.state.send_if_modified(|s| {
            if s.draft.uuid.as_deref() == Some(uuid) {
                s.draft.state = SurveyState::Disabled;
                true
            } else {
                false
            }
        });
        self.surveys.mark_state(uuid, SurveyState::Disabled);
        info!(uuid, "survey finalized");
        Ok(())
    }

    /// Resets to an empty create-mode draft.
    pub fn clear(&self) {
        self.state.send_modify(|s| s.replace(SurveyDraft::default()));
    }

    /// Copy of the current draft.
    #[must_use]
    pub fn draft(&self) -> SurveyDraft {
        self.state.borrow().draft.clone()
    }

    /// Whether the draft has a backend uuid.
    #[must_use]
    pub fn is_edit_mode(&self) -> bool {
        self.state.borrow().draft.is_edit_mode()
    }

    /// Ids that the next save will send as `choices_to_delete`.
    #[must_use]
    pub fn pending_deletions(&self) -> BTreeSet<String> {
        self.state.borrow().pending_deletions.clone()
    }

    /// Copy of the whole editor state.
    #[must_use]
    pub fn snapshot(&self) -> DraftState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DraftState> {
        self.state.subscribe()
    }

    #[cfg(test)]
    fn set_draft(&self, draft: SurveyDraft) {
        self.state.send_modify(|s| s.draft = draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{config::Config, models::find_template};

    fn offline_store() -> SurveyDraftStore {
        let mut config = Config::with_defaults();
        config.api_root = url::Url::parse("http://127.0.0.1:9/").unwrap();
        let api = HttpClient::public(&config).unwrap();
        let surveys = Arc::new(SurveyListStore::new(api.clone()));
        SurveyDraftStore::new(api, surveys)
    }

    fn persisted(id: &str, title: &str) -> Choice {
        Choice {
            id: Some(id.to_string()),
            title: title.to_string(),
            image: None,
        }
    }

    #[test]
    fn test_initialize_from_template_starts_create_mode() {
        let store = offline_store();
        store.set_draft(SurveyDraft {
            uuid: Some("old".into()),
            choices: vec![persisted("1", "Vieja")],
            ..SurveyDraft::default()
        });
        store.remove_choice(0).unwrap();
        assert!(!store.pending_deletions().is_empty());

        let template = find_template("food").unwrap();
        store.initialize_from_template(&template);

        let draft = store.draft();
        assert_eq!(draft.uuid, None);
        assert_eq!(draft.name, template.title);
        assert_eq!(draft.icon, template.icon);
        assert_eq!(draft.state, SurveyState::Pending);
        let titles: Vec<_> = draft.choices.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Pizza", "Tacos", "Sushi"]);
        assert!(draft.choices.iter().all(|c| c.id.is_none()));
        assert!(store.pending_deletions().is_empty());
    }

    #[test]
    fn test_update_field_mutates_in_place() {
        let store = offline_store();
        store.update_field(DraftField::Name("Cena".into()));
        store.update_field(DraftField::Description(String::new()));
        store.update_field(DraftField::State(SurveyState::Enabled));
        store.update_field(DraftField::Icon("twemoji:fork".into()));

        let draft = store.draft();
        assert_eq!(draft.name, "Cena");
        assert_eq!(draft.state, SurveyState::Enabled);
        assert_eq!(draft.icon, "twemoji:fork");
    }

    #[test]
    fn test_add_choice_appends_placeholder_or_given_choice() {
        let store = offline_store();
        store.add_choice(None);
        store.add_choice(Some(Choice::new("B", Some("https://img/b.png".into()))));

        let draft = store.draft();
        assert_eq!(draft.choices.len(), 2);
        assert_eq!(draft.choices[0], Choice::placeholder());
        assert_eq!(draft.choices[1].title, "B");
    }

    #[test]
    fn test_remove_choice_tracks_only_persisted_ids() {
        let store = offline_store();
        store.add_choice(Some(persisted("7", "A")));
        store.add_choice(Some(Choice::new("B", None)));
        store.add_choice(Some(persisted("9", "C")));

        assert_eq!(store.remove_choice(1).unwrap().title, "B");
        assert!(store.pending_deletions().is_empty());

        assert_eq!(store.remove_choice(0).unwrap().id.as_deref(), Some("7"));
        let titles: Vec<_> = store.draft().choices.into_iter().map(|c| c.title).collect();
        assert_eq!(titles, ["C"]);
        assert_eq!(
            store.pending_deletions().into_iter().collect::<Vec<_>>(),
            ["7"]
        );
    }

    #[test]
    fn test_remove_choice_out_of_range() {
        let store = offline_store();
        store.add_choice(None);
        let err = store.remove_choice(3).unwrap_err();
        assert!(matches!(err, ClientError::IndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(store.draft().choices.len(), 1);
    }

    #[test]
    fn test_update_choice_keeps_id() {
        let store = offline_store();
        store.add_choice(Some(persisted("7", "A")));
        store
            .update_choice(0, "A'", Some("https://img/a.png".into()))
            .unwrap();

        let draft = store.draft();
        let choice = &draft.choices[0];
        assert_eq!(choice.id.as_deref(), Some("7"));
        assert_eq!(choice.title, "A'");
        assert!(matches!(
            store.update_choice(1, "x", None),
            Err(ClientError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = offline_store();
        store.add_choice(Some(persisted("7", "A")));
        store.remove_choice(0).unwrap();
        store.update_field(DraftField::Name("x".into()));
        let generation = store.snapshot().generation;

        store.clear();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.draft, SurveyDraft::default());
        assert!(snapshot.pending_deletions.is_empty());
        assert!(snapshot.error.is_empty());
        assert_eq!(snapshot.generation, generation + 1);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_pending_deletions() {
        let store = offline_store();
        store.set_draft(SurveyDraft {
            uuid: Some("S".into()),
            choices: vec![persisted("7", "A"), persisted("8", "B")],
            ..SurveyDraft::default()
        });
        store.remove_choice(0).unwrap();

        assert!(store.save().await.is_err());
        let snapshot = store.snapshot();
        assert!(snapshot.pending_deletions.contains("7"));
        assert!(!snapshot.error.is_empty());
        assert!(!snapshot.loading);
        assert_eq!(snapshot.draft.uuid.as_deref(), Some("S"));
    }

    #[tokio::test]
    async fn test_failed_load_keeps_draft() {
        let store = offline_store();
        store.update_field(DraftField::Name("Sin guardar".into()));

        assert!(store.load("S").await.is_err());
        assert_eq!(store.draft().name, "Sin guardar");
        assert!(!store.snapshot().error.is_empty());
    }
}
