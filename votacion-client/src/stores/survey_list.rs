//! Cached survey listing and the operations that act on listed surveys.

use serde_json::Value;
use shared::models::{
    ApiEnvelope, ListQuery, StateUpdate, SurveyRecord, SurveyState, SurveySummary,
};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{Tracked, tracked};
use crate::{
    api::{HttpClient, expect_success, unwrap_envelope},
    error::{ClientError, ClientResult},
};

pub(crate) const ADMIN_SURVEYS: [&str; 3] = ["api", "admin", "surveys"];
const PUBLIC_SURVEYS: [&str; 2] = ["api", "surveys"];

/// Snapshot of the survey listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyListState {
    /// Last fetched listing, replaced as a whole on every fetch.
    pub surveys: Vec<SurveySummary>,
    /// Some request of this store is still running.
    pub loading: bool,
    /// Message of the last failed operation, cleared when the next one starts.
    pub error: String,
    in_flight: usize,
}

impl SurveyListState {
    /// Listed survey with `uuid`.
    #[must_use]
    pub fn find(&self, uuid: &str) -> Option<&SurveySummary> {
        self.surveys.iter().find(|survey| survey.uuid == uuid)
    }
}

impl Tracked for SurveyListState {
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

/// Cached survey listing and the admin operations on listed surveys.
#[derive(Debug)]
pub struct SurveyListStore {
    api: HttpClient,
    state: watch::Sender<SurveyListState>,
}

impl SurveyListStore {
    /// `api` should be the authenticated client.
    #[must_use]
    pub fn new(api: HttpClient) -> Self {
        let (state, _) = watch::channel(SurveyListState::default());
        Self { api, state }
    }

    /// Fetches the listing and replaces the cache with it.
    ///
    /// # Errors
    /// Returns the request or envelope failure; the cache is left untouched.
    pub async fn fetch(&self, query: &ListQuery) -> ClientResult<Vec<SurveySummary>> {
        let surveys = tracked(&self.state, async {
            let envelope: ApiEnvelope<Vec<SurveySummary>> =
                self.api.get_with_query(&ADMIN_SURVEYS, query).await?;
            unwrap_envelope(envelope)
        })
        .await?;

        debug!(count = surveys.len(), "survey list refreshed");
        let cached = surveys.clone();
        self.state.send_modify(|s| s.surveys = cached);
        Ok(surveys)
    }

    /// Public view of a survey, as shown on the voting page.
    ///
    /// # Errors
    /// Returns the request or envelope failure.
    pub async fn fetch_public(&self, uuid: &str) -> ClientResult<SurveyRecord> {
        tracked(&self.state, async {
            let envelope: ApiEnvelope<SurveyRecord> = self
                .api
                .get(&[PUBLIC_SURVEYS[0], PUBLIC_SURVEYS[1], uuid])
                .await?;
            unwrap_envelope(envelope)
        })
        .await
    }

    /// Changes the state of a listed survey.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidTransition`] without a request when the
    /// cached state cannot move to `state`, otherwise the request failure.
    pub async fn update_state(&self, uuid: &str, state: SurveyState) -> ClientResult<()> {
        let current = self.state.borrow().find(uuid).map(|survey| survey.state);
        if let Some(from) = current {
            if !from.can_transition_to(state) {
                return Err(ClientError::InvalidTransition { from, to: state });
            }
        }

        tracked(&self.state, async {
            let envelope: ApiEnvelope<Value> = self
                .api
                .put(&admin_survey_path(uuid), &StateUpdate { state })
                .await?;
            expect_success(envelope)
        })
        .await?;

        info!(uuid, %state, "survey state updated");
        self.mark_state(uuid, state);
        Ok(())
    }

    /// Deletes a survey and drops it from the cache.
    ///
    /// # Errors
    /// Returns the request or envelope failure; the cache is left untouched.
    pub async fn delete(&self, uuid: &str) -> ClientResult<()> {
        tracked(&self.state, async {
            let envelope: ApiEnvelope<Value> = self.api.delete(&admin_survey_path(uuid)).await?;
            expect_success(envelope)
        })
        .await?;

        info!(uuid, "survey deleted");
        self.state
            .send_if_modified(|s| {
                let before = s.surveys.len();
                s.surveys.retain(|survey| survey.uuid != uuid);
                s.surveys.len() != before
            });
        Ok(())
    }

    /// Mirrors a state change into the cached entry, if the survey is listed.
    pub fn mark_state(&self, uuid: &str, state: SurveyState) {
        self.state.send_if_modified(|s| {
            match s.surveys.iter_mut().find(|survey| survey.uuid == uuid) {
                Some(survey) if survey.state != state => {
                    survey.state = state;
                    true
                }
                _ => false,
            }
        });
    }

    /// Copy of the listing state.
    #[must_use]
    pub fn snapshot(&self) -> SurveyListState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SurveyListState> {
        self.state.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn seed(&self, surveys: Vec<SurveySummary>) {
        self.state.send_modify(|s| s.surveys = surveys);
    }
}

pub(crate) fn admin_survey_path(uuid: &str) -> [&str; 4] {
    [ADMIN_SURVEYS[0], ADMIN_SURVEYS[1], ADMIN_SURVEYS[2], uuid]
}
