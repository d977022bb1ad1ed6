//! Wiring of the client: one instance of every store, sharing one session.

use std::sync::Arc;

use shared::config::Config;
use tracing::debug;
use url::Url;

use crate::{
    api::HttpClient,
    error::ClientResult,
    routes::{Navigator, Router},
    storage::{FileStorage, KeyValueStorage},
    stores::{session::SessionStore, survey::SurveyDraftStore, survey_list::SurveyListStore},
};

/// The application container handed to views and commands.
#[derive(Debug, Clone)]
pub struct App {
    /// Settings the client was built from.
    pub config: Config,
    /// Durable storage behind the session.
    pub storage: Arc<dyn KeyValueStorage>,
    /// The one session shared by every component.
    pub session: Arc<SessionStore>,
    /// Current location and navigation guard.
    pub router: Arc<Router>,
    /// Authenticated client shared by the survey stores.
    pub api: HttpClient,
    /// Cached listing.
    pub surveys: Arc<SurveyListStore>,
    /// Draft editor.
    pub draft: Arc<SurveyDraftStore>,
}

impl App {
    /// Builds the client on top of the file storage in `config.storage_dir`.
    ///
    /// # Errors
    /// Returns an error when an HTTP client cannot be built.
    pub fn new(config: Config) -> ClientResult<Self> {
        let storage = Arc::new(FileStorage::new(&config.storage_dir));
        Self::with_storage(config, storage)
    }

    /// Builds the client on top of an arbitrary storage, rehydrating the
    /// session from it.
    ///
    /// # Errors
    /// Returns an error when an HTTP client cannot be built.
    pub fn with_storage(config: Config, storage: Arc<dyn KeyValueStorage>) -> ClientResult<Self> {
        let session = Arc::new(SessionStore::new(
            storage.clone(),
            HttpClient::public(&config)?,
        ));
        let router = Arc::new(Router::new(session.clone()));
        let navigator: Arc<dyn Navigator> = router.clone();
        let api = HttpClient::authenticated(&config, session.clone(), navigator)?;
        let surveys = Arc::new(SurveyListStore::new(api.clone()));
        let draft = Arc::new(SurveyDraftStore::new(api.clone(), surveys.clone()));
        debug!(
            api_root = %config.api_root,
            persistent = storage.is_persistent(),
            authenticated = session.is_authenticated(),
            "client initialized"
        );
        Ok(Self {
            config,
            storage,
            session,
            router,
            api,
            surveys,
            draft,
        })
    }

    /// Public voting link for a survey.
    ///
    /// # Errors
    /// Returns an error when the link cannot be built from `app_base_url`.
    pub fn share_link(&self, uuid: &str) -> ClientResult<Url> {
        Ok(self.config.share_link(uuid)?)
    }
}
