#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Client core of Votacion: durable session, authenticated HTTP access,
//! route guarding, and the survey stores built on top of them.

pub mod api;
pub mod app;
pub mod error;
pub mod routes;
pub mod storage;
pub mod stores;

pub use api::HttpClient;
pub use app::App;
pub use error::{ClientError, ClientResult};
pub use routes::{Location, RouteName, Router};
pub use stores::{
    session::{SessionState, SessionStore},
    survey::{DraftField, DraftState, SurveyDraftStore},
    survey_list::{SurveyListState, SurveyListStore},
};
