//! Wire models of the survey backend.

pub mod auth;
pub mod envelope;
pub mod survey;
pub mod template;

pub use auth::{LoginRequest, LoginResponse, SessionUser};
pub use envelope::{ApiEnvelope, CreatedSurvey, ErrorResponse};
pub use survey::{
    Choice, ChoicePayload, ChoiceRecord, ListQuery, SortOrder, StateUpdate, SurveyDraft,
    SurveyPayload, SurveyRecord, SurveyState, SurveySummary,
};
pub use template::{SurveyTemplate, TemplateChoice, builtin_templates, find_template};
