//! Surveys as edited on the client and as exchanged with the backend.

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Icon assigned to drafts that were not seeded from a template.
pub const DEFAULT_ICON: &str = "twemoji:writing-hand";
/// Title of the choice appended when the editor adds an empty option.
pub const PLACEHOLDER_CHOICE_TITLE: &str = "Nueva opción";
/// Description sent to the backend when the draft has none.
pub const EMPTY_DESCRIPTION: &str = "Sin descripción";

/// Publication state of a survey.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SurveyState {
    /// Drafted, not yet open for votes.
    #[default]
    Pending,
    /// Open for votes.
    Enabled,
    /// Closed for good.
    Disabled,
}

impl SurveyState {
    /// Whether the backend accepts a move from `self` to `next`.
    ///
    /// `disabled` is terminal; re-sending the current state is a no-op and allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (current, next) if current == next => true,
            (Self::Pending, Self::Enabled | Self::Disabled) | (Self::Enabled, Self::Disabled) => {
                true
            }
            _ => false,
        }
    }
}

/// One option of a survey draft. `id` is `None` until the backend stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Backend id of a stored choice.
    pub id: Option<String>,
    /// Text shown to voters.
    pub title: String,
    /// Optional image URL.
    pub image: Option<String>,
}

impl Choice {
    /// A not yet persisted choice.
    #[must_use]
    pub fn new(title: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            image,
        }
    }

    /// The option appended by "add choice" without arguments.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_CHOICE_TITLE, None)
    }
}

/// The survey being authored on the client.
///
/// `uuid == None` means the draft was never saved (create mode); once the
/// backend assigns an id the draft is in edit mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyDraft {
    /// Backend identifier, `None` in create mode.
    pub uuid: Option<String>,
    /// Survey title.
    pub name: String,
    /// Free text shown under the title.
    pub description: String,
    /// Publication state.
    pub state: SurveyState,
    /// Icon identifier.
    pub icon: String,
    /// Options, in display order.
    pub choices: Vec<Choice>,
}

impl Default for SurveyDraft {
    fn default() -> Self {
        Self {
            uuid: None,
            name: String::new(),
            description: String::new(),
            state: SurveyState::default(),
            icon: DEFAULT_ICON.to_string(),
            choices: Vec::new(),
        }
    }
}

impl SurveyDraft {
    /// Whether the draft was saved before.
    #[must_use]
    pub fn is_edit_mode(&self) -> bool {
        self.uuid.is_some()
    }

    /// Builds the request body for create and update calls.
    ///
    /// Local names map onto backend names: `title` becomes `content` and `id`
    /// becomes `choice_id`. Choice order is kept as is.
    #[must_use]
    pub fn to_payload(&self, choices_to_delete: Vec<String>) -> SurveyPayload {
        let description = if self.description.trim().is_empty() {
            EMPTY_DESCRIPTION.to_string()
        } else {
            self.description.clone()
        };
        SurveyPayload {
            name: self.name.clone(),
            description,
            state: self.state,
            icon: self.icon.clone(),
            choices: self
                .choices
                .iter()
                .map(|choice| ChoicePayload {
                    choice_id: choice.id.clone(),
                    content: choice.title.clone(),
                    image: choice.image.clone(),
                })
                .collect(),
            choices_to_delete,
        }
    }
}

impl From<SurveyRecord> for SurveyDraft {
    fn from(record: SurveyRecord) -> Self {
        Self {
            uuid: Some(record.uuid),
            name: record.name,
            description: record.description.unwrap_or_default(),
            state: record.state,
            icon: record.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            choices: record
                .choices
                .into_iter()
                .map(|choice| Choice {
                    id: choice.id,
                    title: choice.content,
                    image: choice.image,
                })
                .collect(),
        }
    }
}

/// Body of `POST /api/admin/surveys` and `PUT /api/admin/surveys/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyPayload {
    /// Survey title.
    pub name: String,
    /// Description, never empty on the wire.
    pub description: String,
    /// Publication state.
    pub state: SurveyState,
    /// Icon identifier.
    pub icon: String,
    /// Options to keep or create, in display order.
    pub choices: Vec<ChoicePayload>,
    /// Ids of stored choices to delete.
    pub choices_to_delete: Vec<String>,
}

/// A choice as sent to the backend. A `None` id creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicePayload {
    /// Id of the stored choice being updated.
    pub choice_id: Option<String>,
    /// Text shown to voters.
    pub content: String,
    /// Optional image URL.
    pub image: Option<String>,
}

/// Body of a state-only update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Requested state.
    pub state: SurveyState,
}

/// Survey detail as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    /// Backend identifier.
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub uuid: String,
    /// Survey title.
    pub name: String,
    /// Free text shown under the title.
    #[serde(default)]
    pub description: Option<String>,
    /// Publication state.
    #[serde(default)]
    pub state: SurveyState,
    /// Icon identifier.
    #[serde(default)]
    pub icon: Option<String>,
    /// Stored options, in display order.
    #[serde(default)]
    pub choices: Vec<ChoiceRecord>,
}

/// A stored choice. The backend names the id `id` or `choice_id` depending on
/// the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    /// Backend id.
    #[serde(
        default,
        alias = "choice_id",
        deserialize_with = "optional_id_from_string_or_number"
    )]
    pub id: Option<String>,
    /// Text shown to voters.
    #[serde(alias = "title")]
    pub content: String,
    /// Optional image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// Entry of the survey listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySummary {
    /// Backend identifier.
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub uuid: String,
    /// Survey title.
    pub name: String,
    /// Free text shown under the title.
    #[serde(default)]
    pub description: Option<String>,
    /// Publication state.
    #[serde(default)]
    pub state: SurveyState,
    /// Icon identifier.
    #[serde(default)]
    pub icon: Option<String>,
    /// Creation timestamp as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Votes cast so far.
    #[serde(default, alias = "votes")]
    pub total_votes: Option<u64>,
}

/// Sort direction of the survey listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Query string of `GET /api/admin/surveys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Maximum number of surveys returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Field to sort by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Sort direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
