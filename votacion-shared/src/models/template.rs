//! Built-in survey templates.

use serde::{Deserialize, Serialize};

/// Predefined survey skeleton used to seed a new draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyTemplate {
    /// Stable identifier used to pick a template from the command line.
    pub key: String,
    /// Title given to the seeded draft.
    pub title: String,
    /// Icon given to the seeded draft.
    pub icon: String,
    /// Options copied into the draft, in order.
    pub choices: Vec<TemplateChoice>,
}

/// One option of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateChoice {
    /// Text of the option.
    pub title: String,
    /// Optional image URL.
    pub image: Option<String>,
}

impl TemplateChoice {
    fn text(title: &str) -> Self {
        Self {
            title: title.to_string(),
            image: None,
        }
    }
}

fn template(key: &str, title: &str, icon: &str, choices: &[&str]) -> SurveyTemplate {
    SurveyTemplate {
        key: key.to_string(),
        title: title.to_string(),
        icon: icon.to_string(),
        choices: choices.iter().map(|title| TemplateChoice::text(title)).collect(),
    }
}

/// The catalog offered by the template picker, in display order.
#[must_use]
pub fn builtin_templates() -> Vec<SurveyTemplate> {
    vec![
        template("blank", "Votación en blanco", "twemoji:writing-hand", &[]),
        template("yes-no", "Sí o no", "twemoji:thumbs-up", &["Sí", "No"]),
        template(
            "food",
            "¿Qué comemos?",
            "twemoji:pizza",
            &["Pizza", "Tacos", "Sushi"],
        ),
        template(
            "date",
            "¿Qué día nos vemos?",
            "twemoji:calendar",
            &["Lunes", "Miércoles", "Viernes"],
        ),
        template(
            "rating",
            "Califica la experiencia",
            "twemoji:star",
            &["Excelente", "Buena", "Regular", "Mala"],
        ),
    ]
}

/// Looks a template up by key, ignoring ASCII case.
#[must_use]
pub fn find_template(key: &str) -> Option<SurveyTemplate> {
    builtin_templates()
        .into_iter()
        .find(|template| template.key.eq_ignore_ascii_case(key))
}
