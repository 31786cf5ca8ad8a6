//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerSet, Profile, ProfileSource, UiTheme};

/// Radio choice on a question. "no" alone never completes a slot; it only
/// opens the free-text requirement.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerChoice {
    Yes,
    No,
}

/// Full profile DTO for the question page.
#[derive(Debug, Serialize)]
pub struct ProfileOut {
    pub name: String,
    pub title: String,
    pub theme: String,
    pub source: ProfileSource,
    pub questions: Vec<String>,
    pub photo: String,
    pub photos: Vec<String>,
}

/// Card DTO for the entry page list.
#[derive(Debug, Serialize)]
pub struct ProfileCard {
    pub name: String,
    pub title: String,
    pub theme: String,
    pub photo: String,
}

/// Convert full `Profile` (internal) to the public DTOs.
pub fn to_out(p: &Profile) -> ProfileOut {
    ProfileOut {
        name: p.name.clone(),
        title: p.title.clone(),
        theme: p.theme.clone(),
        source: p.source.clone(),
        questions: p.questions.clone(),
        photo: p.photo.clone(),
        photos: p.photos.clone(),
    }
}

pub fn to_card(p: &Profile) -> ProfileCard {
    ProfileCard {
        name: p.name.clone(),
        title: p.title.clone(),
        theme: p.theme.clone(),
        photo: p.photo.clone(),
    }
}

/// Rendered wizard view after a restore or any mutation.
#[derive(Debug, Serialize)]
pub struct WizardStateOut {
    pub name: String,
    pub idx: usize,
    pub total: usize,
    pub question: String,
    pub photo: String,
    #[serde(rename = "progressLabel")]
    pub progress_label: String,
    #[serde(rename = "progressPercent")]
    pub progress_percent: f32,
    pub answers: AnswerSet,
    #[serde(rename = "canAdvance")]
    pub can_advance: bool,
    #[serde(rename = "canGoBack")]
    pub can_go_back: bool,
    #[serde(rename = "isLast")]
    pub is_last: bool,
    pub resumed: bool,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub name: String,
    pub idx: usize,
    pub choice: AnswerChoice,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateIn {
    pub name: String,
}

/// Photo attachment as the page prepares it: base64 body plus metadata.
#[derive(Debug, Deserialize)]
pub struct PhotoIn {
    pub filename: String,
    pub mime: String,
    #[serde(rename = "dataBase64")]
    pub data_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub name: String,
    #[serde(default)]
    pub photos: Vec<PhotoIn>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub ok: bool,
    /// Follow-up page URL on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// User-visible failure message; resubmission is allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub finished: bool,
}

#[derive(Debug, Deserialize)]
pub struct ThemeIn {
    pub theme: UiTheme,
}

#[derive(Debug, Serialize)]
pub struct ThemeOut {
    pub theme: UiTheme,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub message: String,
}
