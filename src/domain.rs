//! Domain models used by the backend: profiles, answer sets, progress records.

use serde::{Deserialize, Serialize};

/// The affirmative answer token. Anything else stored in a slot is free text
/// (or the empty string while the user still owes us that text).
pub const YES: &str = "yes";

/// Where did we get the profile from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
  LocalBank,   // from user-provided TOML bank
  Seed,  // built-in profiles (always available)
}

/// Persisted UI theme preference for the entry page.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UiTheme {
  Light,
  Dark,
}
impl Default for UiTheme {
  fn default() -> Self { UiTheme::Light }
}

/// Static questionnaire descriptor. Immutable once loaded; the wizard never
/// mutates a profile, only the progress record keyed by its name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
  pub name: String,   // identity/caption; also the progress key
  pub source: ProfileSource,

  #[serde(default)] pub title: String,
  pub questions: Vec<String>,

  // Visuals
  #[serde(default)] pub photo: String,   // default background image
  #[serde(default)] pub photos: Vec<String>,   // per-question images
  #[serde(default)] pub theme: String,   // free-form tag (e.g., "sepia")
}

impl Profile {
  /// Image shown for question `idx`: per-question photo when present,
  /// otherwise the profile-wide default.
  pub fn photo_for(&self, idx: usize) -> &str {
    match self.photos.get(idx) {
      Some(p) if !p.is_empty() => p,
      _ => &self.photo,
    }
  }
}

/// Ordered answers, one slot per question.
///
/// Slot values:
///   `None`         -> unanswered
///   `Some("yes")`  -> affirmative
///   `Some("")`     -> declined, free text still missing (incomplete)
///   `Some(text)`   -> free text
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AnswerSet(Vec<Option<String>>);

impl AnswerSet {
  pub fn new(question_count: usize) -> Self {
    Self(vec![None; question_count])
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn get(&self, idx: usize) -> Option<&str> {
    self.0.get(idx).and_then(|s| s.as_deref())
  }

  /// A slot is complete iff it holds the affirmative token or non-empty
  /// free text. This is what gates forward navigation and submission.
  pub fn is_complete(&self, idx: usize) -> bool {
    match self.get(idx) {
      Some(YES) => true,
      Some(text) => !text.trim().is_empty(),
      None => false,
    }
  }

  pub fn set_yes(&mut self, idx: usize) {
    if let Some(slot) = self.0.get_mut(idx) {
      *slot = Some(YES.to_string());
    }
  }

  /// "No" selected: the slot now owes free text and is incomplete until
  /// `set_text` supplies some.
  pub fn decline(&mut self, idx: usize) {
    if let Some(slot) = self.0.get_mut(idx) {
      *slot = Some(String::new());
    }
  }

  /// Free text for a declined slot. Whitespace-only text reverts the slot
  /// to the incomplete declined state.
  pub fn set_text(&mut self, idx: usize, text: &str) {
    if let Some(slot) = self.0.get_mut(idx) {
      *slot = Some(text.trim().to_string());
    }
  }

  /// Force the set back to exactly `question_count` slots. Extra slots are
  /// dropped, missing ones filled with `None`.
  pub fn resize(&mut self, question_count: usize) {
    self.0.resize(question_count, None);
  }

  /// Pair each question with its answer in order; unanswered slots become
  /// empty strings in the outbound payload.
  pub fn paired_with(&self, questions: &[String]) -> Vec<AnswerPair> {
    questions
      .iter()
      .enumerate()
      .map(|(i, q)| AnswerPair {
        question: q.clone(),
        answer: self.get(i).unwrap_or_default().to_string(),
      })
      .collect()
  }
}

/// One `{question, answer}` row of the submission payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerPair {
  pub question: String,
  pub answer: String,
}

/// Persisted `{idx, answers}` snapshot enabling resumption. Field names match
/// the on-disk JSON layout.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressRecord {
  #[serde(default)] pub idx: usize,
  #[serde(default)] pub answers: AnswerSet,
}

impl ProgressRecord {
  /// Bring a loaded record back in range for a profile with
  /// `question_count` questions: clamp the index, resize the answers.
  pub fn normalized(mut self, question_count: usize) -> Self {
    self.answers.resize(question_count);
    if question_count == 0 {
      self.idx = 0;
    } else if self.idx >= question_count {
      self.idx = question_count - 1;
    }
    self
  }
}
