//! Core behaviors shared by the HTTP handlers.
//!
//! This includes:
//!   - Restoring the wizard from the progress store and rendering its view
//!   - Applying answer mutations (persist on every change)
//!   - Back/forward navigation with completeness gating
//!   - Orchestrating submission: duplicate guard, collector call, cleanup

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::collector::PhotoUpload;
use crate::domain::Profile;
use crate::protocol::{AnswerChoice, AnswerIn, ErrorOut, SubmitIn, SubmitOut, WizardStateOut};
use crate::state::AppState;
use crate::store::StoreError;
use crate::wizard::{Advance, Wizard};

/// Message shown when sending fails; resubmission stays possible.
const SUBMIT_FAILED_MSG: &str = "Failed to send your answers. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Unknown profile: {0}")]
  UnknownProfile(String),

  #[error("Internal error: {0}")]
  Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match self {
      ApiError::UnknownProfile(_) => StatusCode::NOT_FOUND,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorOut { message: self.to_string() })).into_response()
  }
}

fn lookup<'a>(state: &'a AppState, name: &str) -> Result<&'a Profile, ApiError> {
  state
    .get_profile(name)
    .ok_or_else(|| ApiError::UnknownProfile(name.to_string()))
}

async fn restore(state: &AppState, profile: &Profile) -> (Wizard, bool) {
  let resumed = state.store.has_progress(&profile.name).await;
  let record = state
    .store
    .load_progress(&profile.name, profile.questions.len())
    .await;
  (Wizard::resume(profile.questions.clone(), record), resumed)
}

fn view(profile: &Profile, wizard: &Wizard, resumed: bool) -> WizardStateOut {
  WizardStateOut {
    name: profile.name.clone(),
    idx: wizard.idx(),
    total: wizard.total(),
    question: wizard.question().to_string(),
    photo: profile.photo_for(wizard.idx()).to_string(),
    progress_label: wizard.progress_label(),
    progress_percent: wizard.progress_percent(),
    answers: wizard.answers().clone(),
    can_advance: wizard.can_advance(),
    can_go_back: wizard.can_go_back(),
    is_last: wizard.is_last(),
    resumed,
  }
}

/// Restore and render the current question without mutating anything.
#[instrument(level = "info", skip(state), fields(%name))]
pub async fn wizard_state(state: &AppState, name: &str) -> Result<WizardStateOut, ApiError> {
  let profile = lookup(state, name)?;
  let (wizard, resumed) = restore(state, profile).await;
  Ok(view(profile, &wizard, resumed))
}

/// Record an answer at the current question and persist immediately.
/// A stale index (the page raced its own events) refreshes the view
/// without mutating the stored answers.
#[instrument(level = "info", skip(state, body), fields(name = %body.name, idx = body.idx, choice = ?body.choice))]
pub async fn apply_answer(state: &AppState, body: AnswerIn) -> Result<WizardStateOut, ApiError> {
  let profile = lookup(state, &body.name)?;
  let (mut wizard, resumed) = restore(state, profile).await;

  if body.idx != wizard.idx() {
    debug!(target: "wizard", client_idx = body.idx, server_idx = wizard.idx(), "Stale answer event; returning current view");
    return Ok(view(profile, &wizard, resumed));
  }

  match body.choice {
    AnswerChoice::Yes => wizard.answer_yes(),
    AnswerChoice::No => {
      wizard.answer_no();
      if let Some(text) = &body.text {
        wizard.answer_text(text);
      }
    }
  }

  state.store.save_progress(&profile.name, &wizard.record()).await?;
  Ok(view(profile, &wizard, resumed))
}

/// `Question(i) --back--> Question(i-1)`; persists the new index.
#[instrument(level = "info", skip(state), fields(%name))]
pub async fn go_back(state: &AppState, name: &str) -> Result<WizardStateOut, ApiError> {
  let profile = lookup(state, name)?;
  let (mut wizard, resumed) = restore(state, profile).await;
  if wizard.back() {
    state.store.save_progress(&profile.name, &wizard.record()).await?;
  }
  Ok(view(profile, &wizard, resumed))
}

/// `Question(i) --advance--> Question(i+1)` when the slot is complete.
/// On the last question the view simply stays put; the page submits instead.
#[instrument(level = "info", skip(state), fields(%name))]
pub async fn go_forward(state: &AppState, name: &str) -> Result<WizardStateOut, ApiError> {
  let profile = lookup(state, name)?;
  let (mut wizard, resumed) = restore(state, profile).await;
  match wizard.advance() {
    Advance::Moved(idx) => {
      state.store.save_progress(&profile.name, &wizard.record()).await?;
      info!(target: "wizard", %name, idx, "Advanced to next question");
    }
    Advance::ReadyToSubmit => {
      debug!(target: "wizard", %name, "On last question; waiting for submit");
    }
    Advance::Blocked => {
      debug!(target: "wizard", %name, "Advance blocked: current answer incomplete");
    }
  }
  Ok(view(profile, &wizard, resumed))
}

/// Terminal transition: send everything to the collector exactly once.
///
/// On confirmed success: clear the progress record, set the completion
/// marker, hand back the follow-up URL. On any failure: release the guard
/// so the user may retry; the progress record is left untouched.
#[instrument(level = "info", skip(state, body), fields(name = %body.name, photos = body.photos.len()))]
pub async fn do_submit(state: &AppState, body: SubmitIn) -> Result<SubmitOut, ApiError> {
  let profile = lookup(state, &body.name)?;
  let (mut wizard, _resumed) = restore(state, profile).await;

  if !wizard.begin_submit() {
    return Ok(SubmitOut {
      ok: false,
      redirect: None,
      message: Some("Please answer the last question before sending.".into()),
    });
  }

  // Cross-request duplicate guard: rapid repeated submits collapse into
  // the one already in flight and are suppressed without an alert.
  if !state.begin_submission(&profile.name).await {
    debug!(target: "wizard", name = %profile.name, "Submission already in flight; suppressing duplicate");
    return Ok(SubmitOut { ok: false, redirect: None, message: None });
  }

  let result = send_to_collector(state, profile, &wizard, body).await;
  state.end_submission(&profile.name).await;

  match result {
    Ok(redirect) => {
      wizard.complete();
      state.store.clear_progress(&profile.name).await?;
      state.store.mark_finished().await?;
      info!(target: "wizard", name = %profile.name, "Submission confirmed; progress cleared");
      Ok(SubmitOut { ok: true, redirect: Some(redirect), message: None })
    }
    Err(e) => {
      wizard.submit_failed();
      error!(target: "wizard", name = %profile.name, error = %e, "Submission failed; user may retry");
      Ok(SubmitOut {
        ok: false,
        redirect: None,
        message: Some(SUBMIT_FAILED_MSG.into()),
      })
    }
  }
}

async fn send_to_collector(
  state: &AppState,
  profile: &Profile,
  wizard: &Wizard,
  body: SubmitIn,
) -> Result<String, String> {
  let collector = state
    .collector
    .as_ref()
    .ok_or_else(|| "Collector disabled (no COLLECTOR_URL).".to_string())?;

  let mut photos = Vec::with_capacity(body.photos.len());
  for p in body.photos {
    let bytes = BASE64
      .decode(p.data_base64.as_bytes())
      .map_err(|e| format!("Invalid photo attachment {}: {}", p.filename, e))?;
    photos.push(PhotoUpload { filename: p.filename, mime: p.mime, bytes });
  }

  let pairs = wizard.answers().paired_with(&profile.questions);
  collector.submit(&profile.name, &pairs, photos).await?;

  let encoded: String = url::form_urlencoded::byte_serialize(profile.name.as_bytes()).collect();
  Ok(format!("/processing.html?name={}", encoded))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::collector::Collector;
  use crate::domain::{ProfileSource, YES};
  use crate::protocol::PhotoIn;
  use crate::store::ProgressStore;
  use axum::{routing::post, Router};

  fn test_profile() -> Profile {
    Profile {
      name: "test".into(),
      source: ProfileSource::Seed,
      title: "Test".into(),
      questions: vec!["q1".into(), "q2".into(), "q3".into()],
      photo: String::new(),
      photos: vec![],
      theme: String::new(),
    }
  }

  fn app_state(dir: &std::path::Path, collector: Option<Collector>) -> AppState {
    let store = ProgressStore::open(dir).expect("open store");
    AppState::with_parts(vec![test_profile()], store, collector)
  }

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/submit")
  }

  async fn ok_collector() -> Collector {
    let app = Router::new().route(
      "/submit",
      post(|| async { Json(serde_json::json!({ "status": "ok" })) }),
    );
    Collector { client: reqwest::Client::new(), url: serve(app).await }
  }

  async fn failing_collector() -> Collector {
    let app = Router::new().route(
      "/submit",
      post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    Collector { client: reqwest::Client::new(), url: serve(app).await }
  }

  async fn answer(state: &AppState, idx: usize, choice: AnswerChoice, text: Option<&str>) {
    apply_answer(
      state,
      AnswerIn { name: "test".into(), idx, choice, text: text.map(String::from) },
    )
    .await
    .expect("answer");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn full_flow_clears_progress_and_sets_marker() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), Some(ok_collector().await));

    // yes, then no + custom text, then yes, advancing between questions
    answer(&state, 0, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance 0->1");
    answer(&state, 1, AnswerChoice::No, Some("custom text")).await;
    go_forward(&state, "test").await.expect("advance 1->2");
    answer(&state, 2, AnswerChoice::Yes, None).await;

    let out = do_submit(&state, SubmitIn { name: "test".into(), photos: vec![] })
      .await
      .expect("submit");
    assert!(out.ok, "submission should succeed: {:?}", out.message);
    assert_eq!(out.redirect.as_deref(), Some("/processing.html?name=test"));

    assert!(!state.store.has_progress("test").await, "record must be cleared");
    assert!(state.store.is_finished().await, "completion marker must be set");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn collector_500_keeps_progress_and_allows_retry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), Some(failing_collector().await));

    answer(&state, 0, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance");
    answer(&state, 1, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance");
    answer(&state, 2, AnswerChoice::Yes, None).await;

    let first = do_submit(&state, SubmitIn { name: "test".into(), photos: vec![] })
      .await
      .expect("submit");
    assert!(!first.ok);
    assert!(first.message.is_some(), "failure must carry a user-visible alert");
    assert!(state.store.has_progress("test").await, "progress must survive the failure");
    assert!(!state.store.is_finished().await);

    // Retry is not suppressed: the guard was released on failure.
    let second = do_submit(&state, SubmitIn { name: "test".into(), photos: vec![] })
      .await
      .expect("resubmit");
    assert!(second.message.is_some(), "retry reaches the collector again");

    let restored = wizard_state(&state, "test").await.expect("state");
    assert_eq!(restored.answers.get(0), Some(YES), "answers are intact after failures");
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn incomplete_last_answer_blocks_submission() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), Some(ok_collector().await));

    answer(&state, 0, AnswerChoice::No, None).await; // declined, no text
    let out = do_submit(&state, SubmitIn { name: "test".into(), photos: vec![] })
      .await
      .expect("submit");
    assert!(!out.ok);
    assert!(out.message.is_some());
    assert!(!state.store.is_finished().await);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn duplicate_submission_is_suppressed_silently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), Some(ok_collector().await));

    answer(&state, 0, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance");
    answer(&state, 1, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance");
    answer(&state, 2, AnswerChoice::Yes, None).await;

    // Simulate an in-flight submission holding the slot.
    assert!(state.begin_submission("test").await);
    let out = do_submit(&state, SubmitIn { name: "test".into(), photos: vec![] })
      .await
      .expect("submit");
    assert!(!out.ok);
    assert!(out.message.is_none(), "duplicates are dropped without an alert");
    state.end_submission("test").await;
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn bad_photo_base64_fails_without_clearing_progress() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), Some(ok_collector().await));

    answer(&state, 0, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance");
    answer(&state, 1, AnswerChoice::Yes, None).await;
    go_forward(&state, "test").await.expect("advance");
    answer(&state, 2, AnswerChoice::Yes, None).await;

    let bad = PhotoIn {
      filename: "photo.jpg".into(),
      mime: "image/jpeg".into(),
      data_base64: "&&& not base64 &&&".into(),
    };
    let out = do_submit(&state, SubmitIn { name: "test".into(), photos: vec![bad] })
      .await
      .expect("submit");
    assert!(!out.ok);
    assert!(state.store.has_progress("test").await);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn stale_answer_index_does_not_mutate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), None);

    answer(&state, 5, AnswerChoice::Yes, None).await; // stale index
    let v = wizard_state(&state, "test").await.expect("state");
    assert_eq!(v.answers.get(0), None, "stale event must not touch slot 0");
    assert!(!v.can_advance);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn unknown_profile_is_a_visible_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = app_state(dir.path(), None);

    let err = wizard_state(&state, "ghost").await.expect_err("must fail");
    assert!(matches!(err, ApiError::UnknownProfile(_)));
  }
}
