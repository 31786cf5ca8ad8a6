//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::logic::{self, ApiError};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_profiles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let mut cards: Vec<ProfileCard> = state.profiles.values().map(to_card).collect();
  cards.sort_by(|a, b| a.name.cmp(&b.name));
  info!(target: "anketa_backend", count = cards.len(), "HTTP profiles listed");
  Json(cards)
}

#[instrument(level = "info", skip(state), fields(%q.name))]
pub async fn http_get_profile(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProfileQuery>,
) -> Result<Json<ProfileOut>, ApiError> {
  let profile = state
    .get_profile(&q.name)
    .ok_or_else(|| ApiError::UnknownProfile(q.name.clone()))?;
  info!(target: "anketa_backend", name = %q.name, "HTTP profile served");
  Ok(Json(to_out(profile)))
}

#[instrument(level = "info", skip(state), fields(%q.name))]
pub async fn http_wizard_state(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProfileQuery>,
) -> Result<Json<WizardStateOut>, ApiError> {
  let v = logic::wizard_state(&state, &q.name).await?;
  info!(target: "wizard", name = %q.name, idx = v.idx, resumed = v.resumed, "HTTP wizard state restored");
  Ok(Json(v))
}

#[instrument(level = "info", skip(state, body), fields(%body.name, idx = body.idx))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<WizardStateOut>, ApiError> {
  let v = logic::apply_answer(&state, body).await?;
  info!(target: "wizard", name = %v.name, idx = v.idx, can_advance = v.can_advance, "HTTP answer recorded");
  Ok(Json(v))
}

#[instrument(level = "info", skip(state, body), fields(%body.name))]
pub async fn http_post_back(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NavigateIn>,
) -> Result<Json<WizardStateOut>, ApiError> {
  let v = logic::go_back(&state, &body.name).await?;
  Ok(Json(v))
}

#[instrument(level = "info", skip(state, body), fields(%body.name))]
pub async fn http_post_advance(
  State(state): State<Arc<AppState>>,
  Json(body): Json<NavigateIn>,
) -> Result<Json<WizardStateOut>, ApiError> {
  let v = logic::go_forward(&state, &body.name).await?;
  Ok(Json(v))
}

#[instrument(level = "info", skip(state, body), fields(%body.name, photos = body.photos.len()))]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  let out = logic::do_submit(&state, body).await?;
  info!(target: "wizard", ok = out.ok, "HTTP submit finished");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(SessionOut { finished: state.store.is_finished().await })
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_session_reset(
  State(state): State<Arc<AppState>>,
) -> Result<Json<SessionOut>, ApiError> {
  state.store.reset_finished().await.map_err(ApiError::from)?;
  info!(target: "anketa_backend", "Session completion marker reset");
  Ok(Json(SessionOut { finished: false }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_theme(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(ThemeOut { theme: state.store.load_theme().await })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_theme(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ThemeIn>,
) -> Result<Json<ThemeOut>, ApiError> {
  state.store.save_theme(body.theme).await.map_err(ApiError::from)?;
  Ok(Json(ThemeOut { theme: body.theme }))
}
