//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/profiles", get(http::http_list_profiles))
        .route("/api/v1/profile", get(http::http_get_profile))
        .route("/api/v1/wizard/state", get(http::http_wizard_state))
        .route("/api/v1/wizard/answer", post(http::http_post_answer))
        .route("/api/v1/wizard/back", post(http::http_post_back))
        .route("/api/v1/wizard/advance", post(http::http_post_advance))
        .route("/api/v1/wizard/submit", post(http::http_post_submit))
        .route("/api/v1/session", get(http::http_get_session))
        .route("/api/v1/session/reset", post(http::http_post_session_reset))
        .route("/api/v1/theme", get(http::http_get_theme).post(http::http_post_theme))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Profile, ProfileSource};
    use crate::store::ProgressStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_router(dir: &std::path::Path) -> Router {
        let profile = Profile {
            name: "test".into(),
            source: ProfileSource::Seed,
            title: "Test".into(),
            questions: vec!["q1".into(), "q2".into()],
            photo: String::new(),
            photos: vec![],
            theme: String::new(),
        };
        let store = ProgressStore::open(dir).expect("open store");
        let state = Arc::new(AppState::with_parts(vec![profile], store, None));
        build_router(state)
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = test_router(dir.path())
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).expect("req"))
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn unknown_profile_is_404_with_error_body() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = test_router(dir.path())
            .oneshot(
                Request::get("/api/v1/wizard/state?name=ghost")
                    .body(Body::empty())
                    .expect("req"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = body_json(res).await;
        assert!(body["message"].as_str().unwrap_or_default().contains("ghost"));
    }

    #[tokio::test]
    async fn answer_roundtrip_updates_gating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let router = test_router(dir.path());

        let payload = serde_json::json!({
            "name": "test", "idx": 0, "choice": "no"
        });
        let res = router
            .clone()
            .oneshot(
                Request::post("/api/v1/wizard/answer")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("req"),
            )
            .await
            .expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["canAdvance"], serde_json::json!(false));

        let payload = serde_json::json!({
            "name": "test", "idx": 0, "choice": "no", "text": "my own words"
        });
        let res = router
            .oneshot(
                Request::post("/api/v1/wizard/answer")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("req"),
            )
            .await
            .expect("response");
        let body = body_json(res).await;
        assert_eq!(body["canAdvance"], serde_json::json!(true));
        assert_eq!(body["progressLabel"], serde_json::json!("1 / 2"));
    }

    #[tokio::test]
    async fn session_gate_defaults_to_unfinished() {
        let dir = tempfile::tempdir().expect("tempdir");
        let res = test_router(dir.path())
            .oneshot(Request::get("/api/v1/session").body(Body::empty()).expect("req"))
            .await
            .expect("response");
        assert_eq!(body_json(res).await, serde_json::json!({ "finished": false }));
    }
}
