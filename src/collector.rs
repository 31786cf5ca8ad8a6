//! Minimal client for the external results collector.
//!
//! One call: POST a multipart form with `username`, `answers` (JSON array of
//! `{question, answer}` pairs) and optional photo attachments. Success means
//! a 2xx status AND a `{"status": "ok"}` body; anything else is a failure
//! the caller surfaces to the user. No automatic retry here.
//!
//! NOTE: We log attempt ids, statuses and latencies, never answer contents.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::CollectorCfg;
use crate::domain::AnswerPair;
use crate::util::trunc_for_log;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Decoded photo attachment ready to forward.
pub struct PhotoUpload {
  pub filename: String,
  pub mime: String,
  pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct Collector {
  pub client: reqwest::Client,
  pub url: String,
}

#[derive(Deserialize)]
struct SubmitAck {
  #[serde(default)]
  status: String,
}

impl Collector {
  /// Construct the client from COLLECTOR_URL (env wins) or the TOML
  /// `[collector]` table; returns None when neither names an endpoint.
  pub fn from_env(cfg: Option<&CollectorCfg>) -> Option<Self> {
    let url = std::env::var("COLLECTOR_URL")
      .ok()
      .or_else(|| cfg.map(|c| c.url.clone()))?;
    let timeout = cfg
      .and_then(|c| c.timeout_secs)
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout))
      .build()
      .ok()?;

    Some(Self { client, url })
  }

  /// Send one completed answer set. Exactly one call per terminal wizard
  /// transition; duplicate suppression happens upstream.
  #[instrument(level = "info", skip(self, pairs, photos), fields(%username, pairs = pairs.len(), photos = photos.len()))]
  pub async fn submit(
    &self,
    username: &str,
    pairs: &[AnswerPair],
    photos: Vec<PhotoUpload>,
  ) -> Result<(), String> {
    let attempt = Uuid::new_v4();
    let answers_json = serde_json::to_string(pairs).map_err(|e| e.to_string())?;

    let mut form = Form::new()
      .text("username", username.to_string())
      .text("answers", answers_json);
    for photo in photos {
      let part = Part::bytes(photo.bytes)
        .file_name(photo.filename)
        .mime_str(&photo.mime)
        .map_err(|e| e.to_string())?;
      form = form.part("photos", part);
    }

    let start = std::time::Instant::now();
    let res = self
      .client
      .post(&self.url)
      .multipart(form)
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let elapsed = start.elapsed();

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      error!(target: "wizard", %attempt, %status, ?elapsed, "Collector rejected the submission");
      return Err(format!("Collector HTTP {}: {}", status, trunc_for_log(&body, 200)));
    }

    let body = res.text().await.map_err(|e| e.to_string())?;
    parse_ack(&body).map_err(|e| {
      error!(target: "wizard", %attempt, ?elapsed, error = %e, "Collector ack was not ok");
      e
    })?;

    info!(target: "wizard", %attempt, ?elapsed, "Submission accepted by collector");
    Ok(())
  }
}

/// The collector must answer `{"status": "ok"}`; any other shape fails.
fn parse_ack(body: &str) -> Result<(), String> {
  match serde_json::from_str::<SubmitAck>(body) {
    Ok(ack) if ack.status == "ok" => Ok(()),
    Ok(ack) => Err(format!("Unexpected collector response: status={:?}", ack.status)),
    Err(_) => Err(format!("Unexpected collector response: {}", trunc_for_log(body, 200))),
  }
}
