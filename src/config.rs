//! Loading app configuration (profile bank + collector endpoint) from TOML.
//!
//! See `AppConfig` and `CollectorCfg` for the expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub collector: Option<CollectorCfg>,
  #[serde(default)]
  pub profiles: Vec<ProfileCfg>,
  #[serde(default)]
  pub data_dir: Option<String>,
}

/// Where completed answer sets get POSTed. `COLLECTOR_URL` in the
/// environment overrides the TOML value.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectorCfg {
  pub url: String,
  #[serde(default)] pub timeout_secs: Option<u64>,
}

/// Profile entry accepted in TOML configuration.
/// `questions` must be non-empty; entries without questions are skipped.
#[derive(Clone, Debug, Deserialize)]
pub struct ProfileCfg {
  pub name: String,
  #[serde(default)] pub title: Option<String>,
  #[serde(default)] pub questions: Vec<String>,
  #[serde(default)] pub photo: Option<String>,
  #[serde(default)] pub photos: Vec<String>,
  #[serde(default)] pub theme: Option<String>,
}

/// Attempt to load `AppConfig` from PROFILE_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("PROFILE_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "anketa_backend", %path, "Loaded app config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "anketa_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "anketa_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
