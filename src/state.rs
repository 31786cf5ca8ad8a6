//! Application state: the profile registry, progress store, collector client,
//! and the in-flight submission guard.
//!
//! This module owns:
//!   - the profile map (TOML bank + built-in seeds, immutable after startup)
//!   - the disk-backed progress store
//!   - the optional collector client
//!   - the per-profile "submission in flight" set
//!
//! Profiles are never mutated at runtime, so the map needs no lock; only the
//! submission guard is behind one.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::collector::Collector;
use crate::config::load_app_config_from_env;
use crate::domain::{Profile, ProfileSource};
use crate::seeds::seed_profiles;
use crate::store::{ProgressStore, StoreError};

const DEFAULT_DATA_DIR: &str = "./data";

pub struct AppState {
    pub profiles: HashMap<String, Profile>,
    pub store: ProgressStore,
    pub collector: Option<Collector>,
    submitting: RwLock<HashSet<String>>,
}

impl AppState {
    /// Build state from env: load config, merge bank + seed profiles,
    /// open the store, init the collector client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Result<Self, StoreError> {
        let cfg_opt = load_app_config_from_env();

        let mut profiles = HashMap::<String, Profile>::new();

        // Insert config-based profiles (if any).
        if let Some(cfg) = &cfg_opt {
            for pc in &cfg.profiles {
                if pc.questions.is_empty() {
                    error!(target: "anketa_backend", name = %pc.name, "Skipping bank profile: no questions.");
                    continue;
                }
                let p = Profile {
                    name: pc.name.clone(),
                    source: ProfileSource::LocalBank,
                    title: pc.title.clone().unwrap_or_else(|| pc.name.clone()),
                    questions: pc.questions.clone(),
                    photo: pc.photo.clone().unwrap_or_default(),
                    photos: pc.photos.clone(),
                    theme: pc.theme.clone().unwrap_or_default(),
                };
                profiles.insert(p.name.clone(), p);
            }
        }

        // Always insert built-in seeds, but don't overwrite bank entries.
        for p in seed_profiles() {
            profiles.entry(p.name.clone()).or_insert(p);
        }

        // Inventory summary by source.
        let mut bank = 0usize;
        let mut seed = 0usize;
        for p in profiles.values() {
            match p.source {
                ProfileSource::LocalBank => bank += 1,
                ProfileSource::Seed => seed += 1,
            }
        }
        info!(target: "anketa_backend", local_bank = bank, seed = seed, "Startup profile inventory");

        // Build optional collector client (if an endpoint is named).
        let collector = Collector::from_env(cfg_opt.as_ref().and_then(|c| c.collector.as_ref()));
        if let Some(c) = &collector {
            info!(target: "anketa_backend", url = %c.url, "Collector enabled.");
        } else {
            info!(target: "anketa_backend", "Collector disabled (no COLLECTOR_URL). Submissions will fail visibly.");
        }

        let data_dir = std::env::var("DATA_DIR")
            .ok()
            .or_else(|| cfg_opt.as_ref().and_then(|c| c.data_dir.clone()))
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let store = ProgressStore::open(&data_dir)?;
        info!(target: "anketa_backend", %data_dir, "Progress store ready");

        Ok(Self {
            profiles,
            store,
            collector,
            submitting: RwLock::new(HashSet::new()),
        })
    }

    /// Assemble state from pre-built parts, bypassing env/config loading.
    #[cfg(test)]
    pub fn with_parts(
        profiles: Vec<Profile>,
        store: ProgressStore,
        collector: Option<Collector>,
    ) -> Self {
        let profiles = profiles.into_iter().map(|p| (p.name.clone(), p)).collect();
        Self {
            profiles,
            store,
            collector,
            submitting: RwLock::new(HashSet::new()),
        }
    }

    /// Read-only access to a profile by name.
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Try to claim the submission slot for this profile. Returns false when
    /// a submission is already in flight (rapid repeated form events).
    pub async fn begin_submission(&self, name: &str) -> bool {
        self.submitting.write().await.insert(name.to_string())
    }

    /// Release the slot after the in-flight call resolved either way.
    pub async fn end_submission(&self, name: &str) {
        self.submitting.write().await.remove(name);
    }
}
