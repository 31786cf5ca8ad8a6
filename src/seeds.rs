//! Seed data: built-in profiles so the app works without external config.

use crate::domain::{Profile, ProfileSource};

/// Minimal set of built-in profiles that guarantee the app
/// is useful even without a TOML bank.
pub fn seed_profiles() -> Vec<Profile> {
  vec![
    Profile {
      name: "demo".into(),
      source: ProfileSource::Seed,
      title: "Demo questionnaire".into(),
      questions: vec![
        "Do you remember our first trip together?".into(),
        "Would you do it all again?".into(),
        "Should we plan the next one?".into(),
      ],
      photo: "assets/profiles/demo.jpg".into(),
      photos: vec![],
      theme: "sepia".into(),
    },
    Profile {
      name: "quickstart".into(),
      source: ProfileSource::Seed,
      title: "Quickstart".into(),
      questions: vec![
        "Is this service reachable?".into(),
        "Did the progress bar move?".into(),
      ],
      photo: String::new(),
      photos: vec![],
      theme: "plain".into(),
    },
  ]
}
