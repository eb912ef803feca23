//! Player profile persistence
//!
//! A profile is a small JSON document behind a string key-value backend.
//! Loads never fail the caller: a missing or corrupt record degrades
//! field-by-field to the documented defaults, and save errors are logged
//! and swallowed. The simulation itself never touches this module; the
//! session layer reads at initialization and writes at lifecycle
//! boundaries only.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scores::BestScores;
use crate::settings::Settings;
use crate::tuning::UpgradeLevels;

/// Profile storage key
pub const PROFILE_KEY: &str = "neon_snake_profile_v1";

/// String key-value storage contract
pub trait StoreBackend {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory backend for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// One JSON file per key under a data directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StoreBackend for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Some(contents),
            Err(err) => {
                log::debug!("no stored record for '{key}': {err}");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            log::warn!("cannot create data dir {:?}: {err}", self.dir);
            return;
        }
        if let Err(err) = fs::write(self.path_for(key), value) {
            log::warn!("failed to persist '{key}': {err}");
        }
    }

    fn remove(&mut self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }
}

/// Everything remembered about a player between rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub settings: Settings,
    pub best: BestScores,
    pub max_level: u32,
    /// Evolving RNG state, carried across rounds
    pub seed: u64,
    /// Shard balance
    pub shards: u32,
    pub upgrades: UpgradeLevels,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            best: BestScores::default(),
            max_level: 1,
            seed: 0,
            shards: 0,
            upgrades: UpgradeLevels::default(),
        }
    }
}

impl Profile {
    /// Load the stored profile, defaulting anything missing or malformed.
    /// `fallback_seed` replaces an absent seed so a first run still has a
    /// reproducible stream.
    pub fn load(store: &dyn StoreBackend, fallback_seed: u64) -> Self {
        let mut profile = match store.read(PROFILE_KEY) {
            Some(raw) => match serde_json::from_str::<Profile>(&raw) {
                Ok(profile) => {
                    log::info!("profile loaded");
                    profile
                }
                Err(err) => {
                    log::warn!("stored profile unreadable, using defaults: {err}");
                    Profile::default()
                }
            },
            None => {
                log::info!("no stored profile, using defaults");
                Profile::default()
            }
        };
        if profile.seed == 0 {
            profile.seed = fallback_seed;
        }
        if profile.max_level == 0 {
            profile.max_level = 1;
        }
        profile
    }

    /// Persist the profile; failures are logged, never surfaced
    pub fn save(&self, store: &mut dyn StoreBackend) {
        match serde_json::to_string(self) {
            Ok(json) => store.write(PROFILE_KEY, &json),
            Err(err) => log::warn!("failed to encode profile: {err}"),
        }
    }
}
