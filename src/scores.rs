//! Run summaries and the score-service seam
//!
//! A finished round produces one [`RunSummary`] handed to a [`ScoreService`]
//! as fire-and-forget: the returned best-per-mode map feeds a display-only
//! field and a failed submission simply leaves it blank. Gameplay state
//! never depends on anything here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::settings::SkinId;
use crate::sim::{Mode, ProtocolId};
use crate::tuning::UpgradeLevels;

/// Best score per rule variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestScores {
    pub classic: u32,
    pub survival: u32,
    pub time: u32,
}

impl BestScores {
    pub fn for_mode(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Classic => self.classic,
            Mode::Survival => self.survival,
            Mode::Time => self.time,
        }
    }

    pub fn set_for_mode(&mut self, mode: Mode, score: u32) {
        match mode {
            Mode::Classic => self.classic = score,
            Mode::Survival => self.survival = score,
            Mode::Time => self.time = score,
        }
    }

    /// Record a score if it beats the stored best; returns whether it did
    pub fn record(&mut self, mode: Mode, score: u32) -> bool {
        if score > self.for_mode(mode) {
            self.set_for_mode(mode, score);
            true
        } else {
            false
        }
    }
}

/// End-of-round submission payload
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub username: String,
    pub mode: Mode,
    pub score: u32,
    pub level: u32,
    /// Tick count for the round
    pub duration: u64,
    pub seed: u64,
    pub protocol: ProtocolId,
    pub skin: SkinId,
    pub shards_earned: u32,
    pub contracts_completed: u32,
    pub contracts_total: u32,
    pub lives: u32,
    pub time_left: f64,
    pub multiplier: u32,
    pub combo: u32,
    pub upgrades: UpgradeLevels,
}

/// Where finished rounds are reported. Implementations must never block
/// the caller on anything gameplay depends on.
pub trait ScoreService {
    /// Submit a summary; `Some` carries the service's best-per-mode map for
    /// display, `None` means the submission failed or was skipped
    fn submit(&mut self, summary: &RunSummary) -> Option<BestScores>;
}

/// Offline service: accepts nothing, returns nothing
#[derive(Debug, Default)]
pub struct NullScoreService;

impl ScoreService for NullScoreService {
    fn submit(&mut self, _summary: &RunSummary) -> Option<BestScores> {
        None
    }
}

/// In-process service keeping a best-per-mode table per user; stands in for
/// the remote endpoint in tests and the headless binary
#[derive(Debug, Default)]
pub struct LocalScoreService {
    best: HashMap<String, BestScores>,
}

impl LocalScoreService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best_for(&self, username: &str) -> Option<&BestScores> {
        self.best.get(username)
    }
}

impl ScoreService for LocalScoreService {
    fn submit(&mut self, summary: &RunSummary) -> Option<BestScores> {
        if summary.score == 0 {
            return None;
        }
        let entry = self.best.entry(summary.username.clone()).or_default();
        entry.record(summary.mode, summary.score);
        log::info!(
            "recorded run for {}: {} in {} mode",
            summary.username,
            summary.score,
            summary.mode.as_str()
        );
        Some(*entry)
    }
}
