//! Player preferences
//!
//! Persisted inside the profile; every field falls back to a fixed default
//! when missing so a partial or stale record never surfaces as an error.

use serde::{Deserialize, Serialize};

use crate::sim::{Mode, ProtocolId};

/// Snake color theme (presentation-only, carried through persistence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinId {
    #[default]
    Neon,
    Ocean,
    Forest,
}

impl SkinId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinId::Neon => "neon",
            SkinId::Ocean => "ocean",
            SkinId::Forest => "forest",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "neon" => Some(SkinId::Neon),
            "ocean" => Some(SkinId::Ocean),
            "forest" => Some(SkinId::Forest),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Audio cues on/off
    pub sound: bool,
    /// Grid lines on/off
    pub grid: bool,
    /// Last selected rule variant
    pub mode: Mode,
    /// Snake theme
    pub skin: SkinId,
    /// Last selected ruleset
    pub protocol: ProtocolId,
    /// Preferred input scheme ("keyboard", "touch", or empty for auto)
    pub input_mode: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound: true,
            grid: true,
            mode: Mode::Classic,
            skin: SkinId::Neon,
            protocol: ProtocolId::Steady,
            input_mode: String::new(),
        }
    }
}
