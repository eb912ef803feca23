//! Data-driven game balance
//!
//! Fixed tables the simulation reads: item payouts, power durations,
//! protocol modifiers, the contract pool, upgrade pricing, and special
//! spawn pacing. Tweaking numbers here must not change any control flow.

use serde::{Deserialize, Serialize};

use crate::sim::state::{ContractKind, ItemKind, PowerKind, ProtocolId};

/// Item time-to-live: bounded in milliseconds or left on the board forever
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ttl {
    Unlimited,
    Ms(f64),
}

/// Static per-kind item payout
#[derive(Debug, Clone, Copy)]
pub struct ItemDef {
    pub score: i32,
    pub grow: i32,
    pub ttl: Ttl,
}

pub const fn item_def(kind: ItemKind) -> ItemDef {
    match kind {
        ItemKind::Food => ItemDef { score: 10, grow: 1, ttl: Ttl::Unlimited },
        ItemKind::Bonus => ItemDef { score: 25, grow: 2, ttl: Ttl::Ms(6000.0) },
        ItemKind::Toxic => ItemDef { score: -15, grow: -2, ttl: Ttl::Ms(7000.0) },
        ItemKind::Power => ItemDef { score: 12, grow: 0, ttl: Ttl::Ms(7000.0) },
        ItemKind::Relic => ItemDef { score: 16, grow: 0, ttl: Ttl::Ms(8000.0) },
    }
}

/// Power pickup table: sub-kind and effect duration
#[derive(Debug, Clone, Copy)]
pub struct PowerDef {
    pub kind: PowerKind,
    pub label: &'static str,
    pub duration_ms: f64,
}

/// All spawnable power sub-kinds, drawn uniformly
pub const POWERS: [PowerDef; 7] = [
    PowerDef { kind: PowerKind::Speed, label: "overclock", duration_ms: 6500.0 },
    PowerDef { kind: PowerKind::Slow, label: "slipstream", duration_ms: 6500.0 },
    PowerDef { kind: PowerKind::Shield, label: "shield", duration_ms: 9000.0 },
    PowerDef { kind: PowerKind::Ghost, label: "ghost", duration_ms: 6500.0 },
    PowerDef { kind: PowerKind::Magnet, label: "magnet", duration_ms: 6500.0 },
    PowerDef { kind: PowerKind::Multiplier, label: "amplify", duration_ms: 7500.0 },
    PowerDef { kind: PowerKind::Rainbow, label: "prism", duration_ms: 15000.0 },
];

pub fn power_def(kind: PowerKind) -> &'static PowerDef {
    // POWERS covers every PowerKind variant exactly once
    POWERS
        .iter()
        .find(|p| p.kind == kind)
        .unwrap_or(&POWERS[0])
}

/// Named ruleset modifiers layered over the base configuration
#[derive(Debug, Clone, Copy)]
pub struct ProtocolDef {
    pub id: ProtocolId,
    pub label: &'static str,
    /// Steps-per-second adjustment
    pub speed: f64,
    /// Obstacle count adjustment
    pub hazard: i32,
    /// Mover count adjustment
    pub mover: i32,
    /// Score multiplier applied to positive payouts
    pub score: f64,
    /// Combo window adjustment (milliseconds)
    pub combo: f64,
    /// Magnet radius adjustment (cells)
    pub magnet: i32,
    /// Starting shield charges
    pub shield: i32,
    /// Scale on special spawn delays (>1 = slower spawns)
    pub special_rate: f64,
}

pub const PROTOCOLS: [ProtocolDef; 3] = [
    ProtocolDef {
        id: ProtocolId::Steady,
        label: "steady",
        speed: -0.6,
        hazard: -3,
        mover: -1,
        score: 0.9,
        combo: 600.0,
        magnet: 0,
        shield: 1,
        special_rate: 1.1,
    },
    ProtocolDef {
        id: ProtocolId::Surge,
        label: "surge",
        speed: 1.2,
        hazard: 4,
        mover: 1,
        score: 1.2,
        combo: -300.0,
        magnet: 0,
        shield: 0,
        special_rate: 0.85,
    },
    ProtocolDef {
        id: ProtocolId::Sync,
        label: "sync",
        speed: 0.3,
        hazard: 0,
        mover: 0,
        score: 1.05,
        combo: 1200.0,
        magnet: 1,
        shield: 0,
        special_rate: 1.0,
    },
];

pub fn protocol(id: ProtocolId) -> &'static ProtocolDef {
    match id {
        ProtocolId::Steady => &PROTOCOLS[0],
        ProtocolId::Surge => &PROTOCOLS[1],
        ProtocolId::Sync => &PROTOCOLS[2],
    }
}

/// A drawable mission objective
#[derive(Debug, Clone, Copy)]
pub struct ContractDef {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: ContractKind,
    pub target: f64,
    pub reward_score: u32,
    pub reward_shards: u32,
}

pub const CONTRACT_POOL: [ContractDef; 8] = [
    ContractDef { id: "eat", label: "energy chain", kind: ContractKind::Eat, target: 6.0, reward_score: 140, reward_shards: 2 },
    ContractDef { id: "power", label: "anomaly harvest", kind: ContractKind::Power, target: 2.0, reward_score: 180, reward_shards: 3 },
    ContractDef { id: "bonus", label: "flare collector", kind: ContractKind::Bonus, target: 2.0, reward_score: 160, reward_shards: 2 },
    ContractDef { id: "portal", label: "jump trial", kind: ContractKind::Portal, target: 3.0, reward_score: 150, reward_shards: 2 },
    ContractDef { id: "combo", label: "chain storm", kind: ContractKind::Combo, target: 4.0, reward_score: 200, reward_shards: 3 },
    ContractDef { id: "survive", label: "stable orbit", kind: ContractKind::Survive, target: 30.0, reward_score: 150, reward_shards: 2 },
    ContractDef { id: "level", label: "layer break", kind: ContractKind::Level, target: 4.0, reward_score: 190, reward_shards: 3 },
    ContractDef { id: "score", label: "neon sprint", kind: ContractKind::Score, target: 520.0, reward_score: 220, reward_shards: 4 },
];

/// Permanent upgrade identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeId {
    Magnet,
    Shield,
    Combo,
}

/// Purchasable upgrade definition; cost grows linearly with level
#[derive(Debug, Clone, Copy)]
pub struct UpgradeDef {
    pub id: UpgradeId,
    pub label: &'static str,
    pub max: u8,
    pub base_cost: u32,
    pub growth: u32,
}

pub const UPGRADES: [UpgradeDef; 3] = [
    UpgradeDef { id: UpgradeId::Magnet, label: "field extension", max: 3, base_cost: 6, growth: 4 },
    UpgradeDef { id: UpgradeId::Shield, label: "shield reserve", max: 2, base_cost: 9, growth: 6 },
    UpgradeDef { id: UpgradeId::Combo, label: "chain buffer", max: 4, base_cost: 7, growth: 4 },
];

pub fn upgrade_def(id: UpgradeId) -> &'static UpgradeDef {
    match id {
        UpgradeId::Magnet => &UPGRADES[0],
        UpgradeId::Shield => &UPGRADES[1],
        UpgradeId::Combo => &UPGRADES[2],
    }
}

/// Persisted upgrade levels, one slot per [`UpgradeId`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeLevels {
    pub magnet: u8,
    pub shield: u8,
    pub combo: u8,
}

impl UpgradeLevels {
    pub fn get(&self, id: UpgradeId) -> u8 {
        match id {
            UpgradeId::Magnet => self.magnet,
            UpgradeId::Shield => self.shield,
            UpgradeId::Combo => self.combo,
        }
    }

    pub fn bump(&mut self, id: UpgradeId) {
        match id {
            UpgradeId::Magnet => self.magnet += 1,
            UpgradeId::Shield => self.shield += 1,
            UpgradeId::Combo => self.combo += 1,
        }
    }
}

/// Next-level cost for an upgrade at its current level
pub fn upgrade_cost(def: &UpgradeDef, level: u8) -> u32 {
    def.base_cost + u32::from(level) * def.growth
}

/// Special kinds that spawn on independent timers, in timer-slot order
pub const SPECIAL_KINDS: [ItemKind; 4] =
    [ItemKind::Bonus, ItemKind::Toxic, ItemKind::Power, ItemKind::Relic];

/// First-spawn delay per special slot (milliseconds, before protocol rate)
pub const SPECIAL_INITIAL_DELAYS_MS: [f64; 4] = [1800.0, 2400.0, 2800.0, 3600.0];

/// Re-arm range per special slot (inclusive milliseconds, before rate)
pub const fn special_respawn_range(kind: ItemKind) -> (i64, i64) {
    match kind {
        ItemKind::Bonus => (2600, 5200),
        ItemKind::Toxic => (3200, 5600),
        ItemKind::Power => (3000, 5200),
        _ => (4200, 7600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_table_covers_every_kind() {
        for def in &POWERS {
            assert_eq!(power_def(def.kind).kind, def.kind);
        }
    }

    #[test]
    fn contract_pool_ids_are_unique() {
        for (i, a) in CONTRACT_POOL.iter().enumerate() {
            for b in &CONTRACT_POOL[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn upgrade_cost_grows_linearly() {
        let def = upgrade_def(UpgradeId::Magnet);
        assert_eq!(upgrade_cost(def, 0), 6);
        assert_eq!(upgrade_cost(def, 1), 10);
        assert_eq!(upgrade_cost(def, 2), 14);
    }
}
