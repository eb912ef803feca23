//! Read-only presentation snapshot
//!
//! Built once per tick batch and handed outward. Drawing, HUD, and audio
//! consume this; nothing in it feeds back into the simulation.

use glam::IVec2;
use serde::Serialize;

use super::state::{
    Contract, EffectKind, GameEvent, GameOverReason, GamePhase, ItemKind, Mode, PowerKind,
    ProtocolId, WorldState, EFFECT_KINDS,
};
use super::tick;
use crate::scores::BestScores;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ItemView {
    pub pos: IVec2,
    pub kind: ItemKind,
    pub power: Option<PowerKind>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MoverView {
    pub pos: IVec2,
    pub vel: IVec2,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PortalView {
    pub a: IVec2,
    pub b: IVec2,
}

/// One active timed effect for the HUD list
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub remaining_ms: f64,
}

/// Immutable view of the world after a tick batch
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub over_reason: Option<GameOverReason>,
    pub mode: Mode,
    pub protocol: ProtocolId,
    pub score: u32,
    pub level: u32,
    pub speed: f64,
    pub multiplier: u32,
    pub combo: u32,
    pub lives: u32,
    pub time_left: f64,
    pub shield: u32,
    pub snake: Vec<IVec2>,
    pub items: Vec<ItemView>,
    pub obstacles: Vec<IVec2>,
    pub movers: Vec<MoverView>,
    pub portals: Vec<PortalView>,
    pub effects: Vec<EffectView>,
    pub contracts: Vec<Contract>,
    /// Persistent shard balance (committed)
    pub shards: u32,
    /// Shards earned during the current round
    pub run_shards: u32,
    /// Local best score for the current mode
    pub best: u32,
    /// Remote best score for the current mode, display-only
    pub server_best: Option<u32>,
    /// Side effects since the previous snapshot
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn capture(
        world: &WorldState,
        shards: u32,
        best: u32,
        server_best: Option<&BestScores>,
        events: Vec<GameEvent>,
    ) -> Self {
        Self {
            phase: world.phase,
            over_reason: world.over_reason,
            mode: world.mode,
            protocol: world.protocol,
            score: world.score,
            level: world.level,
            speed: tick::current_speed(world),
            multiplier: world.multiplier,
            combo: world.combo,
            lives: world.lives,
            time_left: world.time_left,
            shield: world.shield,
            snake: world.snake.iter().copied().collect(),
            items: world
                .items
                .iter()
                .map(|i| ItemView { pos: i.pos, kind: i.kind, power: i.power })
                .collect(),
            obstacles: world.obstacles.clone(),
            movers: world
                .movers
                .iter()
                .map(|m| MoverView { pos: m.pos, vel: m.vel })
                .collect(),
            portals: world
                .portals
                .iter()
                .map(|p| PortalView { a: p.a, b: p.b })
                .collect(),
            effects: EFFECT_KINDS
                .iter()
                .filter(|&&kind| world.effects.active(kind))
                .map(|&kind| EffectView { kind, remaining_ms: world.effects.remaining(kind) })
                .collect(),
            contracts: world.contracts.clone(),
            shards,
            run_shards: world.run_shards,
            best,
            server_best: server_best.map(|b| b.for_mode(world.mode)),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Mode, ProtocolId};
    use crate::tuning::UpgradeLevels;

    #[test]
    fn capture_reflects_world_fields() {
        let mut world =
            WorldState::new(55, ProtocolId::Steady, Mode::Survival, UpgradeLevels::default());
        world.effects.refresh(EffectKind::Magnet, 4000.0);
        let snap = Snapshot::capture(&world, 12, 340, None, Vec::new());
        assert_eq!(snap.snake.len(), world.snake.len());
        assert_eq!(snap.lives, 3);
        assert_eq!(snap.shards, 12);
        assert_eq!(snap.best, 340);
        assert_eq!(snap.server_best, None);
        assert_eq!(snap.effects.len(), 1);
        assert_eq!(snap.effects[0].remaining_ms, 4000.0);
    }

    #[test]
    fn snapshot_serializes() {
        let world =
            WorldState::new(55, ProtocolId::Sync, Mode::Classic, UpgradeLevels::default());
        let snap = Snapshot::capture(&world, 0, 0, None, Vec::new());
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"phase\""));
        assert!(json.contains("\"snake\""));
    }
}
