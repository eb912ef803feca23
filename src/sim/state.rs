//! World state and core simulation types
//!
//! Everything a round needs lives in one aggregate owned by the tick loop.
//! Observers get read-only snapshots; lifecycle calls are the only writes
//! from outside.

use std::collections::VecDeque;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::rng::Lcg;
use super::{contract, grid, level, tick};
use crate::consts::*;
use crate::tuning::{self, Ttl, UpgradeLevels};

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Freshly initialized, waiting for the start action
    Ready,
    /// Active gameplay
    Running,
    /// Suspended mid-round
    Paused,
    /// Round ended
    GameOver,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Unabsorbed wall/body/obstacle/mover hit
    Collision,
    /// Time mode clock ran out
    TimeExpired,
}

/// Ruleset selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolId {
    #[default]
    Steady,
    Surge,
    Sync,
}

impl ProtocolId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolId::Steady => "steady",
            ProtocolId::Surge => "surge",
            ProtocolId::Sync => "sync",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "steady" => Some(ProtocolId::Steady),
            "surge" => Some(ProtocolId::Surge),
            "sync" => Some(ProtocolId::Sync),
            _ => None,
        }
    }
}

/// Rule variant for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Classic,
    /// Three lives, in-place respawn
    Survival,
    /// Countdown clock, bonus items add time
    Time,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Classic => "classic",
            Mode::Survival => "survival",
            Mode::Time => "time",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Mode::Classic),
            "survival" => Some(Mode::Survival),
            "time" => Some(Mode::Time),
            _ => None,
        }
    }
}

/// Heading of the snake; reversals are rejected at queue time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn vector(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.vector() == -other.vector()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Item categories on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Food,
    Bonus,
    Toxic,
    Power,
    Relic,
}

/// Power pickup sub-kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerKind {
    Speed,
    Slow,
    Shield,
    Ghost,
    Magnet,
    Multiplier,
    Rainbow,
}

/// A spawned pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub pos: IVec2,
    pub kind: ItemKind,
    /// Set only for `ItemKind::Power`
    pub power: Option<PowerKind>,
    pub ttl: Ttl,
}

/// A patrolling hazard; reverses on blocked destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mover {
    pub pos: IVec2,
    pub vel: IVec2,
}

/// Two linked teleport endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalPair {
    pub a: IVec2,
    pub b: IVec2,
}

impl PortalPair {
    /// Exit cell when entering at `pos`, if `pos` is one of the endpoints
    pub fn exit_for(&self, pos: IVec2) -> Option<IVec2> {
        if pos == self.a {
            Some(self.b)
        } else if pos == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn covers(&self, pos: IVec2) -> bool {
        pos == self.a || pos == self.b
    }
}

/// Timed status effects, index-addressed so the per-tick decay never walks
/// string keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Speed,
    Slow,
    Ghost,
    Magnet,
    Multiplier,
    Rainbow,
}

pub const EFFECT_KINDS: [EffectKind; 6] = [
    EffectKind::Speed,
    EffectKind::Slow,
    EffectKind::Ghost,
    EffectKind::Magnet,
    EffectKind::Multiplier,
    EffectKind::Rainbow,
];

/// Remaining duration per effect, milliseconds, floored at zero
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Effects {
    remaining: [f64; 6],
}

impl Effects {
    pub fn remaining(&self, kind: EffectKind) -> f64 {
        self.remaining[kind as usize]
    }

    pub fn active(&self, kind: EffectKind) -> bool {
        self.remaining[kind as usize] > 0.0
    }

    /// Refresh to the longer of the current and the new duration
    pub fn refresh(&mut self, kind: EffectKind, duration_ms: f64) {
        let slot = &mut self.remaining[kind as usize];
        *slot = slot.max(duration_ms);
    }

    pub fn decay(&mut self, elapsed_ms: f64) {
        for slot in &mut self.remaining {
            if *slot > 0.0 {
                *slot = (*slot - elapsed_ms).max(0.0);
            }
        }
    }
}

/// Contract objective categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Eat,
    Bonus,
    Power,
    Portal,
    Combo,
    Survive,
    Level,
    Score,
}

/// A drawn mission with live progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contract {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: ContractKind,
    pub target: f64,
    pub progress: f64,
    pub reward_score: u32,
    pub reward_shards: u32,
    pub done: bool,
}

/// Side effects the presentation/audio layers key off; drained per tick batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    LevelUp { level: u32 },
    PortalTransit { to: IVec2 },
    ItemConsumed { kind: ItemKind, power: Option<PowerKind> },
    PowerActivated { power: PowerKind },
    ShardsGranted { amount: u32 },
    ContractCompleted { id: &'static str },
    ShieldAbsorbed,
    Respawned,
    /// Fresh world after an explicit reset; presentation shows the READY card
    RoundReset,
    GameOver { reason: GameOverReason },
}

/// Complete round state, owned by the tick loop between invocations
#[derive(Debug, Clone)]
pub struct WorldState {
    pub rng: Lcg,
    pub mode: Mode,
    pub protocol: ProtocolId,
    /// Snapshot of the persisted upgrade levels, refreshed at shop
    /// interactions
    pub upgrades: UpgradeLevels,
    pub phase: GamePhase,
    pub over_reason: Option<GameOverReason>,
    pub score: u32,
    pub level: u32,
    pub lives: u32,
    /// Time mode clock, seconds
    pub time_left: f64,
    pub combo: u32,
    /// Rolling combo window, milliseconds
    pub combo_timer: f64,
    pub multiplier: u32,
    /// Pending growth credit consumed on successful moves
    pub growth: u32,
    pub shield: u32,
    pub portal_cooldown: u32,
    pub step_count: u64,
    /// Shards earned this round, committed by the session layer
    pub run_shards: u32,
    pub effects: Effects,
    pub direction: Direction,
    pub next_direction: Direction,
    /// Head first; never shorter than `MIN_SNAKE_LEN`
    pub snake: VecDeque<IVec2>,
    pub items: Vec<Item>,
    pub obstacles: Vec<IVec2>,
    pub movers: Vec<Mover>,
    pub portals: Vec<PortalPair>,
    /// Per-kind spawn countdowns, slot order matching `SPECIAL_KINDS`
    pub special_timers: [f64; 4],
    pub contracts: Vec<Contract>,
    pub events: Vec<GameEvent>,
}

impl WorldState {
    /// Build a fresh round. RNG consumption order is fixed: contract draw,
    /// then level geometry, then the food guarantee.
    pub fn new(seed: u64, protocol: ProtocolId, mode: Mode, upgrades: UpgradeLevels) -> Self {
        let proto = tuning::protocol(protocol);
        let mut timers = tuning::SPECIAL_INITIAL_DELAYS_MS;
        for t in &mut timers {
            *t *= proto.special_rate;
        }

        let mut world = Self {
            rng: Lcg::new(seed),
            mode,
            protocol,
            upgrades,
            phase: GamePhase::Ready,
            over_reason: None,
            score: 0,
            level: 1,
            lives: if mode == Mode::Survival { SURVIVAL_LIVES } else { 0 },
            time_left: if mode == Mode::Time { TIME_LIMIT_SECS } else { 0.0 },
            combo: 0,
            combo_timer: 0.0,
            multiplier: 1,
            growth: 0,
            shield: start_shield(protocol, &upgrades),
            portal_cooldown: 0,
            step_count: 0,
            run_shards: 0,
            effects: Effects::default(),
            direction: Direction::Right,
            next_direction: Direction::Right,
            snake: spawn_snake(),
            items: Vec::new(),
            obstacles: Vec::new(),
            movers: Vec::new(),
            portals: Vec::new(),
            special_timers: timers,
            contracts: Vec::new(),
            events: Vec::new(),
        };

        world.contracts = contract::draw(&mut world.rng);
        level::build_level(&mut world);
        tick::ensure_food(&mut world);
        world
    }

    /// Start action: runs the round, rebuilding first when the previous one
    /// ended
    pub fn start(&mut self) {
        match self.phase {
            GamePhase::Ready | GamePhase::Paused => self.phase = GamePhase::Running,
            GamePhase::GameOver => {
                *self = Self::new(self.rng.state(), self.protocol, self.mode, self.upgrades);
                self.phase = GamePhase::Running;
            }
            GamePhase::Running => {}
        }
    }

    /// Pause toggle, valid only while running or paused
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => self.phase = GamePhase::Paused,
            GamePhase::Paused => self.phase = GamePhase::Running,
            _ => {}
        }
    }

    /// Queue a heading change; exact reversals are silently dropped
    pub fn queue_direction(&mut self, dir: Direction) {
        if !dir.is_opposite(self.direction) {
            self.next_direction = dir;
        }
    }

    /// Rebuild the snake in place after a survival life is spent
    pub fn respawn_snake(&mut self) {
        self.snake = spawn_snake();
        self.direction = Direction::Right;
        self.next_direction = Direction::Right;
        self.growth = 0;
    }

    /// Union of every occupied cell, computed on demand
    pub fn occupied_cells(&self) -> std::collections::HashSet<IVec2> {
        let mut occupied = std::collections::HashSet::new();
        occupied.extend(self.snake.iter().copied());
        occupied.extend(self.obstacles.iter().copied());
        occupied.extend(self.movers.iter().map(|m| m.pos));
        occupied.extend(self.items.iter().map(|i| i.pos));
        for portal in &self.portals {
            occupied.insert(portal.a);
            occupied.insert(portal.b);
        }
        occupied
    }

    /// Whether `cell` is taken by anything, optionally ignoring one item slot
    pub fn cell_occupied(&self, cell: IVec2, ignore_item: Option<usize>) -> bool {
        self.snake.iter().any(|&s| s == cell)
            || self.obstacles.contains(&cell)
            || self.movers.iter().any(|m| m.pos == cell)
            || self.portals.iter().any(|p| p.covers(cell))
            || self
                .items
                .iter()
                .enumerate()
                .any(|(i, item)| Some(i) != ignore_item && item.pos == cell)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Initial 3-segment snake at grid center, heading right
fn spawn_snake() -> VecDeque<IVec2> {
    let center = grid::center();
    VecDeque::from([
        center,
        center - IVec2::new(1, 0),
        center - IVec2::new(2, 0),
    ])
}

/// Starting shield charges from upgrades plus the protocol grant
fn start_shield(protocol: ProtocolId, upgrades: &UpgradeLevels) -> u32 {
    let base = i32::from(upgrades.shield) + tuning::protocol(protocol).shield;
    base.clamp(0, SHIELD_CAP as i32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_world_matches_round_shape() {
        let world = WorldState::new(1234, ProtocolId::Steady, Mode::Classic, UpgradeLevels::default());
        assert_eq!(world.phase, GamePhase::Ready);
        assert_eq!(world.snake.len(), 3);
        assert_eq!(world.snake[0], grid::center());
        assert_eq!(world.direction, Direction::Right);
        assert_eq!(world.contracts.len(), 2);
        assert_ne!(world.contracts[0].id, world.contracts[1].id);
        // steady grants one shield charge
        assert_eq!(world.shield, 1);
        // at least one food item always exists
        assert!(world.items.iter().any(|i| i.kind == ItemKind::Food));
    }

    #[test]
    fn mode_setup() {
        let survival =
            WorldState::new(1, ProtocolId::Surge, Mode::Survival, UpgradeLevels::default());
        assert_eq!(survival.lives, 3);
        assert_eq!(survival.time_left, 0.0);

        let timed = WorldState::new(1, ProtocolId::Surge, Mode::Time, UpgradeLevels::default());
        assert_eq!(timed.lives, 0);
        assert_eq!(timed.time_left, TIME_LIMIT_SECS);
    }

    #[test]
    fn start_shield_is_clamped() {
        let upgrades = UpgradeLevels { shield: 2, ..Default::default() };
        // steady adds +1 on top of the two upgrade charges
        let world = WorldState::new(9, ProtocolId::Steady, Mode::Classic, upgrades);
        assert_eq!(world.shield, 3);
        // surge grants none
        let world = WorldState::new(9, ProtocolId::Surge, Mode::Classic, UpgradeLevels::default());
        assert_eq!(world.shield, 0);
    }

    #[test]
    fn reversal_requests_are_dropped() {
        let mut world =
            WorldState::new(3, ProtocolId::Steady, Mode::Classic, UpgradeLevels::default());
        world.queue_direction(Direction::Left);
        assert_eq!(world.next_direction, Direction::Right);
        world.queue_direction(Direction::Up);
        assert_eq!(world.next_direction, Direction::Up);
    }

    #[test]
    fn pause_toggle_only_from_active_states() {
        let mut world =
            WorldState::new(3, ProtocolId::Steady, Mode::Classic, UpgradeLevels::default());
        world.toggle_pause();
        assert_eq!(world.phase, GamePhase::Ready);
        world.start();
        world.toggle_pause();
        assert_eq!(world.phase, GamePhase::Paused);
        world.toggle_pause();
        assert_eq!(world.phase, GamePhase::Running);
    }

    #[test]
    fn start_after_game_over_rebuilds() {
        let mut world =
            WorldState::new(3, ProtocolId::Steady, Mode::Classic, UpgradeLevels::default());
        world.start();
        world.score = 500;
        world.phase = GamePhase::GameOver;
        world.start();
        assert_eq!(world.phase, GamePhase::Running);
        assert_eq!(world.score, 0);
        assert_eq!(world.snake.len(), 3);
    }

    #[test]
    fn effects_refresh_keeps_longer_duration() {
        let mut effects = Effects::default();
        effects.refresh(EffectKind::Ghost, 5000.0);
        effects.refresh(EffectKind::Ghost, 2000.0);
        assert_eq!(effects.remaining(EffectKind::Ghost), 5000.0);
        effects.decay(1500.0);
        assert_eq!(effects.remaining(EffectKind::Ghost), 3500.0);
        effects.decay(10_000.0);
        assert!(!effects.active(EffectKind::Ghost));
    }
}
