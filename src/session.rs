//! Game session: fixed-step loop and lifecycle surface
//!
//! Owns the world between invocations and wires it to the collaborators.
//! `advance` consumes real elapsed time and runs zero or more simulation
//! steps, never overlapping; everything outside sees only the returned
//! snapshot. Profile writes happen at lifecycle boundaries (shard grant,
//! level-up, round end, settings and shop interactions), never mid-tick.

use crate::persistence::{Profile, StoreBackend};
use crate::scores::{BestScores, RunSummary, ScoreService};
use crate::sim::{
    self, Direction, GameEvent, GamePhase, Mode, ProtocolId, Snapshot, WorldState,
};
use crate::tuning::{self, UpgradeId};

/// Cap on simulation steps per `advance` call, so a long stall cannot
/// spiral into an unbounded catch-up burst
const MAX_SUBSTEPS: u32 = 8;

/// Longest stretch of real time one `advance` call will absorb
const MAX_FRAME_MS: f64 = 250.0;

pub struct Session {
    world: WorldState,
    profile: Profile,
    store: Box<dyn StoreBackend>,
    scores: Box<dyn ScoreService>,
    /// Remote best-per-mode map, display-only; a failed submission blanks it
    server_best: Option<BestScores>,
    accumulator: f64,
    player: String,
}

impl Session {
    /// Load the profile and build the opening round. `fallback_seed` seeds
    /// the stream when no profile has been stored yet.
    pub fn new(
        store: Box<dyn StoreBackend>,
        scores: Box<dyn ScoreService>,
        player: impl Into<String>,
        fallback_seed: u64,
    ) -> Self {
        let profile = Profile::load(&*store, fallback_seed);
        let world = WorldState::new(
            profile.seed,
            profile.settings.protocol,
            profile.settings.mode,
            profile.upgrades,
        );
        Self {
            world,
            profile,
            store,
            scores,
            server_best: None,
            accumulator: 0.0,
            player: player.into(),
        }
    }

    /// Consume elapsed wall time, run due simulation steps, and return the
    /// post-batch snapshot
    pub fn advance(&mut self, elapsed_ms: f64) -> Snapshot {
        if self.world.phase == GamePhase::Running {
            let step_ms = 1000.0 / sim::current_speed(&self.world);
            self.accumulator += elapsed_ms.min(MAX_FRAME_MS);
            let mut substeps = 0;
            while self.accumulator >= step_ms && substeps < MAX_SUBSTEPS {
                sim::step(&mut self.world, step_ms);
                self.accumulator -= step_ms;
                substeps += 1;
                if self.world.phase != GamePhase::Running {
                    // terminal transition mid-batch: drop the remainder
                    self.accumulator = 0.0;
                    break;
                }
            }
        }

        let events = self.world.take_events();
        self.apply_events(&events);
        self.snapshot(events)
    }

    /// Start action; rebuilds first when the previous round ended
    pub fn start(&mut self) {
        self.world.start();
    }

    pub fn toggle_pause(&mut self) {
        self.world.toggle_pause();
    }

    /// Reinitialize the world, continuing the RNG stream. With
    /// `keep_overlay` the READY notification is suppressed (used when a
    /// start action resets implicitly).
    pub fn reset(&mut self, keep_overlay: bool) {
        let seed = self.world.rng.state();
        self.world = WorldState::new(
            seed,
            self.profile.settings.protocol,
            self.profile.settings.mode,
            self.profile.upgrades,
        );
        self.accumulator = 0.0;
        if !keep_overlay {
            self.world.push_event(GameEvent::RoundReset);
        }
    }

    /// Queue a heading by name; unknown names are silently ignored
    pub fn set_direction(&mut self, name: &str) {
        if let Some(dir) = Direction::from_name(name) {
            self.world.queue_direction(dir);
        }
    }

    /// Switch rule variant: persisted, then a fresh round
    pub fn set_mode(&mut self, mode: Mode) {
        self.profile.settings.mode = mode;
        self.save_profile();
        self.reset(false);
    }

    /// Switch ruleset: persisted, then a fresh round
    pub fn set_protocol(&mut self, protocol: ProtocolId) {
        self.profile.settings.protocol = protocol;
        self.save_profile();
        self.reset(false);
    }

    /// Spend shards on a permanent upgrade. The world's upgrade snapshot
    /// refreshes here, at the shop boundary.
    pub fn purchase_upgrade(&mut self, id: UpgradeId) -> bool {
        let def = tuning::upgrade_def(id);
        let level = self.profile.upgrades.get(id);
        if level >= def.max {
            return false;
        }
        let cost = tuning::upgrade_cost(def, level);
        if self.profile.shards < cost {
            return false;
        }
        self.profile.shards -= cost;
        self.profile.upgrades.bump(id);
        self.save_profile();
        self.world.upgrades = self.profile.upgrades;
        log::info!("purchased {} (level {})", def.label, level + 1);
        true
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn server_best(&self) -> Option<&BestScores> {
        self.server_best.as_ref()
    }

    /// Fold batch side effects into the profile at their write boundaries
    fn apply_events(&mut self, events: &[GameEvent]) {
        let mut dirty = false;
        for event in events {
            match event {
                GameEvent::ShardsGranted { amount } => {
                    self.profile.shards += amount;
                    dirty = true;
                }
                GameEvent::LevelUp { level } => {
                    if *level > self.profile.max_level {
                        self.profile.max_level = *level;
                        dirty = true;
                    }
                }
                GameEvent::GameOver { .. } => {
                    self.finish_run();
                    dirty = true;
                }
                _ => {}
            }
        }
        if dirty {
            self.save_profile();
        }
    }

    /// Round end: record the local best and report the run, fire-and-forget
    fn finish_run(&mut self) {
        self.profile.best.record(self.world.mode, self.world.score);

        let contracts_completed =
            self.world.contracts.iter().filter(|c| c.done).count() as u32;
        let summary = RunSummary {
            username: self.player.clone(),
            mode: self.world.mode,
            score: self.world.score,
            level: self.world.level,
            duration: self.world.step_count,
            seed: self.world.rng.state(),
            protocol: self.world.protocol,
            skin: self.profile.settings.skin,
            shards_earned: self.world.run_shards,
            contracts_completed,
            contracts_total: self.world.contracts.len() as u32,
            lives: self.world.lives,
            time_left: self.world.time_left,
            multiplier: self.world.multiplier,
            combo: self.world.combo,
            upgrades: self.profile.upgrades,
        };
        self.server_best = self.scores.submit(&summary);
    }

    fn save_profile(&mut self) {
        self.profile.seed = self.world.rng.state();
        self.profile.save(&mut *self.store);
    }

    fn snapshot(&self, events: Vec<GameEvent>) -> Snapshot {
        Snapshot::capture(
            &self.world,
            self.profile.shards,
            self.profile.best.for_mode(self.world.mode),
            self.server_best.as_ref(),
            events,
        )
    }
}
