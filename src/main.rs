//! Neon Snake entry point
//!
//! Headless harness: an autopilot steers the simulation for a stretch of
//! simulated time, logging HUD lines and round results. Useful for soak
//! runs and for watching balance changes without a renderer.
//!
//! Usage: `neon-snake [seconds] [seed]`

use std::time::{SystemTime, UNIX_EPOCH};

use glam::IVec2;

use neon_snake::Session;
use neon_snake::persistence::FileStore;
use neon_snake::scores::LocalScoreService;
use neon_snake::sim::{GameEvent, GamePhase, ItemKind, Snapshot, grid};

/// Simulated frame pacing fed to the accumulator
const FRAME_MS: f64 = 16.0;

const DIRECTIONS: [(&str, IVec2); 4] = [
    ("up", IVec2::new(0, -1)),
    ("down", IVec2::new(0, 1)),
    ("left", IVec2::new(-1, 0)),
    ("right", IVec2::new(1, 0)),
];

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seconds: f64 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(60.0);
    let seed: u64 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or_else(entropy_seed);

    let data_dir = std::env::var("NEON_SNAKE_DATA").unwrap_or_else(|_| "data".to_string());
    let mut session = Session::new(
        Box::new(FileStore::new(data_dir)),
        Box::new(LocalScoreService::new()),
        "autopilot",
        seed,
    );

    log::info!("autopilot run: {seconds}s of simulated time, seed {seed}");
    session.start();

    let total_ms = seconds * 1000.0;
    let mut elapsed = 0.0;
    let mut next_hud = 1000.0;
    let mut rounds: u32 = 1;
    let mut final_snap: Option<Snapshot> = None;

    while elapsed < total_ms {
        let snap = session.advance(FRAME_MS);
        elapsed += FRAME_MS;

        for event in &snap.events {
            match event {
                GameEvent::LevelUp { level } => log::info!("level up -> {level}"),
                GameEvent::ContractCompleted { id } => log::info!("contract '{id}' done"),
                GameEvent::GameOver { reason } => log::info!("round over: {reason:?}"),
                _ => {}
            }
        }

        match snap.phase {
            GamePhase::Running => {
                if let Some(dir) = choose_direction(&snap) {
                    session.set_direction(dir);
                }
            }
            GamePhase::GameOver => {
                final_snap = Some(snap);
                if elapsed + 1000.0 < total_ms {
                    session.start();
                    rounds += 1;
                }
                continue;
            }
            _ => {}
        }

        if elapsed >= next_hud {
            log::info!(
                "t={:>4.0}s score {} level {} len {} combo {} x{}",
                elapsed / 1000.0,
                snap.score,
                snap.level,
                snap.snake.len(),
                snap.combo,
                snap.multiplier
            );
            next_hud += 1000.0;
        }

        final_snap = Some(snap);
    }

    if let Some(snap) = final_snap {
        println!(
            "{} round(s) played; last: score {} level {} shards {} best {}",
            rounds, snap.score, snap.level, snap.shards, snap.best
        );
    }
}

/// Greedy steering: head toward the nearest worthwhile item along a safe
/// cardinal, staying put on the current heading when nothing is safe
fn choose_direction(snap: &Snapshot) -> Option<&'static str> {
    let head = *snap.snake.first()?;
    let target = snap
        .items
        .iter()
        .filter(|item| item.kind != ItemKind::Toxic)
        .min_by_key(|item| grid::manhattan(item.pos, head))?
        .pos;

    let mut best: Option<(&'static str, i32)> = None;
    for (name, vec) in DIRECTIONS {
        let next = head + vec;
        if !grid::contains(next) || blocked(snap, next) {
            continue;
        }
        let distance = grid::manhattan(next, target);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((name, distance));
        }
    }
    best.map(|(name, _)| name)
}

fn blocked(snap: &Snapshot, cell: IVec2) -> bool {
    snap.obstacles.contains(&cell)
        || snap.movers.iter().any(|m| m.pos == cell)
        || snap.snake.contains(&cell)
}

fn entropy_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64 % 100_000)
        .unwrap_or(1)
}
