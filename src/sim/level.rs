//! Procedural level geometry
//!
//! Rebuilds obstacles, movers, and portal pairs for the current level.
//! Placement draws from the shared RNG in a fixed order so a seed fully
//! determines the board. Running out of room terminates a placement phase
//! early: a partially populated level is a legal outcome.

use std::collections::HashSet;

use glam::IVec2;

use super::grid::{self, CARDINALS};
use super::state::{Mover, PortalPair, WorldState};
use crate::consts::SAFE_ZONE_RADIUS;
use crate::tuning;

/// Rebuild level geometry wholesale. Items are cleared too; the next tick's
/// food guarantee restocks the board.
pub fn build_level(world: &mut WorldState) {
    world.obstacles.clear();
    world.movers.clear();
    world.portals.clear();
    world.items.clear();

    let proto = tuning::protocol(world.protocol);
    let level = world.level as i32;
    let obstacle_count = (5 + level * 2 + proto.hazard).clamp(0, 40);
    let mover_count = (level / 3 + proto.mover).clamp(0, 6);
    let portal_pairs = if level >= 3 { 1 + (level - 3) / 4 } else { 0 };

    log::info!(
        "level {} rebuild: {} obstacles, {} movers, {} portal pairs",
        world.level,
        obstacle_count,
        mover_count,
        portal_pairs
    );

    // Reserve the snake plus a safe zone around the spawn cell before
    // anything is placed
    let mut occupied: HashSet<IVec2> = world.snake.iter().copied().collect();
    let center = grid::center();
    for dx in -SAFE_ZONE_RADIUS..=SAFE_ZONE_RADIUS {
        for dy in -SAFE_ZONE_RADIUS..=SAFE_ZONE_RADIUS {
            let cell = center + IVec2::new(dx, dy);
            if grid::contains(cell) {
                occupied.insert(cell);
            }
        }
    }

    for _ in 0..obstacle_count {
        let Some(cell) = grid::random_empty_cell(&mut world.rng, &occupied) else {
            break;
        };
        world.obstacles.push(cell);
        occupied.insert(cell);
    }

    for _ in 0..mover_count {
        let Some(cell) = grid::random_empty_cell(&mut world.rng, &occupied) else {
            break;
        };
        let vel = *world.rng.choice(&CARDINALS);
        world.movers.push(Mover { pos: cell, vel });
        occupied.insert(cell);
    }

    for _ in 0..portal_pairs {
        let Some(a) = grid::random_empty_cell(&mut world.rng, &occupied) else {
            break;
        };
        occupied.insert(a);
        let Some(b) = grid::random_empty_cell(&mut world.rng, &occupied) else {
            break;
        };
        occupied.insert(b);
        world.portals.push(PortalPair { a, b });
    }
}
