//! Bounded grid helpers
//!
//! Integer cell space shared by every entity. Placement uses bounded
//! rejection sampling: callers must treat `None` as "no room right now",
//! not as an error.

use std::collections::HashSet;

use glam::IVec2;

use super::rng::Lcg;
use crate::consts::{COLS, PLACEMENT_ATTEMPTS, ROWS};

/// Cardinal unit vectors, in draw order: right, left, down, up
pub const CARDINALS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
];

pub fn contains(cell: IVec2) -> bool {
    cell.x >= 0 && cell.y >= 0 && cell.x < COLS && cell.y < ROWS
}

pub fn center() -> IVec2 {
    IVec2::new(COLS / 2, ROWS / 2)
}

/// Wrap a coordinate back onto the grid (ghost traversal)
pub fn wrap(cell: IVec2) -> IVec2 {
    cell.rem_euclid(IVec2::new(COLS, ROWS))
}

pub fn manhattan(a: IVec2, b: IVec2) -> i32 {
    let d = a - b;
    d.x.abs() + d.y.abs()
}

/// Rejection-sample an unoccupied cell, giving up after a fixed number of
/// attempts so a crowded board degrades to a skipped spawn
pub fn random_empty_cell(rng: &mut Lcg, occupied: &HashSet<IVec2>) -> Option<IVec2> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let cell = IVec2::new(
            rng.pick_int(0, i64::from(COLS - 1)) as i32,
            rng.pick_int(0, i64::from(ROWS - 1)) as i32,
        );
        if !occupied.contains(&cell) {
            return Some(cell);
        }
    }
    None
}
