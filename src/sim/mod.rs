//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, audio, or storage dependencies
//!
//! Observers read [`Snapshot`]s; lifecycle calls on [`WorldState`] are the
//! only external writes.

pub mod contract;
pub mod grid;
pub mod level;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use rng::Lcg;
pub use snapshot::{EffectView, ItemView, MoverView, PortalView, Snapshot};
pub use state::{
    Contract, ContractKind, Direction, EffectKind, Effects, GameEvent, GameOverReason, GamePhase,
    Item, ItemKind, Mode, Mover, PortalPair, PowerKind, ProtocolId, WorldState,
};
pub use tick::{current_speed, step};
