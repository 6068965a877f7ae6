//! Core domain types shared across the Usion arena server: ids, the input
//! snapshot, ships, projectiles, pickups, effects and the world they live in.
//!
//! This crate has no network, async, or persistence concerns — it is pure
//! data plus the small invariant-preserving helpers that belong with it
//! (bounded position history, special-weapon use counters). The simulation
//! algorithm that mutates a [`world::World`] tick by tick lives in
//! `usion-sim`; the wire projection of these types lives in `usion-net`.

pub mod effect;
pub mod ids;
pub mod input;
pub mod pickup;
pub mod projectile;
pub mod ship;
pub mod world;

pub use effect::{Effect, EffectKind};
pub use ids::{PickupId, ProjectileId, RoomId, SessionId, UserId};
pub use input::InputSnapshot;
pub use pickup::{Pickup, PickupType};
pub use projectile::{Projectile, ProjectileKind};
pub use ship::{PlayerStats, PositionHistory, Ship, SpecialWeapon, POSITION_HISTORY_CAPACITY};
pub use world::{seed_from_room_id, Arena, Phase, TerminationReason, World, ARENA_EXTENT, ROUND_DURATION_MS};
