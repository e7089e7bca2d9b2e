//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One tick per host frame
//! - Seeded RNG only; terrain is a pure function of coordinates
//! - Stable iteration order (entity insertion order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod combat;
pub mod loot;
pub mod progression;
pub mod spatial;
pub mod spells;
pub mod state;
pub mod terrain;
pub mod tick;

pub use combat::{CastOutcome, CastRejection, cast_spell};
pub use progression::PotionRejection;
pub use spatial::{find_blocker, is_position_valid};
pub use spells::SpellKind;
pub use state::{
    Archetype, BaseStat, Enemy, EntityId, EquipmentItem, EquipmentSlot, GameState, Loot, LootKind,
    Player, PotionKind, Projectile, Quest, QuestKind, Rarity, Talent,
};
pub use terrain::{TileData, tile_at};
pub use tick::{Intent, Snapshot, TickInput, tick};
