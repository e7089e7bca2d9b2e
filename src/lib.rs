//! Wildcaster - simulation core of a top-down action-survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, movement, combat, AI, progression)
//! - `settings`: Session configuration (seed, snapshot cadence, spawner)

pub mod settings;
pub mod sim;

pub use settings::SimSettings;

use glam::Vec2;

/// Game configuration constants
///
/// Durations are in ticks (the host drives one tick per animation frame, ~60 Hz).
/// Distances are in world tiles.
pub mod consts {
    /// Nominal tick rate the balance numbers were tuned for
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Host frame duration at the nominal rate (seconds)
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;

    /// Isometric tile footprint in screen pixels
    pub const TILE_WIDTH: f32 = 48.0;
    pub const TILE_HEIGHT: f32 = 24.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 0.4;
    pub const PLAYER_START_HP: f32 = 100.0;
    pub const PLAYER_START_MANA: f32 = 100.0;
    pub const PLAYER_START_SHIELD: f32 = 50.0;
    pub const PLAYER_BASE_SPEED: f32 = 1.8;
    /// Screen-space speed scale applied to the summed base + equipment speed
    pub const PLAYER_PIXEL_SPEED_SCALE: f32 = 2.5;
    pub const MOUNT_SPEED_MULT: f32 = 2.0;
    pub const START_TO_NEXT_LEVEL: u32 = 100;
    pub const LEVEL_XP_GROWTH: f32 = 1.5;
    pub const LEVEL_HP_GRANT: f32 = 20.0;
    pub const LEVEL_SHIELD_GRANT: f32 = 10.0;

    /// Shield regenerates only after this many ticks without damage
    pub const SHIELD_COOLDOWN: u32 = 180;
    pub const SHIELD_REGEN_RATE: f32 = 0.5;
    pub const MANA_REGEN: f32 = 0.2;

    /// Level gates
    pub const LEVEL_5_UNLOCK: u32 = 5;
    pub const LEVEL_7_UNLOCK: u32 = 7;
    /// First level that unlocks a spell; later unlocks every second level
    pub const SPELL_UNLOCK_START_LEVEL: u32 = 3;

    /// Global cooldown never drops below this fraction of the base cooldown
    pub const MIN_COOLDOWN_MULT: f32 = 0.2;
    /// Angular step between fanned projectiles (radians)
    pub const MULTISHOT_SPREAD: f32 = 0.2;
    /// Spell speed units to world tiles per tick
    pub const PROJECTILE_SPEED_SCALE: f32 = 0.05;
    pub const PROJECTILE_RADIUS: f32 = 0.26;
    pub const PROJECTILE_LIFE: u32 = 180;
    pub const SHRAPNEL_RADIUS: f32 = 0.2;
    pub const SHRAPNEL_LIFE: u32 = 30;
    pub const ENEMY_BOLT_SPEED: f32 = 0.15;
    pub const ENEMY_BOLT_LIFE: u32 = 120;
    /// A lobbed bomb detonates once this close to its target point
    pub const BOMB_ARRIVAL_DISTANCE: f32 = 0.2;

    /// Enemy defaults
    pub const ENEMY_RADIUS: f32 = 0.8;
    pub const ENEMY_BASE_SPEED: f32 = 1.3;
    pub const ENEMY_SPAWN_RATE: u32 = 260;
    pub const ENEMY_MIN_SPAWN_RATE: u32 = 40;
    pub const ENEMY_SPAWN_DISTANCE: f32 = 14.0;
    pub const MAX_ENEMIES: usize = 25;
    /// Enemy speed units to world tiles per tick
    pub const ENEMY_MOVE_SCALE: f32 = 0.03;
    pub const ENEMY_RETREAT_SCALE: f32 = 0.02;
    pub const MELEE_CONTACT_DAMAGE: f32 = 0.5;
    pub const CASTER_HP: f32 = 40.0;
    pub const CASTER_SPEED: f32 = 1.2;
    pub const CASTER_DAMAGE: f32 = 10.0;
    pub const CASTER_RANGE: f32 = 8.0;
    pub const CASTER_RANGE_BUFFER: f32 = 2.0;
    pub const CASTER_COOLDOWN: u32 = 120;
    pub const CASTER_CHANCE: f64 = 0.3;

    /// Stuck detection / phasing
    pub const STUCK_CHECK_INTERVAL: u32 = 60;
    pub const STUCK_DISTANCE: f32 = 0.5;
    pub const STUCK_STREAK_LIMIT: u32 = 3;
    pub const ENEMY_PHASE_DURATION: u32 = 120;

    /// Loot
    pub const LOOT_DROP_CHANCE: f64 = 0.20;
    pub const EQUIPMENT_SHARE: f64 = 0.3;
    pub const LOOT_LIFE: u32 = 600;
    pub const COIN_VALUE_MIN: u32 = 1;
    pub const COIN_VALUE_MAX: u32 = 5;
    pub const COIN_RADIUS: f32 = 0.2;
    pub const DROP_RADIUS: f32 = 0.3;
    pub const COIN_SCATTER: f32 = 1.5;
    pub const COIN_MAGNET_RANGE: f32 = 4.0;
    pub const COIN_MAGNET_SPEED: f32 = 0.2;
    pub const PICKUP_MARGIN: f32 = 0.5;

    /// Potions
    pub const POTION_START_CHARGES: u32 = 2;
    pub const POTION_MAX_CHARGES: u32 = 5;
    pub const KILLS_PER_CHARGE: u32 = 3;
    pub const HEALTH_POTION_RESTORE: f32 = 50.0;
    pub const MANA_POTION_RESTORE: f32 = 50.0;
    pub const SPEED_POTION_DURATION: u32 = 300;
    pub const SPEED_POTION_MULT: f32 = 1.5;

    /// Kill rewards
    pub const KILL_SCORE: u64 = 10;
    pub const KILL_XP: u32 = 20;

    /// Quests
    pub const QUEST_BASE_KILL_TARGET: u32 = 10;
    pub const QUEST_BASE_COLLECT_TARGET: u32 = 15;
    pub const QUEST_BASE_REWARD_XP: u32 = 50;
    pub const QUEST_BASE_REWARD_COINS: u32 = 25;
    pub const QUEST_SCALE_PER_COMPLETION: f64 = 0.2;

    /// Talents
    pub const PYROCLASM_BASE_RADIUS: f32 = 1.5;
    pub const PYROCLASM_RADIUS_PER_RANK: f32 = 0.5;
    pub const MULTISHOT_PER_RANK: u32 = 1;
    pub const FORCE_BASE_KNOCKBACK: f32 = 0.5;
    pub const FORCE_KNOCKBACK_PER_RANK: f32 = 0.8;
    pub const VELOCITY_SPEED_PER_RANK: f32 = 0.1;

    /// Base stats
    pub const VITALITY_HP_PER_POINT: f32 = 10.0;
    pub const POWER_DAMAGE_PER_POINT: f32 = 0.5;
    pub const HASTE_CDR_PER_POINT: f32 = 0.02;
    pub const SWIFTNESS_SPEED_PER_POINT: f32 = 0.02;

    /// Presentational lifetimes
    pub const TEXT_LIFE: u32 = 60;
    pub const TEXT_RISE: f32 = -0.05;
    pub const NOVA_LIFE: u32 = 20;
    pub const CHAIN_LINK_LIFE: u32 = 15;
    pub const PUFF_LIFE: u32 = 15;
}

/// Project a world-space vector onto the isometric screen plane (pixels)
#[inline]
pub fn to_screen(world: Vec2) -> Vec2 {
    use consts::{TILE_HEIGHT, TILE_WIDTH};
    Vec2::new(
        (world.x - world.y) * (TILE_WIDTH / 2.0),
        (world.x + world.y) * (TILE_HEIGHT / 2.0),
    )
}

/// Inverse of [`to_screen`]: screen pixels back to world tiles
#[inline]
pub fn to_world(screen: Vec2) -> Vec2 {
    use consts::{TILE_HEIGHT, TILE_WIDTH};
    let a = screen.x / (TILE_WIDTH / 2.0);
    let b = screen.y / (TILE_HEIGHT / 2.0);
    Vec2::new((a + b) / 2.0, (b - a) / 2.0)
}

/// Convert a pointer position to a world point, given the viewport centre the
/// camera keeps the player on.
pub fn screen_point_to_world(pointer: Vec2, viewport_center: Vec2, player_pos: Vec2) -> Vec2 {
    let player_screen = to_screen(player_pos);
    let offset = viewport_center - player_screen;
    to_world(pointer - offset)
}
