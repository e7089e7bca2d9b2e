//! Spell catalogue and per-spell tuning

use serde::{Deserialize, Serialize};

/// Every castable spell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellKind {
    Fire,
    Ice,
    Lightning,
    Wind,
    Earth,
    ArcaneExplosion,
    Teleport,
    Bomb,
}

/// Order in which level-ups teach new spells
pub const SPELL_UNLOCK_ORDER: [SpellKind; 7] = [
    SpellKind::Ice,
    SpellKind::Lightning,
    SpellKind::Wind,
    SpellKind::ArcaneExplosion,
    SpellKind::Teleport,
    SpellKind::Bomb,
    SpellKind::Earth,
];

/// How a spell reaches its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Fanned projectiles fired toward the aim point
    Projectile,
    /// Instant burst around the caster
    Nova,
    /// Instant relocation of the caster
    Blink,
    /// Projectile lobbed at a fixed point, consumes ammunition
    Lobbed,
}

/// Secondary behaviour of a spell, carrying only what that behaviour needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpellEffect {
    /// Fragments into shrapnel (or explodes with pyroclasm)
    Shrapnel { count: u32, damage: f32 },
    /// Slows the target for a number of ticks
    Freeze { ticks: u32 },
    /// Jumps between nearby enemies
    Chain { range: f32, hops: u32 },
    /// Pushes the target away from the impact
    Knockback { base: f32, per_level: f32 },
    /// Damages everything around the caster
    Burst { radius: f32, per_level: f32 },
    /// Area blast with a radial push
    Blast { radius: f32, push: f32, max_throw: f32 },
    None,
}

/// Static tuning for one spell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpellConfig {
    pub base_damage: f32,
    /// Symmetric damage spread (0.3 means ×[0.7, 1.3])
    pub variance: f32,
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Base global cooldown in ticks
    pub cooldown: u32,
    /// 0xRRGGBB for floating numbers
    pub color: u32,
    pub delivery: Delivery,
    pub effect: SpellEffect,
}

/// Variance used when a spell doesn't specify one
pub const DEFAULT_VARIANCE: f32 = 0.1;

impl SpellKind {
    pub const ALL: [SpellKind; 8] = [
        SpellKind::Fire,
        SpellKind::Ice,
        SpellKind::Lightning,
        SpellKind::Wind,
        SpellKind::Earth,
        SpellKind::ArcaneExplosion,
        SpellKind::Teleport,
        SpellKind::Bomb,
    ];

    pub fn config(self) -> SpellConfig {
        match self {
            SpellKind::Fire => SpellConfig {
                base_damage: 5.5,
                variance: 0.3,
                base_speed: 4.0,
                speed_per_level: 0.1,
                cooldown: 35,
                color: 0xef4444,
                delivery: Delivery::Projectile,
                effect: SpellEffect::Shrapnel {
                    count: 5,
                    damage: 2.0,
                },
            },
            SpellKind::Ice => SpellConfig {
                base_damage: 2.5,
                variance: 0.2,
                base_speed: 5.0,
                speed_per_level: 0.1,
                cooldown: 25,
                color: 0x3b82f6,
                delivery: Delivery::Projectile,
                effect: SpellEffect::Freeze { ticks: 120 },
            },
            SpellKind::Lightning => SpellConfig {
                base_damage: 3.5,
                variance: 0.4,
                base_speed: 10.0,
                speed_per_level: 0.0,
                cooldown: 45,
                color: 0xfcd34d,
                delivery: Delivery::Projectile,
                effect: SpellEffect::Chain {
                    range: 5.0,
                    hops: 3,
                },
            },
            SpellKind::Wind => SpellConfig {
                base_damage: 1.5,
                variance: 0.1,
                base_speed: 7.0,
                speed_per_level: 0.1,
                cooldown: 30,
                color: 0xa7f3d0,
                delivery: Delivery::Projectile,
                effect: SpellEffect::Knockback {
                    base: 1.5,
                    per_level: 0.2,
                },
            },
            SpellKind::Earth => SpellConfig {
                base_damage: 7.0,
                variance: 0.2,
                base_speed: 3.0,
                speed_per_level: 0.05,
                cooldown: 50,
                color: 0x8b4513,
                delivery: Delivery::Projectile,
                effect: SpellEffect::Knockback {
                    base: crate::consts::FORCE_BASE_KNOCKBACK,
                    per_level: 0.0,
                },
            },
            SpellKind::ArcaneExplosion => SpellConfig {
                base_damage: 9.0,
                variance: 0.1,
                base_speed: 0.0,
                speed_per_level: 0.2,
                cooldown: 120,
                color: 0x9333ea,
                delivery: Delivery::Nova,
                effect: SpellEffect::Burst {
                    radius: 3.0,
                    per_level: 0.5,
                },
            },
            SpellKind::Teleport => SpellConfig {
                base_damage: 0.0,
                variance: DEFAULT_VARIANCE,
                base_speed: 0.0,
                speed_per_level: 0.0,
                cooldown: 240,
                color: 0xa855f7,
                delivery: Delivery::Blink,
                effect: SpellEffect::None,
            },
            SpellKind::Bomb => SpellConfig {
                base_damage: 35.0,
                variance: 0.2,
                base_speed: 3.0,
                speed_per_level: 0.0,
                cooldown: 60,
                color: 0x1c1917,
                delivery: Delivery::Lobbed,
                effect: SpellEffect::Blast {
                    radius: 3.5,
                    push: 2.0,
                    max_throw: 6.0,
                },
            },
        }
    }

    /// Spells whose projectile count grows with the multishot talent
    pub fn multishot_eligible(self) -> bool {
        matches!(self, SpellKind::Fire | SpellKind::Ice | SpellKind::Wind)
    }

    /// Spells that cost a unit of ammunition per cast
    pub fn needs_ammo(self) -> bool {
        self.config().delivery == Delivery::Lobbed
    }

    pub fn name(self) -> &'static str {
        match self {
            SpellKind::Fire => "Fire",
            SpellKind::Ice => "Ice",
            SpellKind::Lightning => "Lightning",
            SpellKind::Wind => "Wind",
            SpellKind::Earth => "Earth",
            SpellKind::ArcaneExplosion => "Arcane Explosion",
            SpellKind::Teleport => "Teleport",
            SpellKind::Bomb => "Bomb",
        }
    }
}

/// Spell taught on reaching `level`, if any
pub fn unlock_for_level(level: u32) -> Option<SpellKind> {
    use crate::consts::SPELL_UNLOCK_START_LEVEL;
    if level < SPELL_UNLOCK_START_LEVEL || level % 2 == 0 {
        return None;
    }
    let idx = ((level - SPELL_UNLOCK_START_LEVEL) / 2) as usize;
    SPELL_UNLOCK_ORDER.get(idx).copied()
}
