//! Simulation state and entity types
//!
//! `GameState` is the single owner of every entity collection. Entities are
//! soft-deleted with `is_dead` and swept at the end of each tick; anything that
//! refers to another entity stores its id, never a reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::spells::SpellKind;
use crate::consts::*;
use crate::settings::SimSettings;

/// Entity identifier, unique for the session
pub type EntityId = u32;

/// Id reserved for the player
pub const PLAYER_ID: EntityId = 0;

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Head,
    Body,
    Weapon,
    Accessory,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 4] = [
        EquipmentSlot::Head,
        EquipmentSlot::Body,
        EquipmentSlot::Weapon,
        EquipmentSlot::Accessory,
    ];

    pub fn noun(self) -> &'static str {
        match self {
            EquipmentSlot::Head => "Helm",
            EquipmentSlot::Body => "Armor",
            EquipmentSlot::Weapon => "Wand",
            EquipmentSlot::Accessory => "Ring",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            EquipmentSlot::Head => "🧢",
            EquipmentSlot::Body => "👕",
            EquipmentSlot::Weapon => "⚔️",
            EquipmentSlot::Accessory => "💍",
        }
    }
}

/// Rarity tiers, ordered from most to least common
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Number of stat rolls an item of this rarity receives
    pub fn stat_budget(self) -> u32 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::Epic => 3,
            Rarity::Legendary => 4,
        }
    }

    /// Whether extra-projectile rolls are allowed
    pub fn allows_projectiles(self) -> bool {
        matches!(self, Rarity::Epic | Rarity::Legendary)
    }

    pub fn color(self) -> u32 {
        match self {
            Rarity::Common => 0xa3a3a3,
            Rarity::Rare => 0x3b82f6,
            Rarity::Epic => 0xa855f7,
            Rarity::Legendary => 0xeab308,
        }
    }
}

/// Bonuses granted by an item; zero means "no bonus"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemStats {
    /// Added to spell damage
    pub damage: f32,
    /// Added to max shield
    pub shield: f32,
    /// Added to base movement speed before multipliers
    pub speed: f32,
    /// Extra projectiles per cast
    pub projectile_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: EntityId,
    pub name: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
    pub stats: ItemStats,
    pub icon: String,
}

/// The four equipment slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub head: Option<EquipmentItem>,
    pub body: Option<EquipmentItem>,
    pub weapon: Option<EquipmentItem>,
    pub accessory: Option<EquipmentItem>,
}

impl Equipment {
    pub fn slot(&self, slot: EquipmentSlot) -> Option<&EquipmentItem> {
        match slot {
            EquipmentSlot::Head => self.head.as_ref(),
            EquipmentSlot::Body => self.body.as_ref(),
            EquipmentSlot::Weapon => self.weapon.as_ref(),
            EquipmentSlot::Accessory => self.accessory.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: EquipmentSlot) -> &mut Option<EquipmentItem> {
        match slot {
            EquipmentSlot::Head => &mut self.head,
            EquipmentSlot::Body => &mut self.body,
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Accessory => &mut self.accessory,
        }
    }

    /// Equipped items in slot order
    pub fn iter(&self) -> impl Iterator<Item = &EquipmentItem> {
        [&self.head, &self.body, &self.weapon, &self.accessory]
            .into_iter()
            .flatten()
    }

    pub fn total_damage(&self) -> f32 {
        self.iter().map(|i| i.stats.damage).sum()
    }

    pub fn total_shield(&self) -> f32 {
        self.iter().map(|i| i.stats.shield).sum()
    }

    pub fn total_speed(&self) -> f32 {
        self.iter().map(|i| i.stats.speed).sum()
    }

    pub fn total_projectiles(&self) -> u32 {
        self.iter().map(|i| i.stats.projectile_count).sum()
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Talent {
    /// Fire explosion radius
    Pyroclasm,
    /// Extra projectiles for fire/ice/wind
    Multishot,
    /// Earth knockback
    Force,
    /// Projectile speed
    Velocity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Talents {
    pub pyroclasm: u32,
    pub multishot: u32,
    pub force: u32,
    pub velocity: u32,
}

impl Talents {
    pub fn rank_mut(&mut self, talent: Talent) -> &mut u32 {
        match talent {
            Talent::Pyroclasm => &mut self.pyroclasm,
            Talent::Multishot => &mut self.multishot,
            Talent::Force => &mut self.force,
            Talent::Velocity => &mut self.velocity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseStat {
    /// Max HP
    Vitality,
    /// Spell damage
    Power,
    /// Cooldown reduction
    Haste,
    /// Movement speed
    Swiftness,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub vitality: u32,
    pub power: u32,
    pub haste: u32,
    pub swiftness: u32,
}

impl BaseStats {
    pub fn rank_mut(&mut self, stat: BaseStat) -> &mut u32 {
        match stat {
            BaseStat::Vitality => &mut self.vitality,
            BaseStat::Power => &mut self.power,
            BaseStat::Haste => &mut self.haste,
            BaseStat::Swiftness => &mut self.swiftness,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotionKind {
    Health,
    Mana,
    Speed,
}

/// Potion charges per kind, each capped at `POTION_MAX_CHARGES`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Potions {
    pub health: u32,
    pub mana: u32,
    pub speed: u32,
}

impl Default for Potions {
    fn default() -> Self {
        Self {
            health: POTION_START_CHARGES,
            mana: POTION_START_CHARGES,
            speed: POTION_START_CHARGES,
        }
    }
}

impl Potions {
    pub fn charges(&self, kind: PotionKind) -> u32 {
        match kind {
            PotionKind::Health => self.health,
            PotionKind::Mana => self.mana,
            PotionKind::Speed => self.speed,
        }
    }

    pub fn charges_mut(&mut self, kind: PotionKind) -> &mut u32 {
        match kind {
            PotionKind::Health => &mut self.health,
            PotionKind::Mana => &mut self.mana,
            PotionKind::Speed => &mut self.speed,
        }
    }
}

/// The player-controlled spellcaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub is_dead: bool,

    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,
    /// Ticks until the shield starts regenerating again
    pub shield_regen_timer: u32,
    pub mana: f32,
    pub max_mana: f32,

    pub xp: u32,
    pub level: u32,
    pub to_next_level: u32,
    pub stat_points: u32,

    pub current_spell: SpellKind,
    /// Unlock order
    pub known_spells: Vec<SpellKind>,
    /// Global cast cooldown (ticks, fractional after haste)
    pub cast_cooldown: f32,
    pub speed: f32,
    pub bomb_ammo: u32,
    pub mounted: bool,
    pub coins: u32,

    pub talents: Talents,
    pub base_stats: BaseStats,
    pub potions: Potions,
    /// Kills since the last potion recharge
    pub potion_kill_counter: u32,
    /// Ticks of speed-potion buff remaining
    pub speed_boost_ticks: u32,

    pub equipment: Equipment,
    pub inventory: Vec<EquipmentItem>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            id: PLAYER_ID,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            is_dead: false,
            hp: PLAYER_START_HP,
            max_hp: PLAYER_START_HP,
            shield: PLAYER_START_SHIELD,
            max_shield: PLAYER_START_SHIELD,
            shield_regen_timer: 0,
            mana: PLAYER_START_MANA,
            max_mana: PLAYER_START_MANA,
            xp: 0,
            level: 1,
            to_next_level: START_TO_NEXT_LEVEL,
            stat_points: 0,
            current_spell: SpellKind::Fire,
            known_spells: vec![SpellKind::Fire],
            cast_cooldown: 0.0,
            speed: PLAYER_BASE_SPEED,
            bomb_ammo: 0,
            mounted: false,
            coins: 0,
            talents: Talents::default(),
            base_stats: BaseStats::default(),
            potions: Potions::default(),
            potion_kill_counter: 0,
            speed_boost_ticks: 0,
            equipment: Equipment::default(),
            inventory: Vec::new(),
        }
    }
}

impl Player {
    pub fn knows(&self, spell: SpellKind) -> bool {
        self.known_spells.contains(&spell)
    }
}

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    /// Runs at the player, damages on contact
    Melee,
    /// Keeps its distance and fires bolts
    Caster,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub is_dead: bool,

    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub damage: f32,
    pub archetype: Archetype,

    pub frozen: bool,
    pub freeze_timer: u32,
    /// Casters only: ticks until the next bolt
    pub attack_cooldown: u32,

    /// Ticks since the last stuck sample
    pub stuck_check_timer: u32,
    pub last_stuck_pos: Vec2,
    /// Consecutive samples with almost no displacement
    pub stuck_counter: u32,
    pub phasing: bool,
    pub phase_timer: u32,
}

impl Enemy {
    pub fn new(id: EntityId, pos: Vec2, archetype: Archetype, level: u32) -> Self {
        let lvl = level as f32;
        let (hp, speed, damage) = match archetype {
            Archetype::Melee => (
                18.0 + lvl * 6.0,
                ENEMY_BASE_SPEED + lvl * 0.1,
                3.0 + (lvl * 0.5).floor(),
            ),
            Archetype::Caster => (CASTER_HP + lvl * 4.0, CASTER_SPEED, CASTER_DAMAGE),
        };
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: ENEMY_RADIUS,
            is_dead: false,
            hp,
            max_hp: hp,
            speed,
            damage,
            archetype,
            frozen: false,
            freeze_timer: 0,
            attack_cooldown: 0,
            stuck_check_timer: 0,
            last_stuck_pos: pos,
            stuck_counter: 0,
            phasing: false,
            phase_timer: 0,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }
}

// ---------------------------------------------------------------------------
// Projectiles
// ---------------------------------------------------------------------------

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileSource {
    /// Cast directly by the player
    Player,
    /// Fragment of a player projectile; never fragments again
    Shrapnel,
    /// Enemy bolt; damages the player
    Enemy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub is_dead: bool,

    pub spell: SpellKind,
    pub damage: f32,
    /// Ticks left to live
    pub duration: u32,
    /// Enemies already damaged by this projectile
    pub hit_list: Vec<EntityId>,
    pub source: ProjectileSource,
    /// Lobbed projectiles fly to this point
    pub target_pos: Option<Vec2>,
    /// Pyroclasm blast radius
    pub explosion_radius: Option<f32>,
    pub knockback: Option<f32>,
}

impl Projectile {
    #[inline]
    pub fn is_enemy(&self) -> bool {
        self.source == ProjectileSource::Enemy
    }

    #[inline]
    pub fn is_shrapnel(&self) -> bool {
        self.source == ProjectileSource::Shrapnel
    }
}

// ---------------------------------------------------------------------------
// Loot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LootKind {
    Coin { value: u32 },
    BombAmmo,
    Equipment(EquipmentItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub is_dead: bool,
    /// Ticks until it despawns
    pub life: u32,
    pub kind: LootKind,
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestKind {
    Kill,
    Collect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: EntityId,
    pub kind: QuestKind,
    pub description: String,
    pub target: u32,
    pub current: u32,
    pub reward_xp: u32,
    pub reward_coins: u32,
}

impl Quest {
    /// The quest every session starts with
    pub fn opening(id: EntityId) -> Self {
        Self {
            id,
            kind: QuestKind::Kill,
            description: format!("Kill {} Enemies", QUEST_BASE_KILL_TARGET),
            target: QUEST_BASE_KILL_TARGET,
            current: 0,
            reward_xp: QUEST_BASE_REWARD_XP,
            reward_coins: QUEST_BASE_REWARD_COINS,
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

// ---------------------------------------------------------------------------
// Presentation records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    Sparkle,
    /// Arc drawn from `pos` to `target`
    LightningChain { target: Vec2 },
    /// Expanding ring
    Nova { radius: f32 },
    ImpactPuff { spell: SpellKind },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEffect {
    pub id: EntityId,
    pub pos: Vec2,
    pub life: u32,
    pub kind: EffectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub id: EntityId,
    pub pos: Vec2,
    pub text: String,
    /// 0xRRGGBB
    pub color: u32,
    pub life: u32,
    pub vel: Vec2,
}

pub const COLOR_WHITE: u32 = 0xffffff;
pub const COLOR_GREY: u32 = 0x888888;
pub const COLOR_GOLD: u32 = 0xfbbf24;
pub const COLOR_RED: u32 = 0xef4444;
pub const COLOR_GREEN: u32 = 0x22c55e;
pub const COLOR_BLUE: u32 = 0x3b82f6;

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// Complete simulation state, owned by the tick function
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: SimSettings,
    /// Seeded RNG; the only source of gameplay randomness
    pub rng: Pcg32,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub loot: Vec<Loot>,
    pub texts: Vec<FloatingText>,
    pub effects: Vec<VisualEffect>,
    pub score: u64,
    pub game_over: bool,
    pub paused: bool,
    pub quest: Quest,
    pub quests_completed: u32,
    /// Ticks since the last enemy spawn
    pub spawn_timer: u32,
    /// Gameplay ticks simulated (frozen while paused)
    pub time_ticks: u64,
    /// Host frames seen, paused or not; drives the snapshot cadence
    pub frame_count: u64,
    /// Wall-clock play time in seconds (frozen while paused or after game over)
    pub session_time: f64,
    next_id: EntityId,
}

impl GameState {
    /// Create a new session
    pub fn new(settings: SimSettings) -> Self {
        let rng = Pcg32::seed_from_u64(settings.seed);
        // The opening quest takes the first id after the player
        let quest_id = PLAYER_ID + 1;
        Self {
            settings,
            rng,
            player: Player::default(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            loot: Vec::new(),
            texts: Vec::new(),
            effects: Vec::new(),
            score: 0,
            game_over: false,
            paused: false,
            quest: Quest::opening(quest_id),
            quests_completed: 0,
            spawn_timer: 0,
            time_ticks: 0,
            frame_count: 0,
            session_time: 0.0,
            next_id: quest_id + 1,
        }
    }

    /// Session with default settings and the given seed
    pub fn with_seed(seed: u64) -> Self {
        Self::new(SimSettings::with_seed(seed))
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a rising text label at a world position
    pub fn add_text(&mut self, text: impl Into<String>, pos: Vec2, color: u32) {
        let id = self.next_entity_id();
        self.texts.push(FloatingText {
            id,
            pos,
            text: text.into(),
            color,
            life: TEXT_LIFE,
            vel: Vec2::new(0.0, TEXT_RISE),
        });
    }

    pub fn add_effect(&mut self, kind: EffectKind, pos: Vec2, life: u32) {
        let id = self.next_entity_id();
        self.effects.push(VisualEffect { id, pos, life, kind });
    }

    /// Insert an enemy, returning its id
    pub fn spawn_enemy_at(&mut self, pos: Vec2, archetype: Archetype) -> EntityId {
        let id = self.next_entity_id();
        let enemy = Enemy::new(id, pos, archetype, self.player.level);
        self.enemies.push(enemy);
        id
    }

    pub fn enemy_index(&self, id: EntityId) -> Option<usize> {
        self.enemies.iter().position(|e| e.id == id)
    }

    pub fn living_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    /// Drop every soft-deleted entity
    pub fn prune_dead(&mut self) {
        self.enemies.retain(|e| !e.is_dead);
        self.projectiles.retain(|p| !p.is_dead);
        self.loot.retain(|l| !l.is_dead);
    }
}
