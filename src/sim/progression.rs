//! Leveling, stat allocation, equipment and potions
//!
//! HP and shield maxima are cached on the player and recomputed whenever
//! level, vitality or equipment changes. Damage and movement speed depend on
//! transient buffs too, so they are derived at the point of use.

use glam::Vec2;
use thiserror::Error;

use super::spells::{SpellKind, unlock_for_level};
use super::state::{
    BaseStat, COLOR_BLUE, COLOR_GOLD, COLOR_GREEN, COLOR_GREY, COLOR_RED, COLOR_WHITE, EffectKind,
    EntityId, EquipmentSlot, GameState, Player, PotionKind, Talent,
};
use crate::consts::*;

/// Why a potion couldn't be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PotionRejection {
    /// No charges left
    #[error("out of potions")]
    Empty,
}

/// Recompute cached maxima and clamp current values into them
pub fn recalculate_stats(player: &mut Player) {
    player.max_hp = PLAYER_START_HP
        + player.level as f32 * LEVEL_HP_GRANT
        + player.base_stats.vitality as f32 * VITALITY_HP_PER_POINT;
    player.hp = player.hp.min(player.max_hp);

    player.max_shield = PLAYER_START_SHIELD
        + player.level as f32 * LEVEL_SHIELD_GRANT
        + player.equipment.total_shield();
    player.shield = player.shield.min(player.max_shield);
}

/// Pre-variance damage for a spell cast right now
pub fn spell_base_damage(player: &Player, spell: SpellKind) -> f32 {
    spell.config().base_damage
        + player.level as f32 * 0.5
        + player.equipment.total_damage()
        + player.base_stats.power as f32 * POWER_DAMAGE_PER_POINT
}

/// Multiplier applied to base cooldowns (never below `MIN_COOLDOWN_MULT`)
pub fn cooldown_multiplier(player: &Player) -> f32 {
    (1.0 - player.base_stats.haste as f32 * HASTE_CDR_PER_POINT).max(MIN_COOLDOWN_MULT)
}

/// Movement speed in screen pixels per tick, including every live modifier
pub fn movement_speed(player: &Player) -> f32 {
    let mount = if player.mounted { MOUNT_SPEED_MULT } else { 1.0 };
    let potion = if player.speed_boost_ticks > 0 {
        SPEED_POTION_MULT
    } else {
        1.0
    };
    let swiftness = 1.0 + player.base_stats.swiftness as f32 * SWIFTNESS_SPEED_PER_POINT;
    (player.speed + player.equipment.total_speed())
        * PLAYER_PIXEL_SPEED_SCALE
        * mount
        * potion
        * swiftness
}

/// Projectile speed in tiles per tick
pub fn projectile_speed(player: &Player, spell: SpellKind) -> f32 {
    let config = spell.config();
    let velocity = 1.0 + player.talents.velocity as f32 * VELOCITY_SPEED_PER_RANK;
    (config.base_speed + player.level as f32 * config.speed_per_level)
        * velocity
        * PROJECTILE_SPEED_SCALE
}

/// Per-tick regeneration and buff countdown
pub fn update_upkeep(player: &mut Player) {
    player.mana = (player.mana + MANA_REGEN).min(player.max_mana);
    if player.shield_regen_timer > 0 {
        player.shield_regen_timer -= 1;
    } else if player.shield < player.max_shield {
        player.shield = (player.shield + SHIELD_REGEN_RATE).min(player.max_shield);
    }
    player.speed_boost_ticks = player.speed_boost_ticks.saturating_sub(1);
}

/// Add XP and resolve every level threshold it crosses. Returns levels gained.
pub fn grant_xp(state: &mut GameState, amount: u32) -> u32 {
    state.player.xp += amount;
    let mut gained = 0;
    while state.player.xp >= state.player.to_next_level {
        level_up(state);
        gained += 1;
    }
    gained
}

fn level_up(state: &mut GameState) {
    let p = &mut state.player;
    p.xp -= p.to_next_level;
    p.level += 1;
    p.stat_points += 1;
    p.to_next_level = ((p.to_next_level as f32 * LEVEL_XP_GROWTH).floor() as u32).max(1);
    recalculate_stats(p);
    p.hp = p.max_hp;

    let level = p.level;
    let pos = p.pos;
    log::info!("Player reached level {}", level);
    state.add_text("LEVEL UP!", pos, COLOR_GOLD);
    sparkle_burst(state, pos);

    if let Some(spell) = unlock_for_level(level)
        && !state.player.knows(spell)
    {
        state.player.known_spells.push(spell);
        log::info!("Learned {}", spell.name());
        state.add_text(
            format!("Learned {}!", spell.name()),
            pos - Vec2::new(0.0, 2.0),
            COLOR_WHITE,
        );
    }
}

fn sparkle_burst(state: &mut GameState, pos: Vec2) {
    use rand::Rng;
    for _ in 0..10 {
        let angle = state.rng.random::<f32>() * std::f32::consts::TAU;
        let dist = state.rng.random::<f32>() * 2.0;
        let life = 60 + state.rng.random_range(0..30);
        let at = pos + Vec2::new(angle.cos(), angle.sin()) * dist;
        state.add_effect(EffectKind::Sparkle, at, life);
    }
}

/// Spend a stat point on a talent
pub fn upgrade_talent(state: &mut GameState, talent: Talent) -> bool {
    let p = &mut state.player;
    if p.stat_points == 0 {
        return false;
    }
    *p.talents.rank_mut(talent) += 1;
    p.stat_points -= 1;
    let pos = p.pos;
    state.add_text(format!("+ {:?}", talent).to_uppercase(), pos, COLOR_GREEN);
    true
}

/// Spend a stat point on a base stat
pub fn upgrade_base_stat(state: &mut GameState, stat: BaseStat) -> bool {
    let p = &mut state.player;
    if p.stat_points == 0 {
        return false;
    }
    *p.base_stats.rank_mut(stat) += 1;
    p.stat_points -= 1;
    recalculate_stats(p);
    let pos = p.pos;
    state.add_text(format!("+ {:?}", stat).to_uppercase(), pos, COLOR_GREEN);
    true
}

/// Move an inventory item into its slot, swapping out whatever was there
pub fn equip_item(state: &mut GameState, item_id: EntityId) -> bool {
    let p = &mut state.player;
    let Some(idx) = p.inventory.iter().position(|i| i.id == item_id) else {
        return false;
    };
    let item = p.inventory.remove(idx);
    let slot = p.equipment.slot_mut(item.slot);
    if let Some(previous) = slot.replace(item) {
        p.inventory.push(previous);
    }
    recalculate_stats(p);
    true
}

/// Move an equipped item back to the inventory
pub fn unequip_item(state: &mut GameState, slot: EquipmentSlot) -> bool {
    let p = &mut state.player;
    let Some(item) = p.equipment.slot_mut(slot).take() else {
        return false;
    };
    p.inventory.push(item);
    recalculate_stats(p);
    true
}

/// Drink a potion
pub fn use_potion(state: &mut GameState, kind: PotionKind) -> Result<(), PotionRejection> {
    let p = &mut state.player;
    let pos = p.pos;
    let charges = p.potions.charges_mut(kind);
    if *charges == 0 {
        state.add_text("Out of Potions!", pos, COLOR_GREY);
        return Err(PotionRejection::Empty);
    }
    *charges -= 1;

    match kind {
        PotionKind::Health => {
            p.hp = (p.hp + HEALTH_POTION_RESTORE).min(p.max_hp);
            state.add_text(format!("+{} HP", HEALTH_POTION_RESTORE), pos, COLOR_RED);
        }
        PotionKind::Mana => {
            p.mana = (p.mana + MANA_POTION_RESTORE).min(p.max_mana);
            state.add_text(format!("+{} MP", MANA_POTION_RESTORE), pos, COLOR_BLUE);
        }
        PotionKind::Speed => {
            p.speed_boost_ticks = SPEED_POTION_DURATION;
            state.add_text("SPEED UP!", pos, COLOR_GREEN);
        }
    }
    Ok(())
}

/// Count a kill toward potion recharge; refills one charge of every non-full
/// potion each `KILLS_PER_CHARGE` kills. Returns true if anything refilled.
pub fn count_kill_for_potions(player: &mut Player) -> bool {
    player.potion_kill_counter += 1;
    if player.potion_kill_counter < KILLS_PER_CHARGE {
        return false;
    }
    player.potion_kill_counter = 0;
    let mut recharged = false;
    for kind in [PotionKind::Health, PotionKind::Mana, PotionKind::Speed] {
        let charges = player.potions.charges_mut(kind);
        if *charges < POTION_MAX_CHARGES {
            *charges += 1;
            recharged = true;
        }
    }
    recharged
}

/// Toggle the mount (requires level 7)
pub fn toggle_mount(state: &mut GameState) -> bool {
    let p = &mut state.player;
    let pos = p.pos;
    if p.level < LEVEL_7_UNLOCK {
        state.add_text(format!("Mount unlocks at level {}", LEVEL_7_UNLOCK), pos, COLOR_GREY);
        return false;
    }
    p.mounted = !p.mounted;
    let msg = if p.mounted { "Mounted!" } else { "Dismounted" };
    state.add_text(msg, pos, COLOR_WHITE);
    true
}
