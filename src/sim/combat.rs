//! Spell casting, projectile flight and damage resolution
//!
//! Enemy death is resolved at the moment hp crosses zero, inside
//! [`damage_enemy`]. Every other damage source goes through it, so a dead
//! enemy can never be resolved twice no matter how many blasts overlap it.

use glam::Vec2;
use rand::Rng;
use thiserror::Error;

use super::loot::{advance_quest, spawn_loot};
use super::progression::{
    cooldown_multiplier, count_kill_for_potions, grant_xp, projectile_speed, spell_base_damage,
};
use super::spatial::{circles_overlap, find_blocker, is_position_valid};
use super::spells::{Delivery, SpellEffect, SpellKind};
use super::state::{
    COLOR_GREEN, COLOR_GREY, COLOR_RED, COLOR_WHITE, EffectKind, EntityId, GameState, Projectile,
    ProjectileSource, QuestKind,
};
use crate::consts::*;

/// Why a cast request did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CastRejection {
    /// Global cooldown still running
    #[error("spell on cooldown")]
    OnCooldown,
    /// Spell not learned yet
    #[error("spell not learned")]
    UnknownSpell,
    /// Spell needs ammunition the player doesn't have
    #[error("no ammunition")]
    NoAmmo,
}

/// What a successful cast did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// Projectiles were launched
    Fired { projectiles: usize },
    /// Area burst around the caster hit this many enemies
    Nova { hits: usize },
    Teleported,
    /// Destination was blocked; cooldown is still charged
    TeleportBlocked,
}

/// Scale `base` by a uniform factor in [1 - variance, 1 + variance]
pub fn roll_damage<R: Rng>(rng: &mut R, base: f32, variance: f32) -> f32 {
    base * (1.0 - variance + rng.random::<f32>() * variance * 2.0)
}

/// Cast `spell` (or the currently selected spell) toward a world point
pub fn cast_spell(
    state: &mut GameState,
    spell: Option<SpellKind>,
    aim: Vec2,
) -> Result<CastOutcome, CastRejection> {
    if state.player.cast_cooldown > 0.0 {
        return Err(CastRejection::OnCooldown);
    }
    let spell = spell.unwrap_or(state.player.current_spell);
    if !state.player.knows(spell) {
        log::debug!("Rejected cast of unknown spell {}", spell.name());
        return Err(CastRejection::UnknownSpell);
    }
    state.player.current_spell = spell;

    if spell.needs_ammo() && state.player.bomb_ammo == 0 {
        let pos = state.player.pos;
        state.add_text("No Ammo!", pos, COLOR_GREY);
        return Err(CastRejection::NoAmmo);
    }

    let config = spell.config();
    let damage = roll_damage(
        &mut state.rng,
        spell_base_damage(&state.player, spell),
        config.variance,
    );

    let outcome = match config.delivery {
        Delivery::Nova => cast_nova(state, spell, damage),
        Delivery::Blink => cast_teleport(state, aim),
        Delivery::Projectile | Delivery::Lobbed => launch_projectiles(state, spell, damage, aim),
    };

    state.player.cast_cooldown = config.cooldown as f32 * cooldown_multiplier(&state.player);
    Ok(outcome)
}

fn cast_nova(state: &mut GameState, spell: SpellKind, damage: f32) -> CastOutcome {
    let config = spell.config();
    let SpellEffect::Burst { radius, per_level } = config.effect else {
        return CastOutcome::Nova { hits: 0 };
    };
    let radius = radius + state.player.level as f32 * per_level;
    let center = state.player.pos;
    state.add_effect(EffectKind::Nova { radius }, center, NOVA_LIFE);

    let mut hits = 0;
    for idx in 0..state.enemies.len() {
        let enemy = &state.enemies[idx];
        if enemy.is_dead || enemy.pos.distance(center) > radius {
            continue;
        }
        damage_enemy(state, idx, damage, config.color);
        hits += 1;
    }
    if hits == 0 {
        state.add_text("Miss!", center - Vec2::new(0.0, 1.0), COLOR_WHITE);
    }
    CastOutcome::Nova { hits }
}

fn cast_teleport(state: &mut GameState, aim: Vec2) -> CastOutcome {
    match find_blocker(aim, state.player.radius) {
        None => {
            state.player.pos = aim;
            state.add_text("✨", aim, SpellKind::Teleport.config().color);
            CastOutcome::Teleported
        }
        Some(blocker) => {
            log::debug!(
                "Teleport blocked by tree at {:?} ({:.2} overlap)",
                blocker.tile,
                blocker.penetration
            );
            let pos = state.player.pos;
            state.add_text("Blocked!", pos, COLOR_WHITE);
            CastOutcome::TeleportBlocked
        }
    }
}

/// Knockback a projectile of this spell carries
fn knockback_for(state: &GameState, spell: SpellKind) -> Option<f32> {
    let p = &state.player;
    match spell {
        SpellKind::Earth => {
            Some(FORCE_BASE_KNOCKBACK + p.talents.force as f32 * FORCE_KNOCKBACK_PER_RANK)
        }
        SpellKind::Wind => match spell.config().effect {
            SpellEffect::Knockback { base, per_level } => Some(base + p.level as f32 * per_level),
            _ => None,
        },
        _ => None,
    }
}

fn launch_projectiles(state: &mut GameState, spell: SpellKind, damage: f32, aim: Vec2) -> CastOutcome {
    let origin = state.player.pos;
    let to_aim = aim - origin;
    let dir = if to_aim.length_squared() > 0.0 {
        to_aim.normalize()
    } else {
        Vec2::X
    };

    let target_pos = match spell.config().effect {
        SpellEffect::Blast { max_throw, .. } => {
            Some(origin + dir * to_aim.length().min(max_throw))
        }
        _ => None,
    };

    let count = if spell.needs_ammo() {
        1
    } else {
        let mut count = 1 + state.player.equipment.total_projectiles();
        if spell.multishot_eligible() {
            count += state.player.talents.multishot * MULTISHOT_PER_RANK;
        }
        count
    };

    let explosion_radius = match spell {
        SpellKind::Fire if state.player.talents.pyroclasm > 0 => Some(
            PYROCLASM_BASE_RADIUS + state.player.talents.pyroclasm as f32 * PYROCLASM_RADIUS_PER_RANK,
        ),
        _ => None,
    };
    let knockback = knockback_for(state, spell);
    let speed = projectile_speed(&state.player, spell);
    let base_angle = dir.y.atan2(dir.x);

    for i in 0..count {
        let offset = (i as f32 - (count - 1) as f32 / 2.0) * MULTISHOT_SPREAD;
        let angle = base_angle + offset;
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            pos: origin,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            radius: PROJECTILE_RADIUS,
            is_dead: false,
            spell,
            damage,
            duration: PROJECTILE_LIFE,
            hit_list: Vec::new(),
            source: ProjectileSource::Player,
            target_pos,
            explosion_radius,
            knockback,
        });
    }

    if spell.needs_ammo() {
        state.player.bomb_ammo -= 1;
    }
    CastOutcome::Fired {
        projectiles: count as usize,
    }
}

/// Apply damage to an enemy; resolves its death exactly once. Returns true if
/// this call killed it.
pub fn damage_enemy(state: &mut GameState, idx: usize, amount: f32, color: u32) -> bool {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return false;
    };
    if enemy.is_dead {
        return false;
    }
    enemy.hp -= amount;
    let pos = enemy.pos;
    let killed = enemy.hp <= 0.0;
    if killed {
        enemy.is_dead = true;
    }
    state.add_text(format!("{}", amount.round() as i64), pos, color);
    if killed {
        resolve_enemy_death(state, pos);
    }
    killed
}

/// Kill bookkeeping: score, xp, quest, potion recharge, loot
fn resolve_enemy_death(state: &mut GameState, pos: Vec2) {
    state.score += KILL_SCORE;
    grant_xp(state, KILL_XP);
    advance_quest(state, QuestKind::Kill, 1);
    if count_kill_for_potions(&mut state.player) {
        let player_pos = state.player.pos;
        state.add_text("Flasks Recharged!", player_pos, COLOR_GREEN);
    }
    spawn_loot(state, pos);
}

/// Damage everything within `radius` of `center`
pub fn explode_area(state: &mut GameState, center: Vec2, radius: f32, damage: f32, color: u32) {
    state.add_effect(EffectKind::Nova { radius }, center, NOVA_LIFE);
    for idx in 0..state.enemies.len() {
        let enemy = &state.enemies[idx];
        if enemy.is_dead || enemy.pos.distance(center) > radius {
            continue;
        }
        damage_enemy(state, idx, damage, color);
    }
}

/// Bomb detonation: area damage, radial push, shrapnel ring
pub fn explode_bomb(state: &mut GameState, center: Vec2, damage: f32) {
    let (radius, push) = match SpellKind::Bomb.config().effect {
        SpellEffect::Blast { radius, push, .. } => (radius, push),
        _ => return,
    };
    let color = SpellKind::Bomb.config().color;
    state.add_text("BOOM!", center, color);
    spawn_shrapnel(state, center, damage * 0.2);

    for idx in 0..state.enemies.len() {
        let enemy = &state.enemies[idx];
        if enemy.is_dead || enemy.pos.distance(center) > radius {
            continue;
        }
        let dir = (enemy.pos - center).normalize_or_zero();
        knock_back(state, idx, dir, push);
        damage_enemy(state, idx, damage, color);
    }
}

/// Ring of short-lived fire fragments
pub fn spawn_shrapnel(state: &mut GameState, origin: Vec2, damage: f32) {
    let fire = SpellKind::Fire.config();
    let SpellEffect::Shrapnel { count, .. } = fire.effect else {
        return;
    };
    let speed = (fire.base_speed + 2.0) * PROJECTILE_SPEED_SCALE;
    for i in 0..count {
        let angle = std::f32::consts::TAU / count as f32 * i as f32;
        let id = state.next_entity_id();
        state.projectiles.push(Projectile {
            id,
            pos: origin,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            radius: SHRAPNEL_RADIUS,
            is_dead: false,
            spell: SpellKind::Fire,
            damage,
            duration: SHRAPNEL_LIFE,
            hit_list: Vec::new(),
            source: ProjectileSource::Shrapnel,
            target_pos: None,
            explosion_radius: None,
            knockback: None,
        });
    }
}

/// Fire-spell follow-up on impact (enemy or wall)
fn fire_impact(state: &mut GameState, at: Vec2, projectile: &Projectile) {
    if projectile.source != ProjectileSource::Player {
        return;
    }
    if let Some(radius) = projectile.explosion_radius {
        explode_area(state, at, radius, projectile.damage, SpellKind::Fire.config().color);
    } else if state.player.level >= LEVEL_5_UNLOCK
        && let SpellEffect::Shrapnel { damage, .. } = SpellKind::Fire.config().effect
    {
        let damage = damage + state.player.level as f32;
        spawn_shrapnel(state, at, damage);
    }
}

/// Push an enemy along `dir`. Phasing enemies take the full push; others are
/// pulled back until they land on valid terrain, or don't move at all.
pub fn knock_back(state: &mut GameState, idx: usize, dir: Vec2, force: f32) {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return;
    };
    if enemy.phasing {
        enemy.pos += dir * force;
        return;
    }
    for fraction in [1.0, 0.75, 0.5, 0.25] {
        let candidate = enemy.pos + dir * force * fraction;
        if is_position_valid(candidate, enemy.radius) {
            enemy.pos = candidate;
            return;
        }
    }
}

/// Jump from `from` to the nearest living, not-yet-struck enemy in range,
/// up to `hops` times. Returns the ids struck by the chain (excluding `from`).
pub fn chain_lightning(
    state: &mut GameState,
    from: EntityId,
    damage: f32,
    hops: u32,
    range: f32,
) -> Vec<EntityId> {
    let mut struck = vec![from];
    let Some(start) = state.enemy_index(from) else {
        return Vec::new();
    };
    let mut origin = state.enemies[start].pos;
    let color = SpellKind::Lightning.config().color;

    for _ in 0..hops {
        let mut best: Option<(usize, f32)> = None;
        for (idx, enemy) in state.enemies.iter().enumerate() {
            if enemy.is_dead || struck.contains(&enemy.id) {
                continue;
            }
            let d = enemy.pos.distance(origin);
            let closer = match best {
                Some((_, best_d)) => d < best_d,
                None => d < range,
            };
            if closer {
                best = Some((idx, d));
            }
        }
        let Some((idx, _)) = best else {
            break;
        };

        let target = state.enemies[idx].pos;
        struck.push(state.enemies[idx].id);
        state.add_effect(EffectKind::LightningChain { target }, origin, CHAIN_LINK_LIFE);
        damage_enemy(state, idx, damage, color);
        origin = target;
    }

    struck.remove(0);
    struck
}

/// Apply damage to the player: shield first, overflow into hp
pub fn take_player_damage(state: &mut GameState, amount: f32) {
    if amount <= 0.0 || state.game_over {
        return;
    }
    let p = &mut state.player;
    p.shield_regen_timer = SHIELD_COOLDOWN;

    let absorbed = p.shield.min(amount);
    p.shield -= absorbed;
    let remaining = amount - absorbed;
    if remaining <= 0.0 {
        return;
    }
    p.hp -= remaining;
    let pos = p.pos;
    let dead = p.hp <= 0.0;
    if dead {
        p.is_dead = true;
    }
    state.add_text(format!("-{}", remaining.round() as i64), pos, COLOR_RED);
    if dead {
        state.game_over = true;
        log::info!(
            "Game over at level {} with score {}",
            state.player.level,
            state.score
        );
    }
}

/// Launch a caster bolt at the player's current position
pub fn fire_enemy_bolt(state: &mut GameState, from: Vec2, damage: f32) {
    let dir = (state.player.pos - from).normalize_or_zero();
    let id = state.next_entity_id();
    state.projectiles.push(Projectile {
        id,
        pos: from,
        vel: dir * ENEMY_BOLT_SPEED,
        radius: PROJECTILE_RADIUS,
        is_dead: false,
        spell: SpellKind::Fire,
        damage,
        duration: ENEMY_BOLT_LIFE,
        hit_list: Vec::new(),
        source: ProjectileSource::Enemy,
        target_pos: None,
        explosion_radius: None,
        knockback: None,
    });
}

/// Move projectiles, stop them at walls, expire them, detonate bombs
pub fn step_projectiles(state: &mut GameState) {
    for i in 0..state.projectiles.len() {
        let p = &mut state.projectiles[i];
        if p.is_dead {
            continue;
        }

        if let Some(target) = p.target_pos
            && p.pos.distance(target) < BOMB_ARRIVAL_DISTANCE
        {
            p.is_dead = true;
            let (pos, damage) = (p.pos, p.damage);
            explode_bomb(state, pos, damage);
            continue;
        }

        let next = p.pos + p.vel;
        let lobbed = p.target_pos.is_some();
        if !lobbed && !is_position_valid(next, p.radius) {
            p.is_dead = true;
            if p.spell == SpellKind::Fire {
                let snapshot = p.clone();
                fire_impact(state, snapshot.pos, &snapshot);
            }
            continue;
        }
        p.pos = next;

        p.duration = p.duration.saturating_sub(1);
        if p.duration == 0 {
            p.is_dead = true;
            if lobbed {
                let (pos, damage) = (p.pos, p.damage);
                explode_bomb(state, pos, damage);
            }
        }
    }
}

/// Projectile-vs-enemy and projectile-vs-player contact
pub fn resolve_projectile_hits(state: &mut GameState) {
    for pi in 0..state.projectiles.len() {
        let projectile = &state.projectiles[pi];
        if projectile.is_dead || projectile.target_pos.is_some() {
            continue;
        }

        if projectile.is_enemy() {
            let player = &state.player;
            if circles_overlap(projectile.pos, projectile.radius, player.pos, player.radius) {
                let damage = projectile.damage;
                state.projectiles[pi].is_dead = true;
                take_player_damage(state, damage);
            }
            continue;
        }

        for ei in 0..state.enemies.len() {
            let projectile = &state.projectiles[pi];
            if projectile.is_dead {
                break;
            }
            let enemy = &state.enemies[ei];
            if enemy.is_dead || projectile.hit_list.contains(&enemy.id) {
                continue;
            }
            if !circles_overlap(projectile.pos, projectile.radius, enemy.pos, enemy.radius) {
                continue;
            }
            projectile_hit(state, pi, ei);
        }
    }
}

fn projectile_hit(state: &mut GameState, pi: usize, ei: usize) {
    let projectile = state.projectiles[pi].clone();
    let enemy_id = state.enemies[ei].id;
    let enemy_pos = state.enemies[ei].pos;
    let config = projectile.spell.config();

    impact_puff(state, enemy_pos, projectile.spell);

    match projectile.spell {
        SpellKind::Ice => {
            if let SpellEffect::Freeze { ticks } = config.effect {
                let enemy = &mut state.enemies[ei];
                enemy.frozen = true;
                enemy.freeze_timer = ticks;
            }
            if state.player.level >= LEVEL_5_UNLOCK {
                state.projectiles[pi].hit_list.push(enemy_id);
            } else {
                state.projectiles[pi].is_dead = true;
            }
            damage_enemy(state, ei, projectile.damage, config.color);
        }
        SpellKind::Fire => {
            state.projectiles[pi].is_dead = true;
            damage_enemy(state, ei, projectile.damage, config.color);
            fire_impact(state, projectile.pos, &projectile);
        }
        SpellKind::Lightning => {
            state.projectiles[pi].is_dead = true;
            damage_enemy(state, ei, projectile.damage, config.color);
            if let SpellEffect::Chain { range, hops } = config.effect {
                chain_lightning(state, enemy_id, projectile.damage, hops, range);
            }
        }
        SpellKind::Wind | SpellKind::Earth => {
            state.projectiles[pi].is_dead = true;
            let fallback = knockback_for(state, projectile.spell);
            let force = projectile.knockback.or(fallback).unwrap_or(0.0);
            let dir = (enemy_pos - projectile.pos).normalize_or_zero();
            knock_back(state, ei, dir, force);
            let landed = state.enemies[ei].pos;
            if projectile.spell == SpellKind::Earth {
                state.add_text("SLAM!", landed, config.color);
            } else {
                state.add_text(">>>", landed, config.color);
            }
            damage_enemy(state, ei, projectile.damage, config.color);
        }
        _ => {
            state.projectiles[pi].is_dead = true;
            damage_enemy(state, ei, projectile.damage, config.color);
        }
    }
}

fn impact_puff(state: &mut GameState, at: Vec2, spell: SpellKind) {
    for _ in 0..3 {
        let jitter = Vec2::new(
            state.rng.random::<f32>() - 0.5,
            state.rng.random::<f32>() - 0.5,
        ) * 0.5;
        state.add_effect(EffectKind::ImpactPuff { spell }, at + jitter, PUFF_LIFE);
    }
}
