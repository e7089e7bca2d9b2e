//! Enemy spawner and per-enemy behaviour
//!
//! Melee enemies chase the player and drain hp on contact. Casters hold a
//! stand-off ring and shoot. Both fall back to phasing through terrain when
//! stuck detection decides they are wedged.

use glam::Vec2;
use rand::Rng;

use super::combat::{fire_enemy_bolt, take_player_damage};
use super::spatial::{circles_overlap, is_position_valid, slide_move};
use super::state::{Archetype, COLOR_GREY, Enemy, EntityId, GameState};
use crate::consts::*;

/// Ticks between spawns at the given player level
pub fn spawn_interval(level: u32) -> u32 {
    ENEMY_SPAWN_RATE
        .saturating_sub(level * 5)
        .max(ENEMY_MIN_SPAWN_RATE)
}

/// Advance the spawn timer, spawning one enemy when it elapses
pub fn step_spawner(state: &mut GameState) -> Option<EntityId> {
    if !state.settings.spawn_enemies {
        return None;
    }
    state.spawn_timer += 1;
    if state.spawn_timer < spawn_interval(state.player.level) {
        return None;
    }
    state.spawn_timer = 0;
    spawn_enemy(state)
}

/// Spawn an enemy on a ring around the player, respecting the enemy cap
pub fn spawn_enemy(state: &mut GameState) -> Option<EntityId> {
    if state.living_enemies() >= state.settings.max_enemies {
        return None;
    }
    let angle = state.rng.random::<f32>() * std::f32::consts::TAU;
    let pos = state.player.pos + Vec2::new(angle.cos(), angle.sin()) * ENEMY_SPAWN_DISTANCE;
    let archetype =
        if state.player.level >= LEVEL_5_UNLOCK && state.rng.random_bool(CASTER_CHANCE) {
            Archetype::Caster
        } else {
            Archetype::Melee
        };
    let id = state.spawn_enemy_at(pos, archetype);
    log::debug!("Spawned {:?} enemy {} at {:?}", archetype, id, pos);
    Some(id)
}

/// What one enemy's step asks of the rest of the world
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct EnemyStep {
    entered_phasing: bool,
    /// Bolt origin and damage
    shot: Option<(Vec2, f32)>,
    touching_player: bool,
}

/// Run AI for every living enemy
pub fn step_enemies(state: &mut GameState) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    for i in 0..state.enemies.len() {
        if state.enemies[i].is_dead {
            continue;
        }
        let step = step_enemy(&mut state.enemies[i], player_pos, player_radius);
        let (id, pos) = (state.enemies[i].id, state.enemies[i].pos);

        if step.entered_phasing {
            log::debug!("Enemy {} is phasing", id);
            state.add_text("Ghosting", pos, COLOR_GREY);
        }
        if let Some((from, damage)) = step.shot {
            fire_enemy_bolt(state, from, damage);
        }
        if step.touching_player {
            take_player_damage(state, MELEE_CONTACT_DAMAGE);
        }
    }
}

fn step_enemy(enemy: &mut Enemy, player_pos: Vec2, player_radius: f32) -> EnemyStep {
    let mut step = EnemyStep::default();
    let before = enemy.pos;

    if enemy.frozen {
        enemy.freeze_timer = enemy.freeze_timer.saturating_sub(1);
        if enemy.freeze_timer == 0 {
            enemy.frozen = false;
        }
    }
    let speed = if enemy.frozen {
        enemy.speed * 0.5
    } else {
        enemy.speed
    };
    let dist_to_player = enemy.pos.distance(player_pos);

    if enemy.phasing {
        enemy.phase_timer = enemy.phase_timer.saturating_sub(1);
        if enemy.phase_timer == 0 {
            enemy.phasing = false;
        }
    }
    step.entered_phasing = update_stuck_detection(enemy);

    match enemy.archetype {
        Archetype::Caster => {
            if dist_to_player > CASTER_RANGE {
                let dir = (player_pos - enemy.pos).normalize_or_zero();
                advance(enemy, dir * speed * ENEMY_MOVE_SCALE);
            } else if dist_to_player < CASTER_RANGE - CASTER_RANGE_BUFFER {
                let dir = (enemy.pos - player_pos).normalize_or_zero();
                advance(enemy, dir * speed * ENEMY_RETREAT_SCALE);
            }

            enemy.attack_cooldown = enemy.attack_cooldown.saturating_sub(1);
            if dist_to_player < CASTER_RANGE + CASTER_RANGE_BUFFER && enemy.attack_cooldown == 0 {
                step.shot = Some((enemy.pos, enemy.damage));
                enemy.attack_cooldown = CASTER_COOLDOWN;
            }
        }
        Archetype::Melee => {
            if dist_to_player > 0.1 {
                let dir = (player_pos - enemy.pos) / dist_to_player;
                chase(enemy, dir, speed * ENEMY_MOVE_SCALE);
            }
            step.touching_player =
                circles_overlap(enemy.pos, enemy.radius, player_pos, player_radius);
        }
    }
    enemy.vel = enemy.pos - before;
    step
}

/// Sample displacement every `STUCK_CHECK_INTERVAL` ticks; returns true when
/// the enemy just started phasing.
fn update_stuck_detection(enemy: &mut Enemy) -> bool {
    enemy.stuck_check_timer += 1;
    if enemy.stuck_check_timer < STUCK_CHECK_INTERVAL {
        return false;
    }
    if enemy.pos.distance(enemy.last_stuck_pos) < STUCK_DISTANCE {
        enemy.stuck_counter += 1;
    } else {
        enemy.stuck_counter = 0;
    }
    enemy.last_stuck_pos = enemy.pos;
    enemy.stuck_check_timer = 0;

    if enemy.stuck_counter >= STUCK_STREAK_LIMIT {
        enemy.phasing = true;
        enemy.phase_timer = ENEMY_PHASE_DURATION;
        enemy.stuck_counter = 0;
        return true;
    }
    false
}

/// Move ignoring terrain while phasing, otherwise slide axis by axis
fn advance(enemy: &mut Enemy, delta: Vec2) -> bool {
    if enemy.phasing {
        enemy.pos += delta;
        return true;
    }
    slide_move(&mut enemy.pos, delta, enemy.radius)
}

/// Melee pursuit: direct, then either perpendicular strafe if fully blocked
fn chase(enemy: &mut Enemy, dir: Vec2, step_len: f32) {
    if advance(enemy, dir * step_len) {
        return;
    }
    for strafe in [dir.perp(), -dir.perp()] {
        let candidate = enemy.pos + strafe * step_len;
        if is_position_valid(candidate, enemy.radius) {
            enemy.pos = candidate;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimSettings;
    use crate::sim::spatial::{OBSTACLE_RADIUS, any_tree_near_origin, tile_center};
    use crate::sim::state::ProjectileSource;

    fn quiet_state() -> GameState {
        GameState::new(SimSettings {
            spawn_enemies: false,
            ..SimSettings::with_seed(21)
        })
    }

    #[test]
    fn test_spawn_interval_floor() {
        assert_eq!(spawn_interval(1), 255);
        assert_eq!(spawn_interval(10), 210);
        assert_eq!(spawn_interval(44), ENEMY_MIN_SPAWN_RATE);
        assert_eq!(spawn_interval(1_000), ENEMY_MIN_SPAWN_RATE);
    }

    #[test]
    fn test_spawner_fires_on_interval() {
        let mut state = GameState::with_seed(4);
        let interval = spawn_interval(1);
        for _ in 0..interval - 1 {
            assert!(step_spawner(&mut state).is_none());
        }
        let id = step_spawner(&mut state).unwrap();
        assert_eq!(state.spawn_timer, 0);
        let enemy = &state.enemies[state.enemy_index(id).unwrap()];
        assert!((enemy.pos.distance(state.player.pos) - ENEMY_SPAWN_DISTANCE).abs() < 1e-3);
        assert_eq!(enemy.archetype, Archetype::Melee);
    }

    #[test]
    fn test_spawner_disabled() {
        let mut state = quiet_state();
        for _ in 0..1_000 {
            step_spawner(&mut state);
        }
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_enemy_cap() {
        let mut state = GameState::new(SimSettings {
            max_enemies: 3,
            ..SimSettings::with_seed(4)
        });
        for _ in 0..10 {
            spawn_enemy(&mut state);
        }
        assert_eq!(state.enemies.len(), 3);
        state.enemies[0].is_dead = true;
        assert!(spawn_enemy(&mut state).is_some());
    }

    #[test]
    fn test_casters_only_from_level_five() {
        let mut state = quiet_state();
        state.settings.max_enemies = usize::MAX;
        for _ in 0..200 {
            spawn_enemy(&mut state);
        }
        assert!(state.enemies.iter().all(|e| e.archetype == Archetype::Melee));

        state.player.level = LEVEL_5_UNLOCK;
        for _ in 0..200 {
            spawn_enemy(&mut state);
        }
        assert!(state.enemies.iter().any(|e| e.archetype == Archetype::Caster));
    }

    #[test]
    fn test_freeze_halves_speed_then_expires() {
        let mut state = quiet_state();
        state.spawn_enemy_at(Vec2::new(500.5, 0.5), Archetype::Melee);
        state.player.pos = Vec2::new(400.5, 0.5);
        state.enemies[0].phasing = true;
        state.enemies[0].phase_timer = 1_000;
        state.enemies[0].frozen = true;
        state.enemies[0].freeze_timer = 3;

        let speed = state.enemies[0].speed;
        let before = state.enemies[0].pos;
        step_enemies(&mut state);
        let moved = before.distance(state.enemies[0].pos);
        assert!((moved - speed * 0.5 * ENEMY_MOVE_SCALE).abs() < 1e-5);

        step_enemies(&mut state);
        step_enemies(&mut state);
        assert!(!state.enemies[0].frozen);
        let before = state.enemies[0].pos;
        step_enemies(&mut state);
        let moved = before.distance(state.enemies[0].pos);
        assert!((moved - speed * ENEMY_MOVE_SCALE).abs() < 1e-5);
    }

    #[test]
    fn test_enemy_velocity_tracks_last_step() {
        let mut state = quiet_state();
        state.spawn_enemy_at(Vec2::new(500.5, 0.5), Archetype::Melee);
        state.player.pos = Vec2::new(400.5, 0.5);
        state.enemies[0].phasing = true;
        state.enemies[0].phase_timer = 1_000;

        let before = state.enemies[0].pos;
        step_enemies(&mut state);
        let enemy = &state.enemies[0];
        assert_eq!(enemy.vel, enemy.pos - before);
        assert!(enemy.vel.x < 0.0);

        state.enemies[0].frozen = true;
        state.enemies[0].freeze_timer = 10;
        let full = state.enemies[0].vel.length();
        step_enemies(&mut state);
        assert!((state.enemies[0].vel.length() - full * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_melee_contact_drains_player() {
        let mut state = quiet_state();
        let pos = state.player.pos;
        state.spawn_enemy_at(pos + Vec2::new(0.5, 0.0), Archetype::Melee);
        state.enemies[0].phasing = true;
        state.enemies[0].phase_timer = 100;
        step_enemies(&mut state);
        assert_eq!(state.player.shield, PLAYER_START_SHIELD - MELEE_CONTACT_DAMAGE);
        assert_eq!(state.player.shield_regen_timer, SHIELD_COOLDOWN);
    }

    #[test]
    fn test_caster_keeps_distance_and_fires() {
        let mut state = quiet_state();
        let pos = state.player.pos;
        state.spawn_enemy_at(pos + Vec2::new(3.0, 0.0), Archetype::Caster);
        state.enemies[0].phasing = true;
        state.enemies[0].phase_timer = 100;

        step_enemies(&mut state);
        let enemy = &state.enemies[0];
        // Too close: backs off, and is in range to shoot
        assert!(enemy.pos.x > pos.x + 3.0);
        assert_eq!(enemy.attack_cooldown, CASTER_COOLDOWN);
        assert_eq!(state.projectiles.len(), 1);
        let bolt = &state.projectiles[0];
        assert_eq!(bolt.source, ProjectileSource::Enemy);
        assert!(bolt.vel.x < 0.0);
        assert_eq!(bolt.damage, CASTER_DAMAGE);

        // Cooling down: no second bolt
        step_enemies(&mut state);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn test_distant_caster_approaches_without_firing() {
        let mut state = quiet_state();
        let pos = state.player.pos;
        state.spawn_enemy_at(pos + Vec2::new(12.0, 0.0), Archetype::Caster);
        state.enemies[0].phasing = true;
        state.enemies[0].phase_timer = 100;
        step_enemies(&mut state);
        assert!(state.enemies[0].pos.x < pos.x + 12.0);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_stuck_streak_starts_phasing() {
        let mut enemy = Enemy::new(1, Vec2::new(3.0, 3.0), Archetype::Melee, 1);
        for _ in 0..STUCK_CHECK_INTERVAL * (STUCK_STREAK_LIMIT - 1) {
            assert!(!update_stuck_detection(&mut enemy));
        }
        let mut entered = false;
        for _ in 0..STUCK_CHECK_INTERVAL {
            entered |= update_stuck_detection(&mut enemy);
        }
        assert!(entered);
        assert!(enemy.phasing);
        assert_eq!(enemy.phase_timer, ENEMY_PHASE_DURATION);
        assert_eq!(enemy.stuck_counter, 0);
    }

    #[test]
    fn test_movement_resets_stuck_streak() {
        let mut enemy = Enemy::new(1, Vec2::ZERO, Archetype::Melee, 1);
        enemy.stuck_counter = 2;
        enemy.pos = Vec2::new(2.0, 0.0);
        enemy.stuck_check_timer = STUCK_CHECK_INTERVAL - 1;
        assert!(!update_stuck_detection(&mut enemy));
        assert_eq!(enemy.stuck_counter, 0);
        assert_eq!(enemy.last_stuck_pos, enemy.pos);
    }

    #[test]
    fn test_phase_expires() {
        let mut enemy = Enemy::new(1, Vec2::ZERO, Archetype::Melee, 1);
        enemy.phasing = true;
        enemy.phase_timer = 2;
        step_enemy(&mut enemy, Vec2::new(50.0, 0.0), PLAYER_RADIUS);
        assert!(enemy.phasing);
        step_enemy(&mut enemy, Vec2::new(50.0, 0.0), PLAYER_RADIUS);
        assert!(!enemy.phasing);
    }

    #[test]
    fn test_wedged_enemy_phases_through_tree() {
        let mut state = quiet_state();
        let (tx, ty) = any_tree_near_origin();
        let tree = tile_center(tx, ty);
        let start = tree - Vec2::new(ENEMY_RADIUS + OBSTACLE_RADIUS + 0.05, 0.0);
        state.player.pos = tree + Vec2::new(3.0, 0.0);
        state.spawn_enemy_at(start, Archetype::Melee);
        {
            let e = &mut state.enemies[0];
            e.stuck_counter = STUCK_STREAK_LIMIT - 1;
            e.stuck_check_timer = STUCK_CHECK_INTERVAL - 1;
            e.last_stuck_pos = start;
        }

        step_enemies(&mut state);
        assert!(state.enemies[0].phasing);
        assert!(state.enemies[0].pos.x > start.x);
        assert!(state.texts.iter().any(|t| t.text == "Ghosting"));

        let reach = ENEMY_RADIUS + OBSTACLE_RADIUS;
        let mut inside_tree = false;
        for _ in 0..60 {
            step_enemies(&mut state);
            if state.enemies[0].pos.distance(tree) < reach * 0.5 {
                inside_tree = true;
                break;
            }
        }
        assert!(inside_tree);
    }
}
