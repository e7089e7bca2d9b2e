//! Fixed timestep simulation tick
//!
//! One call per host animation frame. Phases run in a fixed order:
//! upkeep and spawning, movement, casting, projectile flight, enemy AI, loot,
//! projectile contact, pruning, then presentation decay.

use glam::Vec2;
use serde::Serialize;

use super::ai::{step_enemies, step_spawner};
use super::combat::{cast_spell, resolve_projectile_hits, step_projectiles};
use super::loot::step_loot;
use super::progression::{
    equip_item, movement_speed, toggle_mount, unequip_item, update_upkeep, upgrade_base_stat,
    upgrade_talent, use_potion,
};
use super::spatial::slide_move;
use super::spells::SpellKind;
use super::state::{
    BaseStat, EntityId, EquipmentSlot, GameState, Player, PotionKind, Quest, Talent,
};
use crate::to_world;

/// Pointer offsets shorter than this (screen pixels) don't move the player
pub const MOVE_DEAD_ZONE: f32 = 5.0;

/// Discrete player commands for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    SelectSpell(SpellKind),
    UsePotion(PotionKind),
    ToggleMount,
    Equip(EntityId),
    Unequip(EquipmentSlot),
    UpgradeTalent(Talent),
    UpgradeStat(BaseStat),
    TogglePause,
}

impl Intent {
    /// Character-panel actions apply even while paused (but not after game over)
    fn is_panel_action(&self) -> bool {
        matches!(
            self,
            Intent::Equip(_) | Intent::Unequip(_) | Intent::UpgradeTalent(_) | Intent::UpgradeStat(_)
        )
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held pointer, as a screen-space offset from the player (pixels)
    pub move_toward: Option<Vec2>,
    /// Cast at this world point
    pub cast_at: Option<Vec2>,
    /// Spell to cast at `cast_at`; `None` casts the selected spell. An
    /// unknown spell is rejected without charging the cooldown.
    pub cast_spell: Option<SpellKind>,
    pub intents: Vec<Intent>,
}

/// State published to the host every `snapshot_interval` frames
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub player: Player,
    pub score: u64,
    pub game_over: bool,
    pub quest: Quest,
    pub paused: bool,
    pub session_time: f64,
    pub time_ticks: u64,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            player: state.player.clone(),
            score: state.score,
            game_over: state.game_over,
            quest: state.quest.clone(),
            paused: state.paused,
            session_time: state.session_time,
            time_ticks: state.time_ticks,
        }
    }
}

/// Advance the game state by one frame. Returns a snapshot on cadence frames.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Option<Snapshot> {
    state.frame_count += 1;

    for intent in &input.intents {
        apply_intent(state, *intent);
    }

    if !state.paused && !state.game_over {
        state.session_time += dt as f64;
        run_gameplay(state, input);
        state.time_ticks += 1;
        state.prune_dead();
        decay_presentation(state);
    }

    let interval = state.settings.effective_snapshot_interval() as u64;
    if state.frame_count % interval == 0 {
        Some(Snapshot::capture(state))
    } else {
        None
    }
}

fn apply_intent(state: &mut GameState, intent: Intent) {
    if let Intent::TogglePause = intent {
        state.paused = !state.paused;
        log::info!("{}", if state.paused { "Paused" } else { "Resumed" });
        return;
    }
    if state.game_over || (state.paused && !intent.is_panel_action()) {
        return;
    }

    match intent {
        Intent::SelectSpell(spell) => {
            if state.player.knows(spell) {
                state.player.current_spell = spell;
            }
        }
        Intent::UsePotion(kind) => {
            if let Err(err) = use_potion(state, kind) {
                log::debug!("Potion {:?} rejected: {}", kind, err);
            }
        }
        Intent::ToggleMount => {
            toggle_mount(state);
        }
        Intent::Equip(item_id) => {
            equip_item(state, item_id);
        }
        Intent::Unequip(slot) => {
            unequip_item(state, slot);
        }
        Intent::UpgradeTalent(talent) => {
            upgrade_talent(state, talent);
        }
        Intent::UpgradeStat(stat) => {
            upgrade_base_stat(state, stat);
        }
        Intent::TogglePause => {}
    }
}

/// Gameplay phases; stops early once the player dies
fn run_gameplay(state: &mut GameState, input: &TickInput) {
    update_upkeep(&mut state.player);
    step_spawner(state);

    if let Some(offset) = input.move_toward {
        move_player(state, offset);
    }

    if let Some(aim) = input.cast_at
        && let Err(reason) = cast_spell(state, input.cast_spell, aim)
    {
        log::debug!("Cast rejected: {}", reason);
    }
    state.player.cast_cooldown = (state.player.cast_cooldown - 1.0).max(0.0);

    step_projectiles(state);
    step_enemies(state);
    if state.game_over {
        return;
    }
    step_loot(state);
    resolve_projectile_hits(state);
}

/// Walk toward a screen-space pointer offset, sliding along obstacles
fn move_player(state: &mut GameState, offset: Vec2) {
    let screen_dist = offset.length();
    if screen_dist <= MOVE_DEAD_ZONE {
        state.player.vel = Vec2::ZERO;
        return;
    }
    let screen_vel = offset / screen_dist * movement_speed(&state.player);
    let delta = to_world(screen_vel);
    let player = &mut state.player;
    let before = player.pos;
    slide_move(&mut player.pos, delta, player.radius);
    player.vel = player.pos - before;
}

/// Count down effect and text lifetimes; texts drift upward
fn decay_presentation(state: &mut GameState) {
    for text in &mut state.texts {
        text.pos += text.vel;
        text.life = text.life.saturating_sub(1);
    }
    state.texts.retain(|t| t.life > 0);

    for effect in &mut state.effects {
        effect.life = effect.life.saturating_sub(1);
    }
    state.effects.retain(|e| e.life > 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::SimSettings;
    use crate::sim::state::{Archetype, EquipmentItem, ItemStats, Rarity};

    fn quiet_state(seed: u64) -> GameState {
        GameState::new(SimSettings {
            spawn_enemies: false,
            snapshot_interval: 1,
            ..SimSettings::with_seed(seed)
        })
    }

    fn pause() -> TickInput {
        TickInput {
            intents: vec![Intent::TogglePause],
            ..Default::default()
        }
    }

    #[test]
    fn test_tick_pause() {
        let mut state = quiet_state(1);
        state.spawn_enemy_at(Vec2::new(8.0, 8.0), Archetype::Melee);
        state.player.shield = 10.0;

        tick(&mut state, &pause(), SIM_DT);
        assert!(state.paused);
        let frozen = state.clone();

        for _ in 0..30 {
            let snap = tick(&mut state, &TickInput::default(), SIM_DT).unwrap();
            assert!(snap.paused);
        }
        assert_eq!(state.enemies, frozen.enemies);
        assert_eq!(state.player.shield, frozen.player.shield);
        assert_eq!(state.session_time, frozen.session_time);
        assert_eq!(state.time_ticks, frozen.time_ticks);
        assert_eq!(state.frame_count, frozen.frame_count + 30);

        tick(&mut state, &pause(), SIM_DT);
        assert!(!state.paused);
        assert!(state.time_ticks > frozen.time_ticks);
    }

    #[test]
    fn test_paused_ignores_gameplay_but_applies_panel() {
        let mut state = quiet_state(1);
        state.paused = true;
        state.player.stat_points = 1;
        let input = TickInput {
            move_toward: Some(Vec2::new(100.0, 0.0)),
            cast_at: Some(Vec2::new(3.0, 0.0)),
            cast_spell: None,
            intents: vec![
                Intent::UsePotion(PotionKind::Speed),
                Intent::UpgradeStat(BaseStat::Vitality),
            ],
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.player.pos, Vec2::ZERO);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.player.potions.speed, POTION_START_CHARGES);
        assert_eq!(state.player.base_stats.vitality, 1);
        assert_eq!(state.player.stat_points, 0);
    }

    #[test]
    fn test_equip_through_intent() {
        let mut state = quiet_state(1);
        state.player.inventory.push(EquipmentItem {
            id: 500,
            name: "Glowing Wand".into(),
            slot: EquipmentSlot::Weapon,
            rarity: Rarity::Legendary,
            stats: ItemStats {
                projectile_count: 2,
                ..Default::default()
            },
            icon: EquipmentSlot::Weapon.icon().into(),
        });
        let input = TickInput {
            intents: vec![Intent::Equip(500)],
            cast_at: Some(Vec2::new(5.0, 5.0)),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert!(state.player.inventory.is_empty());
        assert_eq!(state.player.equipment.total_projectiles(), 2);
        assert!(state.player.cast_cooldown > 0.0);
    }

    #[test]
    fn test_snapshot_cadence() {
        let mut state = GameState::new(SimSettings {
            spawn_enemies: false,
            snapshot_interval: 10,
            ..SimSettings::with_seed(2)
        });
        let published: Vec<u64> = (0..35)
            .filter_map(|_| tick(&mut state, &TickInput::default(), SIM_DT))
            .map(|s| s.time_ticks)
            .collect();
        assert_eq!(published, vec![10, 20, 30]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = quiet_state(2);
        let snap = tick(&mut state, &TickInput::default(), SIM_DT).unwrap();
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"score\":0"));
        assert!(json.contains("\"quest\""));
    }

    #[test]
    fn test_movement_converts_screen_to_world() {
        let mut state = quiet_state(3);
        let speed = movement_speed(&state.player);
        // Straight right on screen is +x/-y in world space
        let input = TickInput {
            move_toward: Some(Vec2::new(200.0, 0.0)),
            ..Default::default()
        };
        let start = state.player.pos;
        tick(&mut state, &input, SIM_DT);
        let delta = state.player.pos - start;
        let expected = to_world(Vec2::new(speed, 0.0));
        assert!(delta.x == 0.0 || (delta.x - expected.x).abs() < 1e-5);
        assert!(delta.y == 0.0 || (delta.y - expected.y).abs() < 1e-5);
        assert_eq!(state.player.vel, delta);

        // Inside the dead zone: no movement
        let before = state.player.pos;
        let input = TickInput {
            move_toward: Some(Vec2::new(3.0, 0.0)),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.player.pos, before);
    }

    #[test]
    fn test_cooldown_ticks_down_after_cast() {
        let mut state = quiet_state(3);
        let input = TickInput {
            cast_at: Some(Vec2::new(4.0, 0.0)),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        let cd = SpellKind::Fire.config().cooldown as f32;
        assert_eq!(state.player.cast_cooldown, cd - 1.0);
        // Held cast while cooling down doesn't recharge the cooldown
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.player.cast_cooldown, cd - 2.0);
    }

    #[test]
    fn test_cast_named_spell() {
        let mut state = quiet_state(3);
        let aim = Vec2::new(4.0, 0.0);
        let unknown = TickInput {
            cast_at: Some(aim),
            cast_spell: Some(SpellKind::Ice),
            ..Default::default()
        };
        tick(&mut state, &unknown, SIM_DT);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.player.cast_cooldown, 0.0);
        assert_eq!(state.player.current_spell, SpellKind::Fire);

        // Once learned, the named spell is cast and becomes the selection
        state.player.known_spells.push(SpellKind::Ice);
        tick(&mut state, &unknown, SIM_DT);
        assert_eq!(state.player.current_spell, SpellKind::Ice);
        let cd = SpellKind::Ice.config().cooldown as f32;
        assert_eq!(state.player.cast_cooldown, cd - 1.0);
    }

    #[test]
    fn test_panel_locked_after_game_over() {
        let mut state = quiet_state(4);
        state.game_over = true;
        state.player.stat_points = 2;
        let max_hp = state.player.max_hp;
        let input = TickInput {
            intents: vec![
                Intent::UpgradeStat(BaseStat::Vitality),
                Intent::UpgradeTalent(Talent::Multishot),
            ],
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert_eq!(state.player.base_stats.vitality, 0);
        assert_eq!(state.player.talents.multishot, 0);
        assert_eq!(state.player.stat_points, 2);
        assert_eq!(state.player.max_hp, max_hp);
    }

    #[test]
    fn test_game_over_freezes_session() {
        let mut state = quiet_state(4);
        state.player.shield = 0.0;
        state.player.shield_regen_timer = 100;
        state.player.hp = 0.4;
        let pos = state.player.pos;
        state.spawn_enemy_at(pos + Vec2::new(0.3, 0.0), Archetype::Melee);
        state.enemies[0].phasing = true;
        state.enemies[0].phase_timer = 100;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.game_over);
        let ticks = state.time_ticks;
        let time = state.session_time;

        let snap = tick(
            &mut state,
            &TickInput {
                cast_at: Some(Vec2::new(3.0, 0.0)),
                ..Default::default()
            },
            SIM_DT,
        )
        .unwrap();
        assert!(snap.game_over);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.session_time, time);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_presentation_decays() {
        let mut state = quiet_state(5);
        state.add_text("hello", Vec2::ZERO, 0);
        for _ in 0..TEXT_LIFE - 1 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.texts.len(), 1);
        assert!(state.texts[0].pos.y < 0.0);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.texts.is_empty());
    }

    #[test]
    fn test_determinism() {
        let script = |frame: u32| TickInput {
            move_toward: Some(Vec2::new(
                (frame as f32 * 0.05).cos() * 100.0,
                (frame as f32 * 0.05).sin() * 100.0,
            )),
            cast_at: (frame % 7 == 0).then(|| Vec2::new(frame as f32 * 0.1, 2.0)),
            cast_spell: None,
            intents: Vec::new(),
        };

        let run = || {
            let mut state = GameState::with_seed(99_999);
            for frame in 0..1_500 {
                tick(&mut state, &script(frame), SIM_DT);
            }
            state
        };

        let a = run();
        let b = run();
        assert_eq!(a.player, b.player);
        assert_eq!(a.enemies, b.enemies);
        assert_eq!(a.projectiles, b.projectiles);
        assert_eq!(a.loot, b.loot);
        assert_eq!(a.score, b.score);
        assert_eq!(a.time_ticks, b.time_ticks);
        assert!(!a.enemies.is_empty() || a.score > 0);
    }
}
