//! Loot drops, equipment generation, pickups and quests

use glam::Vec2;
use rand::Rng;

use super::progression::grant_xp;
use super::state::{
    COLOR_GOLD, COLOR_WHITE, EntityId, EquipmentItem, EquipmentSlot, GameState, ItemStats, Loot,
    LootKind, Quest, QuestKind, Rarity,
};
use crate::consts::*;

const ADJECTIVES: [&str; 5] = ["Rusty", "Glowing", "Ancient", "Void", "Divine"];

/// Map a uniform roll in [0, 1) onto the rarity ladder
pub fn rarity_for_roll(roll: f64) -> Rarity {
    if roll > 0.95 {
        Rarity::Legendary
    } else if roll > 0.85 {
        Rarity::Epic
    } else if roll > 0.60 {
        Rarity::Rare
    } else {
        Rarity::Common
    }
}

/// Roll a random equipment item
pub fn generate_equipment<R: Rng>(rng: &mut R, id: EntityId) -> EquipmentItem {
    let slot = EquipmentSlot::ALL[rng.random_range(0..EquipmentSlot::ALL.len())];
    let rarity = rarity_for_roll(rng.random::<f64>());

    let mut stats = ItemStats::default();
    for _ in 0..rarity.stat_budget() {
        let category = rng.random::<f64>();
        if category < 0.3 {
            stats.damage += rng.random_range(1..=2) as f32;
        } else if category < 0.5 {
            stats.shield += rng.random_range(2..=6) as f32;
        } else if category < 0.7 {
            stats.speed += 0.05;
        } else if rarity.allows_projectiles() {
            stats.projectile_count += 1;
        } else {
            stats.damage += 1.0;
        }
    }

    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    EquipmentItem {
        id,
        name: format!("{} {}", adjective, slot.noun()),
        slot,
        rarity,
        stats,
        icon: slot.icon().to_string(),
    }
}

/// Drop coins (and maybe a bonus item) where an enemy died
pub fn spawn_loot(state: &mut GameState, pos: Vec2) {
    let coin_count = state.rng.random_range(1..=3);
    for _ in 0..coin_count {
        let scatter = Vec2::new(
            (state.rng.random::<f32>() - 0.5) * COIN_SCATTER,
            (state.rng.random::<f32>() - 0.5) * COIN_SCATTER,
        );
        let value = state.rng.random_range(COIN_VALUE_MIN..=COIN_VALUE_MAX);
        let id = state.next_entity_id();
        state.loot.push(Loot {
            id,
            pos: pos + scatter,
            radius: COIN_RADIUS,
            is_dead: false,
            life: LOOT_LIFE,
            kind: LootKind::Coin { value },
        });
    }

    let wants_equipment = state.rng.random::<f64>() < EQUIPMENT_SHARE;
    if state.rng.random::<f64>() >= LOOT_DROP_CHANCE {
        return;
    }
    let id = state.next_entity_id();
    let kind = if wants_equipment {
        let item_id = state.next_entity_id();
        LootKind::Equipment(generate_equipment(&mut state.rng, item_id))
    } else {
        LootKind::BombAmmo
    };
    state.loot.push(Loot {
        id,
        pos,
        radius: DROP_RADIUS,
        is_dead: false,
        life: LOOT_LIFE,
        kind,
    });
}

/// Build the next quest; targets and rewards scale with completions
pub fn generate_quest<R: Rng>(rng: &mut R, id: EntityId, completed: u32) -> Quest {
    let kind = if rng.random_bool(0.5) {
        QuestKind::Kill
    } else {
        QuestKind::Collect
    };
    quest_for(kind, id, completed)
}

/// Deterministic quest contents for a kind and completion count
pub fn quest_for(kind: QuestKind, id: EntityId, completed: u32) -> Quest {
    let scale = 1.0 + completed as f64 * QUEST_SCALE_PER_COMPLETION;
    let scaled = |base: u32| (base as f64 * scale).ceil() as u32;
    let (target, description) = match kind {
        QuestKind::Kill => {
            let target = scaled(QUEST_BASE_KILL_TARGET);
            (target, format!("Kill {} Enemies", target))
        }
        QuestKind::Collect => {
            let target = scaled(QUEST_BASE_COLLECT_TARGET);
            (target, format!("Collect {} Coins", target))
        }
    };
    Quest {
        id,
        kind,
        description,
        target,
        current: 0,
        reward_xp: scaled(QUEST_BASE_REWARD_XP),
        reward_coins: scaled(QUEST_BASE_REWARD_COINS),
    }
}

/// Add progress to the active quest if it is of the given kind
pub fn advance_quest(state: &mut GameState, kind: QuestKind, amount: u32) {
    if state.quest.kind != kind {
        return;
    }
    state.quest.current += amount;
    check_quest_completion(state);
}

/// Grant rewards and roll a new quest once progress reaches the target
pub fn check_quest_completion(state: &mut GameState) -> bool {
    if !state.quest.is_complete() {
        return false;
    }
    let reward_xp = state.quest.reward_xp;
    let reward_coins = state.quest.reward_coins;
    let pos = state.player.pos;
    log::info!(
        "Quest complete: {} (+{} xp, +{} coins)",
        state.quest.description,
        reward_xp,
        reward_coins
    );

    state.add_text("QUEST COMPLETE!", pos, COLOR_GOLD);
    state.add_text(format!("+{} XP", reward_xp), pos - Vec2::new(0.0, 1.0), COLOR_GOLD);
    state.add_text(
        format!("+{} Coins", reward_coins),
        pos - Vec2::new(0.0, 1.5),
        COLOR_GOLD,
    );
    grant_xp(state, reward_xp);
    state.player.coins += reward_coins;
    state.quests_completed += 1;

    let id = state.next_entity_id();
    state.quest = generate_quest(&mut state.rng, id, state.quests_completed);
    true
}

/// Age loot, pull coins toward the player, and collect anything in reach
pub fn step_loot(state: &mut GameState) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    for i in 0..state.loot.len() {
        let loot = &mut state.loot[i];
        if loot.is_dead {
            continue;
        }
        loot.life = loot.life.saturating_sub(1);
        if loot.life == 0 {
            loot.is_dead = true;
        }

        if matches!(loot.kind, LootKind::Coin { .. })
            && loot.pos.distance(player_pos) < COIN_MAGNET_RANGE
        {
            let dir = (player_pos - loot.pos).normalize_or_zero();
            loot.pos += dir * COIN_MAGNET_SPEED;
        }

        let reach = loot.radius + player_radius + PICKUP_MARGIN;
        if loot.pos.distance(player_pos) >= reach {
            continue;
        }
        loot.is_dead = true;
        let kind = loot.kind.clone();
        collect(state, kind);
    }
}

fn collect(state: &mut GameState, kind: LootKind) {
    let pos = state.player.pos;
    match kind {
        LootKind::BombAmmo => {
            state.player.bomb_ammo += 1;
            state.add_text("+1 💣", pos, COLOR_WHITE);
        }
        LootKind::Equipment(item) => {
            state.add_text(item.name.clone(), pos, item.rarity.color());
            state.player.inventory.push(item);
        }
        LootKind::Coin { value } => {
            state.player.coins += value;
            advance_quest(state, QuestKind::Collect, value);
        }
    }
}
