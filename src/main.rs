//! Wildcaster headless driver
//!
//! Runs a scripted session without a renderer and prints the periodic
//! snapshots as JSON lines. Usage: `wildcaster [settings.json] [frames]`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use wildcaster::SimSettings;
    use wildcaster::consts::*;
    use wildcaster::sim::{BaseStat, GameState, Intent, PotionKind, Talent, TickInput, tick};

    const DEFAULT_FRAMES: u64 = 60 * TICKS_PER_SECOND as u64;

    /// Load settings from a JSON file, falling back to defaults on any error
    pub fn load_settings(path: Option<&str>) -> SimSettings {
        let Some(path) = path else {
            return SimSettings::default();
        };
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("Could not read {}: {}; using default settings", path, err);
                return SimSettings::default();
            }
        };
        SimSettings::from_json(&text).unwrap_or_else(|err| {
            log::warn!("Invalid settings in {}: {}; using default settings", path, err);
            SimSettings::default()
        })
    }

    /// Autopilot: circle slowly, shoot the nearest enemy, drink when hurt,
    /// spend points as they come in.
    fn scripted_input(state: &GameState, frame: u64) -> TickInput {
        let mut input = TickInput::default();

        let angle = frame as f32 * 0.01;
        input.move_toward = Some(Vec2::new(angle.cos(), angle.sin()) * 100.0);

        let player = &state.player;
        input.cast_at = state
            .enemies
            .iter()
            .filter(|e| e.is_alive())
            .min_by(|a, b| {
                a.pos
                    .distance(player.pos)
                    .partial_cmp(&b.pos.distance(player.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|e| e.pos);

        if player.hp < player.max_hp * 0.4 && player.potions.health > 0 {
            input.intents.push(Intent::UsePotion(PotionKind::Health));
        }
        if player.stat_points > 0 {
            let intent = if player.level % 2 == 0 {
                Intent::UpgradeStat(BaseStat::Power)
            } else {
                Intent::UpgradeTalent(Talent::Multishot)
            };
            input.intents.push(intent);
        }
        for item in &player.inventory {
            let better = player
                .equipment
                .slot(item.slot)
                .is_none_or(|current| item.rarity > current.rarity);
            if better {
                input.intents.push(Intent::Equip(item.id));
                break;
            }
        }
        input
    }

    pub fn run(settings: SimSettings, frames: u64) {
        log::info!("Starting session with seed {}", settings.seed);
        let mut state = GameState::new(settings);

        for frame in 0..frames {
            let input = scripted_input(&state, frame);
            if let Some(snapshot) = tick(&mut state, &input, SIM_DT) {
                match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{}", line),
                    Err(err) => log::warn!("Snapshot serialization failed: {}", err),
                }
            }
            if state.game_over {
                break;
            }
        }

        log::info!(
            "Session ended after {} ticks: level {}, score {}, {} quests",
            state.time_ticks,
            state.player.level,
            state.score,
            state.quests_completed
        );
    }

    pub fn frames_arg(arg: Option<&str>) -> u64 {
        match arg.map(str::parse::<u64>) {
            Some(Ok(frames)) => frames,
            Some(Err(err)) => {
                log::warn!("Invalid frame count: {}; running {} frames", err, DEFAULT_FRAMES);
                DEFAULT_FRAMES
            }
            None => DEFAULT_FRAMES,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Wildcaster (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = headless::load_settings(args.first().map(String::as_str));
    let frames = headless::frames_arg(args.get(1).map(String::as_str));
    headless::run(settings, frames);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}
