//! Session configuration
//!
//! Loaded from JSON by the host; every field falls back to its default.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_ENEMIES;

/// Default outbound snapshot cadence (ticks)
pub const DEFAULT_SNAPSHOT_INTERVAL: u32 = 10;

/// Simulation settings for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Seed for all gameplay randomness
    pub seed: u64,
    /// Publish a snapshot every N ticks (0 is treated as 1)
    pub snapshot_interval: u32,
    /// Run the enemy spawner
    pub spawn_enemies: bool,
    /// Live enemy cap for the spawner
    pub max_enemies: usize,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            spawn_enemies: true,
            max_enemies: MAX_ENEMIES,
        }
    }
}

impl SimSettings {
    /// Settings with the given seed and everything else default
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(json)?;
        log::info!(
            "Loaded settings: seed={} snapshot_interval={} spawner={}",
            settings.seed,
            settings.snapshot_interval,
            settings.spawn_enemies
        );
        Ok(settings)
    }

    /// Serialize settings to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Effective snapshot cadence (never zero)
    pub fn effective_snapshot_interval(&self) -> u32 {
        self.snapshot_interval.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = SimSettings::from_json(r#"{ "seed": 42 }"#).unwrap();
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.snapshot_interval, DEFAULT_SNAPSHOT_INTERVAL);
        assert!(settings.spawn_enemies);
        assert_eq!(settings.max_enemies, MAX_ENEMIES);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = SimSettings {
            seed: 7,
            snapshot_interval: 3,
            spawn_enemies: false,
            max_enemies: 4,
        };
        let json = settings.to_json().unwrap();
        assert_eq!(SimSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(SimSettings::from_json("{ seed: ").is_err());
    }

    #[test]
    fn test_zero_interval_clamped() {
        let settings = SimSettings {
            snapshot_interval: 0,
            ..SimSettings::default()
        };
        assert_eq!(settings.effective_snapshot_interval(), 1);
    }
}
