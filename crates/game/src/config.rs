//! Game configuration (simulation tuning, caps, arena). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};

/// Arena footprint. The simulation tolerates both shapes; the height band
/// is shared by either.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ArenaShape {
    Rect { half_width: f32, half_depth: f32 },
    Circle { radius: f32 },
}

/// Persistent simulation settings. Loaded from `config.ron` in the current
/// directory; every field falls back to its default when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed simulation rate in Hz.
    #[serde(default = "default_fixed_hz")]
    pub fixed_hz: f32,
    /// Largest wall delta accepted per frame, in seconds.
    #[serde(default = "default_max_frame_delta")]
    pub max_frame_delta: f32,
    /// Hard ceiling on fixed steps per frame.
    #[serde(default = "default_max_steps_per_frame")]
    pub max_steps_per_frame: u32,

    /// Global cap on live projectiles; the oldest is evicted past this.
    #[serde(default = "default_max_projectiles")]
    pub max_projectiles: usize,
    /// Per-owner projectile sub-cap; `None` disables it.
    #[serde(default = "default_max_projectiles_per_owner")]
    pub max_projectiles_per_owner: Option<usize>,
    /// Cap on live item drops; the oldest is disposed past this.
    #[serde(default = "default_max_drops")]
    pub max_drops: usize,
    /// Particle buffer capacity (slots, not allocations).
    #[serde(default = "default_particle_capacity")]
    pub particle_capacity: usize,

    /// Seconds between qualifying hits before the combo drops.
    #[serde(default = "default_combo_window")]
    pub combo_window: f32,

    #[serde(default = "default_arena_shape")]
    pub arena_shape: ArenaShape,
    /// Playable height band.
    #[serde(default)]
    pub floor_y: f32,
    #[serde(default = "default_ceiling_y")]
    pub ceiling_y: f32,

    #[serde(default = "default_player_health")]
    pub player_health: f32,
    #[serde(default = "default_boss_health")]
    pub boss_health: f32,
    /// Max minions alive at once.
    #[serde(default = "default_max_minions")]
    pub max_minions: usize,

    /// Wall-clock length of a headless demo run, in seconds.
    #[serde(default = "default_demo_seconds")]
    pub demo_seconds: f32,
}

fn default_fixed_hz() -> f32 {
    60.0
}
fn default_max_frame_delta() -> f32 {
    1.0 / 15.0
}
fn default_max_steps_per_frame() -> u32 {
    5
}
fn default_max_projectiles() -> usize {
    100
}
fn default_max_projectiles_per_owner() -> Option<usize> {
    Some(40)
}
fn default_max_drops() -> usize {
    20
}
fn default_particle_capacity() -> usize {
    512
}
fn default_combo_window() -> f32 {
    1.2
}
fn default_arena_shape() -> ArenaShape {
    ArenaShape::Circle { radius: 40.0 }
}
fn default_ceiling_y() -> f32 {
    20.0
}
fn default_player_health() -> f32 {
    100.0
}
fn default_boss_health() -> f32 {
    2400.0
}
fn default_max_minions() -> usize {
    12
}
fn default_demo_seconds() -> f32 {
    90.0
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_hz: default_fixed_hz(),
            max_frame_delta: default_max_frame_delta(),
            max_steps_per_frame: default_max_steps_per_frame(),
            max_projectiles: default_max_projectiles(),
            max_projectiles_per_owner: default_max_projectiles_per_owner(),
            max_drops: default_max_drops(),
            particle_capacity: default_particle_capacity(),
            combo_window: default_combo_window(),
            arena_shape: default_arena_shape(),
            floor_y: 0.0,
            ceiling_y: default_ceiling_y(),
            player_health: default_player_health(),
            boss_health: default_boss_health(),
            max_minions: default_max_minions(),
            demo_seconds: default_demo_seconds(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid,
    /// returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    /// Fixed step size in seconds.
    pub fn fixed_step(&self) -> f32 {
        1.0 / self.fixed_hz.max(1.0)
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = GameConfig::default();
        assert_eq!(c.max_projectiles, 100);
        assert_eq!(c.max_projectiles_per_owner, Some(40));
        assert_eq!(c.max_drops, 20);
        assert!((c.fixed_step() - 1.0 / 60.0).abs() < 1.0e-6);
    }

    #[test]
    fn partial_ron_fills_in_defaults() {
        let c: GameConfig = ron::from_str("(max_projectiles: 32)").expect("parse");
        assert_eq!(c.max_projectiles, 32);
        assert_eq!(c.max_drops, 20);
    }
}
