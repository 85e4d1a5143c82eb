use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file looked up next to the binary
pub const DEFAULT_CONFIG_FILE: &str = "boxrunner.json";

/// Environment variable overriding the config path
pub const CONFIG_ENV_VAR: &str = "BOXRUNNER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Player tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: f32,
    pub height: f32,
    pub mass: f32,
    /// Vertical velocity set on jump, pixels per second (negative = up)
    pub jump_velocity: f32,
    /// Horizontal force applied every tick a move key is held
    pub move_force: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            mass: 1.0,
            jump_velocity: -600.0,
            move_force: 1500.0,
        }
    }
}

/// Physics stand-in tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fraction of horizontal velocity removed per tick while resting on a surface
    pub friction: f32,
    /// Fraction of velocity removed per tick in any state
    pub air_damping: f32,
    pub max_horizontal_speed: f32,
    /// Boxes closer than this still count as touching
    pub contact_slop: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            friction: 0.1,
            air_damping: 0.001,
            max_horizontal_speed: 450.0,
            contact_slop: 0.5,
        }
    }
}

/// Top-level configuration resource
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation ticks per second
    pub tick_rate: f32,
    pub rng_seed: u64,
    pub player: PlayerConfig,
    pub physics: PhysicsConfig,
    /// Where player progress is stored
    pub progress_file: String,
    /// Optional directory of `<id>.json` level overrides
    pub levels_dir: Option<String>,
    pub start_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            rng_seed: 0x5eed,
            player: PlayerConfig::default(),
            physics: PhysicsConfig::default(),
            progress_file: "progress.json".to_string(),
            levels_dir: None,
            start_level: 1,
        }
    }
}

impl GameConfig {
    /// Fixed timestep in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: GameConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate > 0.0) {
            return Err(ConfigError::Invalid("tick_rate must be positive".into()));
        }
        if self.player.width <= 0.0 || self.player.height <= 0.0 {
            return Err(ConfigError::Invalid(
                "player dimensions must be positive".into(),
            ));
        }
        if self.player.mass <= 0.0 {
            return Err(ConfigError::Invalid("player mass must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.physics.friction)
            || !(0.0..=1.0).contains(&self.physics.air_damping)
        {
            return Err(ConfigError::Invalid(
                "friction and damping must be within 0..=1".into(),
            ));
        }
        Ok(())
    }
}
