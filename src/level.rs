use crate::enums::BodyRole;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Level data structure matching JSON format
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub id: u32,
    pub name: String,
    /// Gravity in pixels per second squared (positive y = down)
    #[serde(default = "default_gravity")]
    pub gravity: Point,
    pub spawn_point: Point,
    #[serde(default)]
    pub viewport: ViewportData,
    pub bodies: Vec<BodyData>,
    /// Level unlocked on completion, defaults to `id + 1`
    #[serde(default)]
    pub next_level: Option<u32>,
    #[serde(default = "default_true")]
    pub persist_progress: bool,
    #[serde(default)]
    pub distortion: DistortionRules,
    /// Notice shown once the goal is reached
    #[serde(default)]
    pub completion_message: Option<String>,
}

impl LevelData {
    pub fn next_level(&self) -> u32 {
        self.next_level
            .unwrap_or_else(|| self.id.saturating_add(1))
    }

    pub fn completion_message(&self) -> &str {
        self.completion_message.as_deref().unwrap_or("Level Complete!")
    }

    pub fn bodies_with_role(&self, role: BodyRole) -> impl Iterator<Item = &BodyData> {
        self.bodies.iter().filter(move |b| b.role == role)
    }
}

/// Plain 2D point used in level files
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

fn default_gravity() -> Point {
    Point::new(0.0, 1500.0)
}

fn default_true() -> bool {
    true
}

/// Camera viewport for a level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportData {
    pub half_width: f32,
    pub half_height: f32,
    /// Pin the top edge at y = 0 instead of following the player vertically
    #[serde(default = "default_true")]
    pub floor_locked: bool,
}

impl Default for ViewportData {
    fn default() -> Self {
        Self {
            half_width: 600.0,
            half_height: 300.0,
            floor_locked: true,
        }
    }
}

/// One shape in a level
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyData {
    pub role: BodyRole,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_true")]
    pub is_static: bool,
    #[serde(default)]
    pub is_sensor: bool,
    #[serde(default)]
    pub motion: Option<MotionData>,
}

/// Sine motion around the body's position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionData {
    #[serde(default)]
    pub amplitude_x: f32,
    #[serde(default)]
    pub amplitude_y: f32,
    /// Radians per second
    pub angular_speed: f32,
}

/// How a level's distortion counter moves and what it perturbs
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionRules {
    /// Added per distortion zone touched
    pub special_increment: u32,
    /// Removed per ordinary hazard hit (saturating at zero)
    pub hazard_decrement: u32,
    /// Remove the zone from the world once touched
    pub consume_zone: bool,
    /// Gravity noise amplitude per point, pixels per second squared
    pub gravity_jitter: Point,
    /// Camera shake half-range per point, pixels
    pub shake_per_point: f32,
    /// Extra fraction of move force per point
    pub force_gain: f32,
    /// Extra jump speed per point, pixels per second
    pub jump_gain: f32,
}

impl Default for DistortionRules {
    fn default() -> Self {
        Self {
            special_increment: 1,
            hazard_decrement: 0,
            consume_zone: true,
            gravity_jitter: Point::new(100.0, 200.0),
            shake_per_point: 1.0,
            force_gain: 0.1,
            jump_gain: 30.0,
        }
    }
}

/// Level loading errors
#[derive(Debug, Error)]
pub enum LevelLoadError {
    #[error("level file not found: {0}")]
    FileNotFound(String),
    #[error("io error reading level file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level validation error: {0}")]
    Validation(String),
}

/// Load level from JSON file
pub fn load_level_from_file(path: impl AsRef<Path>) -> Result<LevelData, LevelLoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LevelLoadError::FileNotFound(path.display().to_string()));
    }

    let contents = fs::read_to_string(path).map_err(|source| LevelLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let level: LevelData =
        serde_json::from_str(&contents).map_err(|source| LevelLoadError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    validate_level_data(&level)?;
    Ok(level)
}

/// Validate level data for required fields and valid values
pub fn validate_level_data(level: &LevelData) -> Result<(), LevelLoadError> {
    if level.name.trim().is_empty() {
        return Err(LevelLoadError::Validation(
            "level name cannot be empty".to_string(),
        ));
    }

    if level.bodies.is_empty() {
        return Err(LevelLoadError::Validation(format!(
            "level {} has no bodies",
            level.id
        )));
    }

    if level.viewport.half_width <= 0.0 || level.viewport.half_height <= 0.0 {
        return Err(LevelLoadError::Validation(
            "viewport extents must be positive".to_string(),
        ));
    }

    validate_distortion_rules(&level.distortion)?;

    for (i, body) in level.bodies.iter().enumerate() {
        if body.width <= 0.0 || body.height <= 0.0 {
            return Err(LevelLoadError::Validation(format!(
                "body {} has invalid dimensions",
                i
            )));
        }
        if body.role == BodyRole::Player {
            return Err(LevelLoadError::Validation(format!(
                "body {} uses the player role; the player is spawned from spawn_point",
                i
            )));
        }
    }

    Ok(())
}

/// Gains must be finite and non-negative; they are multiplied by the counter every tick
fn validate_distortion_rules(rules: &DistortionRules) -> Result<(), LevelLoadError> {
    let gains = [
        ("gravity_jitter.x", rules.gravity_jitter.x),
        ("gravity_jitter.y", rules.gravity_jitter.y),
        ("shake_per_point", rules.shake_per_point),
        ("force_gain", rules.force_gain),
        ("jump_gain", rules.jump_gain),
    ];
    for (name, value) in gains {
        if !value.is_finite() || value < 0.0 {
            return Err(LevelLoadError::Validation(format!(
                "distortion {} must be finite and non-negative, got {}",
                name, value
            )));
        }
    }
    Ok(())
}
