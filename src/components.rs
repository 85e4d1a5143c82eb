use crate::enums::{BodyKind, BodyRole};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Position component - world coordinates of the body centre, y grows downward
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Velocity component - pixels per second
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Collider component - axis-aligned box centred on the body position
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
}

impl Collider {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Role tag used by the contact resolver instead of body identity
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Role(pub BodyRole);

/// Body kind component
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Body(pub BodyKind);

/// Sensor marker - reports contacts but never pushes other bodies
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Sensor;

/// Force accumulated during a tick, cleared after integration
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct ExternalForce {
    pub x: f32,
    pub y: f32,
}

impl ExternalForce {
    pub fn add(&mut self, x: f32, y: f32) {
        self.x += x;
        self.y += y;
    }

    pub fn clear(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }
}

/// Mass of a dynamic body
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Mass(pub f32);

impl Default for Mass {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Drives a kinematic body along a sine path around its origin
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    pub origin: Vec2,
    pub amplitude: Vec2,
    /// Radians per second
    pub angular_speed: f32,
}

impl Oscillator {
    pub fn position_at(&self, seconds: f32) -> Vec2 {
        self.origin + self.amplitude * (seconds * self.angular_speed).sin()
    }
}

/// Player marker component
#[derive(Component)]
pub struct Player;

/// Player state - owned by the player controller
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    pub grounded: bool,
    pub spawn_point: Vec2,
}

impl PlayerState {
    pub fn new(spawn_point: Vec2) -> Self {
        Self {
            grounded: false,
            spawn_point,
        }
    }

    /// A body whose reference point lies below the player's counts as ground.
    pub fn is_below(player_y: f32, other_y: f32) -> bool {
        other_y > player_y
    }

    /// Returns true when the contact grounded the player.
    pub fn on_contact_begin(&mut self, player_y: f32, other_y: f32) -> bool {
        if Self::is_below(player_y, other_y) {
            self.grounded = true;
            return true;
        }
        false
    }

    pub fn on_contact_end(&mut self, player_y: f32, other_y: f32) {
        if Self::is_below(player_y, other_y) {
            self.grounded = false;
        }
    }

    /// Applies the jump velocity when grounded. Leaves the ground immediately so a
    /// second jump needs a fresh ground contact.
    pub fn try_jump(&mut self, velocity: &mut Velocity, jump_velocity: f32) -> bool {
        if !self.grounded {
            return false;
        }
        velocity.y = jump_velocity;
        self.grounded = false;
        true
    }
}

/// Player intent component - the input snapshot for the current tick
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct PlayerIntent {
    pub move_left: bool,
    pub move_right: bool,
    pub jump_requested: bool,
}

impl PlayerIntent {
    /// -1, 0 or 1; opposing keys cancel
    pub fn horizontal_axis(&self) -> f32 {
        match (self.move_left, self.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Marks everything spawned for the current level
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct LevelEntity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(100.0, 200.0);
        assert_eq!(pos.x, 100.0);
        assert_eq!(pos.y, 200.0);
        assert_eq!(pos.as_vec2(), Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_velocity_default() {
        let vel = Velocity::default();
        assert_eq!(vel.x, 0.0);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn test_collider_half_extents() {
        let collider = Collider::new(32.0, 64.0);
        assert_eq!(collider.half_extents(), Vec2::new(16.0, 32.0));
    }

    #[test]
    fn test_grounded_on_body_below() {
        let mut state = PlayerState::new(Vec2::new(100.0, 500.0));
        assert!(state.on_contact_begin(570.0, 590.0));
        assert!(state.grounded);
    }

    #[test]
    fn test_not_grounded_on_body_above() {
        let mut state = PlayerState::new(Vec2::new(100.0, 500.0));
        assert!(!state.on_contact_begin(500.0, 300.0));
        assert!(!state.grounded);
    }

    #[test]
    fn test_contact_end_below_clears_grounded() {
        let mut state = PlayerState::new(Vec2::ZERO);
        state.on_contact_begin(570.0, 590.0);
        state.on_contact_end(570.0, 590.0);
        assert!(!state.grounded);
    }

    #[test]
    fn test_contact_end_above_keeps_grounded() {
        let mut state = PlayerState::new(Vec2::ZERO);
        state.on_contact_begin(570.0, 590.0);
        state.on_contact_end(570.0, 400.0);
        assert!(state.grounded);
    }

    #[test]
    fn test_two_ground_contacts_are_one_state() {
        let mut state = PlayerState::new(Vec2::ZERO);
        state.on_contact_begin(570.0, 590.0);
        state.on_contact_begin(570.0, 585.0);
        state.on_contact_end(570.0, 590.0);
        assert!(!state.grounded);
    }

    #[test]
    fn test_jump_when_grounded() {
        let mut state = PlayerState::new(Vec2::new(100.0, 500.0));
        state.grounded = true;
        let mut velocity = Velocity::new(3.0, 0.0);

        assert!(state.try_jump(&mut velocity, -10.0));
        assert_eq!(velocity.y, -10.0);
        assert_eq!(velocity.x, 3.0);
        assert!(!state.grounded);
    }

    #[test]
    fn test_no_double_jump() {
        let mut state = PlayerState::new(Vec2::ZERO);
        state.grounded = true;
        let mut velocity = Velocity::default();
        state.try_jump(&mut velocity, -10.0);

        velocity.y = -4.0;
        assert!(!state.try_jump(&mut velocity, -10.0));
        assert_eq!(velocity.y, -4.0);
    }

    #[test]
    fn test_intent_axis() {
        let mut intent = PlayerIntent::default();
        assert_eq!(intent.horizontal_axis(), 0.0);
        intent.move_left = true;
        assert_eq!(intent.horizontal_axis(), -1.0);
        intent.move_right = true;
        assert_eq!(intent.horizontal_axis(), 0.0);
        intent.move_left = false;
        assert_eq!(intent.horizontal_axis(), 1.0);
    }

    #[test]
    fn test_oscillator_path() {
        let osc = Oscillator {
            origin: Vec2::new(1400.0, 400.0),
            amplitude: Vec2::new(200.0, 0.0),
            angular_speed: std::f32::consts::FRAC_PI_2,
        };
        assert_eq!(osc.position_at(0.0), Vec2::new(1400.0, 400.0));
        let quarter = osc.position_at(1.0);
        assert!((quarter.x - 1600.0).abs() < 0.01);
        assert_eq!(quarter.y, 400.0);
    }

    #[test]
    fn test_external_force_accumulates() {
        let mut force = ExternalForce::default();
        force.add(5.0, 0.0);
        force.add(-2.0, 1.0);
        assert_eq!(force, ExternalForce { x: 3.0, y: 1.0 });
        force.clear();
        assert_eq!(force, ExternalForce::default());
    }
}
