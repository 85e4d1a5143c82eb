pub mod camera;
pub mod input;
pub mod level;
pub mod login;
pub mod notice;
pub mod physics;
pub mod player;
pub mod progression;
pub mod resolver;
pub mod sprites;

pub use camera::CameraPlugin;
pub use input::InputPlugin;
pub use level::LevelPlugin;
pub use login::LoginPlugin;
pub use notice::NoticePlugin;
pub use physics::PhysicsPlugin;
pub use player::PlayerPlugin;
pub use progression::ProgressionPlugin;
pub use resolver::ResolverPlugin;
pub use sprites::BodySpritePlugin;

use bevy::prelude::*;
use level::LevelSession;

/// Per-tick stages of the simulation, run in order inside `FixedUpdate`
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Sample input, apply forces and jumps
    Control,
    /// Advance bodies
    Physics,
    /// Emit contact begin/end events
    Contacts,
    /// Classify contacts by role
    Resolve,
    /// Grounding and respawn
    React,
    /// Recompute the camera window
    Camera,
}

/// Orders `SimSet` and stops every stage while no level is loaded
pub struct SimSchedulePlugin;

impl Plugin for SimSchedulePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Control,
                SimSet::Physics,
                SimSet::Contacts,
                SimSet::Resolve,
                SimSet::React,
                SimSet::Camera,
            )
                .chain()
                .run_if(resource_exists::<LevelSession>()),
        );
    }
}

pub(crate) fn ensure_sim_schedule(app: &mut App) {
    if !app.is_plugin_added::<SimSchedulePlugin>() {
        app.add_plugins(SimSchedulePlugin);
    }
}
