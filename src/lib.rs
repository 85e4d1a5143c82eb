pub mod components;
pub mod config;
pub mod enums;
pub mod level;
pub mod plugins;
pub mod world;

pub use components::*;
pub use config::GameConfig;
pub use enums::*;
pub use level::LevelData;

use bevy::prelude::*;
use plugins::{
    CameraPlugin, InputPlugin, LevelPlugin, LoginPlugin, NoticePlugin, PhysicsPlugin,
    PlayerPlugin, ProgressionPlugin, ResolverPlugin,
};

/// Everything except rendering: the simulation core, level lifecycle, progression
/// and login. Insert a `GameConfig` first to override the defaults.
pub struct GamePlugins;

impl PluginGroup for GamePlugins {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(NoticePlugin)
            .add(InputPlugin)
            .add(PhysicsPlugin)
            .add(PlayerPlugin)
            .add(ResolverPlugin)
            .add(CameraPlugin)
            .add(LevelPlugin)
            .add(ProgressionPlugin)
            .add(LoginPlugin)
    }
}
