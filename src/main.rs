use bevy::prelude::*;
use boxrunner::config::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, GameConfig};
use boxrunner::plugins::BodySpritePlugin;
use boxrunner::plugins::level::StartLevel;
use boxrunner::plugins::login::LoginRequest;
use boxrunner::GamePlugins;
use std::process::ExitCode;

/// Log in as this player on startup instead of playing anonymously
const PLAYER_ENV_VAR: &str = "BOXRUNNER_PLAYER";

fn main() -> ExitCode {
    let config_path =
        std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = match GameConfig::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let start_level = config.start_level;

    let mut app = App::new();
    app.insert_resource(config)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "boxrunner".to_string(),
                resolution: (1200.0, 600.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(GamePlugins)
        .add_plugins(BodySpritePlugin)
        .insert_resource(ClearColor(Color::rgb(0.08, 0.08, 0.1)));

    match std::env::var(PLAYER_ENV_VAR) {
        Ok(username) => {
            app.world.send_event(LoginRequest::new(username, "local"));
        }
        Err(_) => {
            app.world.send_event(StartLevel { level: start_level });
        }
    }

    app.run();
    ExitCode::SUCCESS
}
