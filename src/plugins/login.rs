use crate::config::GameConfig;
use crate::plugins::level::{LevelLifecycle, StartLevel, UnloadLevel};
use crate::plugins::notice::Notice;
use crate::plugins::progression::{PlayerIdentity, Progression, ProgressionPlugin};
use bevy::prelude::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Username is required")]
    MissingUsername,
    #[error("Password is required")]
    MissingPassword,
}

/// Credentials from the login form
#[derive(Event, Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Trimmed username of a well-formed request
    pub fn validate(&self) -> Result<String, AuthError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        if self.password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        Ok(username.to_string())
    }
}

/// Forget the player and leave the current level
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct LogoutRequest;

/// Plugin for the login flow
pub struct LoginPlugin;

impl Plugin for LoginPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<ProgressionPlugin>() {
            app.add_plugins(ProgressionPlugin);
        }
        if !app.world.contains_resource::<GameConfig>() {
            app.insert_resource(GameConfig::default());
        }

        app.add_event::<LoginRequest>()
            .add_event::<LogoutRequest>()
            .add_event::<StartLevel>()
            .add_event::<UnloadLevel>()
            .add_event::<Notice>()
            .add_systems(
                Update,
                (handle_login_requests, handle_logout_requests).before(LevelLifecycle),
            );
    }
}

/// Log the player in and start the level their progress points at
fn handle_login_requests(
    mut commands: Commands,
    mut requests: EventReader<LoginRequest>,
    progression: Res<Progression>,
    config: Res<GameConfig>,
    mut notices: EventWriter<Notice>,
    mut starts: EventWriter<StartLevel>,
) {
    for request in requests.read() {
        let username = match request.validate() {
            Ok(username) => username,
            Err(e) => {
                warn!("Login rejected: {}", e);
                notices.send(Notice::error(e.to_string()));
                continue;
            }
        };

        let level = match progression.current_level(&username) {
            Ok(Some(level)) => level,
            Ok(None) => config.start_level,
            Err(e) => {
                warn!("Could not read progress for {}: {}", username, e);
                config.start_level
            }
        };

        info!("{} logged in, starting level {}", username, level);
        notices.send(Notice::success(format!("Welcome, {}", username)));
        starts.send(StartLevel { level });
        commands.insert_resource(PlayerIdentity { username });
    }
}

fn handle_logout_requests(
    mut commands: Commands,
    mut requests: EventReader<LogoutRequest>,
    mut unloads: EventWriter<UnloadLevel>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    commands.remove_resource::<PlayerIdentity>();
    unloads.send(UnloadLevel);
    info!("Logged out");
}
