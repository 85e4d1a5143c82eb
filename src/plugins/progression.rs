use crate::config::GameConfig;
use crate::plugins::level::{LevelLifecycle, LevelSession, ProgressState, StartLevel};
use crate::plugins::notice::Notice;
use crate::plugins::resolver::LevelCompleted;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub const USER_NOT_FOUND_NOTICE: &str = "User not found";
pub const SAVE_FAILED_NOTICE: &str = "Failed to update level";

#[derive(Debug, Error)]
pub enum ProgressionError {
    #[error("failed to access progress file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("progress file {path} is corrupted: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("progress store unavailable: {0}")]
    Unavailable(String),
}

/// Where player progress lives
pub trait ProgressionGateway: Send + Sync {
    /// Record that `player` unlocked `next_level`
    fn complete_level(&mut self, player: &str, next_level: u32) -> Result<(), ProgressionError>;

    /// Highest level unlocked by `player`, if any was recorded
    fn current_level(&self, player: &str) -> Result<Option<u32>, ProgressionError>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub current_level: u32,
    pub updated_at: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressFile {
    pub players: BTreeMap<String, PlayerProgress>,
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Progress kept in a pretty-printed JSON file. Levels only ever go up.
#[derive(Clone, Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<ProgressFile, ProgressionError> {
        if !self.path.exists() {
            return Ok(ProgressFile::default());
        }
        let json = fs::read_to_string(&self.path).map_err(|source| ProgressionError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ProgressionError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn write(&self, progress: &ProgressFile) -> Result<(), ProgressionError> {
        let json = serde_json::to_string_pretty(progress)?;
        if let Err(e) = fs::write(&self.path, &json) {
            warn!("Failed to write progress file, retrying: {}", e);
            // Retry once
            fs::write(&self.path, &json).map_err(|source| ProgressionError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl ProgressionGateway for JsonProgressStore {
    fn complete_level(&mut self, player: &str, next_level: u32) -> Result<(), ProgressionError> {
        let mut progress = self.read()?;
        let entry = progress.players.entry(player.to_string()).or_default();
        entry.current_level = entry.current_level.max(next_level);
        entry.updated_at = unix_now();
        self.write(&progress)?;
        info!("Progress saved to {:?}", self.path);
        Ok(())
    }

    fn current_level(&self, player: &str) -> Result<Option<u32>, ProgressionError> {
        Ok(self
            .read()?
            .players
            .get(player)
            .map(|p| p.current_level))
    }
}

#[derive(Debug, Default)]
struct MemoryProgress {
    levels: HashMap<String, u32>,
    calls: usize,
    failures_left: usize,
}

/// In-memory store. Clones share state, so a test can keep a handle while the
/// game owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryProgressStore {
    inner: Arc<Mutex<MemoryProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryProgress>, ProgressionError> {
        self.inner
            .lock()
            .map_err(|_| ProgressionError::Unavailable("memory store poisoned".into()))
    }

    /// Make the next `count` saves fail
    pub fn fail_next(&self, count: usize) {
        if let Ok(mut inner) = self.lock() {
            inner.failures_left = count;
        }
    }

    /// Save attempts so far, failed ones included
    pub fn calls(&self) -> usize {
        self.lock().map(|inner| inner.calls).unwrap_or(0)
    }
}

impl ProgressionGateway for MemoryProgressStore {
    fn complete_level(&mut self, player: &str, next_level: u32) -> Result<(), ProgressionError> {
        let mut inner = self.lock()?;
        inner.calls += 1;
        if inner.failures_left > 0 {
            inner.failures_left -= 1;
            return Err(ProgressionError::Unavailable("simulated failure".into()));
        }
        let level = inner.levels.entry(player.to_string()).or_insert(0);
        *level = (*level).max(next_level);
        Ok(())
    }

    fn current_level(&self, player: &str) -> Result<Option<u32>, ProgressionError> {
        Ok(self.lock()?.levels.get(player).copied())
    }
}

/// The active gateway
#[derive(Resource)]
pub struct Progression {
    gateway: Box<dyn ProgressionGateway>,
}

impl Progression {
    pub fn new(gateway: impl ProgressionGateway + 'static) -> Self {
        Self {
            gateway: Box::new(gateway),
        }
    }

    pub fn complete_level(&mut self, player: &str, next_level: u32) -> Result<(), ProgressionError> {
        self.gateway.complete_level(player, next_level)
    }

    pub fn current_level(&self, player: &str) -> Result<Option<u32>, ProgressionError> {
        self.gateway.current_level(player)
    }
}

/// Logged-in player
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub username: String,
}

/// Progress could not be saved because nobody is logged in
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoginRequired {
    pub next_level: u32,
}

/// Try saving a completed level again after a failure
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct RetryProgressSave;

/// Plugin for saving progress on level completion
pub struct ProgressionPlugin;

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        if !app.world.contains_resource::<Progression>() {
            let file = app
                .world
                .get_resource::<GameConfig>()
                .map(|c| c.progress_file.clone())
                .unwrap_or_else(|| GameConfig::default().progress_file);
            app.insert_resource(Progression::new(JsonProgressStore::new(file)));
        }

        app.add_event::<LevelCompleted>()
            .add_event::<StartLevel>()
            .add_event::<Notice>()
            .add_event::<LoginRequired>()
            .add_event::<RetryProgressSave>()
            .add_systems(
                Update,
                (persist_completed_levels, retry_progress_save)
                    .chain()
                    .before(LevelLifecycle),
            );
    }
}

/// At most one gateway call per call site; success moves on to the next level
fn save_progress(
    progression: &mut Progression,
    identity: &PlayerIdentity,
    session: &mut LevelSession,
    notices: &mut EventWriter<Notice>,
    starts: &mut EventWriter<StartLevel>,
) {
    let next_level = session.next_level;
    match progression.complete_level(&identity.username, next_level) {
        Ok(()) => {
            session.progress = ProgressState::Saved;
            info!("{} unlocked level {}", identity.username, next_level);
            notices.send(Notice::success(session.completion_message.clone()));
            starts.send(StartLevel { level: next_level });
        }
        Err(e) => {
            // the goal stays reached; only the save can be retried
            session.progress = ProgressState::Failed;
            error!("Failed to save progress: {}", e);
            notices.send(Notice::error(SAVE_FAILED_NOTICE));
        }
    }
}

fn persist_completed_levels(
    mut completed: EventReader<LevelCompleted>,
    session: Option<ResMut<LevelSession>>,
    identity: Option<Res<PlayerIdentity>>,
    mut progression: ResMut<Progression>,
    mut login: EventWriter<LoginRequired>,
    mut notices: EventWriter<Notice>,
    mut starts: EventWriter<StartLevel>,
) {
    let Some(mut session) = session else {
        completed.clear();
        return;
    };

    for event in completed.read() {
        if event.level != session.level {
            debug!("Ignoring completion of unloaded level {}", event.level);
            continue;
        }

        if !session.persist_progress {
            session.progress = ProgressState::Skipped;
            notices.send(Notice::success(session.completion_message.clone()));
            starts.send(StartLevel {
                level: event.next_level,
            });
            continue;
        }

        let Some(identity) = identity.as_deref() else {
            warn!("Level {} completed with no player logged in", event.level);
            session.progress = ProgressState::Failed;
            login.send(LoginRequired {
                next_level: event.next_level,
            });
            notices.send(Notice::error(USER_NOT_FOUND_NOTICE));
            continue;
        };

        save_progress(
            &mut progression,
            identity,
            &mut session,
            &mut notices,
            &mut starts,
        );
    }
}

fn retry_progress_save(
    mut retries: EventReader<RetryProgressSave>,
    session: Option<ResMut<LevelSession>>,
    identity: Option<Res<PlayerIdentity>>,
    mut progression: ResMut<Progression>,
    mut login: EventWriter<LoginRequired>,
    mut notices: EventWriter<Notice>,
    mut starts: EventWriter<StartLevel>,
) {
    if retries.is_empty() {
        return;
    }
    retries.clear();

    let Some(mut session) = session else {
        return;
    };
    if !session.is_completed() || session.progress != ProgressState::Failed {
        debug!("Nothing to retry");
        return;
    }
    let Some(identity) = identity.as_deref() else {
        login.send(LoginRequired {
            next_level: session.next_level,
        });
        notices.send(Notice::error(USER_NOT_FOUND_NOTICE));
        return;
    };

    save_progress(
        &mut progression,
        identity,
        &mut session,
        &mut notices,
        &mut starts,
    );
}
