use crate::components::{
    Body, Collider, ExternalForce, LevelEntity, Mass, Oscillator, Player, PlayerIntent,
    PlayerState, Position, Role, Sensor, Velocity,
};
use crate::config::GameConfig;
use crate::enums::{BodyKind, BodyRole, LevelOutcome};
use crate::level::{
    BodyData, DistortionRules, LevelData, LevelLoadError, ViewportData, load_level_from_file,
};
use crate::plugins::input::HeldIntents;
use crate::plugins::notice::Notice;
use crate::plugins::physics::{ActiveContacts, Gravity, SimClock};
use crate::world::builtin_levels;
use bevy::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const INVALID_LEVEL_NOTICE: &str = "Invalid level selected";

/// Every level that can be started, keyed by id
#[derive(Resource, Clone, Debug, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<u32, LevelData>,
}

impl LevelCatalog {
    pub fn with_builtins() -> Self {
        let mut catalog = Self::default();
        for level in builtin_levels() {
            catalog.insert(level);
        }
        catalog
    }

    /// Add or replace a level
    pub fn insert(&mut self, level: LevelData) {
        self.levels.insert(level.id, level);
    }

    pub fn get(&self, id: u32) -> Option<&LevelData> {
        self.levels.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.keys().copied()
    }

    /// Load every `*.json` in `dir`, replacing built-ins with the same id.
    /// Broken files are logged and skipped.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, LevelLoadError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| LevelLoadError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match load_level_from_file(&path) {
                Ok(level) => {
                    info!("Loaded level {} from {}", level.id, path.display());
                    self.insert(level);
                    loaded += 1;
                }
                Err(e) => warn!("Skipping level file: {}", e),
            }
        }
        Ok(loaded)
    }
}

/// Distortion counter: saturates at zero, unbounded above
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DistortionCounter(u32);

impl DistortionCounter {
    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn escalate(&mut self, amount: u32) -> u32 {
        self.0 = self.0.saturating_add(amount);
        self.0
    }

    pub fn relieve(&mut self, amount: u32) -> u32 {
        self.0 = self.0.saturating_sub(amount);
        self.0
    }
}

/// Where the completed level's progress stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProgressState {
    #[default]
    Idle,
    /// Level doesn't persist progress
    Skipped,
    Saved,
    /// Gateway call failed; retry with `RetryProgressSave`
    Failed,
}

/// State of the running level. Exists from level start to level end; the
/// simulation only ticks while it does.
#[derive(Resource, Clone, Debug)]
pub struct LevelSession {
    pub level: u32,
    pub name: String,
    pub next_level: u32,
    pub spawn_point: Vec2,
    pub base_gravity: Vec2,
    pub viewport: ViewportData,
    pub rules: DistortionRules,
    pub persist_progress: bool,
    pub completion_message: String,
    pub distortion: DistortionCounter,
    pub hazard_hits: u32,
    pub progress: ProgressState,
    completed: bool,
}

impl LevelSession {
    pub fn from_level(level: &LevelData) -> Self {
        Self {
            level: level.id,
            name: level.name.clone(),
            next_level: level.next_level(),
            spawn_point: Vec2::new(level.spawn_point.x, level.spawn_point.y),
            base_gravity: Vec2::new(level.gravity.x, level.gravity.y),
            viewport: level.viewport,
            rules: level.distortion,
            persist_progress: level.persist_progress,
            completion_message: level.completion_message().to_string(),
            distortion: DistortionCounter::default(),
            hazard_hits: 0,
            progress: ProgressState::Idle,
            completed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Returns true only for the first call in a session
    pub fn mark_completed(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        true
    }

    /// Hazards never end the level
    pub fn outcome(&self) -> LevelOutcome {
        if self.completed {
            LevelOutcome::Completed {
                next_level: self.next_level,
            }
        } else {
            LevelOutcome::InProgress
        }
    }

    pub fn record_hazard_hit(&mut self) {
        self.hazard_hits += 1;
        self.distortion.relieve(self.rules.hazard_decrement);
    }

    pub fn escalate_distortion(&mut self) -> u32 {
        self.distortion.escalate(self.rules.special_increment)
    }

    /// Multiplier on the move force
    pub fn control_gain(&self) -> f32 {
        1.0 + self.distortion.value() as f32 * self.rules.force_gain
    }

    /// Extra upward speed added to a jump
    pub fn jump_boost(&self) -> f32 {
        self.distortion.value() as f32 * self.rules.jump_gain
    }

    /// Camera shake half-range
    pub fn shake_amplitude(&self) -> f32 {
        self.distortion.value() as f32 * self.rules.shake_per_point
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::from_level(&crate::world::level_one())
    }
}

/// Load a level, replacing the current one
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartLevel {
    pub level: u32,
}

/// Tear down the current level and stop simulating
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct UnloadLevel;

/// A level finished loading
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelStarted {
    pub level: u32,
}

/// Level start/unload handling. Anything that requests a level change in
/// `Update` should run before it.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelLifecycle;

/// Plugin for level loading, transitions, and geometry
pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();

        let mut catalog = LevelCatalog::with_builtins();
        if let Some(dir) = &config.levels_dir {
            if let Err(e) = catalog.load_dir(dir) {
                warn!("Could not read levels directory: {}", e);
            }
        }

        app.insert_resource(catalog)
            .init_resource::<Gravity>()
            .init_resource::<SimClock>()
            .init_resource::<ActiveContacts>()
            .add_event::<Notice>()
            .add_event::<StartLevel>()
            .add_event::<UnloadLevel>()
            .add_event::<LevelStarted>()
            .add_systems(Update, process_level_requests.in_set(LevelLifecycle));
    }
}

fn body_kind(body: &BodyData) -> BodyKind {
    if body.motion.is_some() {
        BodyKind::Kinematic
    } else if body.is_static {
        BodyKind::Static
    } else {
        BodyKind::Dynamic
    }
}

/// Spawn every body of a level plus the player
pub fn spawn_level_entities(commands: &mut Commands, level: &LevelData, config: &GameConfig) {
    for body in &level.bodies {
        let position = Position::new(body.x, body.y);
        let mut entity = commands.spawn((
            Role(body.role),
            Body(body_kind(body)),
            position,
            Velocity::default(),
            ExternalForce::default(),
            Collider::new(body.width, body.height),
            LevelEntity,
        ));
        if body.is_sensor {
            entity.insert(Sensor);
        }
        if let Some(motion) = body.motion {
            entity.insert(Oscillator {
                origin: position.as_vec2(),
                amplitude: Vec2::new(motion.amplitude_x, motion.amplitude_y),
                angular_speed: motion.angular_speed,
            });
        }
    }

    let spawn = Vec2::new(level.spawn_point.x, level.spawn_point.y);
    commands.spawn((
        Player,
        Role(BodyRole::Player),
        Body(BodyKind::Dynamic),
        Position::from(spawn),
        Velocity::default(),
        ExternalForce::default(),
        Mass(config.player.mass),
        Collider::new(config.player.width, config.player.height),
        PlayerState::new(spawn),
        PlayerIntent::default(),
        LevelEntity,
    ));
}

/// Handle start/unload requests. Only the last start request of a frame wins.
#[allow(clippy::too_many_arguments)]
fn process_level_requests(
    mut commands: Commands,
    mut starts: EventReader<StartLevel>,
    mut unloads: EventReader<UnloadLevel>,
    catalog: Res<LevelCatalog>,
    config: Res<GameConfig>,
    level_entities: Query<Entity, With<LevelEntity>>,
    mut contacts: ResMut<ActiveContacts>,
    mut gravity: ResMut<Gravity>,
    mut clock: ResMut<SimClock>,
    intents: Option<ResMut<HeldIntents>>,
    mut notices: EventWriter<Notice>,
    mut started: EventWriter<LevelStarted>,
) {
    let start = starts.read().last().copied();
    let unload = unloads.read().count() > 0;

    let level = match start {
        Some(request) => match catalog.get(request.level) {
            Some(level) => Some(level),
            None => {
                error!("Level {} is not in the catalog", request.level);
                notices.send(Notice::error(INVALID_LEVEL_NOTICE));
                // an unknown level leaves the current one running
                if !unload {
                    return;
                }
                None
            }
        },
        None if unload => None,
        None => return,
    };

    for entity in level_entities.iter() {
        commands.entity(entity).despawn();
    }
    contacts.clear();
    commands.remove_resource::<LevelSession>();
    *gravity = Gravity::default();
    *clock = SimClock::default();
    // a tap from the old level must not jump in the new one
    if let Some(mut intents) = intents {
        intents.cancel_jump();
    }

    let Some(level) = level else {
        info!("Level unloaded");
        return;
    };

    spawn_level_entities(&mut commands, level, &config);
    gravity.0 = Vec2::new(level.gravity.x, level.gravity.y);
    commands.insert_resource(LevelSession::from_level(level));
    started.send(LevelStarted { level: level.id });
    info!("Started level {} \"{}\"", level.id, level.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{BodyData, Point};
    use crate::plugins::test_support::{drain_events, load_level, sim_app, step};
    use crate::world::{goal, level_one, level_two, obstacle};
    use std::io::Write;
    use tempfile::TempDir;

    fn level_entity_count(app: &mut App) -> usize {
        app.world
            .query_filtered::<Entity, With<LevelEntity>>()
            .iter(&app.world)
            .count()
    }

    #[test]
    fn test_start_level_spawns_bodies_and_player() {
        let mut app = sim_app();
        load_level(&mut app, level_one());

        let expected = level_one().bodies.len() + 1;
        assert_eq!(level_entity_count(&mut app), expected);

        let session = app.world.resource::<LevelSession>();
        assert_eq!(session.level, 1);
        assert_eq!(session.spawn_point, Vec2::new(100.0, 500.0));
        assert_eq!(app.world.resource::<Gravity>().0, Vec2::new(0.0, 1500.0));
        assert_eq!(drain_events::<LevelStarted>(&app), vec![LevelStarted { level: 1 }]);
    }

    #[test]
    fn test_player_spawned_at_spawn_point() {
        let mut app = sim_app();
        load_level(&mut app, level_one());

        let (position, state) = app
            .world
            .query_filtered::<(&Position, &PlayerState), With<Player>>()
            .single(&app.world);
        assert_eq!(*position, Position::new(100.0, 500.0));
        assert!(!state.grounded);
        assert_eq!(state.spawn_point, Vec2::new(100.0, 500.0));
    }

    #[test]
    fn test_switching_levels_replaces_entities() {
        let mut app = sim_app();
        load_level(&mut app, level_one());
        step(&mut app);
        app.world.send_event(StartLevel { level: 2 });
        app.update();

        assert_eq!(level_entity_count(&mut app), level_two().bodies.len() + 1);
        assert_eq!(app.world.resource::<LevelSession>().level, 2);
        assert_eq!(app.world.resource::<SimClock>().tick, 0);
    }

    #[test]
    fn test_jump_tap_does_not_carry_into_next_level() {
        use crate::plugins::input::KeyEvent;

        let mut app = sim_app();
        load_level(&mut app, level_one());
        app.world.send_event(KeyEvent::down(KeyCode::Space));
        app.world.send_event(KeyEvent::up(KeyCode::Space));
        app.world.send_event(StartLevel { level: 2 });
        app.update();

        assert_eq!(app.world.resource::<LevelSession>().level, 2);
        assert!(!app.world.resource_mut::<HeldIntents>().take_jump());
    }

    #[test]
    fn test_unknown_level_keeps_current() {
        let mut app = sim_app();
        load_level(&mut app, level_one());
        let before = level_entity_count(&mut app);

        app.world.send_event(StartLevel { level: 42 });
        app.update();

        assert_eq!(level_entity_count(&mut app), before);
        assert_eq!(app.world.resource::<LevelSession>().level, 1);
        assert!(drain_events::<Notice>(&app).contains(&Notice::error(INVALID_LEVEL_NOTICE)));
    }

    #[test]
    fn test_unload_stops_simulation() {
        let mut app = sim_app();
        load_level(&mut app, level_one());
        app.world.send_event(UnloadLevel);
        app.update();

        assert_eq!(level_entity_count(&mut app), 0);
        assert!(app.world.get_resource::<LevelSession>().is_none());
        assert!(app.world.resource::<ActiveContacts>().is_empty());

        step(&mut app);
        assert_eq!(app.world.resource::<SimClock>().tick, 0);
    }

    #[test]
    fn test_moving_body_is_kinematic() {
        let mut app = sim_app();
        load_level(&mut app, level_two());

        let kinematic = app
            .world
            .query::<(&Body, &Oscillator)>()
            .iter(&app.world)
            .filter(|(body, _)| body.0 == BodyKind::Kinematic)
            .count();
        assert_eq!(kinematic, 1);
    }

    #[test]
    fn test_goal_spawns_as_sensor() {
        let mut app = sim_app();
        load_level(&mut app, level_one());

        let sensors: Vec<BodyRole> = app
            .world
            .query_filtered::<&Role, With<Sensor>>()
            .iter(&app.world)
            .map(|role| role.0)
            .collect();
        assert_eq!(sensors, vec![BodyRole::Goal]);
    }

    #[test]
    fn test_distortion_counter_saturates() {
        let mut counter = DistortionCounter::default();
        assert_eq!(counter.relieve(3), 0);
        assert_eq!(counter.escalate(2), 2);
        assert_eq!(counter.relieve(1), 1);
        assert_eq!(counter.relieve(5), 0);
    }

    #[test]
    fn test_session_completes_once() {
        let mut session = LevelSession::for_tests();
        assert_eq!(session.outcome(), LevelOutcome::InProgress);
        assert!(session.mark_completed());
        assert!(!session.mark_completed());
        assert_eq!(session.outcome(), LevelOutcome::Completed { next_level: 2 });
    }

    #[test]
    fn test_session_gains_scale_with_distortion() {
        let mut session = LevelSession::for_tests();
        assert_eq!(session.control_gain(), 1.0);
        assert_eq!(session.jump_boost(), 0.0);
        session.escalate_distortion();
        session.escalate_distortion();
        assert!((session.control_gain() - 1.2).abs() < 1e-6);
        assert_eq!(session.jump_boost(), 60.0);
        assert_eq!(session.shake_amplitude(), 2.0);
    }

    #[test]
    fn test_catalog_has_builtins() {
        let catalog = LevelCatalog::with_builtins();
        let ids: Vec<u32> = catalog.ids().collect();
        assert_eq!(ids, vec![1, 2, 5, 100]);
    }

    #[test]
    fn test_catalog_loads_directory() {
        let dir = TempDir::new().unwrap();
        let custom = LevelData {
            id: 3,
            name: "Custom".to_string(),
            gravity: Point::new(0.0, 1500.0),
            spawn_point: Point::new(100.0, 500.0),
            viewport: ViewportData::default(),
            bodies: vec![obstacle(3000.0, 590.0, 7000.0, 20.0), goal(900.0, 530.0)],
            next_level: None,
            persist_progress: true,
            distortion: DistortionRules::default(),
            completion_message: None,
        };
        fs::write(
            dir.path().join("3.json"),
            serde_json::to_string(&custom).unwrap(),
        )
        .unwrap();
        let mut broken = fs::File::create(dir.path().join("broken.json")).unwrap();
        broken.write_all(b"not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut catalog = LevelCatalog::with_builtins();
        let loaded = catalog.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(catalog.get(3), Some(&custom));
    }

    #[test]
    fn test_catalog_missing_directory() {
        let mut catalog = LevelCatalog::default();
        assert!(matches!(
            catalog.load_dir("no/such/levels/dir"),
            Err(LevelLoadError::Io { .. })
        ));
    }

    #[test]
    fn test_dynamic_body_from_data() {
        let body = BodyData {
            is_static: false,
            ..obstacle(0.0, 0.0, 10.0, 10.0)
        };
        assert_eq!(body_kind(&body), BodyKind::Dynamic);
        assert_eq!(body_kind(&obstacle(0.0, 0.0, 10.0, 10.0)), BodyKind::Static);
    }
}
