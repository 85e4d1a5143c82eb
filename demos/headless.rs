use bevy::log::LogPlugin;
use bevy::prelude::*;
use boxrunner::GamePlugins;
use boxrunner::components::{Player, Position};
use boxrunner::config::GameConfig;
use boxrunner::plugins::input::KeyEvent;
use boxrunner::plugins::level::LevelSession;
use boxrunner::plugins::login::LoginRequest;
use boxrunner::plugins::notice::Notice;
use boxrunner::plugins::progression::{MemoryProgressStore, Progression};
use boxrunner::plugins::resolver::OutcomeEvent;

const MAX_TICKS: u32 = 60 * 60;

/// Plays level 1 without a window: logs in, holds right and hops every second
/// until the goal is reached or time runs out.
fn main() {
    let config = GameConfig::default();
    let ticks_per_second = config.tick_rate as u32;
    let store = MemoryProgressStore::new();

    let mut app = App::new();
    app.insert_resource(config)
        .insert_resource(Progression::new(store.clone()))
        .add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(GamePlugins)
        .add_systems(Last, (report_outcomes, report_notices));
    // ticks are driven by hand below
    app.insert_resource(Time::<Fixed>::from_seconds(3600.0));

    app.world.send_event(LoginRequest::new("demo", "demo"));
    app.update();
    app.world.send_event(KeyEvent::down(KeyCode::Right));
    app.update();

    for tick in 0..MAX_TICKS {
        if tick % ticks_per_second == 0 {
            app.world.send_event(KeyEvent::down(KeyCode::Space));
            app.update();
            app.world.send_event(KeyEvent::up(KeyCode::Space));
        }
        app.world.run_schedule(FixedUpdate);
        app.update();

        let level = app.world.get_resource::<LevelSession>().map(|s| s.level);
        if level != Some(1) {
            info!("Left level 1 after {} ticks, now on {:?}", tick + 1, level);
            break;
        }
    }

    let position = app
        .world
        .query_filtered::<&Position, With<Player>>()
        .get_single(&app.world)
        .ok()
        .copied();
    info!("Final player position: {:?}", position);
    info!("Gateway calls: {}", store.calls());
}

fn report_outcomes(mut outcomes: EventReader<OutcomeEvent>) {
    for event in outcomes.read() {
        info!("Level {}: {:?}", event.level, event.outcome);
    }
}

fn report_notices(mut notices: EventReader<Notice>) {
    for notice in notices.read() {
        println!("[{:?}] {}", notice.level, notice.message);
    }
}
