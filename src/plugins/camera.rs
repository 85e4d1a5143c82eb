use crate::components::{Player, Position};
use crate::level::ViewportData;
use crate::plugins::level::LevelSession;
use crate::plugins::physics::{SimRng, ensure_sim_rng};
use crate::plugins::{SimSet, ensure_sim_schedule};
use bevy::prelude::*;

/// Visible world rectangle, recomputed every tick from the player position
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraWindow {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl CameraWindow {
    /// Window centred on `center`. A floor-locked viewport keeps its top edge
    /// at y = 0 and only follows horizontally.
    pub fn around(center: Vec2, viewport: &ViewportData) -> Self {
        let (hw, hh) = (viewport.half_width, viewport.half_height);
        let (min_y, max_y) = if viewport.floor_locked {
            (0.0, 2.0 * hh)
        } else {
            (center.y - hh, center.y + hh)
        };
        Self {
            min_x: center.x - hw,
            min_y,
            max_x: center.x + hw,
            max_y,
        }
    }

    /// Same offset on both edges of an axis so the size never changes
    pub fn shaken(self, offset: Vec2) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Camera target component - marks the camera entity
#[derive(Component)]
pub struct GameCamera;

/// Camera plugin - keeps the window on the player and the bevy camera on the window
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        ensure_sim_schedule(app);
        ensure_sim_rng(app);

        app.init_resource::<CameraWindow>()
            .add_systems(Startup, setup_camera)
            .add_systems(FixedUpdate, follow_player.in_set(SimSet::Camera))
            .add_systems(PostUpdate, (sync_game_camera, update_camera_projection));
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Camera2dBundle::default(), GameCamera));
}

fn follow_player(
    session: Res<LevelSession>,
    mut rng: ResMut<SimRng>,
    mut window: ResMut<CameraWindow>,
    player: Query<&Position, With<Player>>,
) {
    let Ok(position) = player.get_single() else {
        return;
    };

    let shake = session.shake_amplitude();
    let offset = Vec2::new(rng.symmetric(shake), rng.symmetric(shake));
    *window = CameraWindow::around(position.as_vec2(), &session.viewport).shaken(offset);
}

/// World y grows downward, bevy's grows upward
fn sync_game_camera(
    window: Res<CameraWindow>,
    mut camera_query: Query<&mut Transform, With<GameCamera>>,
) {
    let Ok(mut transform) = camera_query.get_single_mut() else {
        return;
    };
    let center = window.center();
    transform.translation.x = center.x;
    transform.translation.y = -center.y;
}

/// Scale the projection so the whole camera window fits the OS window
fn update_camera_projection(
    camera_window: Res<CameraWindow>,
    windows: Query<&Window>,
    mut camera_query: Query<&mut OrthographicProjection, With<GameCamera>>,
) {
    let Ok(mut projection) = camera_query.get_single_mut() else {
        return;
    };
    let Some(window) = windows.iter().next() else {
        return;
    };
    if camera_window.width() <= 0.0 || window.width() <= 0.0 || window.height() <= 0.0 {
        return;
    }

    let scale_x = camera_window.width() / window.width();
    let scale_y = camera_window.height() / window.height();
    projection.scale = scale_x.max(scale_y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_support::{load_level, sim_app, step};
    use crate::world::level_one;
    use proptest::prelude::*;

    fn free_viewport() -> ViewportData {
        ViewportData {
            half_width: 600.0,
            half_height: 300.0,
            floor_locked: false,
        }
    }

    #[test]
    fn test_window_centred_on_player() {
        let window = CameraWindow::around(Vec2::new(100.0, 500.0), &free_viewport());
        assert_eq!(
            window,
            CameraWindow {
                min_x: -500.0,
                min_y: 200.0,
                max_x: 700.0,
                max_y: 800.0,
            }
        );
        assert_eq!(window.center(), Vec2::new(100.0, 500.0));
    }

    #[test]
    fn test_floor_locked_window() {
        let window = CameraWindow::around(Vec2::new(2000.0, 500.0), &ViewportData::default());
        assert_eq!(window.min_y, 0.0);
        assert_eq!(window.max_y, 600.0);
        assert_eq!(window.min_x, 1400.0);
        assert_eq!(window.max_x, 2600.0);
    }

    #[test]
    fn test_camera_follows_player_each_tick() {
        let mut app = sim_app();
        load_level(&mut app, level_one());
        step(&mut app);

        let window = *app.world.resource::<CameraWindow>();
        let player_x = app
            .world
            .query_filtered::<&Position, With<Player>>()
            .single(&app.world)
            .x;
        // no distortion, no shake
        assert_eq!(window.min_x, player_x - 600.0);
        assert_eq!(window.max_x, player_x + 600.0);
        assert_eq!(window.min_y, 0.0);
    }

    #[test]
    fn test_game_camera_synced() {
        let mut app = sim_app();
        load_level(&mut app, level_one());
        step(&mut app);
        app.update();

        let center = app.world.resource::<CameraWindow>().center();
        let transform = app
            .world
            .query_filtered::<&Transform, With<GameCamera>>()
            .single(&app.world);
        assert_eq!(transform.translation.x, center.x);
        assert_eq!(transform.translation.y, -center.y);
    }

    #[test]
    fn test_shake_grows_with_distortion() {
        let mut app = sim_app();
        load_level(&mut app, level_one());
        for _ in 0..5 {
            app.world.resource_mut::<LevelSession>().escalate_distortion();
        }

        let mut moved = false;
        for _ in 0..20 {
            step(&mut app);
            let window = *app.world.resource::<CameraWindow>();
            assert!((window.width() - 1200.0).abs() < 1e-3);
            assert!((window.height() - 600.0).abs() < 1e-3);
            assert!(window.min_y.abs() <= 5.0);
            moved |= window.min_y != 0.0;
        }
        assert!(moved);
    }

    proptest! {
        #[test]
        fn prop_shake_keeps_size(
            px in -10_000.0f32..10_000.0,
            py in -10_000.0f32..10_000.0,
            dx in -50.0f32..50.0,
            dy in -50.0f32..50.0,
            floor_locked in any::<bool>(),
        ) {
            let viewport = ViewportData { floor_locked, ..ViewportData::default() };
            let calm = CameraWindow::around(Vec2::new(px, py), &viewport);
            let shaken = calm.shaken(Vec2::new(dx, dy));

            prop_assert!((shaken.width() - calm.width()).abs() < 1e-2);
            prop_assert!((shaken.height() - calm.height()).abs() < 1e-2);
            prop_assert!((shaken.center().x - calm.center().x - dx).abs() < 1e-2);
        }

        #[test]
        fn prop_rng_shake_within_bounds(seed in any::<u64>(), k in 0.0f32..20.0) {
            let mut rng = SimRng::seeded(seed);
            let offset = rng.symmetric(k);
            prop_assert!(offset.abs() <= k);
        }
    }
}
