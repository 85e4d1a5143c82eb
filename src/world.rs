use crate::enums::BodyRole;
use crate::level::{BodyData, DistortionRules, LevelData, MotionData, Point, ViewportData};

/// Shared by the built-in levels
pub const SPAWN_POINT: Point = Point::new(100.0, 500.0);

fn static_body(role: BodyRole, x: f32, y: f32, width: f32, height: f32) -> BodyData {
    BodyData {
        role,
        x,
        y,
        width,
        height,
        is_static: true,
        is_sensor: false,
        motion: None,
    }
}

/// Ground plus the two boundary walls
pub fn world_box() -> Vec<BodyData> {
    vec![
        obstacle(3000.0, 590.0, 7000.0, 20.0),
        obstacle(-500.0, 300.0, 1000.0, 1000.0),
        obstacle(6310.0, 300.0, 1000.0, 600.0),
    ]
}

/// Solid scenery the player can stand on
pub fn obstacle(x: f32, y: f32, width: f32, height: f32) -> BodyData {
    static_body(BodyRole::Scenery, x, y, width, height)
}

/// Solid body that sends the player back to spawn
pub fn hazard(x: f32, y: f32, width: f32, height: f32) -> BodyData {
    static_body(BodyRole::Hazard, x, y, width, height)
}

/// 50x100 sensor that completes the level
pub fn goal(x: f32, y: f32) -> BodyData {
    BodyData {
        is_sensor: true,
        ..static_body(BodyRole::Goal, x, y, 50.0, 100.0)
    }
}

/// Square sensor that escalates the distortion counter
pub fn distortion_zone(x: f32, y: f32, radius: f32) -> BodyData {
    BodyData {
        is_sensor: true,
        ..static_body(BodyRole::Distortion, x, y, radius * 2.0, radius * 2.0)
    }
}

/// Make a body oscillate around its position
pub fn moving(body: BodyData, amplitude_x: f32, amplitude_y: f32, angular_speed: f32) -> BodyData {
    BodyData {
        motion: Some(MotionData {
            amplitude_x,
            amplitude_y,
            angular_speed,
        }),
        ..body
    }
}

fn base_level(id: u32, name: &str, gravity_y: f32, bodies: Vec<BodyData>) -> LevelData {
    LevelData {
        id,
        name: name.to_string(),
        gravity: Point::new(0.0, gravity_y),
        spawn_point: SPAWN_POINT,
        viewport: ViewportData::default(),
        bodies,
        next_level: None,
        persist_progress: true,
        distortion: DistortionRules::default(),
        completion_message: None,
    }
}

pub fn level_one() -> LevelData {
    let mut bodies = world_box();
    bodies.extend([
        obstacle(500.0, 540.0, 80.0, 80.0),
        obstacle(800.0, 450.0, 150.0, 20.0),
        hazard(1100.0, 577.0, 150.0, 5.0),
        goal(1500.0, 530.0),
    ]);
    base_level(1, "First Steps", 1500.0, bodies)
}

pub fn level_two() -> LevelData {
    let mut bodies = world_box();
    bodies.extend([
        obstacle(600.0, 520.0, 50.0, 200.0),
        obstacle(900.0, 400.0, 100.0, 50.0),
        moving(obstacle(1400.0, 400.0, 200.0, 20.0), 200.0, 0.0, 5.0),
        obstacle(1800.0, 450.0, 150.0, 20.0),
        hazard(1400.0, 577.0, 200.0, 5.0),
        goal(2200.0, 530.0),
    ]);
    base_level(2, "Moving Parts", 1500.0, bodies)
}

pub fn level_five() -> LevelData {
    let mut bodies = world_box();

    let red_platforms = [
        (400.0, 520.0, 190.0),
        (600.0, 430.0, 140.0),
        (800.0, 330.0, 90.0),
        (1200.0, 550.0, 190.0),
        (1600.0, 470.0, 140.0),
        (2000.0, 530.0, 90.0),
        (2350.0, 530.0, 140.0),
        (2750.0, 480.0, 190.0),
        (2800.0, 430.0, 40.0),
        (3000.0, 380.0, 40.0),
        (3200.0, 530.0, 40.0),
        (1000.0, 380.0, 100.0),
        (1500.0, 300.0, 120.0),
        (2200.0, 250.0, 80.0),
        (2600.0, 350.0, 110.0),
        (3400.0, 450.0, 90.0),
        (3700.0, 300.0, 70.0),
        (4000.0, 500.0, 130.0),
        (4300.0, 400.0, 100.0),
    ];
    bodies.extend(
        red_platforms
            .iter()
            .map(|&(x, y, width)| hazard(x, y, width, 20.0)),
    );

    // Swinging bars hang from a post 100px above their pivot
    for (x, y) in [(1800.0, 350.0), (3500.0, 450.0), (2200.0, 500.0), (4100.0, 350.0)] {
        bodies.push(moving(hazard(x, y, 100.0, 10.0), 50.0, 0.0, 0.5));
        bodies.push(obstacle(x, y - 100.0, 10.0, 200.0));
    }

    bodies.push(goal(4500.0, 530.0));
    base_level(5, "Red Ground", 1800.0, bodies)
}

/// The hidden level past the last numbered one. Touching the purple zones bends
/// gravity, the camera and the controls.
pub fn breach_level() -> LevelData {
    let mut bodies = Vec::new();

    // Starting ledge and a void floor so a missed jump respawns instead of falling forever
    bodies.push(obstacle(100.0, 560.0, 120.0, 10.0));
    bodies.push(hazard(3000.0, 1000.0, 8000.0, 20.0));

    for i in 0..20 {
        let i = i as f32;
        let x = 300.0 + i * 300.0;
        let y = 500.0 - (i * 0.5).sin() * 200.0;
        let width = 100.0 - i * 2.0;
        bodies.push(obstacle(x, y, width, 10.0));
    }

    for i in 0..10 {
        let i = i as f32;
        bodies.push(distortion_zone(800.0 + i * 600.0, 300.0 + i.sin() * 100.0, 30.0));
    }

    bodies.push(goal(6000.0, 300.0));

    LevelData {
        persist_progress: false,
        completion_message: Some("REALITY BREACH DETECTED".to_string()),
        ..base_level(100, "Breach", 1800.0, bodies)
    }
}

/// All levels that ship with the game
pub fn builtin_levels() -> Vec<LevelData> {
    vec![level_one(), level_two(), level_five(), breach_level()]
}
