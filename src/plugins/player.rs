use crate::components::{ExternalForce, Player, PlayerIntent, PlayerState, Position, Velocity};
use crate::config::GameConfig;
use crate::enums::{ContactPhase, Intent};
use crate::plugins::input::HeldIntents;
use crate::plugins::level::LevelSession;
use crate::plugins::physics::{ActiveContacts, Gravity, SimRng, ensure_sim_rng};
use crate::plugins::resolver::{HazardHit, SurfaceContact};
use crate::plugins::{SimSet, ensure_sim_schedule};
use bevy::prelude::*;

/// Plugin for player character logic and state
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        ensure_sim_schedule(app);
        ensure_sim_rng(app);

        app.init_resource::<HeldIntents>()
            .init_resource::<Gravity>()
            .init_resource::<ActiveContacts>()
            .add_event::<SurfaceContact>()
            .add_event::<HazardHit>()
            .add_systems(
                FixedUpdate,
                (jitter_gravity, sample_intents, apply_player_intents)
                    .chain()
                    .in_set(SimSet::Control),
            )
            .add_systems(
                FixedUpdate,
                (update_grounding, respawn_on_hazard)
                    .chain()
                    .in_set(SimSet::React),
            );
    }
}

/// Gravity for this tick: the level's base vector, re-rolled around it while
/// the distortion counter is positive
pub fn distorted_gravity(session: &LevelSession, rng: &mut SimRng) -> Vec2 {
    let counter = session.distortion.value() as f32;
    if counter == 0.0 {
        return session.base_gravity;
    }
    let jitter = session.rules.gravity_jitter;
    let gravity = Vec2::new(
        session.base_gravity.x + (rng.unit() - 0.5) * counter * jitter.x,
        session.base_gravity.y + (rng.unit() - 0.5) * counter * jitter.y,
    );
    if gravity.is_finite() {
        gravity
    } else {
        session.base_gravity
    }
}

fn jitter_gravity(
    session: Res<LevelSession>,
    mut gravity: ResMut<Gravity>,
    mut rng: ResMut<SimRng>,
) {
    gravity.0 = distorted_gravity(&session, &mut rng);
}

/// Snapshot held keys once per tick
fn sample_intents(
    mut held: ResMut<HeldIntents>,
    mut query: Query<&mut PlayerIntent, With<Player>>,
) {
    let jump = held.take_jump();
    for mut intent in query.iter_mut() {
        intent.move_left = held.is_held(Intent::MoveLeft);
        intent.move_right = held.is_held(Intent::MoveRight);
        intent.jump_requested = jump;
    }
}

fn apply_player_intents(
    config: Res<GameConfig>,
    session: Res<LevelSession>,
    mut query: Query<
        (
            &PlayerIntent,
            &mut PlayerState,
            &mut Velocity,
            &mut ExternalForce,
        ),
        With<Player>,
    >,
) {
    let move_force = config.player.move_force * session.control_gain();
    let jump_velocity = config.player.jump_velocity - session.jump_boost();

    for (intent, mut state, mut velocity, mut force) in query.iter_mut() {
        force.add(intent.horizontal_axis() * move_force, 0.0);

        if intent.jump_requested && state.try_jump(&mut velocity, jump_velocity) {
            debug!("Jump, vy = {}", velocity.y);
        }
    }
}

/// Grounded is set by contact with a body below the player and cleared when
/// such a contact ends
fn update_grounding(
    mut surfaces: EventReader<SurfaceContact>,
    mut query: Query<(&Position, &mut PlayerState), With<Player>>,
) {
    let Ok((position, mut state)) = query.get_single_mut() else {
        surfaces.clear();
        return;
    };

    for contact in surfaces.read() {
        match contact.phase {
            ContactPhase::Begin => {
                if state.on_contact_begin(position.y, contact.other_y) {
                    debug!("Grounded on {:?}", contact.other);
                }
            }
            ContactPhase::End => state.on_contact_end(position.y, contact.other_y),
        }
    }
}

/// Back to spawn with no momentum
fn respawn_on_hazard(
    mut hits: EventReader<HazardHit>,
    mut contacts: ResMut<ActiveContacts>,
    mut query: Query<
        (
            Entity,
            &mut Position,
            &mut Velocity,
            &mut ExternalForce,
            &mut PlayerState,
        ),
        With<Player>,
    >,
) {
    if hits.is_empty() {
        return;
    }
    hits.clear();

    for (entity, mut position, mut velocity, mut force, mut state) in query.iter_mut() {
        *position = state.spawn_point.into();
        *velocity = Velocity::default();
        force.clear();
        state.grounded = false;
        contacts.forget(entity);
        info!("Player respawned at {:?}", state.spawn_point);
    }
}
