use crate::components::{Player, Position, Role};
use crate::enums::{BodyRole, ContactPhase, FailReason, LevelOutcome};
use crate::plugins::level::LevelSession;
use crate::plugins::notice::Notice;
use crate::plugins::physics::{ContactBegin, ContactEnd};
use crate::plugins::{SimSet, ensure_sim_schedule};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

pub const HAZARD_NOTICE: &str = "You hit a hazard! Restarting...";

/// The player touched a hazard and must go back to spawn
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct HazardHit {
    pub player: Entity,
    pub hazard: Entity,
}

/// The goal was reached. Sent once per level session.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelCompleted {
    pub level: u32,
    pub next_level: u32,
}

/// Contact with ordinary scenery, forwarded for grounding
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct SurfaceContact {
    pub phase: ContactPhase,
    pub other: Entity,
    pub other_y: f32,
}

/// Outcome reported upward to the progression layer
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutcomeEvent {
    pub level: u32,
    pub outcome: LevelOutcome,
}

/// The level's distortion counter moved
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistortionChanged {
    pub value: u32,
}

/// Goal/hazard resolver: turns raw contacts into game events by role
pub struct ResolverPlugin;

impl Plugin for ResolverPlugin {
    fn build(&self, app: &mut App) {
        ensure_sim_schedule(app);
        app.add_event::<ContactBegin>()
            .add_event::<ContactEnd>()
            .add_event::<Notice>()
            .add_event::<HazardHit>()
            .add_event::<LevelCompleted>()
            .add_event::<SurfaceContact>()
            .add_event::<OutcomeEvent>()
            .add_event::<DistortionChanged>()
            .add_systems(
                FixedUpdate,
                (resolve_contact_begins, resolve_contact_ends)
                    .chain()
                    .in_set(SimSet::Resolve),
            );
    }
}

#[derive(SystemParam)]
struct ResolverEvents<'w> {
    hazards: EventWriter<'w, HazardHit>,
    completed: EventWriter<'w, LevelCompleted>,
    surfaces: EventWriter<'w, SurfaceContact>,
    outcomes: EventWriter<'w, OutcomeEvent>,
    distortion: EventWriter<'w, DistortionChanged>,
    notices: EventWriter<'w, Notice>,
}

/// The member of the pair that isn't the player, if the player is in it
fn other_member(player: Entity, a: Entity, b: Entity) -> Option<Entity> {
    if a == player {
        Some(b)
    } else if b == player {
        Some(a)
    } else {
        None
    }
}

fn resolve_contact_begins(
    mut commands: Commands,
    mut begins: EventReader<ContactBegin>,
    player: Query<Entity, With<Player>>,
    bodies: Query<(&Role, &Position)>,
    mut session: ResMut<LevelSession>,
    mut events: ResolverEvents,
) {
    let Ok(player) = player.get_single() else {
        begins.clear();
        return;
    };

    for contact in begins.read() {
        let Some(other) = other_member(player, contact.a, contact.b) else {
            continue;
        };
        // despawned since the contact was detected
        let Ok((role, position)) = bodies.get(other) else {
            continue;
        };

        match role.0 {
            BodyRole::Goal => {
                if !session.mark_completed() {
                    debug!("Goal touched again in level {}, ignoring", session.level);
                    continue;
                }
                info!("Level {} complete", session.level);
                events.completed.send(LevelCompleted {
                    level: session.level,
                    next_level: session.next_level,
                });
                events.outcomes.send(OutcomeEvent {
                    level: session.level,
                    outcome: session.outcome(),
                });
            }
            BodyRole::Hazard => {
                session.record_hazard_hit();
                info!(
                    "Hazard hit in level {} ({} so far)",
                    session.level, session.hazard_hits
                );
                events.hazards.send(HazardHit {
                    player,
                    hazard: other,
                });
                events.outcomes.send(OutcomeEvent {
                    level: session.level,
                    outcome: LevelOutcome::Failed(FailReason::HazardContact),
                });
                events.notices.send(Notice::error(HAZARD_NOTICE));
            }
            BodyRole::Distortion => {
                let value = session.escalate_distortion();
                debug!("Distortion now {}", value);
                events.distortion.send(DistortionChanged { value });
                if session.rules.consume_zone {
                    commands.entity(other).despawn();
                }
            }
            BodyRole::Scenery | BodyRole::Player => {
                events.surfaces.send(SurfaceContact {
                    phase: ContactPhase::Begin,
                    other,
                    other_y: position.y,
                });
            }
        }
    }
}

/// Only scenery contacts matter once they end
fn resolve_contact_ends(
    mut ends: EventReader<ContactEnd>,
    player: Query<Entity, With<Player>>,
    bodies: Query<(&Role, &Position)>,
    mut surfaces: EventWriter<SurfaceContact>,
) {
    let Ok(player) = player.get_single() else {
        ends.clear();
        return;
    };

    for contact in ends.read() {
        let Some(other) = other_member(player, contact.a, contact.b) else {
            continue;
        };
        let Ok((role, position)) = bodies.get(other) else {
            continue;
        };
        if matches!(role.0, BodyRole::Scenery | BodyRole::Player) {
            surfaces.send(SurfaceContact {
                phase: ContactPhase::End,
                other,
                other_y: position.y,
            });
        }
    }
}
