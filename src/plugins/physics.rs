use crate::components::{Body, Collider, ExternalForce, Mass, Oscillator, Position, Sensor, Velocity};
use crate::config::GameConfig;
use crate::enums::BodyKind;
use crate::plugins::{SimSet, ensure_sim_schedule};
use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::BTreeSet;

/// Gravity vector in pixels per second squared, positive y pulls down
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct Gravity(pub Vec2);

impl Default for Gravity {
    fn default() -> Self {
        Self(Vec2::new(0.0, 1500.0))
    }
}

/// Ticks simulated since the level started
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    pub tick: u64,
}

impl SimClock {
    pub fn seconds(&self, dt: f32) -> f32 {
        self.tick as f32 * dt
    }
}

/// Seeded RNG for everything random inside the tick
#[derive(Resource)]
pub struct SimRng(Pcg32);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }

    /// Uniform in `[-k, k]`, zero when `k` is not a positive finite number
    pub fn symmetric(&mut self, k: f32) -> f32 {
        if !k.is_finite() || k <= 0.0 {
            return 0.0;
        }
        self.0.random_range(-k..=k)
    }

    /// Uniform in `[0, 1)`
    pub fn unit(&mut self) -> f32 {
        self.0.random_range(0.0..1.0)
    }
}

/// Two bodies started touching. `a < b`.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactBegin {
    pub a: Entity,
    pub b: Entity,
}

/// Two bodies stopped touching, or one of them is gone. `a < b`.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEnd {
    pub a: Entity,
    pub b: Entity,
}

/// Pairs currently in contact
#[derive(Resource, Clone, Debug, Default)]
pub struct ActiveContacts {
    pairs: BTreeSet<(Entity, Entity)>,
}

impl ActiveContacts {
    pub fn contains(&self, a: Entity, b: Entity) -> bool {
        self.pairs.contains(&contact_pair(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Forget every pair without emitting end events
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Forget the pairs of one entity so contacts it still has begin again
    pub fn forget(&mut self, entity: Entity) {
        self.pairs.retain(|&(a, b)| a != entity && b != entity);
    }
}

/// Order a pair so each contact has one key
pub fn contact_pair(a: Entity, b: Entity) -> (Entity, Entity) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Overlap depth on each axis; both positive means the boxes intersect
pub fn penetration(a: Vec2, a_half: Vec2, b: Vec2, b_half: Vec2) -> Vec2 {
    (a_half + b_half) - (a - b).abs()
}

/// Boxes overlap or lie within `slop` of each other on both axes
pub fn boxes_touch(a: Vec2, a_half: Vec2, b: Vec2, b_half: Vec2, slop: f32) -> bool {
    let depth = penetration(a, a_half, b, b_half);
    depth.x >= -slop && depth.y >= -slop
}

/// Minimal stand-in for the physics engine: moves bodies, keeps dynamic bodies
/// out of solid ones and reports contacts
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        ensure_sim_schedule(app);

        let config = app
            .world
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(config.clone())
            .insert_resource(Time::<Fixed>::from_seconds(config.dt() as f64));
        ensure_sim_rng(app);

        app.init_resource::<Gravity>()
            .init_resource::<SimClock>()
            .init_resource::<ActiveContacts>()
            .add_event::<ContactBegin>()
            .add_event::<ContactEnd>()
            .add_systems(
                FixedUpdate,
                (
                    advance_clock,
                    move_kinematic_bodies,
                    integrate_dynamic_bodies,
                    separate_dynamic_bodies,
                )
                    .chain()
                    .in_set(SimSet::Physics),
            )
            .add_systems(FixedUpdate, detect_contacts.in_set(SimSet::Contacts));
    }
}

/// Insert `GameConfig` defaults and a seeded `SimRng` unless already present
pub(crate) fn ensure_sim_rng(app: &mut App) {
    if !app.world.contains_resource::<GameConfig>() {
        app.insert_resource(GameConfig::default());
    }
    if !app.world.contains_resource::<SimRng>() {
        let seed = app.world.resource::<GameConfig>().rng_seed;
        app.insert_resource(SimRng::seeded(seed));
    }
}

fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.tick += 1;
}

fn move_kinematic_bodies(
    config: Res<GameConfig>,
    clock: Res<SimClock>,
    mut query: Query<(&Body, &Oscillator, &mut Position)>,
) {
    let seconds = clock.seconds(config.dt());
    for (body, oscillator, mut position) in query.iter_mut() {
        if body.0 != BodyKind::Kinematic {
            continue;
        }
        *position = oscillator.position_at(seconds).into();
    }
}

/// v += (g + F/m) dt, then p += v dt. Forces are consumed.
fn integrate_dynamic_bodies(
    config: Res<GameConfig>,
    gravity: Res<Gravity>,
    mut query: Query<(
        &Body,
        &mut Position,
        &mut Velocity,
        &mut ExternalForce,
        Option<&Mass>,
    )>,
) {
    let dt = config.dt();
    let max_speed = config.physics.max_horizontal_speed;
    let damping = 1.0 - config.physics.air_damping;

    for (body, mut position, mut velocity, mut force, mass) in query.iter_mut() {
        if body.0 != BodyKind::Dynamic {
            continue;
        }
        let mass = mass.map_or(1.0, |m| m.0);

        velocity.x += (gravity.0.x + force.x / mass) * dt;
        velocity.y += (gravity.0.y + force.y / mass) * dt;
        velocity.x = velocity.x.clamp(-max_speed, max_speed) * damping;
        velocity.y *= damping;

        position.x += velocity.x * dt;
        position.y += velocity.y * dt;
        force.clear();
    }
}

/// Push dynamic bodies out of solid bodies along the shallower axis
fn separate_dynamic_bodies(
    config: Res<GameConfig>,
    mut bodies: ParamSet<(
        Query<(&Body, &Position, &Collider), Without<Sensor>>,
        Query<(&Body, &mut Position, &mut Velocity, &Collider), Without<Sensor>>,
    )>,
) {
    let friction = config.physics.friction;
    let solid_boxes: Vec<(Vec2, Vec2)> = bodies
        .p0()
        .iter()
        .filter(|(body, _, _)| body.0 != BodyKind::Dynamic)
        .map(|(_, position, collider)| (position.as_vec2(), collider.half_extents()))
        .collect();

    for (body, mut position, mut velocity, collider) in bodies.p1().iter_mut() {
        if body.0 != BodyKind::Dynamic {
            continue;
        }
        let half = collider.half_extents();

        for &(solid, solid_half) in &solid_boxes {
            let here = position.as_vec2();
            let depth = penetration(here, half, solid, solid_half);
            if depth.x <= 0.0 || depth.y <= 0.0 {
                continue;
            }

            if depth.y < depth.x {
                if here.y < solid.y {
                    // landed on top
                    position.y -= depth.y;
                    if velocity.y > 0.0 {
                        velocity.y = 0.0;
                    }
                    velocity.x *= 1.0 - friction;
                } else {
                    position.y += depth.y;
                    if velocity.y < 0.0 {
                        velocity.y = 0.0;
                    }
                }
            } else if here.x < solid.x {
                position.x -= depth.x;
                if velocity.x > 0.0 {
                    velocity.x = 0.0;
                }
            } else {
                position.x += depth.x;
                if velocity.x < 0.0 {
                    velocity.x = 0.0;
                }
            }
        }
    }
}

/// Diff touching pairs against the previous tick. Pairs with no dynamic body
/// never report.
fn detect_contacts(
    config: Res<GameConfig>,
    bodies: Query<(Entity, &Body, &Position, &Collider)>,
    mut active: ResMut<ActiveContacts>,
    mut begins: EventWriter<ContactBegin>,
    mut ends: EventWriter<ContactEnd>,
) {
    let slop = config.physics.contact_slop;
    let mut current = BTreeSet::new();

    for [(ea, ka, pa, ca), (eb, kb, pb, cb)] in bodies.iter_combinations() {
        if ka.0 != BodyKind::Dynamic && kb.0 != BodyKind::Dynamic {
            continue;
        }
        if boxes_touch(
            pa.as_vec2(),
            ca.half_extents(),
            pb.as_vec2(),
            cb.half_extents(),
            slop,
        ) {
            current.insert(contact_pair(ea, eb));
        }
    }

    for &(a, b) in active.pairs.difference(&current) {
        ends.send(ContactEnd { a, b });
    }
    for &(a, b) in current.difference(&active.pairs) {
        begins.send(ContactBegin { a, b });
    }

    active.pairs = current;
}
