use crate::components::{Collider, Position, Role};
use crate::enums::BodyRole;
use bevy::prelude::*;

/// Plugin that draws every body as a flat coloured box
pub struct BodySpritePlugin;

impl Plugin for BodySpritePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PostUpdate,
            (attach_body_sprites, update_sprite_position_system).chain(),
        );
    }
}

pub fn role_color(role: BodyRole) -> Color {
    match role {
        BodyRole::Player => Color::rgb(0.2, 0.5, 0.9),
        BodyRole::Hazard => Color::rgb(0.85, 0.15, 0.15),
        BodyRole::Goal => Color::rgb(0.2, 0.8, 0.3),
        BodyRole::Scenery => Color::rgb(0.45, 0.45, 0.5),
        BodyRole::Distortion => Color::rgb(0.6, 0.2, 0.8),
    }
}

/// World y grows downward
fn to_translation(position: &Position, z: f32) -> Vec3 {
    Vec3::new(position.x, -position.y, z)
}

fn attach_body_sprites(
    mut commands: Commands,
    query: Query<(Entity, &Role, &Collider, &Position), Added<Role>>,
) {
    for (entity, role, collider, position) in query.iter() {
        // player drawn above the scenery
        let z = if role.0 == BodyRole::Player { 1.0 } else { 0.0 };
        commands.entity(entity).insert(SpriteBundle {
            sprite: Sprite {
                color: role_color(role.0),
                custom_size: Some(Vec2::new(collider.width, collider.height)),
                ..default()
            },
            transform: Transform::from_translation(to_translation(position, z)),
            ..default()
        });
    }
}

/// Update sprite position to match entity position
fn update_sprite_position_system(
    mut query: Query<(&Position, &mut Transform), Changed<Position>>,
) {
    for (position, mut transform) in query.iter_mut() {
        transform.translation = to_translation(position, transform.translation.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprites_follow_bodies() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(BodySpritePlugin);
        let body = app
            .world
            .spawn((
                Role(BodyRole::Hazard),
                Collider::new(200.0, 5.0),
                Position::new(1400.0, 577.0),
            ))
            .id();

        app.update();

        let sprite = app.world.get::<Sprite>(body).unwrap();
        assert_eq!(sprite.custom_size, Some(Vec2::new(200.0, 5.0)));
        assert_eq!(sprite.color, role_color(BodyRole::Hazard));
        assert_eq!(
            app.world.get::<Transform>(body).unwrap().translation,
            Vec3::new(1400.0, -577.0, 0.0)
        );

        app.world.get_mut::<Position>(body).unwrap().x = 1500.0;
        app.update();
        assert_eq!(app.world.get::<Transform>(body).unwrap().translation.x, 1500.0);
    }
}
