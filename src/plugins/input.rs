use crate::enums::Intent;
use bevy::input::ButtonState;
use bevy::input::keyboard::KeyboardInput;
use bevy::prelude::*;
use bevy::utils::{HashMap, HashSet};

/// A key went down or up. The only input shape the game depends on.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(key: KeyCode) -> Self {
        Self { key, pressed: true }
    }

    pub fn up(key: KeyCode) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

/// Key to intent table
#[derive(Resource, Clone, Debug)]
pub struct KeyBindings {
    bindings: HashMap<KeyCode, Intent>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings = [
            (KeyCode::Up, Intent::Jump),
            (KeyCode::Space, Intent::Jump),
            (KeyCode::W, Intent::Jump),
            (KeyCode::Left, Intent::MoveLeft),
            (KeyCode::A, Intent::MoveLeft),
            (KeyCode::Right, Intent::MoveRight),
            (KeyCode::D, Intent::MoveRight),
        ];
        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

impl KeyBindings {
    pub fn map_key(&self, key: KeyCode) -> Option<Intent> {
        self.bindings.get(&key).copied()
    }
}

/// Intents whose keys are down, plus a jump press not yet seen by a tick.
/// Key events write it, the simulation tick reads it.
#[derive(Resource, Clone, Debug, Default)]
pub struct HeldIntents {
    held: HashSet<Intent>,
    jump_latched: bool,
}

impl HeldIntents {
    pub fn press(&mut self, intent: Intent) {
        // key repeat arrives as more presses of a held key
        if self.held.insert(intent) && intent == Intent::Jump {
            self.jump_latched = true;
        }
    }

    pub fn release(&mut self, intent: Intent) {
        self.held.remove(&intent);
    }

    pub fn is_held(&self, intent: Intent) -> bool {
        self.held.contains(&intent)
    }

    /// True once per jump press, or every call while jump stays held
    pub fn take_jump(&mut self) -> bool {
        let latched = std::mem::take(&mut self.jump_latched);
        latched || self.is_held(Intent::Jump)
    }

    /// Drop a jump press no tick has seen yet. Held keys stay held.
    pub fn cancel_jump(&mut self) {
        self.jump_latched = false;
    }
}

/// Input mapper: keyboard to held intents
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<KeyBindings>()
            .init_resource::<HeldIntents>()
            .add_event::<KeyboardInput>()
            .add_event::<KeyEvent>()
            .add_systems(
                PreUpdate,
                (forward_keyboard_input, apply_key_events).chain(),
            );
    }
}

fn forward_keyboard_input(
    mut keyboard: EventReader<KeyboardInput>,
    mut keys: EventWriter<KeyEvent>,
) {
    for input in keyboard.read() {
        let Some(key) = input.key_code else {
            continue;
        };
        keys.send(KeyEvent {
            key,
            pressed: input.state == ButtonState::Pressed,
        });
    }
}

fn apply_key_events(
    mut events: EventReader<KeyEvent>,
    bindings: Res<KeyBindings>,
    mut held: ResMut<HeldIntents>,
) {
    for event in events.read() {
        let Some(intent) = bindings.map_key(event.key) else {
            continue;
        };
        if event.pressed {
            held.press(intent);
        } else {
            held.release(intent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(InputPlugin);
        app
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.map_key(KeyCode::Up), Some(Intent::Jump));
        assert_eq!(bindings.map_key(KeyCode::Space), Some(Intent::Jump));
        assert_eq!(bindings.map_key(KeyCode::W), Some(Intent::Jump));
        assert_eq!(bindings.map_key(KeyCode::A), Some(Intent::MoveLeft));
        assert_eq!(bindings.map_key(KeyCode::Right), Some(Intent::MoveRight));
        assert_eq!(bindings.map_key(KeyCode::Escape), None);
    }

    #[test]
    fn test_held_until_released() {
        let mut app = input_app();
        app.world.send_event(KeyEvent::down(KeyCode::Left));
        app.update();
        app.update();
        assert!(app.world.resource::<HeldIntents>().is_held(Intent::MoveLeft));

        app.world.send_event(KeyEvent::up(KeyCode::Left));
        app.update();
        assert!(!app.world.resource::<HeldIntents>().is_held(Intent::MoveLeft));
    }

    #[test]
    fn test_tap_between_ticks_is_not_lost() {
        let mut app = input_app();
        app.world.send_event(KeyEvent::down(KeyCode::Space));
        app.world.send_event(KeyEvent::up(KeyCode::Space));
        app.update();

        let mut held = app.world.resource_mut::<HeldIntents>();
        assert!(!held.is_held(Intent::Jump));
        assert!(held.take_jump());
        assert!(!held.take_jump());
    }

    #[test]
    fn test_key_repeat_does_not_relatch() {
        let mut held = HeldIntents::default();
        held.press(Intent::Jump);
        assert!(held.take_jump());
        held.press(Intent::Jump);
        held.release(Intent::Jump);
        assert!(!held.take_jump());
    }

    #[test]
    fn test_keyboard_input_is_bridged() {
        let mut app = input_app();
        app.world.send_event(KeyboardInput {
            scan_code: 0,
            key_code: Some(KeyCode::D),
            state: ButtonState::Pressed,
            window: Entity::PLACEHOLDER,
        });
        app.update();
        assert!(app.world.resource::<HeldIntents>().is_held(Intent::MoveRight));
    }

    #[test]
    fn test_unbound_keys_ignored() {
        let mut app = input_app();
        app.world.send_event(KeyEvent::down(KeyCode::Q));
        app.update();
        let held = app.world.resource::<HeldIntents>();
        for intent in [Intent::Jump, Intent::MoveLeft, Intent::MoveRight] {
            assert!(!held.is_held(intent));
        }
    }
}
