//! Semantic controls. Devices are folded into a `Controls` snapshot once per frame so the physics
//! core only ever asks "is jump held?", never "is the space bar down?".

use bevy::input::gamepad::{Gamepad, GamepadAxis, GamepadAxisType, GamepadButton, GamepadButtonType};
use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

use crate::state::{GameSet, GameState};

pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Controls>().add_systems(
            Update,
            sample_controls
                .in_set(GameSet::Input)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// Capability set the player and camera read from. Anything that can answer these queries can
/// drive a room, which is how the tests script input frame by frame.
pub trait ControlSource {
    fn left(&self) -> bool;
    fn right(&self) -> bool;
    fn jump(&self) -> bool;
    fn dash(&self) -> bool;
    fn glide(&self) -> bool;
    fn crouch(&self) -> bool;
    fn interact(&self) -> bool;
    /// Vertical look axis in room space: negative looks up, positive looks down.
    fn look(&self) -> f32;
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub dash: bool,
    pub glide: bool,
    pub crouch: bool,
    pub interact: bool,
    pub look: f32,
}

impl ControlSource for Controls {
    fn left(&self) -> bool {
        self.left
    }

    fn right(&self) -> bool {
        self.right
    }

    fn jump(&self) -> bool {
        self.jump
    }

    fn dash(&self) -> bool {
        self.dash
    }

    fn glide(&self) -> bool {
        self.glide
    }

    fn crouch(&self) -> bool {
        self.crouch
    }

    fn interact(&self) -> bool {
        self.interact
    }

    fn look(&self) -> f32 {
        self.look
    }
}

/// Remembers last frame's state of a button so holds can be told apart from fresh presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLatch {
    held: bool,
}

impl ButtonLatch {
    /// Feeds this frame's state and returns true only on the frame the button goes down.
    pub fn update(&mut self, down: bool) -> bool {
        let pressed = down && !self.held;
        self.held = down;
        pressed
    }

    #[cfg(test)]
    pub fn is_held(&self) -> bool {
        self.held
    }
}

const STICK_DEAD_ZONE: f32 = 0.35;

fn sample_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Res<Gamepads>,
    buttons: Res<ButtonInput<GamepadButton>>,
    axes: Res<Axis<GamepadAxis>>,
    mut controls: ResMut<Controls>,
) {
    let mut next = Controls {
        left: keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]),
        jump: keyboard.any_pressed([KeyCode::Space, KeyCode::KeyW]),
        dash: keyboard.any_pressed([KeyCode::Period, KeyCode::ShiftLeft]),
        // Glide and crouch share a key: crouch needs ground, glide needs air.
        glide: keyboard.pressed(KeyCode::KeyS),
        crouch: keyboard.pressed(KeyCode::KeyS),
        interact: keyboard.pressed(KeyCode::KeyE),
        look: 0.0,
    };

    if keyboard.pressed(KeyCode::ArrowDown) {
        next.look = 1.0;
    } else if keyboard.pressed(KeyCode::ArrowUp) {
        next.look = -1.0;
    }

    // Only the first connected pad is read; with none connected every query stays neutral.
    if let Some(gamepad) = gamepads.iter().next() {
        merge_gamepad(&mut next, gamepad, &buttons, &axes);
    }

    if *controls != next {
        *controls = next;
    }
}

fn merge_gamepad(
    controls: &mut Controls,
    gamepad: Gamepad,
    buttons: &ButtonInput<GamepadButton>,
    axes: &Axis<GamepadAxis>,
) {
    let pressed = |kind| buttons.pressed(GamepadButton::new(gamepad, kind));
    let axis = |kind| {
        axes.get(GamepadAxis::new(gamepad, kind))
            .unwrap_or(0.0)
    };

    let stick_x = axis(GamepadAxisType::LeftStickX);
    controls.left |= pressed(GamepadButtonType::DPadLeft) || stick_x < -STICK_DEAD_ZONE;
    controls.right |= pressed(GamepadButtonType::DPadRight) || stick_x > STICK_DEAD_ZONE;
    controls.jump |= pressed(GamepadButtonType::South);
    controls.dash |= pressed(GamepadButtonType::West) || pressed(GamepadButtonType::RightTrigger);
    controls.glide |= pressed(GamepadButtonType::LeftTrigger);
    controls.crouch |= pressed(GamepadButtonType::DPadDown);
    controls.interact |= pressed(GamepadButtonType::North);

    // Stick up is positive, room space looks down with positive y.
    let look = -axis(GamepadAxisType::RightStickY);
    if look.abs() > controls.look.abs() {
        controls.look = look;
    }
}
