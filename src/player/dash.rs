//! Dash: an edge-triggered horizontal burst with a short landing buffer.
//!
//! The dash timer only refills on ground or wall contact while not dashing, so one dash is
//! available per flight. A press that cannot dash yet is remembered for `dash_buffer_max`
//! frames and fires as soon as the player lands.

use super::{Contacts, Facing, PlayerSettings};
use crate::controls::ButtonLatch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashState {
    pub latch: ButtonLatch,
    pub dashing: bool,
    pub timer: f32,
    /// +1 or -1, fixed for the whole dash.
    pub direction: f32,
    pub buffered: bool,
    pub buffer_timer: f32,
}

impl DashState {
    /// Starts exhausted so the player cannot dash before first touching ground.
    pub fn new(settings: &PlayerSettings) -> Self {
        Self {
            latch: ButtonLatch::default(),
            dashing: false,
            timer: settings.dash_max,
            direction: 1.0,
            buffered: false,
            buffer_timer: settings.dash_buffer_max,
        }
    }

    /// Ends the dash without refilling it.
    pub fn cancel(&mut self) {
        self.dashing = false;
    }

    /// Ends the dash and exhausts it, used on respawn.
    pub fn reset(&mut self, settings: &PlayerSettings) {
        let latch = self.latch;
        *self = Self::new(settings);
        self.latch = latch;
    }
}

/// Away from the wall when touching one, otherwise the way the player faces.
fn launch_direction(contacts: &Contacts, facing: Facing) -> f32 {
    if contacts.on_wall {
        if contacts.wall_right {
            -1.0
        } else {
            1.0
        }
    } else {
        facing.sign()
    }
}

/// Advances the dash one frame and returns the horizontal velocity it adds.
pub fn update_dash(
    state: &mut DashState,
    held: bool,
    contacts: &Contacts,
    facing: Facing,
    dt: f32,
    settings: &PlayerSettings,
) -> f32 {
    // Refill before reading the press so a dash on the landing frame is not lost. Wall contact
    // waits for the running dash to finish so it cannot be chained into a cling.
    if !state.dashing && (contacts.on_ground || contacts.on_wall) {
        state.timer = 0.0;
    }

    if state.latch.update(held) {
        if !state.dashing {
            state.dashing = true;
            state.direction = launch_direction(contacts, facing);
        }
        state.buffered = true;
        state.buffer_timer = 0.0;
    }

    if contacts.on_ground
        && !state.dashing
        && state.buffered
        && state.buffer_timer < settings.dash_buffer_max
    {
        state.dashing = true;
        state.direction = launch_direction(contacts, facing);
    }

    let mut velocity = 0.0;
    if state.dashing && state.timer < settings.dash_max {
        velocity = settings.dash_speed * state.direction;
        state.timer += dt;
        state.buffered = false;
        state.buffer_timer = settings.dash_buffer_max;
    } else {
        state.dashing = false;
    }

    if state.buffered {
        state.buffer_timer += dt;
        if state.buffer_timer >= settings.dash_buffer_max {
            state.buffered = false;
        }
    }

    velocity
}
