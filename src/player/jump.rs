//! Jumping in all its forms: ground hop, buffered hop on landing, coyote hop, one double jump
//! per flight, wall jump, and the held-button extension that gives variable height.

use super::{Contacts, PlayerSettings};
use crate::controls::ButtonLatch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpState {
    pub latch: ButtonLatch,
    /// Set by a hop, cleared on release or landing. Only a jumping player can extend.
    pub jumping: bool,
    pub hold_timer: f32,
    /// Frames since the last unconsumed press.
    pub buffer_timer: f32,
    /// Frames since the player last stood on ground.
    pub coyote_timer: f32,
    pub can_double_jump: bool,
}

impl JumpState {
    /// Timers start expired so nothing fires on the first frame of a room.
    pub fn new(settings: &PlayerSettings) -> Self {
        Self {
            latch: ButtonLatch::default(),
            jumping: false,
            hold_timer: settings.jump_hold_max,
            buffer_timer: settings.jump_buffer_max,
            coyote_timer: settings.coyote_max,
            can_double_jump: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallJumpState {
    /// Frames since the last wall jump; horizontal input is locked while below `wall_kick_max`.
    pub kick_timer: f32,
    pub kick_direction: f32,
    /// Frames since the player last touched a wall.
    pub sticky_timer: f32,
    pub last_wall_right: bool,
}

impl WallJumpState {
    pub fn new(settings: &PlayerSettings) -> Self {
        Self {
            kick_timer: settings.wall_kick_max,
            kick_direction: 0.0,
            sticky_timer: settings.sticky_wall_max,
            last_wall_right: false,
        }
    }

    pub fn kicking(&self, settings: &PlayerSettings) -> bool {
        self.kick_timer < settings.wall_kick_max
    }

    /// True while the wall was touched recently enough to jump off it.
    pub fn in_grace(&self, settings: &PlayerSettings) -> bool {
        self.sticky_timer < settings.sticky_wall_max
    }

    pub fn away_from_wall(&self) -> f32 {
        if self.last_wall_right {
            -1.0
        } else {
            1.0
        }
    }

    pub fn start_kick(&mut self, direction: f32, settings: &PlayerSettings) {
        self.kick_timer = 0.0;
        self.kick_direction = direction;
        // One wall jump per contact.
        self.sticky_timer = settings.sticky_wall_max;
    }

    /// Tracks wall contact after collisions have settled for the frame. Standing on ground
    /// closes the grace window.
    pub fn track_contact(&mut self, contacts: &Contacts, dt: f32, settings: &PlayerSettings) {
        if contacts.on_wall {
            self.sticky_timer = 0.0;
            self.last_wall_right = contacts.wall_right;
        } else if contacts.on_ground {
            self.sticky_timer = settings.sticky_wall_max;
        } else {
            self.sticky_timer = (self.sticky_timer + dt).min(settings.sticky_wall_max);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopKind {
    Ground,
    Buffered,
    Coyote,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpAction {
    None,
    Hop(HopKind),
    /// Button still held during a hop: keep the upward speed.
    Extend,
    /// Kick off the wall in `direction` (+1 right, -1 left).
    WallJump { direction: f32 },
}

/// Advances the jump mechanics one frame. `contacts` is the state settled by last frame's
/// collisions; the caller applies the returned action to the velocity.
pub fn update_jump(
    jump: &mut JumpState,
    wall: &WallJumpState,
    held: bool,
    contacts: &Contacts,
    dt: f32,
    settings: &PlayerSettings,
) -> JumpAction {
    let pressed = jump.latch.update(held);
    if pressed {
        jump.buffer_timer = 0.0;
        jump.hold_timer = 0.0;
    }
    if !held {
        jump.jumping = false;
        jump.hold_timer = settings.jump_hold_max;
    }

    if contacts.on_ground {
        jump.coyote_timer = 0.0;
        jump.jumping = false;
    }
    if contacts.on_ground || contacts.on_wall {
        jump.can_double_jump = true;
    }

    let action = if pressed && !contacts.on_ground && wall.in_grace(settings) {
        jump.buffer_timer = settings.jump_buffer_max;
        jump.coyote_timer = settings.coyote_max;
        jump.jumping = false;
        JumpAction::WallJump {
            direction: wall.away_from_wall(),
        }
    } else if let Some(kind) = hop_kind(jump, pressed, contacts, settings) {
        if kind == HopKind::Double {
            jump.can_double_jump = false;
        }
        // Consume everything that could fire a second hop from the same press.
        jump.coyote_timer = settings.coyote_max;
        jump.buffer_timer = settings.jump_buffer_max;
        jump.hold_timer = 0.0;
        jump.jumping = true;
        JumpAction::Hop(kind)
    } else if jump.jumping && held && jump.hold_timer < settings.jump_hold_max {
        JumpAction::Extend
    } else {
        JumpAction::None
    };

    jump.buffer_timer = (jump.buffer_timer + dt).min(settings.jump_buffer_max);
    jump.hold_timer = (jump.hold_timer + dt).min(settings.jump_hold_max);
    if !contacts.on_ground {
        jump.coyote_timer = (jump.coyote_timer + dt).min(settings.coyote_max);
    }

    action
}

fn hop_kind(
    jump: &JumpState,
    pressed: bool,
    contacts: &Contacts,
    settings: &PlayerSettings,
) -> Option<HopKind> {
    if contacts.on_ground && jump.buffer_timer < settings.jump_buffer_max {
        Some(if pressed {
            HopKind::Ground
        } else {
            HopKind::Buffered
        })
    } else if pressed && jump.coyote_timer < settings.coyote_max {
        Some(HopKind::Coyote)
    } else if pressed && jump.can_double_jump {
        Some(HopKind::Double)
    } else {
        None
    }
}
