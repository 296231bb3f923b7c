//! The player: one composite state struct advanced once per frame.
//!
//! Each capability lives in its own module as a function over its own slice of state. `Player`
//! owns those slices and calls the mechanics in a fixed order: walk, dash, jump, glide, crouch,
//! gravity, then x and y movement with collision, then scroll. Mechanics read the contacts settled
//! by the previous frame's collisions.

use bevy::math::{IVec2, Vec2};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::camera::FollowTarget;
use crate::collision::is_blocked;
use crate::controls::ControlSource;
use crate::geometry::PixelRect;
use crate::tiles::{Spawn, Tile};

mod crouch;
mod dash;
mod glide;
mod gravity;
mod jump;
mod settings;
mod walk;


use dash::DashState;
use glide::GlideState;
use jump::{JumpAction, JumpState, WallJumpState};
pub use settings::PlayerSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn from_sign(sign: f32) -> Self {
        if sign < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// What the last collision pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contacts {
    pub on_ground: bool,
    pub on_wall: bool,
    pub wall_right: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HitboxVariant {
    #[default]
    Normal,
    Crouch,
}

/// Animation state for the renderer, derived at the end of each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    Dash,
    Glide,
    WallSlide,
    Crouch,
}

#[derive(Debug, Clone)]
pub struct Player {
    settings: PlayerSettings,
    /// Sprite rect. Its midbottom always matches the hitbox's.
    rect: PixelRect,
    hitbox: PixelRect,
    variant: HitboxVariant,
    /// Velocity in pixels per reference frame, +y down.
    direction: Vec2,
    facing: Facing,
    contacts: Contacts,
    fall_timer: f32,
    gliding_active: bool,
    crouching: bool,
    dash: DashState,
    jump: JumpState,
    wall: WallJumpState,
    glide: GlideState,
    respawn_pending: bool,
    status: Status,
}

impl Player {
    /// Stands the player on `spawn`, which marks the midbottom of the hitbox.
    pub fn new(spawn: &Spawn, settings: PlayerSettings) -> Self {
        let hitbox = PixelRect::from_midbottom(spawn.position, settings.hitbox_size());
        let rect = PixelRect::from_midbottom(spawn.position, settings.size());
        Self {
            rect,
            hitbox,
            variant: HitboxVariant::Normal,
            direction: Vec2::ZERO,
            facing: spawn.facing,
            contacts: Contacts::default(),
            fall_timer: 0.0,
            gliding_active: false,
            crouching: false,
            dash: DashState::new(&settings),
            jump: JumpState::new(&settings),
            wall: WallJumpState::new(&settings),
            glide: GlideState::default(),
            respawn_pending: false,
            status: Status::Idle,
            settings,
        }
    }

    /// Advances one frame. `tiles` are the solid tiles, `scroll` the camera scroll computed for
    /// this frame, applied after collisions.
    pub fn update(
        &mut self,
        dt: f32,
        controls: &impl ControlSource,
        tiles: &[Tile],
        scroll: IVec2,
    ) {
        self.direction.x = walk::horizontal_speed(
            controls.left(),
            controls.right(),
            self.crouching,
            &mut self.wall,
            &mut self.facing,
            dt,
            &self.settings,
        );

        let dash_speed = dash::update_dash(
            &mut self.dash,
            controls.dash(),
            &self.contacts,
            self.facing,
            dt,
            &self.settings,
        );
        self.direction.x += dash_speed;

        let action = jump::update_jump(
            &mut self.jump,
            &self.wall,
            controls.jump(),
            &self.contacts,
            dt,
            &self.settings,
        );
        self.apply_jump(action);

        self.gliding_active = glide::update_glide(
            &mut self.glide,
            controls.glide(),
            &self.contacts,
            self.direction.y,
            dt,
            &self.settings,
        );

        let standing = PixelRect::from_midbottom(self.hitbox.midbottom(), self.settings.hitbox_size());
        self.crouching = crouch::update_crouch(
            controls.crouch(),
            self.contacts.on_ground,
            self.crouching,
            is_blocked(&standing, tiles),
        );
        self.set_variant(if self.crouching {
            HitboxVariant::Crouch
        } else {
            HitboxVariant::Normal
        });

        self.direction.y = gravity::integrate(
            self.direction.y,
            &self.contacts,
            self.gliding_active,
            dt,
            &self.settings,
        );
        // A dash overrides gravity, grounded or not.
        if self.dash.dashing {
            self.direction.y = 0.0;
        }

        self.move_and_collide(dt, tiles);

        self.fall_timer = gravity::update_fall_timer(
            self.fall_timer,
            self.direction.y,
            self.contacts.on_ground,
            dt,
        );
        self.wall.track_contact(&self.contacts, dt, &self.settings);

        self.apply_scroll(scroll);
        self.status = self.compute_status();
    }

    fn apply_jump(&mut self, action: JumpAction) {
        match action {
            JumpAction::Hop(kind) => {
                trace!("hop {:?}", kind);
                self.direction.y = -self.settings.jump_speed;
                self.contacts.on_ground = false;
                self.glide.cancel();
            }
            JumpAction::Extend => {
                self.direction.y = -self.settings.jump_speed;
            }
            JumpAction::WallJump { direction } => {
                trace!("wall jump {}", direction);
                self.direction.y = -self.settings.wall_jump_speed;
                self.direction.x = self.settings.wall_kick_speed * direction;
                self.wall.start_kick(direction, &self.settings);
                self.dash.cancel();
                self.glide.cancel();
                self.facing = Facing::from_sign(direction);
                self.contacts.on_wall = false;
            }
            JumpAction::None => {}
        }
    }

    fn move_and_collide(&mut self, dt: f32, tiles: &[Tile]) {
        let resolver = self.settings.resolver();

        self.hitbox.x += to_pixels(self.direction.x * dt);
        let horizontal = resolver.resolve_x(&mut self.hitbox, self.direction.x, tiles);

        self.hitbox.y += to_pixels(self.direction.y * dt);
        let vertical = resolver.resolve_y(&mut self.hitbox, self.direction.y, tiles);
        if vertical.up {
            self.direction.y = 0.0;
            self.jump.jumping = false;
        }

        self.contacts = Contacts {
            on_ground: vertical.down,
            on_wall: horizontal.on_wall,
            wall_right: horizontal.wall_right,
        };
        self.rect.set_midbottom(self.hitbox.midbottom());
    }

    /// Swaps the hitbox size, keeping the feet where they are.
    fn set_variant(&mut self, variant: HitboxVariant) {
        if self.variant == variant {
            return;
        }
        let size = match variant {
            HitboxVariant::Normal => self.settings.hitbox_size(),
            HitboxVariant::Crouch => self.settings.crouch_hitbox_size(),
        };
        self.hitbox = PixelRect::from_midbottom(self.hitbox.midbottom(), size);
        self.variant = variant;
    }

    fn compute_status(&self) -> Status {
        if self.dash.dashing {
            Status::Dash
        } else if self.crouching {
            Status::Crouch
        } else if self.gliding_active {
            Status::Glide
        } else if !self.contacts.on_ground {
            if self.contacts.on_wall && self.direction.y > 0.0 {
                Status::WallSlide
            } else if self.direction.y < 0.0 {
                Status::Jump
            } else {
                Status::Fall
            }
        } else if self.direction.x != 0.0 {
            Status::Run
        } else {
            Status::Idle
        }
    }

    pub fn apply_scroll(&mut self, scroll: IVec2) {
        self.hitbox.translate(-scroll);
        self.rect.translate(-scroll);
    }

    /// Flags a respawn for the room to carry out on its next update.
    pub fn invoke_respawn(&mut self) {
        self.respawn_pending = true;
    }

    pub fn get_respawn(&self) -> bool {
        self.respawn_pending
    }

    /// Soft reset at `spawn`: same player, fresh motion. Held buttons stay latched so a button
    /// kept down through the respawn does not fire again.
    pub fn respawn(&mut self, spawn: &Spawn) {
        self.set_variant(HitboxVariant::Normal);
        self.hitbox.set_midbottom(spawn.position);
        self.rect.set_midbottom(spawn.position);
        self.direction = Vec2::ZERO;
        self.facing = spawn.facing;
        self.contacts = Contacts::default();
        self.fall_timer = 0.0;
        self.gliding_active = false;
        self.crouching = false;

        self.dash.reset(&self.settings);
        let jump_latch = self.jump.latch;
        self.jump = JumpState::new(&self.settings);
        self.jump.latch = jump_latch;
        self.wall = WallJumpState::new(&self.settings);
        self.glide = GlideState {
            latch: self.glide.latch,
            ..GlideState::default()
        };

        self.respawn_pending = false;
        self.status = Status::Idle;
    }

    /// Snapshot of what the camera frames.
    pub fn follow_target(&self) -> FollowTarget {
        FollowTarget {
            center: self.rect.center(),
            velocity: self.direction,
            facing: self.facing,
            on_ground: self.contacts.on_ground,
            dashing: self.dash.dashing,
            fall_timer: self.fall_timer,
        }
    }

    pub fn rect(&self) -> &PixelRect {
        &self.rect
    }

    pub fn hitbox(&self) -> &PixelRect {
        &self.hitbox
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

#[cfg(test)]
impl Player {
    pub fn variant(&self) -> HitboxVariant {
        self.variant
    }

    pub fn velocity(&self) -> Vec2 {
        self.direction
    }

    pub fn contacts(&self) -> Contacts {
        self.contacts
    }

    pub fn on_ground(&self) -> bool {
        self.contacts.on_ground
    }

    pub fn fall_timer(&self) -> f32 {
        self.fall_timer
    }

    pub fn is_dashing(&self) -> bool {
        self.dash.dashing
    }

    pub fn is_gliding(&self) -> bool {
        self.gliding_active
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }
}

/// Truncates a displacement to whole pixels. Values within float noise of an integer snap to it,
/// so velocities pre-divided by `dt` land on the intended pixel count.
fn to_pixels(distance: f32) -> i32 {
    let nearest = distance.round();
    if (distance - nearest).abs() < 1e-3 {
        nearest as i32
    } else {
        distance as i32
    }
}
