use bevy::math::IVec2;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::Resolver;
use crate::error::RoomError;

/// Movement tuning. Speeds are pixels per reference frame, durations are reference frames
/// (1/60 s); both are scaled by the frame's dt ratio when applied.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    pub size: [i32; 2],
    pub hitbox: [i32; 2],
    pub crouch_hitbox: [i32; 2],

    /// Largest penetration the resolver still treats as a collision. Must stay above every
    /// per-frame displacement or bodies pass through tiles.
    pub collision_tolerance: i32,
    pub corner_margin: i32,
    pub corner_boost: i32,

    pub walk_speed: f32,
    pub crouch_speed: f32,

    pub dash_speed: f32,
    pub dash_max: f32,
    pub dash_buffer_max: f32,

    pub gravity: f32,
    pub fall_gravity: f32,
    /// Downward speed held while grounded so the floor is re-detected every frame.
    pub ground_clamp: f32,
    pub terminal_velocity: f32,
    pub wall_terminal_velocity: f32,
    pub glide_terminal_velocity: f32,

    pub jump_speed: f32,
    pub jump_hold_max: f32,
    pub coyote_max: f32,
    pub jump_buffer_max: f32,

    pub wall_jump_speed: f32,
    pub wall_kick_speed: f32,
    /// How long horizontal input stays locked after a wall jump.
    pub wall_kick_max: f32,
    pub sticky_wall_max: f32,

    pub glide_max: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            size: [16, 24],
            hitbox: [12, 22],
            crouch_hitbox: [12, 14],
            collision_tolerance: 20,
            corner_margin: 4,
            corner_boost: 2,
            walk_speed: 2.5,
            crouch_speed: 1.0,
            dash_speed: 4.0,
            dash_max: 12.0,
            dash_buffer_max: 5.0,
            gravity: 0.4,
            fall_gravity: 1.0,
            ground_clamp: 1.0,
            terminal_velocity: 10.0,
            wall_terminal_velocity: 2.0,
            glide_terminal_velocity: 2.0,
            jump_speed: 5.0,
            jump_hold_max: 12.0,
            coyote_max: 5.0,
            jump_buffer_max: 10.0,
            wall_jump_speed: 7.0,
            wall_kick_speed: 3.0,
            wall_kick_max: 8.0,
            sticky_wall_max: 5.0,
            glide_max: 120.0,
        }
    }
}

impl PlayerSettings {
    pub fn size(&self) -> IVec2 {
        IVec2::from(self.size)
    }

    pub fn hitbox_size(&self) -> IVec2 {
        IVec2::from(self.hitbox)
    }

    pub fn crouch_hitbox_size(&self) -> IVec2 {
        IVec2::from(self.crouch_hitbox)
    }

    pub fn resolver(&self) -> Resolver {
        Resolver {
            tolerance: self.collision_tolerance,
            corner_margin: self.corner_margin,
            corner_boost: self.corner_boost,
            corner_speed: self.dash_speed,
        }
    }

    /// Rejects values the physics cannot honour. Called once per room build.
    pub fn validate(&self) -> Result<(), RoomError> {
        for (name, size) in [
            ("size", self.size),
            ("hitbox", self.hitbox),
            ("crouch_hitbox", self.crouch_hitbox),
        ] {
            if size[0] <= 0 || size[1] <= 0 {
                return Err(invalid(name, format!("must be positive, got {:?}", size)));
            }
        }
        if self.crouch_hitbox[1] > self.hitbox[1] {
            return Err(invalid("crouch_hitbox", "must not be taller than hitbox".to_owned()));
        }

        for (name, value) in [
            ("dash_max", self.dash_max),
            ("dash_buffer_max", self.dash_buffer_max),
            ("jump_hold_max", self.jump_hold_max),
            ("coyote_max", self.coyote_max),
            ("jump_buffer_max", self.jump_buffer_max),
            ("wall_kick_max", self.wall_kick_max),
            ("sticky_wall_max", self.sticky_wall_max),
            ("glide_max", self.glide_max),
        ] {
            if value <= 0.0 {
                return Err(invalid(name, format!("must be positive, got {}", value)));
            }
        }

        let fastest = self
            .terminal_velocity
            .max(self.walk_speed + self.dash_speed)
            .max(self.wall_jump_speed)
            .max(self.jump_speed);
        if self.collision_tolerance as f32 <= fastest {
            return Err(invalid(
                "collision_tolerance",
                format!("must exceed the fastest per-frame speed {}", fastest),
            ));
        }

        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> RoomError {
    RoomError::InvalidSetting { name, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(PlayerSettings::default().validate(), Ok(()));
    }

    #[test]
    fn tolerance_below_terminal_velocity_is_rejected() {
        let settings = PlayerSettings {
            terminal_velocity: 25.0,
            ..default()
        };
        assert!(matches!(
            settings.validate(),
            Err(RoomError::InvalidSetting {
                name: "collision_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let settings = PlayerSettings {
            coyote_max: 0.0,
            ..default()
        };
        assert!(matches!(
            settings.validate(),
            Err(RoomError::InvalidSetting { name: "coyote_max", .. })
        ));
    }
}
