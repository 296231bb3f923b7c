use super::jump::WallJumpState;
use super::{Facing, PlayerSettings};

/// Horizontal speed from input, with no acceleration. A running wall kick overrides the input
/// and is counted down here.
pub fn horizontal_speed(
    left: bool,
    right: bool,
    crouching: bool,
    wall: &mut WallJumpState,
    facing: &mut Facing,
    dt: f32,
    settings: &PlayerSettings,
) -> f32 {
    if wall.kicking(settings) {
        wall.kick_timer = (wall.kick_timer + dt).min(settings.wall_kick_max);
        return settings.wall_kick_speed * wall.kick_direction;
    }

    let input = right as i32 - left as i32;
    if input == 0 {
        return 0.0;
    }
    *facing = Facing::from_sign(input as f32);

    let speed = if crouching {
        settings.crouch_speed
    } else {
        settings.walk_speed
    };
    speed * input as f32
}
