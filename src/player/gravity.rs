//! Vertical integration and the fall timer the camera reads.

use super::{Contacts, PlayerSettings};

/// The most restrictive cap that currently applies.
pub fn terminal_velocity(contacts: &Contacts, gliding: bool, settings: &PlayerSettings) -> f32 {
    let mut terminal = settings.terminal_velocity;
    if contacts.on_wall && !contacts.on_ground {
        terminal = terminal.min(settings.wall_terminal_velocity);
    }
    if gliding {
        terminal = terminal.min(settings.glide_terminal_velocity);
    }
    terminal
}

/// Returns next frame's vertical velocity. On the ground the velocity is pinned to a small push
/// into the floor, pre-divided by `dt` so the push is the same number of pixels at any rate.
pub fn integrate(
    velocity_y: f32,
    contacts: &Contacts,
    gliding: bool,
    dt: f32,
    settings: &PlayerSettings,
) -> f32 {
    if contacts.on_ground {
        return settings.ground_clamp / dt;
    }

    let gravity = if velocity_y < 0.0 {
        settings.gravity
    } else {
        settings.fall_gravity
    };
    (velocity_y + gravity * dt).min(terminal_velocity(contacts, gliding, settings))
}

/// Counts frames spent descending in the air. Landing or moving up resets it.
pub fn update_fall_timer(timer: f32, velocity_y: f32, on_ground: bool, dt: f32) -> f32 {
    if on_ground || velocity_y <= 0.0 {
        0.0
    } else {
        timer + dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_velocity_is_clamped_not_zero() {
        let settings = PlayerSettings::default();
        let ground = Contacts {
            on_ground: true,
            ..Contacts::default()
        };
        assert_eq!(integrate(7.0, &ground, false, 1.0, &settings), 1.0);
        assert_eq!(integrate(7.0, &ground, false, 0.5, &settings), 2.0);
    }

    #[test]
    fn rising_uses_the_lighter_gravity() {
        let settings = PlayerSettings::default();
        let air = Contacts::default();
        assert_eq!(integrate(-5.0, &air, false, 1.0, &settings), -4.6);
        assert_eq!(integrate(1.0, &air, false, 1.0, &settings), 2.0);
    }

    #[test]
    fn tightest_terminal_wins() {
        let settings = PlayerSettings::default();
        let air = Contacts::default();
        assert_eq!(integrate(9.5, &air, false, 1.0, &settings), 10.0);
        assert_eq!(integrate(9.5, &air, true, 1.0, &settings), 2.0);

        let sliding = Contacts {
            on_wall: true,
            ..Contacts::default()
        };
        assert_eq!(terminal_velocity(&sliding, false, &settings), 2.0);

        let custom = PlayerSettings {
            wall_terminal_velocity: 3.0,
            glide_terminal_velocity: 1.5,
            ..PlayerSettings::default()
        };
        assert_eq!(terminal_velocity(&sliding, true, &custom), 1.5);
    }

    #[test]
    fn fall_timer_resets_on_ground_and_rise() {
        assert_eq!(update_fall_timer(3.0, 2.0, false, 1.0), 4.0);
        assert_eq!(update_fall_timer(3.0, 2.0, true, 1.0), 0.0);
        assert_eq!(update_fall_timer(3.0, -1.0, false, 1.0), 0.0);
    }
}
