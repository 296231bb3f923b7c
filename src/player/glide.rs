//! Glide: caps the fall speed while the button is held on the way down.
//!
//! A press anywhere in the air arms the glide; the cap only bites once the player is falling, so a
//! press on the way up carries through the apex.

use super::{Contacts, PlayerSettings};
use crate::controls::ButtonLatch;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlideState {
    pub latch: ButtonLatch,
    /// Armed by a press in the air, cleared on release, contact or exhaustion.
    pub gliding: bool,
    /// Frames spent gliding since the last ground or wall contact. Releasing does not rewind it.
    pub timer: f32,
}

impl GlideState {
    pub fn cancel(&mut self) {
        self.gliding = false;
    }

    pub fn exhausted(&self, settings: &PlayerSettings) -> bool {
        self.timer >= settings.glide_max
    }
}

/// Advances the glide one frame and returns whether the glide terminal velocity applies.
/// `velocity_y` is the vertical velocity before gravity, positive when falling.
pub fn update_glide(
    state: &mut GlideState,
    held: bool,
    contacts: &Contacts,
    velocity_y: f32,
    dt: f32,
    settings: &PlayerSettings,
) -> bool {
    if contacts.on_ground || contacts.on_wall {
        state.timer = 0.0;
        state.gliding = false;
    }

    let pressed = state.latch.update(held);
    if !held {
        state.gliding = false;
    }
    if pressed && !contacts.on_ground && !state.exhausted(settings) {
        state.gliding = true;
    }

    if state.gliding && state.exhausted(settings) {
        state.gliding = false;
    }

    let capping = state.gliding && velocity_y > 0.0;
    if capping {
        state.timer = (state.timer + dt).min(settings.glide_max);
    }
    capping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_while_rising_glides_after_the_apex() {
        let settings = PlayerSettings::default();
        let mut state = GlideState::default();
        let air = Contacts::default();

        assert!(!update_glide(&mut state, true, &air, -2.0, 1.0, &settings));
        assert!(state.gliding);
        assert_eq!(state.timer, 0.0);
        assert!(!update_glide(&mut state, true, &air, 0.0, 1.0, &settings));
        assert!(update_glide(&mut state, true, &air, 1.0, 1.0, &settings));
        assert_eq!(state.timer, 1.0);
    }

    #[test]
    fn holding_through_a_landing_needs_a_fresh_press() {
        let settings = PlayerSettings::default();
        let mut state = GlideState::default();
        let air = Contacts::default();
        let ground = Contacts {
            on_ground: true,
            ..Contacts::default()
        };

        // Held across ground contact: no new edge, no glide.
        update_glide(&mut state, true, &ground, 0.0, 1.0, &settings);
        assert!(!update_glide(&mut state, true, &air, 1.0, 1.0, &settings));
        update_glide(&mut state, false, &air, 1.0, 1.0, &settings);
        assert!(update_glide(&mut state, true, &air, 1.0, 1.0, &settings));
    }

    #[test]
    fn repress_resumes_without_new_time() {
        let settings = PlayerSettings::default();
        let mut state = GlideState::default();
        let air = Contacts::default();

        for _ in 0..50 {
            update_glide(&mut state, true, &air, 2.0, 1.0, &settings);
        }
        update_glide(&mut state, false, &air, 2.0, 1.0, &settings);
        assert_eq!(state.timer, 50.0);

        let mut frames = 0;
        for _ in 0..200 {
            if update_glide(&mut state, true, &air, 2.0, 1.0, &settings) {
                frames += 1;
            }
        }
        assert_eq!(frames, 70);
    }

    #[test]
    fn exhausted_glide_waits_for_ground() {
        let settings = PlayerSettings::default();
        let mut state = GlideState {
            timer: settings.glide_max,
            ..GlideState::default()
        };
        let air = Contacts::default();
        assert!(!update_glide(&mut state, true, &air, 2.0, 1.0, &settings));

        let ground = Contacts {
            on_ground: true,
            ..Contacts::default()
        };
        update_glide(&mut state, false, &ground, 0.0, 1.0, &settings);
        assert_eq!(state.timer, 0.0);
        assert!(update_glide(&mut state, true, &air, 2.0, 1.0, &settings));
    }
}
