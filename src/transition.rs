//! Room-to-room transitions. When the active room reports a destination the screen fades to black,
//! the destination is requested from the level loader at the darkest point, and the fade lifts
//! once the new room is playing. The new room is entered at the spawn named after the room left.

use bevy::prelude::*;

use crate::level::RoomRequest;
use crate::room::ActiveRoom;
use crate::state::{GameSet, GameState};

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TransitionState>()
            .add_systems(Startup, spawn_fade_overlay)
            .add_systems(
                Update,
                poll_room_exit
                    .in_set(GameSet::Effects)
                    .run_if(resource_exists::<ActiveRoom>),
            )
            .add_systems(Update, (advance_fade, update_fade_overlay).chain());
    }
}

/// Progress of the current fade. `fade_timer` runs in seconds over `fade_duration`, the room is
/// swapped at the halfway mark.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TransitionState {
    pub is_transitioning: bool,
    pub fade_timer: f32,
    pub fade_duration: f32,
    pub pending: Option<RoomRequest>,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            is_transitioning: false,
            fade_timer: 0.0,
            fade_duration: 0.6,
            pending: None,
        }
    }
}

impl TransitionState {
    pub fn start(&mut self, request: RoomRequest) {
        self.is_transitioning = true;
        self.fade_timer = 0.0;
        self.pending = Some(request);
    }

    pub fn reset(&mut self) {
        self.is_transitioning = false;
        self.fade_timer = 0.0;
        self.pending = None;
    }

    /// 0.0 is clear, 1.0 fully black.
    pub fn fade_alpha(&self) -> f32 {
        if !self.is_transitioning {
            return 0.0;
        }
        let half = self.fade_duration * 0.5;
        if self.fade_timer < half {
            self.fade_timer / half
        } else {
            (1.0 - (self.fade_timer - half) / half).max(0.0)
        }
    }

    /// Advances the fade. Returns the request once, on the frame the midpoint is crossed.
    pub fn tick(&mut self, delta: f32) -> Option<RoomRequest> {
        if !self.is_transitioning {
            return None;
        }
        let half = self.fade_duration * 0.5;
        let before = self.fade_timer;
        self.fade_timer += delta;

        let swap = if before < half && self.fade_timer >= half {
            self.pending.take()
        } else {
            None
        };
        if self.fade_timer >= self.fade_duration {
            self.reset();
        }
        swap
    }
}

#[derive(Component)]
pub struct FadeOverlay;

fn spawn_fade_overlay(mut commands: Commands) {
    commands.spawn((
        FadeOverlay,
        Name::new("FadeOverlay"),
        SpriteBundle {
            sprite: Sprite {
                color: Color::srgba(0.0, 0.0, 0.0, 0.0),
                custom_size: Some(Vec2::splat(10000.0)),
                ..default()
            },
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, 100.0)),
            ..default()
        },
    ));
}

fn update_fade_overlay(
    transition: Res<TransitionState>,
    mut overlays: Query<&mut Sprite, With<FadeOverlay>>,
) {
    if !transition.is_changed() {
        return;
    }
    for mut sprite in &mut overlays {
        sprite.color = Color::srgba(0.0, 0.0, 0.0, transition.fade_alpha());
    }
}

fn poll_room_exit(room: Res<ActiveRoom>, mut transition: ResMut<TransitionState>) {
    if transition.is_transitioning {
        return;
    }
    if let Some(destination) = room.room_transition() {
        info!("leaving room '{}' for '{}'", room.name(), destination);
        transition.start(RoomRequest {
            room: destination.to_owned(),
            entry: room.name().to_owned(),
        });
    }
}

/// The fade keeps running while the next room loads; the swap itself freezes the old room by
/// leaving `Playing`.
fn advance_fade(
    time: Res<Time>,
    mut transition: ResMut<TransitionState>,
    mut request: ResMut<RoomRequest>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !transition.is_transitioning {
        return;
    }
    if let Some(next) = transition.tick(time.delta_seconds()) {
        *request = next;
        next_state.set(GameState::Loading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RoomRequest {
        RoomRequest {
            room: "garden".to_owned(),
            entry: "cellar".to_owned(),
        }
    }

    #[test]
    fn swap_happens_once_at_the_midpoint() {
        let mut state = TransitionState::default();
        state.start(request());

        assert_eq!(state.tick(0.2), None);
        assert!(state.fade_alpha() > 0.5);
        assert_eq!(state.tick(0.2), Some(request()));
        assert_eq!(state.tick(0.1), None);
        assert!(state.is_transitioning);

        assert_eq!(state.tick(0.2), None);
        assert!(!state.is_transitioning);
        assert_eq!(state.fade_alpha(), 0.0);
    }

    #[test]
    fn idle_state_never_swaps() {
        let mut state = TransitionState::default();
        assert_eq!(state.tick(5.0), None);
        assert_eq!(state.fade_alpha(), 0.0);
    }
}
