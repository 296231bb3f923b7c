//! Camera controller. Nothing in the world ever moves the camera: the controller computes how far
//! the world has to shift this frame so the player stays framed, and every entity applies that
//! scroll to itself. The Bevy camera only carries the zoom.

use bevy::math::{IVec2, Vec2};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use serde::{Deserialize, Serialize};

use crate::geometry::PixelRect;
use crate::player::Facing;
use crate::room::ActiveRoom;
use crate::state::{GameSet, GameState};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    zoom_keys.in_set(GameSet::Input),
                    apply_zoom.in_set(GameSet::Effects),
                )
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

/// Framing and smoothing constants. Lerp values divide the distance to the target, so larger
/// values trail further behind.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub norm_lerp: f32,
    pub fall_lerp_min: f32,
    pub fall_lerp_step: f32,
    pub dash_lerp: f32,
    /// Frames of falling before the view starts leading downward.
    pub fall_min_time: f32,
    pub fall_offset_step: f32,
    pub fall_offset_max: f32,
    pub facing_offset: f32,
    pub walking_offset: f32,
    pub look_distance: f32,
    pub look_delay: f32,
    pub look_dead_zone: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            norm_lerp: 15.0,
            fall_lerp_min: 8.0,
            fall_lerp_step: 0.5,
            dash_lerp: 8.0,
            fall_min_time: 60.0,
            fall_offset_step: 6.0,
            fall_offset_max: 100.0,
            facing_offset: 25.0,
            walking_offset: 35.0,
            look_distance: 100.0,
            look_delay: 20.0,
            look_dead_zone: 0.5,
        }
    }
}

/// The parts of the player's settled state the camera frames by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    pub center: IVec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub on_ground: bool,
    pub dashing: bool,
    pub fall_timer: f32,
}

#[derive(Debug, Clone)]
pub struct Camera {
    settings: CameraSettings,
    screen: IVec2,
    /// Room bounds in screen space, shifted by every scroll handed out so far.
    room_rect: PixelRect,
    target: Vec2,
    lerp: Vec2,
    fall_offset: f32,
    look_timer: f32,
    focus: bool,
    zoom: f32,
}

impl Camera {
    pub fn new(screen: IVec2, room_size: IVec2, settings: CameraSettings) -> Self {
        Self {
            screen,
            room_rect: PixelRect::new(0, 0, room_size.x, room_size.y),
            target: Vec2::ZERO,
            lerp: Vec2::new(settings.norm_lerp, settings.norm_lerp),
            fall_offset: 0.0,
            look_timer: 0.0,
            focus: false,
            zoom: 1.0,
            settings,
        }
    }

    /// While set, the next scrolls snap straight onto the target.
    pub fn focus(&mut self, focus: bool) {
        self.focus = focus;
    }

    #[cfg(test)]
    pub fn is_focused(&self) -> bool {
        self.focus
    }

    /// Scroll for this frame. Must be called once per frame and the result applied to every
    /// world entity, or the shadow room rect drifts from the real one.
    pub fn get_scroll(&mut self, dt: f32, fps: f32, player: &FollowTarget, look: f32) -> IVec2 {
        // A clock that has not warmed up yet reports nonsense rates.
        let dt = if fps < 1.0 { 1.0 } else { dt };

        self.update_target(player, look, dt);
        self.update_lerp(player, dt);

        let offset = self.target - self.screen.as_vec2() / 2.0;
        let raw = if self.focus {
            offset
        } else {
            offset / self.lerp * dt
        };

        let scroll = self.clamp(raw.round().as_ivec2());
        self.room_rect.translate(-scroll);
        trace!("camera scroll {:?}", scroll);
        scroll
    }

    fn update_target(&mut self, player: &FollowTarget, look: f32, dt: f32) {
        let settings = &self.settings;
        let mut target = player.center.as_vec2();

        if player.velocity.x == 0.0 {
            target.x += player.facing.sign() * settings.facing_offset;
        } else {
            target.x += player.velocity.x.signum() * settings.walking_offset;
        }

        if !player.on_ground && player.fall_timer > settings.fall_min_time {
            self.fall_offset = (self.fall_offset + settings.fall_offset_step * dt)
                .min(settings.fall_offset_max);
        } else {
            self.fall_offset = 0.0;
        }
        target.y += self.fall_offset;

        if player.on_ground && look.abs() > settings.look_dead_zone {
            self.look_timer += dt;
            if self.look_timer >= settings.look_delay {
                target.y += look.signum() * settings.look_distance;
            }
        } else {
            self.look_timer = 0.0;
        }

        self.target = target;
    }

    fn update_lerp(&mut self, player: &FollowTarget, dt: f32) {
        let settings = &self.settings;
        if player.on_ground {
            self.lerp.y = settings.norm_lerp;
        } else if player.velocity.y > 0.0 {
            self.lerp.y = (self.lerp.y - settings.fall_lerp_step * dt).max(settings.fall_lerp_min);
        }

        self.lerp.x = if player.dashing {
            settings.dash_lerp
        } else {
            settings.norm_lerp
        };
    }

    /// Keeps the screen inside the room. A room smaller than the screen along an axis is centred.
    fn clamp(&self, scroll: IVec2) -> IVec2 {
        let room = &self.room_rect;
        IVec2::new(
            clamp_axis(scroll.x, room.left(), room.right(), self.screen.x),
            clamp_axis(scroll.y, room.top(), room.bottom(), self.screen.y),
        )
    }

    /// Raises the zoom by `delta`; it never drops below native resolution.
    pub fn change_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).max(1.0);
    }

    /// Zoom factor and the pixel offset that keeps the zoom centred on the screen.
    pub fn get_zoom(&self) -> (f32, Vec2) {
        let screen = self.screen.as_vec2();
        (self.zoom, (screen * self.zoom - screen) / 2.0)
    }

    pub fn room_rect(&self) -> &PixelRect {
        &self.room_rect
    }

    pub fn screen_rect(&self) -> PixelRect {
        PixelRect::new(0, 0, self.screen.x, self.screen.y)
    }

    #[cfg(test)]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    #[cfg(test)]
    pub fn lerp(&self) -> Vec2 {
        self.lerp
    }
}

fn clamp_axis(scroll: i32, room_start: i32, room_end: i32, screen: i32) -> i32 {
    let length = room_end - room_start;
    if length <= screen {
        room_start - (screen - length) / 2
    } else {
        scroll.clamp(room_start, room_end - screen)
    }
}

/// Marker for the one 2D camera the zoom is applied to.
#[derive(Component)]
pub struct FollowCamera;

fn setup_camera(mut commands: Commands) {
    commands.spawn((Name::new("MainCamera"), Camera2dBundle::default(), FollowCamera));
}

const ZOOM_STEP: f32 = 0.25;

fn zoom_keys(keyboard: Res<ButtonInput<KeyCode>>, room: Option<ResMut<ActiveRoom>>) {
    let Some(mut room) = room else {
        return;
    };
    if keyboard.just_pressed(KeyCode::Equal) {
        room.camera_mut().change_zoom(ZOOM_STEP);
    }
    if keyboard.just_pressed(KeyCode::Minus) {
        room.camera_mut().change_zoom(-ZOOM_STEP);
    }
}

/// Fits the room's screen surface into the window, then applies the controller's zoom.
fn apply_zoom(
    room: Option<Res<ActiveRoom>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut OrthographicProjection, With<FollowCamera>>,
) {
    let (Some(room), Ok(window)) = (room, windows.get_single()) else {
        return;
    };
    let Ok(mut projection) = cameras.get_single_mut() else {
        return;
    };

    let window_size = window.resolution.size();
    if window_size.x <= 0.0 || window_size.y <= 0.0 {
        return;
    }
    let screen = room.camera().screen_rect().size().as_vec2();
    let fit = (screen.x / window_size.x).max(screen.y / window_size.y);
    let (zoom, _offset) = room.camera().get_zoom();
    let scale = (fit / zoom).max(0.0001);
    if projection.scale != scale {
        projection.scale = scale;
    }
}
