//! Plugin composition and system-set ordering.

use bevy::prelude::*;

use crate::camera::CameraPlugin;
use crate::controls::ControlsPlugin;
use crate::level::LevelPlugin;
use crate::render::RenderPlugin;
use crate::room::RoomPlugin;
use crate::state::{pause_on_focus_loss, toggle_pause, GameSet, GameState};
use crate::transition::TransitionPlugin;

/// Everything the game adds on top of Bevy's default plugins.
pub struct TilePlatformerPlugin;

impl Plugin for TilePlatformerPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_plugins((
                LevelPlugin,
                ControlsPlugin,
                RoomPlugin,
                CameraPlugin,
                TransitionPlugin,
                RenderPlugin,
            ))
            // One room update per rendered frame, after input and before anything that draws it.
            .configure_sets(
                Update,
                (GameSet::Input, GameSet::Movement, GameSet::Effects)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(Update, (toggle_pause, pause_on_focus_loss));
    }
}
