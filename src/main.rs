//! Entry point: window setup and the game plugin.

mod app;
mod camera;
mod collision;
mod controls;
mod error;
mod geometry;
mod level;
mod player;
mod render;
mod room;
mod state;
mod tiles;
mod transition;

use app::TilePlatformerPlugin;
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};

fn main() {
    // Three times the 416x240 screen surface, so pixels stay square at the default size.
    let primary_window = Window {
        title: "Tile Platformer".to_string(),
        resolution: WindowResolution::new(1248.0, 720.0),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: 416.0,
            min_height: 240.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        ..default()
    };

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(primary_window),
                    ..default()
                })
                .set(ImagePlugin::default_nearest())
                .set(AssetPlugin {
                    file_path: "assets".to_owned(),
                    ..default()
                }),
        )
        .add_plugins(TilePlatformerPlugin)
        .run();
}
