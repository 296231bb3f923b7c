//! Sprite sync. The room works in screen pixels with +y down; each frame the sprites are moved to
//! match, in Bevy world space centred on the camera. Tiles outside the screen are hidden.

use bevy::prelude::*;

use crate::geometry::PixelRect;
use crate::player::Status;
use crate::room::ActiveRoom;
use crate::state::{GameSet, GameState};
use crate::tiles::TileKind;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Loading), despawn_room_sprites)
            .add_systems(
                Update,
                (
                    spawn_room_sprites.run_if(not(any_with_component::<RoomSprite>)),
                    sync_room_sprites,
                )
                    .chain()
                    .in_set(GameSet::Effects)
                    .run_if(resource_exists::<ActiveRoom>),
            );
    }
}

/// Every sprite that mirrors room state, despawned together when the room is swapped.
#[derive(Component)]
pub struct RoomSprite;

/// Index into the room's back-to-front tile order.
#[derive(Component, Debug, Clone, Copy)]
pub struct TileSprite(pub usize);

#[derive(Component)]
pub struct PlayerSprite;

const TILE_Z: f32 = 0.0;
const PLAYER_Z: f32 = 10.0;

/// Centre of `rect` in world space for a screen of `screen` pixels.
pub fn pixel_to_world(rect: &PixelRect, screen: IVec2) -> Vec2 {
    Vec2::new(
        rect.x as f32 + rect.width as f32 / 2.0 - screen.x as f32 / 2.0,
        screen.y as f32 / 2.0 - (rect.y as f32 + rect.height as f32 / 2.0),
    )
}

fn tile_color(kind: TileKind) -> Color {
    match kind {
        TileKind::Decoration => Color::srgb(0.18, 0.2, 0.28),
        TileKind::Solid => Color::srgb(0.45, 0.42, 0.38),
        TileKind::Hazard => Color::srgb(0.8, 0.2, 0.2),
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Idle | Status::Run => Color::srgb(0.95, 0.85, 0.4),
        Status::Jump | Status::Fall => Color::srgb(0.95, 0.7, 0.3),
        Status::Dash => Color::srgb(0.4, 0.9, 1.0),
        Status::Glide => Color::srgb(0.7, 0.95, 0.6),
        Status::WallSlide => Color::srgb(0.9, 0.55, 0.9),
        Status::Crouch => Color::srgb(0.85, 0.75, 0.35),
    }
}

fn despawn_room_sprites(mut commands: Commands, sprites: Query<Entity, With<RoomSprite>>) {
    for entity in &sprites {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_room_sprites(mut commands: Commands, room: Res<ActiveRoom>) {
    for (index, tile) in room.tiles().enumerate() {
        let size = tile.rect().size().as_vec2();
        commands.spawn((
            RoomSprite,
            TileSprite(index),
            SpriteBundle {
                sprite: Sprite {
                    color: tile_color(tile.kind()),
                    custom_size: Some(size),
                    ..default()
                },
                transform: Transform::from_xyz(0.0, 0.0, TILE_Z + index as f32 * 0.0001),
                ..default()
            },
        ));
    }

    let size = room.player().rect().size().as_vec2();
    commands.spawn((
        Name::new("Player"),
        RoomSprite,
        PlayerSprite,
        SpriteBundle {
            sprite: Sprite {
                custom_size: Some(size),
                ..default()
            },
            transform: Transform::from_xyz(0.0, 0.0, PLAYER_Z),
            ..default()
        },
    ));
    debug!("spawned sprites for room '{}'", room.name());
}

fn sync_room_sprites(
    room: Res<ActiveRoom>,
    mut tiles: Query<(&TileSprite, &mut Transform, &mut Visibility), Without<PlayerSprite>>,
    mut player: Query<(&mut Transform, &mut Sprite), (With<PlayerSprite>, Without<TileSprite>)>,
) {
    let screen_rect = room.camera().screen_rect();
    let screen = screen_rect.size();
    let all_tiles: Vec<_> = room.tiles().collect();

    for (sprite, mut transform, mut visibility) in &mut tiles {
        let Some(tile) = all_tiles.get(sprite.0) else {
            continue;
        };
        let world = pixel_to_world(tile.rect(), screen);
        transform.translation.x = world.x;
        transform.translation.y = world.y;
        *visibility = if tile.is_visible(&screen_rect) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }

    if let Ok((mut transform, mut sprite)) = player.get_single_mut() {
        let rect = room.player().rect();
        let world = pixel_to_world(rect, screen);
        transform.translation.x = world.x;
        transform.translation.y = world.y;
        sprite.flip_x = room.player().facing().sign() < 0.0;
        sprite.color = status_color(room.player().status());
        sprite.custom_size = Some(rect.size().as_vec2());
    }
}
