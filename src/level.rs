//! LDtk level loading: reads the project once, converts the requested level into `RoomData` and
//! builds the active room from it.
//!
//! Layer identifiers decide what a layer becomes. `collideable` layers are solid, `hazards` layers
//! hurt, anything containing `background` or `foreground` is decoration. Entity layers carry
//! `Spawn`, `SpawnTrigger`, `Trigger` and `Door` entities.

use bevy::asset::LoadState;
use bevy::math::IVec2;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_ecs_ldtk::ldtk::{
    Definitions, EntityInstance, FieldValue, LayerInstance, Level, TileInstance,
};
use bevy_ecs_ldtk::prelude::*;

use crate::camera::CameraSettings;
use crate::error::RoomError;
use crate::geometry::PixelRect;
use crate::player::{Facing, PlayerSettings};
use crate::room::{
    ActiveRoom, FrameClock, Room, RoomData, SpawnData, TileData, TriggerAction, TriggerData,
};
use crate::state::GameState;
use crate::tiles::TileKind;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(LevelConfig::default())
            .init_resource::<LevelAssets>()
            .init_resource::<RoomRequest>()
            .init_resource::<PlayerSettings>()
            .add_plugins(LdtkPlugin)
            .add_systems(Startup, (request_start_room, log_screen_fit))
            .add_systems(OnEnter(GameState::Loading), load_project)
            .add_systems(
                Update,
                build_requested_room.run_if(in_state(GameState::Loading)),
            );
    }
}

/// Which project to load and where the game starts. The screen surface is the part of the room
/// visible at zoom 1, in tiles.
#[derive(Resource, Clone, Debug)]
pub struct LevelConfig {
    pub project_path: String,
    pub start_room: String,
    /// Spawn the player enters the first room at.
    pub entry_spawn: String,
    pub tile_size: i32,
    pub screen_tiles: IVec2,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            project_path: "levels/world.ldtk".to_owned(),
            start_room: "Level_0".to_owned(),
            entry_spawn: "start".to_owned(),
            tile_size: 16,
            screen_tiles: IVec2::new(26, 15),
        }
    }
}

impl LevelConfig {
    pub fn screen_size(&self) -> IVec2 {
        self.screen_tiles * self.tile_size
    }
}

#[derive(Resource, Default)]
pub struct LevelAssets {
    pub project: Option<Handle<LdtkProject>>,
    /// Set when the last build failed so it is not retried every frame.
    pub failed: bool,
}

/// The room to build next and the spawn to enter it at.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomRequest {
    pub room: String,
    pub entry: String,
}

fn request_start_room(config: Res<LevelConfig>, mut request: ResMut<RoomRequest>) {
    *request = RoomRequest {
        room: config.start_room.clone(),
        entry: config.entry_spawn.clone(),
    };
}

fn load_project(
    asset_server: Res<AssetServer>,
    config: Res<LevelConfig>,
    mut level_assets: ResMut<LevelAssets>,
) {
    if level_assets.project.is_none() {
        info!("loading level project '{}'", config.project_path);
        level_assets.project = Some(asset_server.load(config.project_path.clone()));
    }
    level_assets.failed = false;
}

#[allow(clippy::too_many_arguments)]
fn build_requested_room(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    projects: Res<Assets<LdtkProject>>,
    config: Res<LevelConfig>,
    request: Res<RoomRequest>,
    player_settings: Res<PlayerSettings>,
    camera_settings: Res<CameraSettings>,
    time: Res<Time>,
    mut level_assets: ResMut<LevelAssets>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if level_assets.failed {
        return;
    }
    let Some(handle) = level_assets.project.as_ref() else {
        return;
    };

    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => {}
        Some(LoadState::Failed(_)) => {
            error!("unable to load level project '{}'", config.project_path);
            level_assets.failed = true;
            return;
        }
        _ => return,
    }
    let Some(project) = projects.get(handle) else {
        return;
    };

    let clock = FrameClock::from_delta(time.delta_seconds());
    let room = find_level(project, &request.room)
        .and_then(|level| room_data_from_level(level, &project.json_data().defs))
        .and_then(|data| {
            Room::new(
                &data,
                &request.entry,
                config.screen_size(),
                player_settings.clone(),
                camera_settings.clone(),
                clock.dt,
                clock.fps,
            )
        });

    match room {
        Ok(room) => {
            commands.insert_resource(ActiveRoom(room));
            next_state.set(GameState::Playing);
        }
        Err(err) => {
            error!("could not build room '{}': {}", request.room, err);
            level_assets.failed = true;
        }
    }
}

fn find_level<'a>(project: &'a LdtkProject, identifier: &str) -> Result<&'a Level, RoomError> {
    project
        .json_data()
        .levels
        .iter()
        .find(|level| level.identifier == identifier)
        .ok_or_else(|| RoomError::UnknownRoom(identifier.to_owned()))
}

/// What a layer contributes to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Tiles(TileKind),
    Objects,
}

pub fn layer_role(identifier: &str) -> Result<LayerRole, RoomError> {
    let name = identifier.to_lowercase();
    let role = match name.as_str() {
        "collideable" => LayerRole::Tiles(TileKind::Solid),
        "hazards" => LayerRole::Tiles(TileKind::Hazard),
        "spawns" | "transitions" | "entities" => LayerRole::Objects,
        _ if name.contains("background") || name.contains("foreground") => {
            LayerRole::Tiles(TileKind::Decoration)
        }
        _ => return Err(RoomError::UnknownLayer(identifier.to_owned())),
    };
    Ok(role)
}

/// Converts one LDtk level. LDtk lists layers top-most first, rooms want them back to front.
pub fn room_data_from_level(level: &Level, defs: &Definitions) -> Result<RoomData, RoomError> {
    let mut data = RoomData {
        name: level.identifier.clone(),
        size: [level.px_wid, level.px_hei],
        tiles: Vec::new(),
        spawns: Vec::new(),
        triggers: Vec::new(),
    };

    let layers = level.layer_instances.as_deref().unwrap_or_default();
    for layer in layers.iter().rev() {
        match layer_role(&layer.identifier)? {
            LayerRole::Tiles(kind) => add_tile_layer(&mut data, layer, kind, defs),
            LayerRole::Objects => {
                for entity in &layer.entity_instances {
                    add_entity(&mut data, &layer.identifier, entity)?;
                }
            }
        }
    }

    debug!(
        "converted level '{}': {} tiles, {} spawns, {} triggers",
        data.name,
        data.tiles.len(),
        data.spawns.len(),
        data.triggers.len()
    );
    Ok(data)
}

fn add_tile_layer(data: &mut RoomData, layer: &LayerInstance, kind: TileKind, defs: &Definitions) {
    let grid = layer.grid_size;
    let parallax = defs
        .layers
        .iter()
        .find(|def| def.uid == layer.layer_def_uid)
        .map(|def| ldtk_parallax(def.parallax_factor_x, def.parallax_factor_y))
        .unwrap_or([1.0, 1.0]);
    let custom_data = layer.tileset_def_uid.and_then(|uid| {
        defs.tilesets
            .iter()
            .find(|tileset| tileset.uid == uid)
            .map(|tileset| &tileset.custom_data)
    });

    let painted: Vec<&TileInstance> = layer
        .grid_tiles
        .iter()
        .chain(layer.auto_layer_tiles.iter())
        .collect();

    if painted.is_empty() {
        // Pure IntGrid layers have no tiles, only cells.
        for cell in int_grid_cells(&layer.int_grid_csv, layer.c_wid, grid) {
            data.tiles.push(TileData {
                parallax,
                ..TileData::new(kind, cell, [grid, grid])
            });
        }
        return;
    }

    for tile in painted {
        let hitbox = if kind == TileKind::Hazard {
            custom_data.and_then(|entries| {
                entries
                    .iter()
                    .find(|entry| entry.tile_id == tile.t)
                    .and_then(|entry| parse_hitbox(&entry.data))
            })
        } else {
            None
        };
        data.tiles.push(TileData {
            hitbox,
            parallax,
            ..TileData::new(kind, [tile.px.x, tile.px.y], [grid, grid])
        });
    }
}

/// LDtk's factor is how much a layer lags behind (0 moves with the world); a tile's parallax is
/// how much of the scroll it follows.
fn ldtk_parallax(factor_x: f32, factor_y: f32) -> [f32; 2] {
    [1.0 - factor_x, 1.0 - factor_y]
}

/// Top-left corners of every non-empty IntGrid cell.
pub fn int_grid_cells(csv: &[i32], columns: i32, grid: i32) -> Vec<[i32; 2]> {
    if columns <= 0 {
        return Vec::new();
    }
    csv.iter()
        .enumerate()
        .filter(|(_, value)| **value != 0)
        .map(|(index, _)| {
            let index = index as i32;
            [(index % columns) * grid, (index / columns) * grid]
        })
        .collect()
}

/// Reads a `hitbox=x,y,w,h` line from a tile's custom data.
pub fn parse_hitbox(custom: &str) -> Option<PixelRect> {
    let values = custom
        .lines()
        .find_map(|line| line.trim().strip_prefix("hitbox="))?;
    let parts = values
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, width, height] if *width > 0 && *height > 0 => {
            Some(PixelRect::new(*x, *y, *width, *height))
        }
        _ => None,
    }
}

fn entity_rect(entity: &EntityInstance) -> PixelRect {
    let size = IVec2::new(entity.width, entity.height);
    let corner = entity.px.as_vec2() - entity.pivot * size.as_vec2();
    PixelRect::new(corner.x.round() as i32, corner.y.round() as i32, size.x, size.y)
}

fn string_field(entity: &EntityInstance, field: &str) -> Option<String> {
    entity
        .field_instances
        .iter()
        .find(|instance| instance.identifier == field)
        .and_then(|instance| match &instance.value {
            FieldValue::String(value) | FieldValue::Enum(value) => value.clone(),
            _ => None,
        })
}

fn required_field(entity: &EntityInstance, layer: &str, field: &str) -> Result<String, RoomError> {
    string_field(entity, field).ok_or_else(|| RoomError::UnknownObject {
        layer: layer.to_owned(),
        identifier: format!("{} without '{}'", entity.identifier, field),
    })
}

pub fn parse_facing(value: Option<&str>) -> Facing {
    match value.map(str::to_lowercase).as_deref() {
        Some("left") => Facing::Left,
        _ => Facing::Right,
    }
}

fn add_entity(data: &mut RoomData, layer: &str, entity: &EntityInstance) -> Result<(), RoomError> {
    let rect = entity_rect(entity);
    match entity.identifier.as_str() {
        "Spawn" => {
            let feet = rect.midbottom();
            data.spawns.push(SpawnData {
                name: required_field(entity, layer, "name")?,
                position: [feet.x, feet.y],
                facing: parse_facing(string_field(entity, "player_facing").as_deref()),
            });
        }
        "SpawnTrigger" => data.triggers.push(TriggerData {
            name: required_field(entity, layer, "name")?,
            rect,
            action: TriggerAction::Checkpoint {
                spawn: required_field(entity, layer, "trigger_spawn")?,
            },
        }),
        "Trigger" => data.triggers.push(TriggerData {
            name: required_field(entity, layer, "name")?,
            rect,
            action: TriggerAction::Transition,
        }),
        "Door" => data.triggers.push(TriggerData {
            name: required_field(entity, layer, "name")?,
            rect,
            action: TriggerAction::Door,
        }),
        other => {
            return Err(RoomError::UnknownObject {
                layer: layer.to_owned(),
                identifier: other.to_owned(),
            })
        }
    }
    Ok(())
}

/// Logs how large the screen surface is drawn in the window.
fn log_screen_fit(config: Res<LevelConfig>, windows: Query<&Window, With<PrimaryWindow>>) {
    if let Ok(window) = windows.get_single() {
        let screen = config.screen_size().as_vec2();
        let size = window.resolution.size();
        info!(
            "screen surface {}x{} shown at {:.2}x",
            screen.x,
            screen.y,
            (size.x / screen.x).min(size.y / screen.y)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_map_by_identifier() {
        assert_eq!(
            layer_role("Collideable"),
            Ok(LayerRole::Tiles(TileKind::Solid))
        );
        assert_eq!(layer_role("hazards"), Ok(LayerRole::Tiles(TileKind::Hazard)));
        assert_eq!(
            layer_role("far_background_2"),
            Ok(LayerRole::Tiles(TileKind::Decoration))
        );
        assert_eq!(layer_role("Spawns"), Ok(LayerRole::Objects));
        assert_eq!(
            layer_role("water"),
            Err(RoomError::UnknownLayer("water".to_owned()))
        );
    }

    #[test]
    fn int_grid_cells_skip_empty_values() {
        let csv = [0, 1, 0, 2, 0, 1];
        assert_eq!(int_grid_cells(&csv, 3, 16), vec![[16, 0], [0, 16], [32, 16]]);
        assert!(int_grid_cells(&csv, 0, 16).is_empty());
    }

    #[test]
    fn hitbox_custom_data() {
        assert_eq!(
            parse_hitbox("kind=spike\nhitbox=2, 10, 12, 6"),
            Some(PixelRect::new(2, 10, 12, 6))
        );
        assert_eq!(parse_hitbox("hitbox=2,10,12"), None);
        assert_eq!(parse_hitbox("hitbox=0,0,0,6"), None);
        assert_eq!(parse_hitbox("nothing here"), None);
    }

    #[test]
    fn facing_defaults_to_right() {
        assert_eq!(parse_facing(Some("Left")), Facing::Left);
        assert_eq!(parse_facing(Some("right")), Facing::Right);
        assert_eq!(parse_facing(None), Facing::Right);
    }

    #[test]
    fn parallax_follows_ldtk_factor() {
        assert_eq!(ldtk_parallax(0.0, 0.0), [1.0, 1.0]);
        assert_eq!(ldtk_parallax(0.5, 0.25), [0.5, 0.75]);
    }

    #[test]
    fn screen_is_measured_in_tiles() {
        assert_eq!(LevelConfig::default().screen_size(), IVec2::new(416, 240));
    }
}
