//! A room: the world the player is currently in, and the per-frame loop over it.
//!
//! The room exclusively owns the player, the camera and every tile for the duration of a frame.
//! Each update asks the camera for the scroll using the state the player settled into last
//! frame, updates the player, then shifts the rest of the world by the same scroll.

use std::collections::HashMap;

use bevy::math::{IVec2, Vec2};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, CameraSettings};
use crate::controls::{ControlSource, Controls};
use crate::error::RoomError;
use crate::geometry::PixelRect;
use crate::player::{Facing, Player, PlayerSettings};
use crate::state::{GameSet, GameState};
use crate::tiles::{Spawn, Tile, TileKind, Trigger, TriggerKind};

/// Frame rate every per-frame constant is tuned for.
pub const TARGET_FPS: f32 = 60.0;
/// Longest frame simulated in one step. Longer hitches are slowed down instead of letting bodies
/// move further than the collision tolerance.
pub const MAX_FRAME_RATIO: f32 = 1.5;

pub struct RoomPlugin;

impl Plugin for RoomPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameClock>().add_systems(
            Update,
            (tick_clock, advance_room)
                .chain()
                .in_set(GameSet::Movement)
                .run_if(in_state(GameState::Playing))
                .run_if(resource_exists::<ActiveRoom>),
        );
    }
}

/// Elapsed time as a ratio of the reference frame, plus a frame-rate estimate.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    pub dt: f32,
    pub fps: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            dt: 1.0,
            fps: 0.0,
        }
    }
}

impl FrameClock {
    pub fn from_delta(delta_secs: f32) -> Self {
        Self {
            dt: frame_ratio(delta_secs),
            fps: if delta_secs > 0.0 {
                1.0 / delta_secs
            } else {
                0.0
            },
        }
    }
}

/// `delta_secs` expressed in reference frames. A zero delta (first frame) counts as one frame.
pub fn frame_ratio(delta_secs: f32) -> f32 {
    if delta_secs <= 0.0 {
        return 1.0;
    }
    (delta_secs * TARGET_FPS).min(MAX_FRAME_RATIO)
}

/// Level-format independent description of a room. Positions are room pixels, top-left origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    pub name: String,
    pub size: [i32; 2],
    pub tiles: Vec<TileData>,
    pub spawns: Vec<SpawnData>,
    pub triggers: Vec<TriggerData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    pub kind: TileKind,
    pub position: [i32; 2],
    pub size: [i32; 2],
    /// Collision shape relative to the tile's corner, when it differs from the art.
    #[serde(default)]
    pub hitbox: Option<PixelRect>,
    #[serde(default = "full_parallax")]
    pub parallax: [f32; 2],
}

fn full_parallax() -> [f32; 2] {
    [1.0, 1.0]
}

impl TileData {
    pub fn new(kind: TileKind, position: [i32; 2], size: [i32; 2]) -> Self {
        Self {
            kind,
            position,
            size,
            hitbox: None,
            parallax: full_parallax(),
        }
    }

    fn build(&self) -> Tile {
        let position = IVec2::from(self.position);
        let size = IVec2::from(self.size);
        let tile = match self.hitbox {
            Some(hitbox) => Tile::with_hitbox(self.kind, position, size, hitbox),
            None => Tile::new(self.kind, position, size),
        };
        tile.with_parallax(Vec2::from(self.parallax))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnData {
    pub name: String,
    /// Where the player's feet go.
    pub position: [i32; 2],
    pub facing: Facing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerAction {
    /// Load the room named by the trigger.
    Transition,
    /// Load the room named by the trigger while interact is held.
    Door,
    /// Make the named spawn the respawn point.
    Checkpoint { spawn: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerData {
    pub name: String,
    pub rect: PixelRect,
    pub action: TriggerAction,
}

#[derive(Debug, Clone)]
pub struct Room {
    name: String,
    size: IVec2,
    decorations: Vec<Tile>,
    solids: Vec<Tile>,
    hazards: Vec<Tile>,
    spawns: HashMap<String, Spawn>,
    triggers: Vec<Trigger>,
    /// Where a respawn puts the player. Starts at the entry spawn, moved by checkpoints.
    player_spawn: Spawn,
    player: Player,
    camera: Camera,
    interact: bool,
}

impl Room {
    /// Builds the room and enters it at the spawn named `entry`; for transitions that is the name
    /// of the room being left. The camera snaps onto the player before the first frame.
    pub fn new(
        data: &RoomData,
        entry: &str,
        screen: IVec2,
        player_settings: PlayerSettings,
        camera_settings: CameraSettings,
        dt: f32,
        fps: f32,
    ) -> Result<Self, RoomError> {
        player_settings.validate()?;

        let mut decorations = Vec::new();
        let mut solids = Vec::new();
        let mut hazards = Vec::new();
        for tile in &data.tiles {
            let built = tile.build();
            match tile.kind {
                TileKind::Decoration => decorations.push(built),
                TileKind::Solid => solids.push(built),
                TileKind::Hazard => hazards.push(built),
            }
        }
        if solids.is_empty() {
            warn!("room '{}' has nothing to collide with", data.name);
        }

        let spawns: HashMap<String, Spawn> = data
            .spawns
            .iter()
            .map(|spawn| {
                (
                    spawn.name.clone(),
                    Spawn::new(spawn.name.clone(), IVec2::from(spawn.position), spawn.facing),
                )
            })
            .collect();

        let triggers = data
            .triggers
            .iter()
            .map(|trigger| {
                let kind = match &trigger.action {
                    TriggerAction::Transition => TriggerKind::Transition,
                    TriggerAction::Door => TriggerKind::Door,
                    TriggerAction::Checkpoint { spawn } => TriggerKind::Checkpoint(
                        spawns
                            .get(spawn)
                            .cloned()
                            .ok_or_else(|| RoomError::MissingSpawn(spawn.clone()))?,
                    ),
                };
                Ok::<_, RoomError>(Trigger::new(trigger.name.clone(), trigger.rect, kind))
            })
            .collect::<Result<Vec<_>, RoomError>>()?;

        let player_spawn = spawns
            .get(entry)
            .cloned()
            .ok_or_else(|| RoomError::MissingSpawn(entry.to_owned()))?;
        let player = Player::new(&player_spawn, player_settings);

        let size = IVec2::from(data.size);
        let mut camera = Camera::new(screen, size, camera_settings);
        camera.focus(true);

        let mut room = Self {
            name: data.name.clone(),
            size,
            decorations,
            solids,
            hazards,
            spawns,
            triggers,
            player_spawn,
            player,
            camera,
            interact: false,
        };

        let scroll = room
            .camera
            .get_scroll(dt, fps, &room.player.follow_target(), 0.0);
        room.camera.focus(false);
        room.player.apply_scroll(scroll);
        room.scroll_world(scroll);

        info!(
            "entered room '{}' ({}x{}) at spawn '{}' ({} solid, {} hazard, {} trigger)",
            room.name,
            room.size.x,
            room.size.y,
            entry,
            room.solids.len(),
            room.hazards.len(),
            room.triggers.len()
        );
        Ok(room)
    }

    /// One frame.
    pub fn update(&mut self, dt: f32, fps: f32, controls: &impl ControlSource) {
        let scroll = self.camera.get_scroll(
            dt,
            fps,
            &self.player.follow_target(),
            controls.look(),
        );
        self.camera.focus(false);
        self.interact = controls.interact();

        if self.player.get_respawn() {
            info!("respawning at '{}'", self.player_spawn.name);
            self.player.respawn(&self.player_spawn);
            self.camera.focus(true);
        }
        self.update_checkpoint();

        self.player.update(dt, controls, &self.solids, scroll);
        self.scroll_world(scroll);

        if self
            .hazards
            .iter()
            .any(|hazard| hazard.hitbox().overlaps(self.player.hitbox()))
        {
            debug!("player touched a hazard");
            self.player.invoke_respawn();
        }
    }

    fn update_checkpoint(&mut self) {
        let hitbox = self.player.hitbox();
        let reached = self
            .triggers
            .iter()
            .filter(|trigger| trigger.hitbox.overlaps(hitbox))
            .find_map(Trigger::checkpoint_spawn);

        if let Some(spawn) = reached {
            if spawn.name != self.player_spawn.name {
                info!("checkpoint '{}' reached", spawn.name);
                self.player_spawn = spawn.clone();
            }
        }
    }

    fn scroll_world(&mut self, scroll: IVec2) {
        for tile in self
            .decorations
            .iter_mut()
            .chain(self.solids.iter_mut())
            .chain(self.hazards.iter_mut())
        {
            tile.apply_scroll(scroll);
        }
        for spawn in self.spawns.values_mut() {
            spawn.apply_scroll(scroll);
        }
        for trigger in &mut self.triggers {
            trigger.apply_scroll(scroll);
        }
        self.player_spawn.apply_scroll(scroll);
    }

    /// Name of the room the player is leaving for, if a transition trigger is being touched.
    /// Doors only count while interact was held this frame.
    pub fn room_transition(&self) -> Option<&str> {
        self.triggers
            .iter()
            .filter(|trigger| trigger.hitbox.overlaps(self.player.hitbox()))
            .find_map(|trigger| match trigger.kind {
                TriggerKind::Transition => Some(trigger.name.as_str()),
                TriggerKind::Door if self.interact => Some(trigger.name.as_str()),
                _ => None,
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Every tile, back to front.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.decorations
            .iter()
            .chain(self.solids.iter())
            .chain(self.hazards.iter())
    }

    #[cfg(test)]
    pub fn respawn_point(&self) -> &Spawn {
        &self.player_spawn
    }
}

/// The room being played.
#[derive(Resource, Deref, DerefMut)]
pub struct ActiveRoom(pub Room);

fn tick_clock(time: Res<Time>, mut clock: ResMut<FrameClock>) {
    *clock = FrameClock::from_delta(time.delta_seconds());
}

fn advance_room(clock: Res<FrameClock>, controls: Res<Controls>, mut room: ResMut<ActiveRoom>) {
    room.update(clock.dt, clock.fps, &*controls);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: IVec2 = IVec2::new(416, 240);
    const FLOOR_Y: i32 = 464;

    fn room_data() -> RoomData {
        RoomData {
            name: "cellar".to_owned(),
            size: [832, 480],
            tiles: vec![
                TileData::new(TileKind::Solid, [0, FLOOR_Y], [832, 16]),
                TileData {
                    hitbox: Some(PixelRect::new(0, 8, 16, 8)),
                    ..TileData::new(TileKind::Hazard, [300, FLOOR_Y - 16], [16, 16])
                },
                TileData::new(TileKind::Decoration, [40, 40], [16, 16]),
            ],
            spawns: vec![
                SpawnData {
                    name: "start".to_owned(),
                    position: [100, FLOOR_Y],
                    facing: Facing::Right,
                },
                SpawnData {
                    name: "cp".to_owned(),
                    position: [220, FLOOR_Y],
                    facing: Facing::Left,
                },
            ],
            triggers: vec![
                TriggerData {
                    name: "cp".to_owned(),
                    rect: PixelRect::new(200, 400, 40, 64),
                    action: TriggerAction::Checkpoint {
                        spawn: "cp".to_owned(),
                    },
                },
                TriggerData {
                    name: "attic".to_owned(),
                    rect: PixelRect::new(80, 420, 40, 44),
                    action: TriggerAction::Door,
                },
                TriggerData {
                    name: "garden".to_owned(),
                    rect: PixelRect::new(816, 0, 16, 480),
                    action: TriggerAction::Transition,
                },
            ],
        }
    }

    fn build(data: &RoomData, entry: &str) -> Result<Room, RoomError> {
        Room::new(
            data,
            entry,
            SCREEN,
            PlayerSettings::default(),
            CameraSettings::default(),
            1.0,
            60.0,
        )
    }

    fn walk_right() -> Controls {
        Controls {
            right: true,
            ..Controls::default()
        }
    }

    #[test]
    fn frame_ratio_is_clamped() {
        assert_eq!(frame_ratio(0.0), 1.0);
        assert!((frame_ratio(1.0 / 60.0) - 1.0).abs() < 1e-5);
        assert!((frame_ratio(1.0 / 120.0) - 0.5).abs() < 1e-5);
        assert_eq!(frame_ratio(1.0), MAX_FRAME_RATIO);
        assert_eq!(FrameClock::from_delta(0.0).fps, 0.0);
    }

    #[test]
    fn entry_snaps_camera_and_clamps_to_room() {
        let room = build(&room_data(), "start").unwrap();
        // Pushed as far down as the room allows; the left edge stays put.
        assert_eq!(*room.camera().room_rect(), PixelRect::new(0, -240, 832, 480));
        assert_eq!(room.player().hitbox().midbottom(), IVec2::new(100, FLOOR_Y - 240));
        assert_eq!(room.respawn_point().position, IVec2::new(100, FLOOR_Y - 240));
        assert!(room
            .camera()
            .room_rect()
            .contains_rect(&room.camera().screen_rect()));
    }

    #[test]
    fn unknown_entry_is_a_missing_spawn() {
        assert_eq!(
            build(&room_data(), "nowhere").unwrap_err(),
            RoomError::MissingSpawn("nowhere".to_owned())
        );
    }

    #[test]
    fn checkpoint_needs_a_real_spawn() {
        let mut data = room_data();
        data.triggers[0].action = TriggerAction::Checkpoint {
            spawn: "ghost".to_owned(),
        };
        assert_eq!(
            build(&data, "start").unwrap_err(),
            RoomError::MissingSpawn("ghost".to_owned())
        );
    }

    #[test]
    fn invalid_settings_refuse_to_build() {
        let settings = PlayerSettings {
            collision_tolerance: 5,
            ..PlayerSettings::default()
        };
        let result = Room::new(
            &room_data(),
            "start",
            SCREEN,
            settings,
            CameraSettings::default(),
            1.0,
            60.0,
        );
        assert!(matches!(result, Err(RoomError::InvalidSetting { .. })));
    }

    #[test]
    fn hazard_sends_player_back_to_last_checkpoint() {
        let mut room = build(&room_data(), "start").unwrap();

        let mut touched = false;
        for _ in 0..200 {
            room.update(1.0, 60.0, &walk_right());
            if room.player().get_respawn() {
                touched = true;
                break;
            }
        }
        assert!(touched);
        assert_eq!(room.respawn_point().name, "cp");

        room.update(1.0, 60.0, &Controls::default());
        assert!(!room.player().get_respawn());
        assert_eq!(
            room.player().hitbox().midbottom(),
            room.respawn_point().position
        );
        assert_eq!(room.player().facing(), Facing::Left);
        assert!(room.camera().is_focused());

        room.update(1.0, 60.0, &Controls::default());
        assert!(!room.camera().is_focused());
    }

    #[test]
    fn world_and_player_scroll_together() {
        let mut room = build(&room_data(), "start").unwrap();
        for _ in 0..120 {
            room.update(1.0, 60.0, &walk_right());
            let floor_top = room
                .tiles()
                .find(|tile| tile.kind() == TileKind::Solid)
                .map(|tile| tile.hitbox().top());
            assert_eq!(Some(room.player().hitbox().bottom()), floor_top);
            assert!(room
                .camera()
                .room_rect()
                .contains_rect(&room.camera().screen_rect()));
            if room.player().get_respawn() {
                break;
            }
        }
    }

    #[test]
    fn door_needs_interact() {
        let mut room = build(&room_data(), "start").unwrap();
        room.update(1.0, 60.0, &Controls::default());
        assert_eq!(room.room_transition(), None);

        let interact = Controls {
            interact: true,
            ..Controls::default()
        };
        room.update(1.0, 60.0, &interact);
        assert_eq!(room.room_transition(), Some("attic"));
    }

    #[test]
    fn transition_trigger_fires_on_contact() {
        let mut data = room_data();
        data.triggers.push(TriggerData {
            name: "well".to_owned(),
            rect: PixelRect::new(90, 440, 20, 24),
            action: TriggerAction::Transition,
        });
        let mut room = build(&data, "start").unwrap();
        room.update(1.0, 60.0, &Controls::default());
        assert_eq!(room.room_transition(), Some("well"));
    }

    #[test]
    fn room_data_loads_from_json() {
        let json = r#"{
            "name": "tiny",
            "size": [416, 240],
            "tiles": [{ "kind": "Solid", "position": [0, 224], "size": [416, 16] }],
            "spawns": [{ "name": "in", "position": [50, 224], "facing": "Left" }],
            "triggers": []
        }"#;
        let data: RoomData = serde_json::from_str(json).unwrap();
        assert_eq!(data.tiles[0].parallax, [1.0, 1.0]);
        assert!(build(&data, "in").is_ok());
    }

    #[test]
    fn room_plugin_only_advances_while_playing() {
        use bevy::state::app::StatesPlugin;
        use bevy::time::TimeUpdateStrategy;
        use std::time::Duration;

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
                1.0 / TARGET_FPS,
            )))
            .init_state::<GameState>()
            .init_resource::<Controls>()
            .insert_resource(ActiveRoom(build(&room_data(), "start").unwrap()))
            .add_plugins(RoomPlugin);

        let start = *app.world().resource::<ActiveRoom>().player().hitbox();
        for _ in 0..3 {
            app.update();
        }
        let room = app.world().resource::<ActiveRoom>();
        assert_eq!(*room.player().hitbox(), start);
        assert!(!room.player().on_ground());
        assert_eq!(*app.world().resource::<FrameClock>(), FrameClock::default());

        app.world_mut()
            .resource_mut::<NextState<GameState>>()
            .set(GameState::Playing);
        app.update();
        app.update();

        let room = app.world().resource::<ActiveRoom>();
        assert!(room.player().on_ground());
        assert!(app.world().resource::<FrameClock>().fps > 0.0);
    }
}
