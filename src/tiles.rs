//! Static world geometry: tiles, spawn points and trigger volumes.
//!
//! Everything here is created once when a room is built and afterwards only moves when the
//! camera scroll is applied. Tiles keep a float position next to their integer rects so layers
//! with a parallax factor below one still drift by sub-pixel amounts between frames.

use bevy::math::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::PixelRect;
use crate::player::Facing;

/// What a tile does. Decoration is drawn only, solid tiles block the player, hazards send the
/// player back to the current spawn on contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Decoration,
    Solid,
    Hazard,
}

#[derive(Debug, Clone)]
pub struct Tile {
    kind: TileKind,
    position: Vec2,
    parallax: Vec2,
    rect: PixelRect,
    hitbox_offset: IVec2,
    hitbox: PixelRect,
}

impl Tile {
    /// A tile whose hitbox covers its whole visual rect.
    pub fn new(kind: TileKind, position: IVec2, size: IVec2) -> Self {
        Self::with_hitbox(kind, position, size, PixelRect::new(0, 0, size.x, size.y))
    }

    /// `hitbox` is relative to the tile's top-left corner. Hazard spikes use this to shrink their
    /// collision shape below the art.
    pub fn with_hitbox(kind: TileKind, position: IVec2, size: IVec2, hitbox: PixelRect) -> Self {
        let rect = PixelRect::new(position.x, position.y, size.x, size.y);
        let hitbox_offset = IVec2::new(hitbox.x, hitbox.y);
        Self {
            kind,
            position: position.as_vec2(),
            parallax: Vec2::ONE,
            rect,
            hitbox_offset,
            hitbox: PixelRect::new(
                position.x + hitbox_offset.x,
                position.y + hitbox_offset.y,
                hitbox.width,
                hitbox.height,
            ),
        }
    }

    pub fn with_parallax(mut self, parallax: Vec2) -> Self {
        self.parallax = parallax;
        self
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn rect(&self) -> &PixelRect {
        &self.rect
    }

    pub fn hitbox(&self) -> &PixelRect {
        &self.hitbox
    }

    /// Shifts the tile opposite to the camera scroll, scaled by the layer's parallax factor.
    pub fn apply_scroll(&mut self, scroll: IVec2) {
        self.position -= scroll.as_vec2() * self.parallax;
        // Truncation matches how every other integer position in the core is derived.
        self.rect.x = self.position.x as i32;
        self.rect.y = self.position.y as i32;
        self.hitbox.x = self.rect.x + self.hitbox_offset.x;
        self.hitbox.y = self.rect.y + self.hitbox_offset.y;
    }

    /// Renderers draw a tile only while its visual rect intersects the screen.
    pub fn is_visible(&self, screen: &PixelRect) -> bool {
        self.rect.overlaps(screen)
    }
}

/// A named place the player can appear at, facing a given way.
#[derive(Debug, Clone, PartialEq)]
pub struct Spawn {
    pub name: String,
    pub position: IVec2,
    pub facing: Facing,
}

impl Spawn {
    pub fn new(name: impl Into<String>, position: IVec2, facing: Facing) -> Self {
        Self {
            name: name.into(),
            position,
            facing,
        }
    }

    pub fn apply_scroll(&mut self, scroll: IVec2) {
        self.position -= scroll;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerKind {
    /// Leaving through this volume loads the room named by the trigger.
    Transition,
    /// Like a transition, but only while the interact control is held.
    Door,
    /// Touching it makes the attached spawn the room's respawn point.
    Checkpoint(Spawn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub hitbox: PixelRect,
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn new(name: impl Into<String>, hitbox: PixelRect, kind: TriggerKind) -> Self {
        Self {
            name: name.into(),
            hitbox,
            kind,
        }
    }

    pub fn apply_scroll(&mut self, scroll: IVec2) {
        self.hitbox.translate(-scroll);
        if let TriggerKind::Checkpoint(spawn) = &mut self.kind {
            spawn.apply_scroll(scroll);
        }
    }

    pub fn checkpoint_spawn(&self) -> Option<&Spawn> {
        match &self.kind {
            TriggerKind::Checkpoint(spawn) => Some(spawn),
            _ => None,
        }
    }
}
