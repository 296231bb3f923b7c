//! Axis-separated hitbox resolution against solid tiles.
//!
//! The player moves along x, calls [`Resolver::resolve_x`], then moves along y and calls
//! [`Resolver::resolve_y`]. Each call corrects a single axis. A collision only registers on the
//! side whose penetration is below the tolerance, so the tolerance has to exceed the largest
//! per-frame displacement or fast bodies tunnel through tiles.
//!
//! Both passes try corner correction before stopping the hitbox: when every overlapping tile
//! only clips a thin band at one edge of the hitbox, the hitbox is slid off that band instead.
//! This stops dashes from catching on grid seams and lets jumps round the lip of a ledge.

use bevy::math::IVec2;

use crate::geometry::PixelRect;
use crate::tiles::Tile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HorizontalCollision {
    pub on_wall: bool,
    /// Which side the wall is on. Only meaningful while `on_wall` is set.
    pub wall_right: bool,
    /// Vertical slide applied instead of a wall stop.
    pub corner_nudge: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerticalCollision {
    pub down: bool,
    pub up: bool,
    /// Horizontal slide applied instead of a head bump.
    pub corner_nudge: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolver {
    pub tolerance: i32,
    /// Thickness of the edge band probed for corner correction.
    pub corner_margin: i32,
    /// Extra lift after rounding a ceiling corner.
    pub corner_boost: i32,
    /// Horizontal speed a body needs before x-axis corner correction is considered.
    pub corner_speed: f32,
}

impl Resolver {
    pub fn resolve_x(
        &self,
        hitbox: &mut PixelRect,
        velocity_x: f32,
        tiles: &[Tile],
    ) -> HorizontalCollision {
        let mut collision = HorizontalCollision::default();

        if velocity_x.abs() >= self.corner_speed {
            if let Some(nudge) = self.vertical_nudge(hitbox, tiles) {
                hitbox.y += nudge;
                collision.corner_nudge = nudge;
                return collision;
            }
        }

        for tile in tiles {
            let tile_box = tile.hitbox();
            if !tile_box.overlaps(hitbox) {
                continue;
            }

            if (tile_box.right() - hitbox.left()).abs() < self.tolerance {
                hitbox.set_left(tile_box.right());
                collision.on_wall = true;
                collision.wall_right = false;
                break;
            } else if (tile_box.left() - hitbox.right()).abs() < self.tolerance {
                hitbox.set_right(tile_box.left());
                collision.on_wall = true;
                collision.wall_right = true;
                break;
            }
        }

        collision
    }

    pub fn resolve_y(
        &self,
        hitbox: &mut PixelRect,
        velocity_y: f32,
        tiles: &[Tile],
    ) -> VerticalCollision {
        let mut collision = VerticalCollision::default();

        for tile in tiles {
            let tile_box = tile.hitbox();
            if !tile_box.overlaps(hitbox) {
                continue;
            }

            if (tile_box.top() - hitbox.bottom()).abs() < self.tolerance {
                hitbox.set_bottom(tile_box.top());
                collision.down = true;
                break;
            } else if (tile_box.bottom() - hitbox.top()).abs() < self.tolerance {
                if velocity_y < 0.0 {
                    if let Some(nudge) = self.horizontal_nudge(hitbox, tiles) {
                        hitbox.x += nudge;
                        let lifted = hitbox.offset(IVec2::new(0, -self.corner_boost));
                        if !is_blocked(&lifted, tiles) {
                            *hitbox = lifted;
                        }
                        collision.corner_nudge = nudge;
                        break;
                    }
                }
                hitbox.set_top(tile_box.bottom());
                collision.up = true;
                break;
            }
        }

        collision
    }

    /// Offset along y that frees the hitbox when every overlapping tile only clips its top or
    /// its bottom band. All overlapping tiles are scanned before anything is decided.
    fn vertical_nudge(&self, hitbox: &PixelRect, tiles: &[Tile]) -> Option<i32> {
        let nudge = edge_nudge(tiles, hitbox, self.corner_margin, |tile_box| {
            (
                tile_box.bottom() - hitbox.top(),
                hitbox.bottom() - tile_box.top(),
            )
        })?;
        let moved = hitbox.offset(IVec2::new(0, nudge));
        (!is_blocked(&moved, tiles)).then_some(nudge)
    }

    /// Same as [`Self::vertical_nudge`] for the left/right bands, used on head bumps.
    fn horizontal_nudge(&self, hitbox: &PixelRect, tiles: &[Tile]) -> Option<i32> {
        let nudge = edge_nudge(tiles, hitbox, self.corner_margin, |tile_box| {
            (
                tile_box.right() - hitbox.left(),
                hitbox.right() - tile_box.left(),
            )
        })?;
        let moved = hitbox.offset(IVec2::new(nudge, 0));
        (!is_blocked(&moved, tiles)).then_some(nudge)
    }
}

/// `clips` returns how deep a tile reaches past the near edge and past the far edge. A clip on
/// the near edge pushes the hitbox forward (+), a clip on the far edge pushes it back (-).
fn edge_nudge(
    tiles: &[Tile],
    hitbox: &PixelRect,
    margin: i32,
    clips: impl Fn(&PixelRect) -> (i32, i32),
) -> Option<i32> {
    let mut nudge: i32 = 0;

    for tile in tiles {
        let tile_box = tile.hitbox();
        if !tile_box.overlaps(hitbox) {
            continue;
        }

        let (near, far) = clips(tile_box);
        let step = if near <= margin {
            near
        } else if far <= margin {
            -far
        } else {
            return None;
        };

        if nudge != 0 && step.signum() != nudge.signum() {
            return None;
        }
        if step.abs() > nudge.abs() {
            nudge = step;
        }
    }

    (nudge != 0).then_some(nudge)
}

/// True if `rect` overlaps any tile hitbox.
pub fn is_blocked(rect: &PixelRect, tiles: &[Tile]) -> bool {
    tiles.iter().any(|tile| tile.hitbox().overlaps(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileKind;

    const RESOLVER: Resolver = Resolver {
        tolerance: 20,
        corner_margin: 4,
        corner_boost: 2,
        corner_speed: 4.0,
    };

    fn solid(x: i32, y: i32) -> Tile {
        Tile::new(TileKind::Solid, IVec2::new(x, y), IVec2::splat(16))
    }

    #[test]
    fn no_tiles_means_no_correction() {
        let mut hitbox = PixelRect::new(10, 10, 12, 22);
        let x = RESOLVER.resolve_x(&mut hitbox, 6.5, &[]);
        let y = RESOLVER.resolve_y(&mut hitbox, -3.0, &[]);
        assert_eq!(x, HorizontalCollision::default());
        assert_eq!(y, VerticalCollision::default());
        assert_eq!(hitbox, PixelRect::new(10, 10, 12, 22));
    }

    #[test]
    fn landing_snaps_to_tile_top() {
        let tiles = [solid(0, 100)];
        let mut hitbox = PixelRect::new(2, 81, 12, 22);
        let hit = RESOLVER.resolve_y(&mut hitbox, 3.0, &tiles);
        assert!(hit.down);
        assert!(!hit.up);
        assert_eq!(hitbox.bottom(), 100);
    }

    #[test]
    fn wall_on_the_right_is_reported() {
        let tiles = [solid(100, 64), solid(100, 80)];
        let mut hitbox = PixelRect::new(91, 70, 12, 22);
        let hit = RESOLVER.resolve_x(&mut hitbox, 2.5, &tiles);
        assert!(hit.on_wall);
        assert!(hit.wall_right);
        assert_eq!(hitbox.right(), 100);

        let mut hitbox = PixelRect::new(114, 70, 12, 22);
        let hit = RESOLVER.resolve_x(&mut hitbox, -2.5, &tiles);
        assert!(hit.on_wall);
        assert!(!hit.wall_right);
        assert_eq!(hitbox.left(), 116);
    }

    #[test]
    fn first_qualifying_tile_wins() {
        // Two tiles at different depths: only the first in iteration order is applied.
        let tiles = [solid(100, 70), solid(98, 86)];
        let mut hitbox = PixelRect::new(92, 70, 12, 22);
        RESOLVER.resolve_x(&mut hitbox, 2.5, &tiles);
        assert_eq!(hitbox.right(), 100);
    }

    #[test]
    fn slow_walk_into_ledge_lip_stays_blocked() {
        // A ledge whose top sits 3px above the hitbox bottom.
        let tiles = [solid(100, 89)];
        let mut hitbox = PixelRect::new(90, 70, 12, 22);
        let hit = RESOLVER.resolve_x(&mut hitbox, 2.5, &tiles);
        assert!(hit.on_wall);
        assert_eq!(hit.corner_nudge, 0);
        assert_eq!(hitbox, PixelRect::new(88, 70, 12, 22));
    }

    #[test]
    fn dash_speed_slides_over_ledge_lip() {
        let tiles = [solid(100, 89)];
        let mut hitbox = PixelRect::new(90, 70, 12, 22);
        let hit = RESOLVER.resolve_x(&mut hitbox, 6.5, &tiles);
        assert!(!hit.on_wall);
        assert_eq!(hit.corner_nudge, -3);
        assert_eq!(hitbox, PixelRect::new(90, 67, 12, 22));
    }

    #[test]
    fn dash_into_full_wall_is_not_corrected() {
        let tiles = [solid(100, 64), solid(100, 80)];
        let mut hitbox = PixelRect::new(93, 70, 12, 22);
        let hit = RESOLVER.resolve_x(&mut hitbox, 8.0, &tiles);
        assert!(hit.on_wall);
        assert_eq!(hit.corner_nudge, 0);
    }

    #[test]
    fn corner_nudge_rejected_when_destination_is_blocked() {
        // Lip at the bottom, but the tile above leaves no room to slide up into.
        let tiles = [solid(100, 89), solid(84, 52)];
        let mut hitbox = PixelRect::new(90, 70, 12, 22);
        let hit = RESOLVER.resolve_x(&mut hitbox, 6.5, &tiles);
        assert_eq!(hit.corner_nudge, 0);
        assert!(hit.on_wall);
    }

    #[test]
    fn head_bump_stops_upward_motion() {
        let tiles = [solid(96, 40)];
        let mut hitbox = PixelRect::new(98, 53, 12, 22);
        let hit = RESOLVER.resolve_y(&mut hitbox, -4.0, &tiles);
        assert!(hit.up);
        assert_eq!(hitbox.top(), 56);
    }

    #[test]
    fn head_bump_on_corner_slides_past_the_ledge() {
        // Only the rightmost 2px of the hitbox clip the tile above.
        let tiles = [solid(108, 40)];
        let mut hitbox = PixelRect::new(98, 53, 12, 22);
        let hit = RESOLVER.resolve_y(&mut hitbox, -4.0, &tiles);
        assert!(!hit.up);
        assert_eq!(hit.corner_nudge, -2);
        assert_eq!(hitbox, PixelRect::new(96, 51, 12, 22));
    }

    #[test]
    fn falling_into_corner_never_uses_ceiling_correction() {
        let tiles = [solid(108, 40)];
        let mut hitbox = PixelRect::new(98, 53, 12, 22);
        let hit = RESOLVER.resolve_y(&mut hitbox, 0.0, &tiles);
        assert!(hit.up);
        assert_eq!(hit.corner_nudge, 0);
    }
}
