//! Spatial queries against the procedural obstacle field
//!
//! Trees are treated as circles centred on their tile. A position with a
//! collision radius is valid when no tree within a small tile window overlaps it.

use glam::Vec2;

use super::terrain::tile_at;

/// Collision radius of a tree, centred on its tile
pub const OBSTACLE_RADIUS: f32 = 0.75;
/// Tiles scanned on each side of the query point
pub const SCAN_WINDOW: f32 = 2.0;

/// First obstacle blocking a circle, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blocker {
    /// Tile coordinate of the tree
    pub tile: (i32, i32),
    /// How deep the circle overlaps the tree
    pub penetration: f32,
}

/// World-space centre of a tile
#[inline]
pub fn tile_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

/// Find the first tree overlapping a circle at `pos`
pub fn find_blocker(pos: Vec2, radius: f32) -> Option<Blocker> {
    let min_x = (pos.x - SCAN_WINDOW).floor() as i32;
    let max_x = (pos.x + SCAN_WINDOW).ceil() as i32;
    let min_y = (pos.y - SCAN_WINDOW).floor() as i32;
    let max_y = (pos.y + SCAN_WINDOW).ceil() as i32;
    let reach = radius + OBSTACLE_RADIUS;

    for tx in min_x..=max_x {
        for ty in min_y..=max_y {
            if !tile_at(tx, ty).has_tree() {
                continue;
            }
            let center = tile_center(tx, ty);
            let dist = pos.distance(center);
            if dist < reach {
                return Some(Blocker {
                    tile: (tx, ty),
                    penetration: reach - dist,
                });
            }
        }
    }
    None
}

/// Whether a circle of `radius` at `pos` is free of obstacles
#[inline]
pub fn is_position_valid(pos: Vec2, radius: f32) -> bool {
    find_blocker(pos, radius).is_none()
}

/// Move a circle by `delta`, checking each axis on its own so it can slide
/// along obstacles. Returns true if either axis moved.
pub fn slide_move(pos: &mut Vec2, delta: Vec2, radius: f32) -> bool {
    let mut moved = false;
    let next_x = Vec2::new(pos.x + delta.x, pos.y);
    if is_position_valid(next_x, radius) {
        pos.x = next_x.x;
        moved = true;
    }
    let next_y = Vec2::new(pos.x, pos.y + delta.y);
    if is_position_valid(next_y, radius) {
        pos.y = next_y.y;
        moved = true;
    }
    moved
}

/// Whether two circles overlap
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Locate some tree tile by scanning outward from the origin (test helper)
#[cfg(test)]
pub(crate) fn any_tree_near_origin() -> (i32, i32) {
    for r in 0..200i32 {
        for x in -r..=r {
            for y in -r..=r {
                if (x.abs() == r || y.abs() == r) && tile_at(x, y).has_tree() {
                    return (x, y);
                }
            }
        }
    }
    panic!("no tree found near origin");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_center_is_invalid() {
        let (tx, ty) = any_tree_near_origin();
        let center = tile_center(tx, ty);
        assert!(!is_position_valid(center, 0.4));
        let blocker = find_blocker(center, 0.4).unwrap();
        assert!(tile_at(blocker.tile.0, blocker.tile.1).has_tree());
        assert!(blocker.penetration > 0.0);
    }

    #[test]
    fn test_radius_matters() {
        let (tx, ty) = any_tree_near_origin();
        let center = tile_center(tx, ty);
        // Exactly 1.3 tiles away along x: blocked for big circles, clear for small
        let probe = center + Vec2::new(1.3, 0.0);
        let big_blocked = !is_position_valid(probe, 0.8);
        assert!(big_blocked);
        // Small circles may still be blocked by a neighbouring chunk's tree;
        // only assert about this tree
        if let Some(b) = find_blocker(probe, 0.1) {
            assert_ne!(b.tile, (tx, ty));
        }
    }

    #[test]
    fn test_slide_move_blocks_into_tree() {
        let (tx, ty) = any_tree_near_origin();
        let center = tile_center(tx, ty);
        let mut pos = center - Vec2::new(1.2, 0.0);
        if !is_position_valid(pos, 0.4) {
            return; // crowded by another tree; nothing to assert
        }
        let before = pos;
        slide_move(&mut pos, Vec2::new(0.5, 0.0), 0.4);
        assert_eq!(pos.x, before.x, "x step into the tree must be rejected");
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 0.5, Vec2::new(0.9, 0.0), 0.5));
        assert!(!circles_overlap(Vec2::ZERO, 0.5, Vec2::new(1.1, 0.0), 0.5));
    }
}
