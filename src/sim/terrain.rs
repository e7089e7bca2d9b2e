//! Procedural terrain oracle
//!
//! Maps integer tile coordinates to tile properties. Everything here is a pure
//! function of the coordinates: no caches, no RNG state, so any caller may ask
//! about any tile in any order and get bit-identical answers.

use serde::{Deserialize, Serialize};

/// Side length of the square chunks that each hold at most one tree
pub const TREE_CHUNK_SIZE: i32 = 5;
/// Probability threshold a chunk must exceed to actually grow its tree (~35%)
pub const TREE_CHUNK_THRESHOLD: f64 = 0.65;
/// Foliage grows where the per-tile hash exceeds this (~15%)
pub const FOLIAGE_THRESHOLD: f64 = 0.85;
/// Scale of the trig field that carves roads
pub const ROAD_SCALE: f64 = 0.08;
/// Road ribbons are where |field| falls below this
pub const ROAD_THRESHOLD: f64 = 0.15;
/// Scale of the smooth noise that picks road colours per region
pub const ROAD_REGION_SCALE: f64 = 0.02;

/// Road surface palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadColor {
    GreyStone,
    BrownCobble,
    MossyPath,
    DirtRoad,
}

impl RoadColor {
    pub const PALETTE: [RoadColor; 4] = [
        RoadColor::GreyStone,
        RoadColor::BrownCobble,
        RoadColor::MossyPath,
        RoadColor::DirtRoad,
    ];

    /// 0xRRGGBB
    pub fn rgb(&self) -> u32 {
        match self {
            RoadColor::GreyStone => 0x5d5c61,
            RoadColor::BrownCobble => 0x8c7b75,
            RoadColor::MossyPath => 0x556b2f,
            RoadColor::DirtRoad => 0x8b4513,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeVariant {
    Pine,
    Broadleaf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoliageVariant {
    Fern,
    Wheat,
    Mushroom,
    Sprout,
}

impl FoliageVariant {
    const ALL: [FoliageVariant; 4] = [
        FoliageVariant::Fern,
        FoliageVariant::Wheat,
        FoliageVariant::Mushroom,
        FoliageVariant::Sprout,
    ];
}

/// Everything the world knows about one tile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    pub x: i32,
    pub y: i32,
    /// Road surface, if the tile is part of a road
    pub road: Option<RoadColor>,
    /// Blocking obstacle
    pub tree: Option<TreeVariant>,
    /// Non-blocking decoration
    pub foliage: Option<FoliageVariant>,
}

impl TileData {
    #[inline]
    pub fn is_road(&self) -> bool {
        self.road.is_some()
    }

    #[inline]
    pub fn has_tree(&self) -> bool {
        self.tree.is_some()
    }

    #[inline]
    pub fn has_foliage(&self) -> bool {
        self.foliage.is_some()
    }
}

/// Sine-scrambled hash of two reals into [0, 1)
#[inline]
pub fn pseudo_random(x: f64, y: f64) -> f64 {
    let n = ((x + 0.123) * 12.9898 + (y + 0.456) * 78.233).sin() * 43758.5453;
    n - n.floor()
}

/// Bilinear interpolation of hashed lattice corners (smooth, large-scale)
pub fn value_noise(x: f64, y: f64) -> f64 {
    let i = x.floor();
    let j = y.floor();
    let u = x - i;
    let v = y - j;

    let n00 = pseudo_random(i, j);
    let n01 = pseudo_random(i, j + 1.0);
    let n10 = pseudo_random(i + 1.0, j);
    let n11 = pseudo_random(i + 1.0, j + 1.0);

    let nx0 = n00 * (1.0 - u) + n10 * u;
    let nx1 = n01 * (1.0 - u) + n11 * u;
    nx0 * (1.0 - v) + nx1 * v
}

/// Chunk containing a tile (floor division, correct for negatives)
#[inline]
pub fn chunk_of(x: i32, y: i32) -> (i32, i32) {
    (x.div_euclid(TREE_CHUNK_SIZE), y.div_euclid(TREE_CHUNK_SIZE))
}

/// The single tile in a chunk that may hold a tree
pub fn chunk_candidate(chunk_x: i32, chunk_y: i32) -> (i32, i32) {
    let cx = chunk_x as f64;
    let cy = chunk_y as f64;
    let size = TREE_CHUNK_SIZE as f64;
    let offset_x = ((pseudo_random(cx, cy) * size).floor() as i32).min(TREE_CHUNK_SIZE - 1);
    let offset_y =
        ((pseudo_random(cx + 123.0, cy + 456.0) * size).floor() as i32).min(TREE_CHUNK_SIZE - 1);
    (
        chunk_x * TREE_CHUNK_SIZE + offset_x,
        chunk_y * TREE_CHUNK_SIZE + offset_y,
    )
}

/// Whether a chunk's candidate tile grows a tree (before the road check)
#[inline]
pub fn chunk_grows_tree(chunk_x: i32, chunk_y: i32) -> bool {
    pseudo_random(chunk_x as f64 * 0.7, chunk_y as f64 * 1.3) > TREE_CHUNK_THRESHOLD
}

/// Road membership and colour for a tile
pub fn road_at(x: i32, y: i32) -> Option<RoadColor> {
    let fx = x as f64;
    let fy = y as f64;
    let field = (fx * ROAD_SCALE).sin() + (fy * ROAD_SCALE).cos();
    if field.abs() >= ROAD_THRESHOLD {
        return None;
    }

    let region = value_noise(fx * ROAD_REGION_SCALE, fy * ROAD_REGION_SCALE);
    let len = RoadColor::PALETTE.len();
    let idx = ((region * len as f64).floor() as usize).min(len - 1);
    Some(RoadColor::PALETTE[idx])
}

/// Look up a tile
pub fn tile_at(x: i32, y: i32) -> TileData {
    let road = road_at(x, y);

    let (chunk_x, chunk_y) = chunk_of(x, y);
    let is_candidate = chunk_candidate(chunk_x, chunk_y) == (x, y);
    let tree = if is_candidate && road.is_none() && chunk_grows_tree(chunk_x, chunk_y) {
        if pseudo_random(x as f64, y as f64) > 0.5 {
            Some(TreeVariant::Pine)
        } else {
            Some(TreeVariant::Broadleaf)
        }
    } else {
        None
    };

    let foliage = if road.is_none() && tree.is_none() {
        let roll = pseudo_random(x as f64 * 1.5, y as f64 * 1.5);
        if roll > FOLIAGE_THRESHOLD {
            let idx = ((roll * 100.0).floor() as usize) % FoliageVariant::ALL.len();
            Some(FoliageVariant::ALL[idx])
        } else {
            None
        }
    } else {
        None
    };

    TileData {
        x,
        y,
        road,
        tree,
        foliage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pseudo_random_in_unit_range() {
        for x in -50..50 {
            for y in -50..50 {
                let v = pseudo_random(x as f64, y as f64);
                assert!((0.0..1.0).contains(&v), "hash out of range at ({x}, {y}): {v}");
            }
        }
    }

    #[test]
    fn test_roads_exist_and_are_thin() {
        let mut roads = 0;
        let total = 200 * 200;
        for x in -100..100 {
            for y in -100..100 {
                if tile_at(x, y).is_road() {
                    roads += 1;
                }
            }
        }
        assert!(roads > 0, "expected some road tiles");
        assert!(roads < total / 4, "roads should be ribbons, got {roads}/{total}");
    }

    #[test]
    fn test_trees_exist() {
        let trees = (-100..100)
            .flat_map(|x| (-100..100).map(move |y| (x, y)))
            .filter(|&(x, y)| tile_at(x, y).has_tree())
            .count();
        assert!(trees > 0);
    }

    #[test]
    fn test_negative_chunks_use_floor_division() {
        assert_eq!(chunk_of(-1, -1), (-1, -1));
        assert_eq!(chunk_of(-5, 4), (-1, 0));
        assert_eq!(chunk_of(5, -6), (1, -2));
    }

    proptest! {
        #[test]
        fn prop_tile_is_pure(x in -10_000i32..10_000, y in -10_000i32..10_000) {
            let a = tile_at(x, y);
            // Unrelated lookup in between must not perturb anything
            let _ = tile_at(y, x);
            let b = tile_at(x, y);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_at_most_one_tree_per_chunk(cx in -2_000i32..2_000, cy in -2_000i32..2_000) {
            let mut trees = Vec::new();
            for dx in 0..TREE_CHUNK_SIZE {
                for dy in 0..TREE_CHUNK_SIZE {
                    let x = cx * TREE_CHUNK_SIZE + dx;
                    let y = cy * TREE_CHUNK_SIZE + dy;
                    let tile = tile_at(x, y);
                    if tile.has_tree() {
                        prop_assert!(!tile.is_road());
                        prop_assert_eq!((x, y), chunk_candidate(cx, cy));
                        trees.push((x, y));
                    }
                }
            }
            prop_assert!(trees.len() <= 1);
        }

        #[test]
        fn prop_layers_are_exclusive(x in -10_000i32..10_000, y in -10_000i32..10_000) {
            let tile = tile_at(x, y);
            if tile.has_foliage() {
                prop_assert!(!tile.is_road());
                prop_assert!(!tile.has_tree());
            }
        }
    }
}
