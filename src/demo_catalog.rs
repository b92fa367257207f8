//! Built-in catalogs used when no catalog file is given.
//!
//! Both catalogs are symmetric: whenever `b` may sit in direction `d` of
//! `a`, `a` may sit in the opposite direction of `b`. With a symmetric
//! catalog every finished grid is adjacency-valid in both directions.

use wfc_core::{AdjacencyCatalog, CatalogEntry, Direction, TileId};

pub const WATER: TileId = 0;
pub const SAND: TileId = 1;
pub const GRASS: TileId = 2;
pub const FOREST: TileId = 3;

pub const AIR: TileId = 0;
pub const GROUND: TileId = 1;
pub const STONE: TileId = 2;

/// Water, sand, grass and forest; each band only touches its neighbors.
pub fn coastline() -> AdjacencyCatalog {
    let bands: [(&str, f64, &[TileId]); 4] = [
        ("water", 3.0, &[WATER, SAND]),
        ("sand", 1.0, &[WATER, SAND, GRASS]),
        ("grass", 3.0, &[SAND, GRASS, FOREST]),
        ("forest", 2.0, &[GRASS, FOREST]),
    ];

    AdjacencyCatalog::new(
        bands
            .iter()
            .map(|(name, weight, touches)| CatalogEntry::new(*name, *weight).allow_all(touches))
            .collect(),
    )
}

/// Air, ground and stone. Stone is never directly under air.
pub fn terrain() -> AdjacencyCatalog {
    const ANY: &[TileId] = &[AIR, GROUND, STONE];

    let air = CatalogEntry::new("air", 4.0).allow_all(ANY);
    let air = with_vertical(air, &[AIR], &[AIR, GROUND]);

    let ground = CatalogEntry::new("ground", 2.0).allow_all(ANY);
    let ground = with_vertical(ground, &[AIR, GROUND, STONE], &[GROUND, STONE]);

    let stone = CatalogEntry::new("stone", 1.0).allow_all(ANY);
    let stone = with_vertical(stone, &[GROUND, STONE], &[GROUND, STONE]);

    AdjacencyCatalog::new(vec![air, ground, stone])
        .with_air(AIR)
        .with_default(GROUND)
}

fn with_vertical(mut entry: CatalogEntry, up: &[TileId], down: &[TileId]) -> CatalogEntry {
    *entry.neighbors.get_mut(Direction::Up) = up.iter().copied().collect();
    *entry.neighbors.get_mut(Direction::Down) = down.iter().copied().collect();
    entry
}

/// Display colors, indexed by tile id.
pub fn coastline_palette() -> Vec<[u8; 4]> {
    vec![
        [38, 92, 166, 255],
        [222, 203, 140, 255],
        [96, 168, 72, 255],
        [34, 96, 48, 255],
    ]
}

/// Display colors, indexed by tile id. Air is never drawn.
pub fn terrain_palette() -> Vec<[u8; 4]> {
    vec![
        [0, 0, 0, 0],
        [120, 92, 60, 255],
        [128, 128, 136, 255],
    ]
}
