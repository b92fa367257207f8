//! Terrain pre-fill for volumetric runs.
//!
//! Before chunked collapse starts, every cell of a volume is committed to a
//! sentinel tile. Those cells are not free variables: they are the seeds
//! that the first chunks narrow against, and each chunk overwrites its own
//! share when it is generated.

use bevy_math::UVec3;

use crate::catalog::{AdjacencyCatalog, TileId};
use crate::error::GenerationError;

/// Picks the pre-fill tile for a position.
pub trait TerrainSeeder: Send + Sync {
    fn seed_tile(&self, position: UVec3) -> TileId;
}

/// Ground layer at `y == 0` with the default tile, air everywhere above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElevationSeeder {
    pub ground: TileId,
    pub air: TileId,
}

impl ElevationSeeder {
    /// Build from the catalog's default and air sentinels.
    pub fn from_catalog(catalog: &AdjacencyCatalog) -> Result<Self, GenerationError> {
        let ground = catalog
            .default_tile
            .ok_or(GenerationError::MissingSentinel("default"))?;
        let air = catalog
            .air_tile
            .ok_or(GenerationError::MissingSentinel("air"))?;
        Ok(Self { ground, air })
    }
}

impl TerrainSeeder for ElevationSeeder {
    fn seed_tile(&self, position: UVec3) -> TileId {
        if position.y > 0 {
            self.air
        } else {
            self.ground
        }
    }
}
