//! Chunked Wave Function Collapse solver.
//!
//! This crate provides:
//! - Adjacency catalogs of weighted tiles and their allowed neighbors
//! - Planar (4-neighbor) and volumetric (6-neighbor) grids of Open/Collapsed cells
//! - Chunk partitioning with one shared layer between neighboring chunks
//! - A steppable generator with chunk reset and volumetric backoff
//! - Terrain pre-fill for volumes
//!
//! The crate has no engine dependency beyond `bevy_math` vectors and
//! `bevy_log` macros; scheduling lives in `wfc_runtime`.

pub mod catalog;
pub mod cell;
pub mod chunk;
pub mod config;
pub mod direction;
pub mod error;
pub mod generator;
pub mod grid;
pub mod possibility;
pub mod rng;
pub mod terrain;

#[cfg(test)]
mod scenario_tests;

pub use catalog::{AdjacencyCatalog, CatalogEntry, Neighbors, TileId};
pub use cell::{Cell, CellState};
pub use chunk::{Chunk, ChunkPartitioner};
pub use config::GenerationConfig;
pub use direction::{Dimensionality, Direction};
pub use error::{CatalogError, CollapseError, GenerationError, GenerationResult, GridError};
pub use generator::{generate, GenerationOutput, GenerationStats, Generator, StepEvent};
pub use grid::{Grid, Placement};
pub use possibility::WeightedPossibilitySet;
pub use rng::{StdRandom, TileRng};
pub use terrain::{ElevationSeeder, TerrainSeeder};
