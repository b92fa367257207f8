//! Adjacency catalog: the static tile definitions shared by every cell.
//!
//! Each entry carries a content handle (opaque to the solver), a weight, and
//! the set of tile ids allowed next to it in each direction. Tile ids are the
//! dense indices `0..len()` into the catalog.
//!
//! Rules are read from the placed tile's side: `allowed_neighbors(a, East)`
//! lists what may sit east of `a`. Symmetry (a allows b to its east, so b
//! allows a to its west) is an authoring convention, not enforced here; an
//! asymmetric catalog simply narrows from one side only.
//!
//! # Example
//!
//! ```ignore
//! use wfc_core::{AdjacencyCatalog, CatalogEntry, Direction};
//!
//! let catalog = AdjacencyCatalog::new(vec![
//!     CatalogEntry::new("water", 1.0).allow_all(&[0, 1]),
//!     CatalogEntry::new("sand", 0.5).allow_all(&[0, 1]),
//! ]);
//! assert!(catalog.allowed_neighbors(0, Direction::East).contains(&1));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::direction::Direction;
use crate::error::CatalogError;

/// Dense index of a catalog entry.
pub type TileId = usize;

static NO_NEIGHBORS: BTreeSet<TileId> = BTreeSet::new();

/// Allowed neighbor ids per direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neighbors {
    pub north: BTreeSet<TileId>,
    pub east: BTreeSet<TileId>,
    pub south: BTreeSet<TileId>,
    pub west: BTreeSet<TileId>,
    pub up: BTreeSet<TileId>,
    pub down: BTreeSet<TileId>,
}

impl Neighbors {
    pub fn get(&self, direction: Direction) -> &BTreeSet<TileId> {
        match direction {
            Direction::North => &self.north,
            Direction::East => &self.east,
            Direction::South => &self.south,
            Direction::West => &self.west,
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut BTreeSet<TileId> {
        match direction {
            Direction::North => &mut self.north,
            Direction::East => &mut self.east,
            Direction::South => &mut self.south,
            Direction::West => &mut self.west,
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        }
    }
}

/// One authored tile definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Opaque handle an external instantiator maps to content
    pub content: String,
    /// Relative draw weight; non-positive values are treated as 1.0
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub neighbors: Neighbors,
}

fn default_weight() -> f64 {
    1.0
}

impl CatalogEntry {
    /// Create an entry with no allowed neighbors.
    pub fn new(content: impl Into<String>, weight: f64) -> Self {
        Self {
            content: content.into(),
            weight,
            neighbors: Neighbors::default(),
        }
    }

    /// Allow `ids` next to this tile in `direction`.
    pub fn allow(mut self, direction: Direction, ids: &[TileId]) -> Self {
        self.neighbors.get_mut(direction).extend(ids.iter().copied());
        self
    }

    /// Allow `ids` next to this tile in every direction.
    pub fn allow_all(mut self, ids: &[TileId]) -> Self {
        for dir in Direction::ALL {
            self.neighbors.get_mut(dir).extend(ids.iter().copied());
        }
        self
    }
}

/// Read-only tile catalog plus optional sentinel ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyCatalog {
    pub entries: Vec<CatalogEntry>,
    /// Tile used to pre-fill ground terrain before collapse
    #[serde(default)]
    pub default_tile: Option<TileId>,
    /// Empty-space tile, elided from volumetric output
    #[serde(default)]
    pub air_tile: Option<TileId>,
}

impl AdjacencyCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            default_tile: None,
            air_tile: None,
        }
    }

    pub fn with_default(mut self, tile: TileId) -> Self {
        self.default_tile = Some(tile);
        self
    }

    pub fn with_air(mut self, tile: TileId) -> Self {
        self.air_tile = Some(tile);
        self
    }

    /// Number of tile definitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, tile: TileId) -> Option<&CatalogEntry> {
        self.entries.get(tile)
    }

    /// Ids allowed next to `tile` in `direction`, seen from `tile`.
    ///
    /// Unknown ids allow nothing.
    pub fn allowed_neighbors(&self, tile: TileId, direction: Direction) -> &BTreeSet<TileId> {
        self.entries
            .get(tile)
            .map(|entry| entry.neighbors.get(direction))
            .unwrap_or(&NO_NEIGHBORS)
    }

    /// Check that every referenced id exists.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let len = self.entries.len();
        for (tile, entry) in self.entries.iter().enumerate() {
            for dir in Direction::ALL {
                if let Some(&neighbor) = entry.neighbors.get(dir).iter().find(|&&n| n >= len) {
                    return Err(CatalogError::UnknownNeighbor {
                        tile,
                        direction: dir.name(),
                        neighbor,
                    });
                }
            }
        }

        for (name, sentinel) in [("default", self.default_tile), ("air", self.air_tile)] {
            if let Some(tile) = sentinel {
                if tile >= len {
                    return Err(CatalogError::UnknownSentinel { name, tile });
                }
            }
        }

        Ok(())
    }
}
