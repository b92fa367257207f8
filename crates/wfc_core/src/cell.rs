//! A single grid cell and its Open/Collapsed state machine.
//!
//! ```text
//!   initialize()            collapse() / collapse_to()
//!  ─────────────▶  Open  ───────────────────────────▶  Collapsed
//!                   ▲                                      │
//!                   └──────────── initialize() ────────────┘
//! ```
//!
//! There is no contradiction state: an Open cell whose possibilities ran
//! out is the contradiction, and the generator is the one that notices.

use bevy_math::UVec3;

use crate::catalog::{AdjacencyCatalog, TileId};
use crate::direction::Direction;
use crate::error::CollapseError;
use crate::possibility::WeightedPossibilitySet;
use crate::rng::TileRng;

/// Current state of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellState {
    /// Not yet decided; the set holds the remaining candidates
    Open(WeightedPossibilitySet),
    /// Committed to a single tile
    Collapsed(TileId),
}

/// One grid position and its state.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub position: UVec3,
    state: CellState,
}

impl Cell {
    /// Create an Open cell holding every catalog entry.
    pub fn new(position: UVec3, catalog: &AdjacencyCatalog) -> Self {
        let mut cell = Self {
            position,
            state: CellState::Open(WeightedPossibilitySet::new()),
        };
        cell.initialize(catalog);
        cell
    }

    pub fn state(&self) -> &CellState {
        &self.state
    }

    /// Reset to Open with the full catalog, dropping any chosen tile.
    pub fn initialize(&mut self, catalog: &AdjacencyCatalog) {
        let mut possibilities = match std::mem::replace(&mut self.state, CellState::Collapsed(0)) {
            CellState::Open(mut set) => {
                set.clear();
                set
            }
            CellState::Collapsed(_) => WeightedPossibilitySet::new(),
        };
        for (tile, entry) in catalog.entries.iter().enumerate() {
            possibilities.add(tile, entry.weight);
        }
        self.state = CellState::Open(possibilities);
    }

    /// Draw a tile from the remaining possibilities and commit to it.
    ///
    /// On error the cell is left unchanged.
    pub fn collapse(&mut self, rng: &mut dyn TileRng) -> Result<TileId, CollapseError> {
        let tile = match &mut self.state {
            CellState::Open(possibilities) => possibilities.draw(rng)?,
            CellState::Collapsed(tile) => {
                return Err(CollapseError::AlreadyCollapsed {
                    position: self.position,
                    tile: *tile,
                })
            }
        };
        self.state = CellState::Collapsed(tile);
        Ok(tile)
    }

    /// Commit to `tile` without drawing. Used for terrain pre-fill.
    pub fn collapse_to(&mut self, tile: TileId) {
        self.state = CellState::Collapsed(tile);
    }

    /// Remove every possibility the neighbor's rules forbid.
    ///
    /// `direction` points from the collapsed neighbor to this cell, so the
    /// surviving ids are exactly `allowed_neighbors(neighbor_tile, direction)`
    /// intersected with the current set. Only this cell changes; nothing is
    /// propagated further. Collapsed cells are left alone.
    ///
    /// Returns the number of removed ids.
    pub fn narrow(
        &mut self,
        catalog: &AdjacencyCatalog,
        neighbor_tile: TileId,
        direction: Direction,
    ) -> usize {
        match &mut self.state {
            CellState::Open(possibilities) => {
                let allowed = catalog.allowed_neighbors(neighbor_tile, direction);
                possibilities.retain(|tile| allowed.contains(&tile))
            }
            CellState::Collapsed(_) => 0,
        }
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        matches!(self.state, CellState::Collapsed(_))
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.is_collapsed()
    }

    /// Chosen tile, if collapsed.
    pub fn tile(&self) -> Option<TileId> {
        match self.state {
            CellState::Collapsed(tile) => Some(tile),
            CellState::Open(_) => None,
        }
    }

    /// Remaining possibilities, if open.
    pub fn possibilities(&self) -> Option<&WeightedPossibilitySet> {
        match &self.state {
            CellState::Open(possibilities) => Some(possibilities),
            CellState::Collapsed(_) => None,
        }
    }

    /// Number of remaining possibilities (0 for a collapsed cell).
    ///
    /// An Open cell with entropy 0 is a contradiction.
    #[inline]
    pub fn entropy(&self) -> usize {
        match &self.state {
            CellState::Open(possibilities) => possibilities.len(),
            CellState::Collapsed(_) => 0,
        }
    }

    /// Open with nothing left to choose from.
    #[inline]
    pub fn is_contradiction(&self) -> bool {
        matches!(&self.state, CellState::Open(p) if p.is_empty())
    }
}
