//! Dense grid of cells with bounds and neighbor arithmetic.
//!
//! Cells are stored in a flat Vec, indexed `x + y * sx + z * sx * sy`.
//! Planar grids always have depth 1.

use bevy_math::{IVec3, UVec3};
use serde::{Deserialize, Serialize};

use crate::catalog::{AdjacencyCatalog, TileId};
use crate::cell::Cell;
use crate::direction::{Dimensionality, Direction};
use crate::error::GridError;

/// A collapsed cell as handed to content instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub position: UVec3,
    pub tile: TileId,
}

/// Owns every cell of one generation run.
#[derive(Debug, Clone)]
pub struct Grid {
    size: UVec3,
    dimensionality: Dimensionality,
    cells: Vec<Cell>,
}

/// Number of cells in a grid of `size`, or `None` when an axis is zero or
/// the count does not fit a `u32` index.
pub fn cell_count(size: UVec3) -> Option<usize> {
    if size.min_element() == 0 {
        return None;
    }
    size.x
        .checked_mul(size.y)
        .and_then(|n| n.checked_mul(size.z))
        .map(|n| n as usize)
}

impl Grid {
    /// Create a grid with every cell Open.
    pub fn new(
        size: UVec3,
        dimensionality: Dimensionality,
        catalog: &AdjacencyCatalog,
    ) -> Result<Self, GridError> {
        if dimensionality == Dimensionality::Planar && size.z != 1 {
            return Err(GridError::InvalidSize(size));
        }
        let len = cell_count(size).ok_or(GridError::InvalidSize(size))?;

        let mut cells = Vec::with_capacity(len);
        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    cells.push(Cell::new(UVec3::new(x, y, z), catalog));
                }
            }
        }

        Ok(Self {
            size,
            dimensionality,
            cells,
        })
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, position: IVec3) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.z >= 0
            && (position.x as u32) < self.size.x
            && (position.y as u32) < self.size.y
            && (position.z as u32) < self.size.z
    }

    /// Flat index of an in-bounds position.
    pub fn index_of(&self, position: UVec3) -> Result<usize, GridError> {
        if !self.in_bounds(position.as_ivec3()) {
            return Err(self.out_of_bounds(position.as_ivec3()));
        }
        Ok(self.index_unchecked(position))
    }

    #[inline]
    fn index_unchecked(&self, position: UVec3) -> usize {
        (position.x + position.y * self.size.x + position.z * self.size.x * self.size.y) as usize
    }

    /// Position stored at flat `index`.
    pub fn position_of(&self, index: usize) -> UVec3 {
        let index = index as u32;
        let layer = self.size.x * self.size.y;
        UVec3::new(
            index % self.size.x,
            (index % layer) / self.size.x,
            index / layer,
        )
    }

    pub fn cell_at(&self, position: UVec3) -> Result<&Cell, GridError> {
        let index = self.index_of(position)?;
        Ok(&self.cells[index])
    }

    pub fn cell_at_mut(&mut self, position: UVec3) -> Result<&mut Cell, GridError> {
        let index = self.index_of(position)?;
        Ok(&mut self.cells[index])
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Position one step from `position` in `direction`.
    ///
    /// Rejects results outside the grid instead of clamping them.
    pub fn neighbor_position(
        &self,
        position: UVec3,
        direction: Direction,
    ) -> Result<UVec3, GridError> {
        let target = position.as_ivec3() + self.dimensionality.offset(direction);
        if self.in_bounds(target) {
            Ok(target.as_uvec3())
        } else {
            Err(self.out_of_bounds(target))
        }
    }

    /// Like `neighbor_position`, for callers that treat the edge as "no neighbor".
    pub fn neighbor(&self, position: UVec3, direction: Direction) -> Option<UVec3> {
        self.neighbor_position(position, direction).ok()
    }

    /// Every collapsed cell as a placement, in index order.
    pub fn placements(&self) -> Vec<Placement> {
        self.cells
            .iter()
            .filter_map(|cell| {
                cell.tile().map(|tile| Placement {
                    position: cell.position,
                    tile,
                })
            })
            .collect()
    }

    /// Whether every cell is collapsed.
    pub fn is_fully_collapsed(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    fn out_of_bounds(&self, position: IVec3) -> GridError {
        GridError::OutOfBounds {
            position: [position.x as i64, position.y as i64, position.z as i64],
            size: self.size,
        }
    }
}
