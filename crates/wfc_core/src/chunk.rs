//! Chunk partitioning of the grid.
//!
//! Chunks are boxes of `chunk_size` cells laid out with a per-axis stride of
//! `chunk_size - 1`, so neighboring chunks share one layer of cells. The
//! shared layer belongs to the earlier chunk: a chunk owns its box minus the
//! leading layer on every axis where it overlaps a predecessor. The later
//! chunk only reads that layer as a constraint seed.
//!
//! ```text
//!   5-cell line, chunk size 3, stride 2
//!
//!   cell:    0   1   2   3   4
//!   chunk 0: [=========]              owns 0..3
//!   chunk 1:         [=========]      box 2..5, owns 3..5, reads 2
//! ```
//!
//! Scan order:
//! - Planar: X outer, Y inner
//! - Volumetric: Y outer, then X, then Z innermost
//!
//! Origins whose owned box would be empty are skipped, so the sequence is
//! finite, deterministic and restartable.

use bevy_math::UVec3;

use crate::direction::Dimensionality;
use crate::error::GenerationError;

/// One chunk of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the scan order
    pub index: usize,
    /// Corner of the (unclipped) chunk box
    pub origin: UVec3,
    /// First owned position (inclusive)
    pub min: UVec3,
    /// End of the owned box (exclusive, clipped to the grid)
    pub max: UVec3,
}

impl Chunk {
    /// Whether `position` is owned by this chunk.
    #[inline]
    pub fn contains(&self, position: UVec3) -> bool {
        position.cmpge(self.min).all() && position.cmplt(self.max).all()
    }

    /// Number of owned cells.
    pub fn len(&self) -> usize {
        let extent = self.max - self.min;
        (extent.x * extent.y * extent.z) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned positions, X fastest.
    pub fn positions(&self) -> impl Iterator<Item = UVec3> + '_ {
        (self.min.z..self.max.z).flat_map(move |z| {
            (self.min.y..self.max.y)
                .flat_map(move |y| (self.min.x..self.max.x).map(move |x| UVec3::new(x, y, z)))
        })
    }
}

/// Computes the chunk sequence for a grid.
#[derive(Debug, Clone)]
pub struct ChunkPartitioner {
    grid_size: UVec3,
    chunk_size: UVec3,
    /// Per-axis chunk origins (x, y, z)
    axis_origins: [Vec<u32>; 3],
    /// Axes from outermost to innermost loop
    axis_order: [usize; 3],
}

impl ChunkPartitioner {
    pub fn new(
        grid_size: UVec3,
        chunk_size: UVec3,
        dimensionality: Dimensionality,
    ) -> Result<Self, GenerationError> {
        if chunk_size.min_element() == 0 {
            return Err(GenerationError::InvalidChunkSize(chunk_size));
        }

        let axis_origins = [0, 1, 2].map(|axis| axis_origins(grid_size[axis], chunk_size[axis]));
        let axis_order = match dimensionality {
            Dimensionality::Planar => [0, 1, 2],
            Dimensionality::Volumetric => [1, 0, 2],
        };

        Ok(Self {
            grid_size,
            chunk_size,
            axis_origins,
            axis_order,
        })
    }

    pub fn chunk_size(&self) -> UVec3 {
        self.chunk_size
    }

    /// Total number of chunks.
    pub fn len(&self) -> usize {
        self.axis_origins.iter().map(Vec::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk at `index` in scan order.
    pub fn chunk(&self, index: usize) -> Option<Chunk> {
        if index >= self.len() {
            return None;
        }

        let mut rest = index;
        let mut origin = UVec3::ZERO;
        for &axis in self.axis_order.iter().rev() {
            let count = self.axis_origins[axis].len();
            origin[axis] = self.axis_origins[axis][rest % count];
            rest /= count;
        }

        let mut min = origin;
        let mut max = origin;
        for axis in 0..3 {
            min[axis] = origin[axis] + leading_overlap(origin[axis], self.chunk_size[axis]);
            max[axis] = (origin[axis] + self.chunk_size[axis]).min(self.grid_size[axis]);
        }

        Some(Chunk {
            index,
            origin,
            min,
            max,
        })
    }

    /// The chunk scanned just before `index`, used for backoff.
    pub fn previous(&self, index: usize) -> Option<Chunk> {
        index.checked_sub(1).and_then(|i| self.chunk(i))
    }

    /// Every chunk in scan order.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        (0..self.len()).filter_map(move |i| self.chunk(i))
    }
}

/// 1 when a chunk at `origin` shares its first layer with the previous one.
#[inline]
fn leading_overlap(origin: u32, chunk: u32) -> u32 {
    if origin > 0 && chunk > 1 {
        1
    } else {
        0
    }
}

/// Origins along one axis, stopping before a chunk would own nothing.
fn axis_origins(size: u32, chunk: u32) -> Vec<u32> {
    let stride = if chunk > 1 { chunk - 1 } else { 1 };
    let mut origins = vec![0];
    let mut origin = stride;
    while origin + leading_overlap(origin, chunk) < size {
        origins.push(origin);
        origin += stride;
    }
    origins
}
