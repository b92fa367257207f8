//! Error types for the solver.
//!
//! Contradictions are not errors: they are expected during generation and
//! are handled by chunk reset/backoff inside the generator. Everything here
//! is either invalid input or a misuse that must surface to the caller.

use bevy_math::UVec3;
use std::fmt;

use crate::catalog::TileId;

/// Errors raised by a single cell or possibility set.
#[derive(Debug, Clone, PartialEq)]
pub enum CollapseError {
    /// `draw()` was called on an empty possibility set
    EmptyDraw,
    /// `collapse()` was called on a cell that is already collapsed
    AlreadyCollapsed { position: UVec3, tile: TileId },
}

impl fmt::Display for CollapseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollapseError::EmptyDraw => {
                write!(f, "cannot draw from an empty possibility set")
            }
            CollapseError::AlreadyCollapsed { position, tile } => {
                write!(f, "cell {} is already collapsed to tile {}", position, tile)
            }
        }
    }
}

impl std::error::Error for CollapseError {}

/// Errors from grid construction and position arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Position lies outside `[0, size)` on some axis
    OutOfBounds { position: [i64; 3], size: UVec3 },
    /// Grid size has a zero axis, or a planar grid has depth != 1
    InvalidSize(UVec3),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfBounds { position, size } => write!(
                f,
                "position ({}, {}, {}) is outside grid of size {}",
                position[0], position[1], position[2], size
            ),
            GridError::InvalidSize(size) => write!(f, "invalid grid size {}", size),
        }
    }
}

impl std::error::Error for GridError {}

/// Errors found while validating an adjacency catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Catalog has no entries
    Empty,
    /// An entry references a neighbor id that does not exist
    UnknownNeighbor {
        tile: TileId,
        direction: &'static str,
        neighbor: TileId,
    },
    /// A sentinel id (default or air) is outside the catalog
    UnknownSentinel { name: &'static str, tile: TileId },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "catalog has no entries"),
            CatalogError::UnknownNeighbor {
                tile,
                direction,
                neighbor,
            } => write!(
                f,
                "tile {} lists unknown neighbor {} in direction {}",
                tile, neighbor, direction
            ),
            CatalogError::UnknownSentinel { name, tile } => {
                write!(f, "{} sentinel {} is not a catalog entry", name, tile)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Errors that abort a generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Catalog failed validation
    Catalog(CatalogError),
    /// Grid construction or lookup failed
    Grid(GridError),
    /// A cell operation was misused
    Collapse(CollapseError),
    /// Chunk size has a zero axis
    InvalidChunkSize(UVec3),
    /// Chunk delay is negative, not finite, or too large for a `Duration`
    InvalidChunkDelay(f32),
    /// Volumetric terrain pre-fill needs a sentinel the catalog does not define
    MissingSentinel(&'static str),
    /// Total contradictions exceeded the configured retry limit
    RetryLimitExceeded { limit: u64, chunk: usize },
    /// The run was cancelled before it finished
    Cancelled,
    /// `step()` was called after the run already finished
    Finished,
    /// Output was requested before the run finished
    Incomplete,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Catalog(e) => write!(f, "catalog error: {}", e),
            GenerationError::Grid(e) => write!(f, "grid error: {}", e),
            GenerationError::Collapse(e) => write!(f, "collapse error: {}", e),
            GenerationError::InvalidChunkSize(size) => {
                write!(f, "invalid chunk size {}", size)
            }
            GenerationError::InvalidChunkDelay(secs) => {
                write!(f, "invalid chunk delay {} seconds", secs)
            }
            GenerationError::MissingSentinel(name) => {
                write!(f, "volumetric generation requires a {} sentinel", name)
            }
            GenerationError::RetryLimitExceeded { limit, chunk } => write!(
                f,
                "gave up on chunk {} after {} contradictions",
                chunk, limit
            ),
            GenerationError::Cancelled => write!(f, "generation was cancelled"),
            GenerationError::Finished => write!(f, "generation already finished"),
            GenerationError::Incomplete => write!(f, "generation has not finished"),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GenerationError::Catalog(e) => Some(e),
            GenerationError::Grid(e) => Some(e),
            GenerationError::Collapse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for GenerationError {
    fn from(e: CatalogError) -> Self {
        GenerationError::Catalog(e)
    }
}

impl From<GridError> for GenerationError {
    fn from(e: GridError) -> Self {
        GenerationError::Grid(e)
    }
}

impl From<CollapseError> for GenerationError {
    fn from(e: CollapseError) -> Self {
        GenerationError::Collapse(e)
    }
}

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;
