//! Generation settings.

use bevy_math::UVec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::direction::Dimensionality;
use crate::error::{GenerationError, GridError};
use crate::grid::cell_count;

/// Parameters of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Plane (4 neighbors) or volume (6 neighbors)
    pub dimensionality: Dimensionality,

    /// Grid extent in cells. Planar grids must have `z == 1`.
    pub grid_size: UVec3,

    /// Chunk extent in cells. Adjacent chunks overlap by one layer.
    pub chunk_size: UVec3,

    /// Contradictions tolerated on one volumetric chunk before backing off
    /// to the previous chunk.
    /// Default: 100
    pub max_fail_count: u32,

    /// Pause after each completed chunk, for watching generation.
    /// Has no effect on the result.
    /// Default: 0.0
    pub chunk_delay_secs: f32,

    /// RNG seed. `None` draws one from OS entropy.
    pub seed: Option<u64>,

    /// Give up after this many contradictions in total.
    /// `None` retries without bound.
    pub retry_limit: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            dimensionality: Dimensionality::Planar,
            grid_size: UVec3::new(16, 16, 1),
            chunk_size: UVec3::new(5, 5, 1),
            max_fail_count: 100,
            chunk_delay_secs: 0.0,
            seed: None,
            retry_limit: None,
        }
    }
}

impl GenerationConfig {
    /// Planar run over a `width x height` plane.
    pub fn planar(width: u32, height: u32, chunk: u32) -> Self {
        Self {
            dimensionality: Dimensionality::Planar,
            grid_size: UVec3::new(width, height, 1),
            chunk_size: UVec3::new(chunk, chunk, 1),
            ..Default::default()
        }
    }

    /// Volumetric run over a `size` box with cubic chunks.
    pub fn volumetric(size: UVec3, chunk: u32) -> Self {
        Self {
            dimensionality: Dimensionality::Volumetric,
            grid_size: size,
            chunk_size: UVec3::splat(chunk),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: UVec3) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_fail_count(mut self, max_fail_count: u32) -> Self {
        self.max_fail_count = max_fail_count;
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay_secs = delay.as_secs_f32();
        self
    }

    pub fn with_retry_limit(mut self, limit: u64) -> Self {
        self.retry_limit = Some(limit);
        self
    }

    /// Pause after each chunk. Values `validate()` rejects read as zero.
    pub fn chunk_delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.chunk_delay_secs).unwrap_or_default()
    }

    /// Reject sizes and delays the solver cannot work with.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if cell_count(self.grid_size).is_none()
            || (self.dimensionality == Dimensionality::Planar && self.grid_size.z != 1)
        {
            return Err(GridError::InvalidSize(self.grid_size).into());
        }
        if self.chunk_size.min_element() == 0 {
            return Err(GenerationError::InvalidChunkSize(self.chunk_size));
        }
        if Duration::try_from_secs_f32(self.chunk_delay_secs).is_err() {
            return Err(GenerationError::InvalidChunkDelay(self.chunk_delay_secs));
        }
        Ok(())
    }
}
