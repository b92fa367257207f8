//! Command-line arguments for the headless runner.

use bevy_math::UVec3;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use wfc_core::{AdjacencyCatalog, Dimensionality, GenerationConfig};

use crate::demo_catalog;
use crate::export::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// 2D plane, 4 neighbors per cell
    Planar,
    /// 3D volume, 6 neighbors per cell, terrain pre-fill and backoff
    Volumetric,
}

impl From<Mode> for Dimensionality {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Planar => Dimensionality::Planar,
            Mode::Volumetric => Dimensionality::Volumetric,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wfc_studio")]
#[command(about = "Fill a plane or volume with tiles using chunked wave function collapse")]
pub struct Args {
    /// Grid dimensionality
    #[arg(short, long, value_enum, default_value = "planar")]
    pub mode: Mode,

    /// Grid size as X,Y or X,Y,Z (missing axes repeat the first)
    #[arg(long, value_delimiter = ',', default_value = "32,32")]
    pub size: Vec<u32>,

    /// Chunk size as one value or per axis
    #[arg(long, value_delimiter = ',', default_value = "6")]
    pub chunk: Vec<u32>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Contradictions on one volumetric chunk before backing off
    #[arg(long, default_value = "100")]
    pub max_fail: u32,

    /// Give up after this many contradictions in total
    #[arg(long)]
    pub retry_limit: Option<u64>,

    /// Pause after each chunk, in milliseconds
    #[arg(long, default_value = "0")]
    pub delay_ms: u64,

    /// Generator steps per frame
    #[arg(long, default_value = "256")]
    pub steps_per_update: usize,

    /// Catalog JSON file (built-in demo catalog if not specified)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output path for the placement JSON
    #[arg(short, long, default_value = "placements.json")]
    pub out: PathBuf,

    /// Write a PNG preview to this path
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Pixels per cell in the PNG preview
    #[arg(long, default_value = "8")]
    pub scale: u32,
}

impl Args {
    /// Build the generation config. Invalid sizes are left for
    /// `GenerationConfig::validate` to reject.
    pub fn generation_config(&self) -> GenerationConfig {
        let dimensionality: Dimensionality = self.mode.into();
        let mut grid_size = expand_axes(&self.size);
        let mut chunk_size = expand_axes(&self.chunk);
        if dimensionality == Dimensionality::Planar {
            // An explicit depth is kept so validation can reject it.
            if self.size.len() < 3 {
                grid_size.z = 1;
            }
            chunk_size.z = 1;
        }

        GenerationConfig {
            dimensionality,
            grid_size,
            chunk_size,
            max_fail_count: self.max_fail,
            seed: self.seed,
            retry_limit: self.retry_limit,
            ..Default::default()
        }
        .with_chunk_delay(Duration::from_millis(self.delay_ms))
    }

    /// Load the catalog file, or pick the demo catalog for the mode.
    pub fn load_catalog(&self) -> Result<AdjacencyCatalog, ExportError> {
        match &self.catalog {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(match self.mode {
                Mode::Planar => demo_catalog::coastline(),
                Mode::Volumetric => demo_catalog::terrain(),
            }),
        }
    }

    /// Preview colors for the selected catalog.
    pub fn palette(&self) -> Vec<[u8; 4]> {
        match (self.catalog.is_some(), self.mode) {
            (true, _) => Vec::new(),
            (false, Mode::Planar) => demo_catalog::coastline_palette(),
            (false, Mode::Volumetric) => demo_catalog::terrain_palette(),
        }
    }
}

/// `[a]` -> (a, a, a), `[a, b]` -> (a, b, a), `[a, b, c]` -> (a, b, c).
fn expand_axes(values: &[u32]) -> UVec3 {
    let first = values.first().copied().unwrap_or(0);
    let axis = |i: usize| values.get(i).copied().unwrap_or(first);
    UVec3::new(first, axis(1), axis(2))
}
