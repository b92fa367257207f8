//! Writing finished runs to disk: placement JSON and a PNG preview.
//!
//! Planar grids render one pixel block per cell with north at the top.
//! Volumes render top-down: each column shows its highest non-air cell,
//! darkened the lower it sits.

use bevy_math::UVec3;
use image::{ImageBuffer, Rgba, RgbaImage};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use wfc_core::{
    Dimensionality, GenerationConfig, GenerationOutput, GenerationStats, Grid, Placement, TileId,
};

/// Errors that can occur while exporting a run.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error.
    Io(std::io::Error),
    /// Image encoding error.
    Image(image::ImageError),
    /// JSON encoding error.
    Json(serde_json::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Image(e) => write!(f, "Image error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for ExportError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// JSON document written for a finished run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub config: &'a GenerationConfig,
    pub stats: GenerationStats,
    pub placements: &'a [Placement],
}

/// Write the run's placements and stats as pretty JSON.
pub fn write_report<P: AsRef<Path>>(
    path: P,
    config: &GenerationConfig,
    output: &GenerationOutput,
) -> Result<(), ExportError> {
    let report = RunReport {
        config,
        stats: output.stats,
        placements: &output.placements,
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}

/// Preview renderer.
pub struct PreviewRenderer {
    palette: Vec<[u8; 4]>,
    background: [u8; 4],
    /// Pixels per cell edge
    scale: u32,
    air: Option<TileId>,
}

impl PreviewRenderer {
    pub fn new(palette: Vec<[u8; 4]>, scale: u32) -> Self {
        Self {
            palette,
            background: [50, 50, 50, 255],
            scale: scale.max(1),
            air: None,
        }
    }

    /// Treat `air` as empty space in top-down views.
    pub fn with_air(mut self, air: Option<TileId>) -> Self {
        self.air = air;
        self
    }

    pub fn set_background(&mut self, color: [u8; 4]) {
        self.background = color;
    }

    fn color(&self, tile: TileId) -> [u8; 4] {
        // Ids past the palette fall back to a stable hash color.
        self.palette.get(tile).copied().unwrap_or_else(|| {
            let h = (tile as u32).wrapping_mul(2654435761);
            [(h >> 24) as u8, (h >> 16) as u8, (h >> 8) as u8, 255]
        })
    }

    /// Color for the cell column at `(x, row)` of the preview.
    fn column_color(&self, grid: &Grid, x: u32, row: u32) -> [u8; 4] {
        let size = grid.size();
        match grid.dimensionality() {
            Dimensionality::Planar => {
                let y = size.y - 1 - row;
                grid.cell_at(UVec3::new(x, y, 0))
                    .ok()
                    .and_then(|cell| cell.tile())
                    .map_or(self.background, |tile| self.color(tile))
            }
            Dimensionality::Volumetric => {
                let z = size.z - 1 - row;
                for y in (0..size.y).rev() {
                    let Some(tile) = grid
                        .cell_at(UVec3::new(x, y, z))
                        .ok()
                        .and_then(|cell| cell.tile())
                    else {
                        continue;
                    };
                    if Some(tile) == self.air {
                        continue;
                    }
                    let shade = 0.5 + 0.5 * (y + 1) as f32 / size.y as f32;
                    let [r, g, b, a] = self.color(tile);
                    return [
                        (r as f32 * shade) as u8,
                        (g as f32 * shade) as u8,
                        (b as f32 * shade) as u8,
                        a,
                    ];
                }
                self.background
            }
        }
    }

    /// Render the grid to an image.
    pub fn render(&self, grid: &Grid) -> RgbaImage {
        let size = grid.size();
        let rows = match grid.dimensionality() {
            Dimensionality::Planar => size.y,
            Dimensionality::Volumetric => size.z,
        };
        let scale = self.scale;

        let mut img: RgbaImage = ImageBuffer::new(size.x * scale, rows * scale);
        for row in 0..rows {
            for x in 0..size.x {
                let color = Rgba(self.column_color(grid, x, row));
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(x * scale + dx, row * scale + dy, color);
                    }
                }
            }
        }
        img
    }

    /// Render and save as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, grid: &Grid, path: P) -> Result<(), ExportError> {
        self.render(grid).save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wfc_core::{generate, AdjacencyCatalog, CatalogEntry};

    fn single_tile_grid(config: GenerationConfig, catalog: AdjacencyCatalog) -> GenerationOutput {
        generate(config.with_seed(1), Arc::new(catalog)).unwrap()
    }

    #[test]
    fn test_planar_render_north_up() {
        let catalog = AdjacencyCatalog::new(vec![CatalogEntry::new("only", 1.0).allow_all(&[0])]);
        let output = single_tile_grid(GenerationConfig::planar(3, 2, 2), catalog);
        let renderer = PreviewRenderer::new(vec![[10, 20, 30, 255]], 4);
        let img = renderer.render(&output.grid);
        assert_eq!(img.dimensions(), (12, 8));
        assert_eq!(img.get_pixel(11, 7).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_volumetric_render_skips_air() {
        let catalog = AdjacencyCatalog::new(vec![CatalogEntry::new("air", 1.0).allow_all(&[0])])
            .with_air(0)
            .with_default(0);
        let config = GenerationConfig::volumetric(UVec3::new(2, 2, 3), 2);
        let output = single_tile_grid(config, catalog);
        let mut renderer = PreviewRenderer::new(vec![[255, 0, 0, 255]], 1).with_air(Some(0));
        renderer.set_background([1, 2, 3, 255]);
        let img = renderer.render(&output.grid);
        assert_eq!(img.dimensions(), (2, 3));
        assert!(img.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_report_roundtrips_placements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let catalog = AdjacencyCatalog::new(vec![CatalogEntry::new("only", 1.0).allow_all(&[0])]);
        let config = GenerationConfig::planar(2, 2, 2);
        let output = single_tile_grid(config.clone(), catalog);

        write_report(&path, &config, &output).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["placements"].as_array().unwrap().len(), 4);
        assert_eq!(json["stats"]["collapses"], 4);
    }
}
