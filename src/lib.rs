//! Headless studio for chunked tile generation.
//!
//! Wraps `wfc_core` and `wfc_runtime` in a command-line runner that
//! generates one grid, writes its placements as JSON and optionally
//! renders a PNG preview.

pub mod cli;
pub mod demo_catalog;
pub mod export;
pub mod runner;

pub use cli::{Args, Mode};
pub use export::{write_report, ExportError, PreviewRenderer, RunReport};
pub use runner::{HeadlessRunPlugin, RunPlan};
