//! Full headless runs: request in, files out, adjacency checked.

use bevy_app::{App, AppExit};
use bevy_math::UVec3;
use bevy_time::Time;
use std::sync::Arc;

use wfc_core::{AdjacencyCatalog, GenerationConfig, Grid};
use wfc_runtime::{GenerationDriver, RuntimeSettings};
use wfc_studio::{demo_catalog, HeadlessRunPlugin, RunPlan};

fn run_headless(plan: RunPlan, max_updates: usize) -> (App, Option<AppExit>) {
    let mut app = App::new();
    app.init_resource::<Time>()
        .add_plugins(HeadlessRunPlugin { plan })
        .insert_resource(RuntimeSettings {
            steps_per_update: 512,
        });

    for _ in 0..max_updates {
        app.update();
        if let Some(exit) = app.should_exit() {
            return (app, Some(exit));
        }
    }
    (app, None)
}

/// Every collapsed neighbor pair must be allowed in both directions.
fn assert_adjacency_valid(grid: &Grid, catalog: &AdjacencyCatalog) {
    for cell in grid.cells() {
        let tile = cell.tile().expect("finished grids are fully collapsed");
        for &dir in grid.dimensionality().directions() {
            let Some(neighbor) = grid.neighbor(cell.position, dir) else {
                continue;
            };
            let other = grid.cell_at(neighbor).unwrap().tile().unwrap();
            assert!(
                catalog.allowed_neighbors(tile, dir).contains(&other),
                "{} at {} does not allow {} {:?}",
                tile,
                cell.position,
                other,
                dir
            );
        }
    }
}

#[test]
fn test_planar_run_writes_report_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(demo_catalog::coastline());
    let plan = RunPlan {
        config: GenerationConfig::planar(20, 14, 5).with_seed(11),
        catalog: catalog.clone(),
        out: dir.path().join("placements.json"),
        png: Some(dir.path().join("preview.png")),
        palette: demo_catalog::coastline_palette(),
        scale: 2,
    };

    let (app, exit) = run_headless(plan, 500);
    assert_eq!(exit, Some(AppExit::Success));

    let driver = app.world().resource::<GenerationDriver>();
    let output = driver.last_output().unwrap();
    assert_eq!(output.placements.len(), 20 * 14);
    assert_adjacency_valid(&output.grid, &catalog);

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("placements.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["placements"].as_array().unwrap().len(), 280);
    assert_eq!(json["config"]["seed"], 11);

    let preview = image::open(dir.path().join("preview.png")).unwrap();
    assert_eq!((preview.width(), preview.height()), (40, 28));
}

#[test]
fn test_volumetric_run_elides_air() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(demo_catalog::terrain());
    let plan = RunPlan {
        config: GenerationConfig::volumetric(UVec3::new(8, 4, 8), 3)
            .with_seed(3)
            .with_retry_limit(100_000),
        catalog: catalog.clone(),
        out: dir.path().join("volume.json"),
        png: None,
        palette: demo_catalog::terrain_palette(),
        scale: 1,
    };

    let (app, exit) = run_headless(plan, 20_000);
    assert_eq!(exit, Some(AppExit::Success));

    let output = app
        .world()
        .resource::<GenerationDriver>()
        .last_output()
        .unwrap()
        .clone();
    assert_adjacency_valid(&output.grid, &catalog);
    assert!(output
        .placements
        .iter()
        .all(|p| p.tile != demo_catalog::AIR));
    assert!(!dir.path().join("preview.png").exists());
}

#[test]
fn test_invalid_config_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let plan = RunPlan {
        config: GenerationConfig::planar(8, 8, 0),
        catalog: Arc::new(demo_catalog::coastline()),
        out: dir.path().join("never.json"),
        png: None,
        palette: Vec::new(),
        scale: 1,
    };

    let (_, exit) = run_headless(plan, 10);
    assert!(matches!(exit, Some(AppExit::Error(_))));
    assert!(!dir.path().join("never.json").exists());
}
