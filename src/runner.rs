//! Headless app wiring: submit one request, export the result, exit.

use bevy_app::{App, AppExit, Plugin, Startup, Update};
use bevy_ecs::prelude::*;
use bevy_log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

use wfc_core::{AdjacencyCatalog, GenerationConfig};
use wfc_runtime::{GenerateRequest, GenerationComplete, GenerationFailed, GenerationPlugin};

use crate::export::{write_report, PreviewRenderer};

/// What to generate and where the results go.
#[derive(Resource, Clone)]
pub struct RunPlan {
    pub config: GenerationConfig,
    pub catalog: Arc<AdjacencyCatalog>,
    pub out: PathBuf,
    pub png: Option<PathBuf>,
    pub palette: Vec<[u8; 4]>,
    pub scale: u32,
}

/// Runs a single [`RunPlan`] and exits when it is done.
pub struct HeadlessRunPlugin {
    pub plan: RunPlan,
}

impl Plugin for HeadlessRunPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<GenerationPlugin>() {
            app.add_plugins(GenerationPlugin);
        }
        app.insert_resource(self.plan.clone())
            .add_systems(Startup, submit_request)
            .add_systems(Update, (export_results, report_failure));
    }
}

fn submit_request(plan: Res<RunPlan>, mut requests: MessageWriter<GenerateRequest>) {
    info!(
        "Requesting {:?} generation of {}",
        plan.config.dimensionality, plan.config.grid_size
    );
    requests.write(GenerateRequest::new(plan.config.clone(), plan.catalog.clone()));
}

fn export_results(
    plan: Res<RunPlan>,
    mut complete: MessageReader<GenerationComplete>,
    mut exit: MessageWriter<AppExit>,
) {
    for message in complete.read() {
        let output = &message.output;
        let mut result = write_report(&plan.out, &plan.config, output);
        if let (Ok(()), Some(png)) = (&result, &plan.png) {
            result = PreviewRenderer::new(plan.palette.clone(), plan.scale)
                .with_air(plan.catalog.air_tile)
                .save_png(&output.grid, png);
        }

        match result {
            Ok(()) => {
                info!(
                    "Wrote {} placements to {} ({} contradictions, {} backoffs)",
                    output.placements.len(),
                    plan.out.display(),
                    output.stats.contradictions,
                    output.stats.backoffs
                );
                exit.write(AppExit::Success);
            }
            Err(e) => {
                error!("Export failed: {}", e);
                exit.write(AppExit::error());
            }
        }
    }
}

fn report_failure(mut failed: MessageReader<GenerationFailed>, mut exit: MessageWriter<AppExit>) {
    if let Some(message) = failed.read().last() {
        error!("Generation failed: {}", message.error);
        exit.write(AppExit::error());
    }
}
