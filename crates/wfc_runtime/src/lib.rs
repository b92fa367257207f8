//! Bevy plugin that runs chunked generation inside the app schedule.
//!
//! ## Overview
//!
//! Generation is driven cooperatively: every `Update` the driver advances
//! the active [`Generator`] by at most `steps_per_update` steps, so a large
//! grid never stalls a frame. Requests and results travel as messages.
//!
//! ```text
//!   GenerateRequest ──▶ accept_requests ──▶ GenerationDriver (active run)
//!                                                   │
//!   CancelGeneration ─▶ cancel_generation ──────────┤
//!                                                   ▼
//!                                           step_generation
//!                                          (Timer after each chunk)
//!                                                   │
//!                        ┌──────────────────────────┴──────────┐
//!                        ▼                                     ▼
//!                GenerationComplete                    GenerationFailed
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! app.add_plugins(GenerationPlugin)
//!     .insert_resource(RuntimeSettings { steps_per_update: 256 });
//!
//! fn start(mut requests: MessageWriter<GenerateRequest>) {
//!     requests.write(GenerateRequest::new(GenerationConfig::planar(32, 32, 6), catalog));
//! }
//! ```

use bevy_app::{App, Plugin, Update};
use bevy_ecs::prelude::*;
use bevy_log::{error, info, warn};
use bevy_time::{Time, Timer, TimerMode};
use std::sync::Arc;
use std::time::Duration;

use wfc_core::{
    AdjacencyCatalog, GenerationConfig, GenerationError, GenerationOutput, Generator, StepEvent,
};

/// Start a generation run. Ignored while another run is active.
#[derive(Message, Debug, Clone)]
pub struct GenerateRequest {
    pub config: GenerationConfig,
    pub catalog: Arc<AdjacencyCatalog>,
}

impl GenerateRequest {
    pub fn new(config: GenerationConfig, catalog: impl Into<Arc<AdjacencyCatalog>>) -> Self {
        Self {
            config,
            catalog: catalog.into(),
        }
    }
}

/// A run finished. Partial grids are never reported.
#[derive(Message, Debug, Clone)]
pub struct GenerationComplete {
    pub output: Arc<GenerationOutput>,
}

/// A run was rejected or aborted.
#[derive(Message, Debug, Clone)]
pub struct GenerationFailed {
    pub error: GenerationError,
}

/// Drop the active run, if any.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct CancelGeneration;

/// Scheduler tuning.
#[derive(Resource, Debug, Clone)]
pub struct RuntimeSettings {
    /// Generator steps per `Update`. One step collapses at most one cell.
    /// Default: 64
    pub steps_per_update: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            steps_per_update: 64,
        }
    }
}

struct ActiveRun {
    generator: Generator,
    delay: Duration,
    /// Armed after a chunk completes when `delay` is non-zero
    pacing: Option<Timer>,
}

/// Owns the active run and the last finished output.
#[derive(Resource, Default)]
pub struct GenerationDriver {
    active: Option<ActiveRun>,
    last_output: Option<Arc<GenerationOutput>>,
}

impl GenerationDriver {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Read-only view of the run in progress, for previews.
    pub fn generator(&self) -> Option<&Generator> {
        self.active.as_ref().map(|run| &run.generator)
    }

    /// Output of the most recent finished run.
    pub fn last_output(&self) -> Option<&Arc<GenerationOutput>> {
        self.last_output.as_ref()
    }

    /// Whether the active run is sitting out a pacing delay.
    pub fn is_paused(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| run.pacing.is_some())
    }
}

/// Plugin wiring the generation messages and driver systems.
pub struct GenerationPlugin;

impl Plugin for GenerationPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<GenerateRequest>()
            .add_message::<GenerationComplete>()
            .add_message::<GenerationFailed>()
            .add_message::<CancelGeneration>()
            .init_resource::<GenerationDriver>()
            .init_resource::<RuntimeSettings>()
            .add_systems(
                Update,
                (cancel_generation, accept_requests, step_generation).chain(),
            );
    }
}

fn cancel_generation(
    mut cancels: MessageReader<CancelGeneration>,
    mut driver: ResMut<GenerationDriver>,
) {
    if cancels.read().count() == 0 {
        return;
    }
    if let Some(mut run) = driver.active.take() {
        run.generator.cancel();
    }
}

fn accept_requests(
    mut requests: MessageReader<GenerateRequest>,
    mut driver: ResMut<GenerationDriver>,
    mut failed: MessageWriter<GenerationFailed>,
) {
    for request in requests.read() {
        if driver.is_running() {
            warn!("Generation already running, ignoring request");
            continue;
        }

        match Generator::new(request.config.clone(), request.catalog.clone()) {
            Ok(generator) => {
                info!(
                    "Accepted generation request: {} chunks",
                    generator.chunk_count()
                );
                driver.active = Some(ActiveRun {
                    delay: request.config.chunk_delay(),
                    generator,
                    pacing: None,
                });
            }
            Err(error) => {
                error!("Rejected generation request: {}", error);
                failed.write(GenerationFailed { error });
            }
        }
    }
}

fn step_generation(
    time: Res<Time>,
    settings: Res<RuntimeSettings>,
    mut driver: ResMut<GenerationDriver>,
    mut complete: MessageWriter<GenerationComplete>,
    mut failed: MessageWriter<GenerationFailed>,
) {
    let Some(run) = driver.active.as_mut() else {
        return;
    };

    if let Some(timer) = run.pacing.as_mut() {
        timer.tick(time.delta());
        if !timer.is_finished() {
            return;
        }
        run.pacing = None;
    }

    for _ in 0..settings.steps_per_update.max(1) {
        match run.generator.step() {
            Ok(StepEvent::ChunkCompleted { .. }) if !run.delay.is_zero() => {
                run.pacing = Some(Timer::new(run.delay, TimerMode::Once));
                return;
            }
            Ok(StepEvent::Finished) => break,
            Ok(_) => {}
            Err(error) => {
                error!("Generation failed: {}", error);
                driver.active = None;
                failed.write(GenerationFailed { error });
                return;
            }
        }
    }

    if !run.generator.is_finished() {
        return;
    }
    let Some(run) = driver.active.take() else {
        return;
    };
    match run.generator.into_output() {
        Ok(output) => {
            info!("Generation complete: {} placements", output.placements.len());
            let output = Arc::new(output);
            driver.last_output = Some(output.clone());
            complete.write(GenerationComplete { output });
        }
        Err(error) => {
            error!("Generation failed: {}", error);
            failed.write(GenerationFailed { error });
        }
    }
}
