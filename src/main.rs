use bevy_app::{App, AppExit, ScheduleRunnerPlugin};
use bevy_log::LogPlugin;
use bevy_time::TimePlugin;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use wfc_runtime::{GenerationPlugin, RuntimeSettings};
use wfc_studio::{Args, HeadlessRunPlugin, RunPlan};

fn main() -> AppExit {
    let args = Args::parse();

    let catalog = match args.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Failed to load catalog: {}", e);
            return AppExit::error();
        }
    };

    let plan = RunPlan {
        config: args.generation_config(),
        catalog: Arc::new(catalog),
        out: args.out.clone(),
        png: args.png.clone(),
        palette: args.palette(),
        scale: args.scale,
    };

    App::new()
        .add_plugins(LogPlugin::default())
        .add_plugins(TimePlugin)
        // No window: tick as fast as possible until the run exits
        .add_plugins(ScheduleRunnerPlugin::run_loop(Duration::ZERO))
        .add_plugins(GenerationPlugin)
        .insert_resource(RuntimeSettings {
            steps_per_update: args.steps_per_update,
        })
        .add_plugins(HeadlessRunPlugin { plan })
        .run()
}
