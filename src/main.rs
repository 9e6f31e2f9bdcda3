#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod capture;
mod config;
mod error;
mod output_log;
mod pipeline;
mod types;
mod ui;
mod visualizer;

use std::fmt::Display;

use anyhow::Result;
use capture::{KeyMap, Session};
use config::Config;
use gpui::Application;
use pipeline::{FrameStore, Sensor, SyntheticSensor};

const CONFIG_PATH: &str = "snapshot.toml";

fn main() -> Result<()> {
    env_logger::init();

    let config = log_startup(
        Config::load_or_default(CONFIG_PATH),
        "cannot load configuration",
    )?;
    let keys = log_startup(KeyMap::try_from(&config.keys), "invalid key bindings")?;
    let session = log_startup(
        Session::create(&config.output, keys),
        "cannot start capture session",
    )?;

    let (store, sinks) = FrameStore::new();
    let mut sensor = SyntheticSensor::new(config.sensor.fps);
    let mapper = sensor.mapper();
    let sensor_label = sensor.label().to_string();
    let stream = log_startup(sensor.start(sinks), "cannot start sensor")?;
    log::info!("sensor {sensor_label} started at {} fps", config.sensor.fps);

    let window_config = config.window.clone();
    let parts = ui::AppParts {
        store,
        mapper,
        session,
        sensor: stream,
        sensor_label,
    };

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, &window_config, parts) {
                log::error!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}

/// Logs a startup failure before it ends the process.
fn log_startup<T, E: Display>(result: Result<T, E>, what: &str) -> Result<T, E> {
    result.inspect_err(|err| log::error!("{what}: {err}"))
}
