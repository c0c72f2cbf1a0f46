// Penguin World: a skyboxed polar scene with a fly-through camera

// Module declarations
mod app;
mod camera;
mod clock;
mod config;
mod error;
mod gfx;
mod input;
mod math;
mod renderer;
mod scene;

use anyhow::Context;
use winit::event_loop::EventLoop;

use crate::app::App;
use crate::config::AppConfig;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run().await {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = AppConfig::path_from_env();
    let config = AppConfig::load_or_default(&config_path)?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let app = App::new(&event_loop, &config)
        .await
        .context("failed to initialise Penguin World")?;

    app.run(event_loop)?;
    Ok(())
}
