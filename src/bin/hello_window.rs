use anyhow::{Context, Result};
use gl_tutorials::utils::logging;
use gl_tutorials::{GlWindow, RenderConfig, WindowConfig};
use log::{error, info, LevelFilter};
use std::process::ExitCode;

fn run() -> Result<()> {
    let (window, event_loop) =
        GlWindow::new(&WindowConfig::titled("Hello Window")).context("failed to set up window")?;
    let gl = window.load_gl();

    let render_config = RenderConfig::default();
    render_config.apply(&gl);

    window.run(&gl, event_loop, |_| render_config.clear(&gl))?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init(LevelFilter::Info) {
        eprintln!("failed to initialize logger: {err}");
    }

    match run() {
        Ok(()) => {
            info!("Exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
