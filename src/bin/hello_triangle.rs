use anyhow::{Context, Result};
use gl_tutorials::render::geometry::{triangle_layout, TRIANGLE_VERTICES};
use gl_tutorials::render::shaders::triangle_shaders;
use gl_tutorials::utils::logging;
use gl_tutorials::{GlWindow, Mesh, RenderConfig, ShaderProgram, ShaderSource, WindowConfig};
use log::{error, info, LevelFilter};
use std::process::ExitCode;

fn run() -> Result<()> {
    let (window, event_loop) = GlWindow::new(&WindowConfig::titled("Hello Triangle"))
        .context("failed to set up window")?;
    let gl = window.load_gl();

    let render_config = RenderConfig::default();
    render_config.apply(&gl);

    let source = ShaderSource::new(triangle_shaders::VERTEX_SRC, triangle_shaders::FRAGMENT_SRC);
    let program = match ShaderProgram::build(&gl, &source) {
        Ok(program) => Some(program),
        Err(err) => {
            error!("Triangle shader unavailable, nothing will be drawn: {}", err);
            None
        }
    };
    let triangle = Mesh::upload(&gl, &TRIANGLE_VERTICES, &triangle_layout())
        .context("failed to upload triangle")?;

    window.run(&gl, event_loop, |_| {
        render_config.clear(&gl);
        if let Some(program) = &program {
            triangle.draw(program);
        }
    })?;
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
