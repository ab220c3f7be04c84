use anyhow::{Context, Result};
use gl_tutorials::render::geometry::{cube_layout, CUBE_VERTICES};
use gl_tutorials::render::transform::aspect_ratio;
use gl_tutorials::utils::logging;
use gl_tutorials::{
    GlWindow, GraphicsApi, Mesh, RenderConfig, ShaderProgram, ShaderSource, Texture, Transforms,
    WindowConfig,
};
use log::{error, info, LevelFilter};
use std::path::Path;
use std::process::ExitCode;

const VERTEX_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/coordinate_systems.vert");
const FRAGMENT_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/coordinate_systems.frag");
const TEXTURE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/textures");

fn load_program<G: GraphicsApi>(gl: &G) -> Option<ShaderProgram<'_, G>> {
    let program = ShaderSource::from_files(VERTEX_PATH, FRAGMENT_PATH)
        .and_then(|source| ShaderProgram::build(gl, &source));
    match program {
        Ok(program) => Some(program),
        Err(err) => {
            error!("Cube shader unavailable, nothing will be drawn: {}", err);
            None
        }
    }
}

fn load_texture<'gl, G: GraphicsApi>(gl: &'gl G, name: &str) -> Option<Texture<'gl, G>> {
    match Texture::from_file(gl, Path::new(TEXTURE_DIR).join(name)) {
        Ok(texture) => Some(texture),
        Err(err) => {
            error!("{}", err);
            None
        }
    }
}

fn run() -> Result<()> {
    let window_config = WindowConfig::titled("Coordinate Systems");
    let (window, event_loop) = GlWindow::new(&window_config).context("failed to set up window")?;
    let gl = window.load_gl();

    let render_config = RenderConfig::with_depth_test();
    render_config.apply(&gl);

    let program = load_program(&gl);
    let cube = Mesh::upload(&gl, &CUBE_VERTICES, &cube_layout()).context("failed to upload cube")?;
    let container = load_texture(&gl, "container.png");
    let face = load_texture(&gl, "awesomeface.png");

    if let Some(program) = &program {
        program.set_int("texture1", 0);
        program.set_int("texture2", 1);
    }

    let fallback_aspect = window_config.aspect_ratio();
    window.run(&gl, event_loop, |frame| {
        render_config.clear(&gl);

        if let Some(texture) = &container {
            texture.bind(0);
        }
        if let Some(texture) = &face {
            texture.bind(1);
        }

        let Some(program) = &program else {
            return;
        };
        let aspect = aspect_ratio(frame.width, frame.height, fallback_aspect);
        let transforms = Transforms::spinning_cube(frame.seconds(), aspect);
        program.set_mat4("model", &transforms.model);
        program.set_mat4("view", &transforms.view);
        program.set_mat4("projection", &transforms.projection);
        cube.draw(program);
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
