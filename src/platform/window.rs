use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference, GetGlDisplay, GlDisplay};
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::GlWindow as _;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use std::ffi::{c_void, CString};
use std::num::NonZeroU32;
use std::ptr;
use std::time::{Duration, Instant};
use thiserror::Error;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::config::WindowConfig;
use crate::gl::{GraphicsApi, NativeGl};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("no OpenGL config offers a {depth_bits}-bit depth buffer")]
    NoConfig { depth_bits: u8 },
    #[error("OpenGL context error: {0}")]
    Context(#[from] glutin::error::Error),
}

/// Picks the candidate with the fewest samples; these programs never ask for
/// multisampling.
fn choose_config<C>(
    candidates: impl Iterator<Item = C>,
    samples: impl FnMut(&C) -> u8,
    depth_bits: u8,
) -> Result<C, WindowError> {
    candidates
        .min_by_key(samples)
        .ok_or(WindowError::NoConfig { depth_bits })
}

#[cfg(windows)]
fn display_preference(window: Option<&Window>) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(window.map(|w| w.raw_window_handle()))
}

#[cfg(target_os = "macos")]
fn display_preference(_window: Option<&Window>) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
fn display_preference(_window: Option<&Window>) -> DisplayApiPreference {
    DisplayApiPreference::EglThenGlx(Box::new(winit::platform::x11::register_xlib_error_hook))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Escape quits; every other key is ignored.
pub fn control_for_key(key: &Key, state: ElementState) -> Control {
    match (key, state) {
        (Key::Named(NamedKey::Escape), ElementState::Pressed) => Control::Exit,
        _ => Control::Continue,
    }
}

pub fn control_for_event(event: &WindowEvent) -> Control {
    match event {
        WindowEvent::CloseRequested => Control::Exit,
        WindowEvent::KeyboardInput { event, .. } => control_for_key(&event.logical_key, event.state),
        _ => Control::Continue,
    }
}

/// Per-frame timing and framebuffer size handed to the render callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub elapsed: Duration,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// A window with a current OpenGL context and its surface.
pub struct GlWindow {
    gl_context: PossiblyCurrentContext,
    gl_surface: Surface<WindowSurface>,
    window: Window,
}

impl GlWindow {
    pub fn new(config: &WindowConfig) -> Result<(Self, EventLoop<()>), WindowError> {
        log::info!("Initializing event loop");
        let event_loop = EventLoop::new()?;

        log::info!("Checking video modes");
        for (index, monitor) in event_loop.available_monitors().enumerate() {
            let size = monitor.size();
            match monitor.refresh_rate_millihertz() {
                Some(millihertz) => log::info!(
                    "Display #{} ({}): {}x{}px @ {}hz",
                    index,
                    monitor.name().unwrap_or_default(),
                    size.width,
                    size.height,
                    millihertz / 1000
                ),
                None => log::warn!("Could not get refresh rate for display #{}", index),
            }
        }

        let (major, minor) = config.gl_version;
        log::info!(
            "Requesting OpenGL {}.{} core context with a {}-bit depth buffer",
            major,
            minor,
            config.depth_bits
        );
        let window_builder = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);
        let template = ConfigTemplateBuilder::new().with_depth_size(config.depth_bits);

        // WGL needs a window before it can open a display; elsewhere the window
        // is created after the config so X11 can match its visual.
        #[cfg(windows)]
        let early_window = Some(window_builder.clone().build(&event_loop)?);
        #[cfg(not(windows))]
        let early_window: Option<Window> = None;
        #[cfg(windows)]
        let template = match &early_window {
            Some(window) => template.compatible_with_native_window(window.raw_window_handle()),
            None => template,
        };

        log::info!("Opening GL display");
        let gl_display = unsafe {
            Display::new(
                event_loop.raw_display_handle(),
                display_preference(early_window.as_ref()),
            )?
        };
        let candidates = unsafe { gl_display.find_configs(template.build())? };
        let gl_config = choose_config(
            candidates,
            |candidate| candidate.num_samples(),
            config.depth_bits,
        )?;

        log::info!("Creating window '{}'", config.title);
        let window = match early_window {
            Some(window) => window,
            None => glutin_winit::finalize_window(&event_loop, window_builder, &gl_config)?,
        };

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(GlProfile::Core)
            .build(Some(window.raw_window_handle()));

        log::info!("Creating OpenGL context");
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes)? };
        let attrs = window.build_surface_attributes(Default::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs)? };
        let gl_context = not_current.make_current(&gl_surface)?;

        if config.vsync {
            log::info!("Synchronizing with the display vsync");
            if let Err(err) =
                gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
            {
                log::warn!("Vsync unavailable: {}", err);
            }
        }

        log::info!("Finished window setup");
        Ok((
            Self {
                gl_context,
                gl_surface,
                window,
            },
            event_loop,
        ))
    }

    /// Loads GL entry points from the current context.
    pub fn load_gl(&self) -> NativeGl {
        let display = self.gl_context.display();
        let gl = NativeGl::load_with(|symbol| match CString::new(symbol) {
            Ok(symbol) => display.get_proc_address(symbol.as_c_str()) as *const c_void,
            Err(_) => ptr::null(),
        });
        match gl.version_string() {
            Some(version) => log::info!("OpenGL version: {}", version),
            None => log::warn!("Driver did not report an OpenGL version"),
        }
        gl
    }

    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn resize<G: GraphicsApi>(&self, gl: &G, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return;
        };
        self.gl_surface.resize(&self.gl_context, w, h);
        gl.viewport(width as i32, height as i32);
    }

    /// Runs the render loop until the window is closed or Escape is pressed.
    ///
    /// `frame` is called once per redraw, before the buffers are swapped.
    pub fn run<G, F>(&self, gl: &G, event_loop: EventLoop<()>, mut frame: F) -> Result<(), WindowError>
    where
        G: GraphicsApi,
        F: FnMut(&Frame),
    {
        let started = Instant::now();
        let (width, height) = self.size();
        gl.viewport(width as i32, height as i32);

        let mut swap_error = None;
        event_loop.run(|event, elwt| match event {
            Event::WindowEvent { event, .. } => {
                if control_for_event(&event) == Control::Exit {
                    log::info!("Quit requested");
                    elwt.exit();
                    return;
                }
                match event {
                    WindowEvent::Resized(size) => self.resize(gl, size.width, size.height),
                    WindowEvent::RedrawRequested => {
                        let (width, height) = self.size();
                        frame(&Frame {
                            elapsed: started.elapsed(),
                            width,
                            height,
                        });
                        if let Err(err) = self.gl_surface.swap_buffers(&self.gl_context) {
                            log::error!("Failed to swap buffers: {}", err);
                            swap_error = Some(err);
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => self.window.request_redraw(),
            _ => {}
        })?;

        match swap_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}
