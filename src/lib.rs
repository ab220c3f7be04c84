pub mod config;
pub mod gl;
pub mod platform;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use config::{RenderConfig, WindowConfig};
pub use gl::{GraphicsApi, NativeGl};
pub use platform::{Frame, GlWindow, WindowError};
pub use render::{Mesh, ShaderProgram, ShaderSource, Texture, Transforms};
