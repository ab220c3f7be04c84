pub mod rendering;
pub mod window;

pub use rendering::RenderConfig;
pub use window::WindowConfig;
