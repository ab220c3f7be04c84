pub mod window;

pub use window::{control_for_event, control_for_key, Control, Frame, GlWindow, WindowError};
