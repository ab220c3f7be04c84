#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Requested OpenGL core profile version (major, minor).
    pub gl_version: (u8, u8),
    pub depth_bits: u8,
    pub vsync: bool,
    pub resizable: bool,
}

impl WindowConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "OpenGL".to_string(),
            width: 800,
            height: 600,
            gl_version: (3, 3),
            depth_bits: 24,
            vsync: true,
            resizable: true,
        }
    }
}
