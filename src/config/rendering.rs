use crate::gl::{ClearMask, GraphicsApi};

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    pub depth_test: bool,
}

impl RenderConfig {
    /// Settings for programs that draw 3D geometry.
    pub fn with_depth_test() -> Self {
        Self {
            depth_test: true,
            ..Self::default()
        }
    }

    /// One-time state set up after the context is loaded.
    pub fn apply<G: GraphicsApi>(&self, gl: &G) {
        gl.clear_color(self.clear_color);
        if self.depth_test {
            gl.enable_depth_test();
        }
    }

    pub fn clear_mask(&self) -> ClearMask {
        if self.depth_test {
            ClearMask::COLOR_AND_DEPTH
        } else {
            ClearMask::COLOR
        }
    }

    pub fn clear<G: GraphicsApi>(&self, gl: &G) {
        gl.clear(self.clear_mask());
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.2, 0.3, 0.3, 1.0],
            depth_test: false,
        }
    }
}
