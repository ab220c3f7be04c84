use glam::{Mat4, Vec3};

pub const FOV_Y_DEGREES: f32 = 45.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -3.0);
pub const ROTATION_AXIS: Vec3 = Vec3::new(0.5, 1.0, 0.0);

/// Model, view and projection matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Transforms {
    /// The cube turns one radian per second around [`ROTATION_AXIS`], three
    /// units in front of the camera.
    pub fn spinning_cube(seconds: f32, aspect: f32) -> Self {
        Self {
            model: Mat4::from_axis_angle(ROTATION_AXIS.normalize(), seconds),
            view: Mat4::from_translation(CAMERA_OFFSET),
            projection: Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR),
        }
    }
}

/// Width over height, or `fallback` while the framebuffer has no area.
pub fn aspect_ratio(width: u32, height: u32, fallback: f32) -> f32 {
    if width == 0 || height == 0 {
        fallback
    } else {
        width as f32 / height as f32
    }
}
