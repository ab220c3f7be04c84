//! Thin, explicit wrapper over the slice of OpenGL these programs use.
//!
//! Every GPU resource in the crate borrows a [`GraphicsApi`] instead of calling
//! the global `gl::*` functions directly, so binding order is visible in the
//! code and the whole render path can run against [`fake::FakeGl`] in tests.

pub mod native;

#[cfg(test)]
pub(crate) mod fake;

use std::ffi::CStr;
use std::fmt;

pub use native::NativeGl;

/// Bytes reserved for a shader or program info log, terminator included.
pub const INFO_LOG_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// A resolved uniform location. Unknown names never produce one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask {
        color: true,
        depth: false,
    };
    pub const COLOR_AND_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

/// The OpenGL 3.3 core operations used by the tutorial programs.
///
/// Creation calls return `None` where GL would hand back object name 0.
pub trait GraphicsApi {
    // Shader stages
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle>;
    fn shader_source(&self, shader: ShaderHandle, source: &CStr);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    /// Reads at most `capacity - 1` bytes of the compile log.
    fn shader_info_log(&self, shader: ShaderHandle, capacity: usize) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    // Programs
    fn create_program(&self) -> Option<ProgramHandle>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    /// Reads at most `capacity - 1` bytes of the link log.
    fn program_info_log(&self, program: ProgramHandle, capacity: usize) -> String;
    fn delete_program(&self, program: ProgramHandle);
    fn use_program(&self, program: Option<ProgramHandle>);
    fn current_program(&self) -> Option<ProgramHandle>;

    // Uniforms, written to the current program
    fn uniform_location(&self, program: ProgramHandle, name: &CStr) -> Option<UniformLocation>;
    fn uniform_1i(&self, location: UniformLocation, value: i32);
    fn uniform_1f(&self, location: UniformLocation, value: f32);
    fn uniform_matrix_4f(&self, location: UniformLocation, columns: &[f32; 16]);

    // Vertex data
    fn create_vertex_array(&self) -> Option<VertexArrayHandle>;
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn create_buffer(&self) -> Option<BufferHandle>;
    fn bind_array_buffer(&self, buffer: Option<BufferHandle>);
    fn array_buffer_data(&self, data: &[f32]);
    fn delete_buffer(&self, buffer: BufferHandle);
    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: usize);
    fn enable_vertex_attrib_array(&self, location: u32);

    // Textures
    fn create_texture(&self) -> Option<TextureHandle>;
    fn active_texture(&self, unit: u32);
    fn bind_texture_2d(&self, texture: Option<TextureHandle>);
    /// Repeat wrapping on S/T and linear min/mag filtering on the bound texture.
    fn texture_2d_default_parameters(&self);
    fn texture_2d_image(&self, width: i32, height: i32, format: PixelFormat, pixels: &[u8]);
    fn generate_mipmap_2d(&self);
    fn delete_texture(&self, texture: TextureHandle);

    // Frame
    fn clear_color(&self, color: [f32; 4]);
    fn clear(&self, mask: ClearMask);
    fn enable_depth_test(&self);
    fn viewport(&self, width: i32, height: i32);
    fn draw_triangles(&self, first: i32, count: i32);
}
