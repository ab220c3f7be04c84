use gl::types::*;
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::ptr;

use super::{
    BufferHandle, ClearMask, GraphicsApi, PixelFormat, ProgramHandle, ShaderHandle,
    ShaderStage, TextureHandle, UniformLocation, VertexArrayHandle,
};

/// [`GraphicsApi`] over the global function pointers of the `gl` crate.
///
/// Only obtainable through [`NativeGl::load_with`], which must run while the
/// target context is current on this thread.
pub struct NativeGl {
    _loaded: (),
}

impl NativeGl {
    pub fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);
        Self { _loaded: () }
    }

    /// The driver's `GL_VERSION` string, if it reports one.
    pub fn version_string(&self) -> Option<String> {
        let raw = unsafe { gl::GetString(gl::VERSION) };
        if raw.is_null() {
            return None;
        }
        let version = unsafe { CStr::from_ptr(raw as *const c_char) };
        Some(version.to_string_lossy().into_owned())
    }
}

fn read_info_log(capacity: usize, fill: impl FnOnce(GLsizei, *mut GLsizei, *mut GLchar)) -> String {
    let mut buffer = vec![0u8; capacity.max(1)];
    let mut written: GLsizei = 0;
    fill(
        buffer.len() as GLsizei,
        &mut written as *mut GLsizei,
        buffer.as_mut_ptr() as *mut GLchar,
    );
    buffer.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}

fn object_or_none(id: GLuint) -> Option<GLuint> {
    (id != 0).then_some(id)
}

impl GraphicsApi for NativeGl {
    fn create_shader(&self, stage: ShaderStage) -> Option<ShaderHandle> {
        let kind = match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        };
        object_or_none(unsafe { gl::CreateShader(kind) }).map(ShaderHandle)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &CStr) {
        unsafe {
            gl::ShaderSource(shader.0, 1, &source.as_ptr(), ptr::null());
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        unsafe { gl::CompileShader(shader.0) }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        let mut success: GLint = 0;
        unsafe {
            gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, &mut success);
        }
        success != 0
    }

    fn shader_info_log(&self, shader: ShaderHandle, capacity: usize) -> String {
        read_info_log(capacity, |len, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader.0, len, written, buffer)
        })
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { gl::DeleteShader(shader.0) }
    }

    fn create_program(&self) -> Option<ProgramHandle> {
        object_or_none(unsafe { gl::CreateProgram() }).map(ProgramHandle)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe { gl::AttachShader(program.0, shader.0) }
    }

    fn link_program(&self, program: ProgramHandle) {
        unsafe { gl::LinkProgram(program.0) }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        let mut success: GLint = 0;
        unsafe {
            gl::GetProgramiv(program.0, gl::LINK_STATUS, &mut success);
        }
        success != 0
    }

    fn program_info_log(&self, program: ProgramHandle, capacity: usize) -> String {
        read_info_log(capacity, |len, written, buffer| unsafe {
            gl::GetProgramInfoLog(program.0, len, written, buffer)
        })
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { gl::DeleteProgram(program.0) }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe { gl::UseProgram(program.map_or(0, |p| p.0)) }
    }

    fn current_program(&self) -> Option<ProgramHandle> {
        let mut id: GLint = 0;
        unsafe {
            gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut id);
        }
        object_or_none(id as GLuint).map(ProgramHandle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &CStr) -> Option<UniformLocation> {
        let location = unsafe { gl::GetUniformLocation(program.0, name.as_ptr()) };
        (location >= 0).then_some(UniformLocation(location))
    }

    fn uniform_1i(&self, location: UniformLocation, value: i32) {
        unsafe { gl::Uniform1i(location.0, value) }
    }

    fn uniform_1f(&self, location: UniformLocation, value: f32) {
        unsafe { gl::Uniform1f(location.0, value) }
    }

    fn uniform_matrix_4f(&self, location: UniformLocation, columns: &[f32; 16]) {
        unsafe { gl::UniformMatrix4fv(location.0, 1, gl::FALSE, columns.as_ptr()) }
    }

    fn create_vertex_array(&self) -> Option<VertexArrayHandle> {
        let mut id: GLuint = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        object_or_none(id).map(VertexArrayHandle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe { gl::BindVertexArray(vertex_array.map_or(0, |v| v.0)) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe { gl::DeleteVertexArrays(1, &vertex_array.0) }
    }

    fn create_buffer(&self) -> Option<BufferHandle> {
        let mut id: GLuint = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        object_or_none(id).map(BufferHandle)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferHandle>) {
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, buffer.map_or(0, |b| b.0)) }
    }

    fn array_buffer_data(&self, data: &[f32]) {
        unsafe {
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(data) as GLsizeiptr,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { gl::DeleteBuffers(1, &buffer.0) }
    }

    fn vertex_attrib_pointer(&self, location: u32, components: i32, stride: i32, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(
                location,
                components,
                gl::FLOAT,
                gl::FALSE,
                stride,
                offset as *const c_void,
            );
        }
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        unsafe { gl::EnableVertexAttribArray(location) }
    }

    fn create_texture(&self) -> Option<TextureHandle> {
        let mut id: GLuint = 0;
        unsafe { gl::GenTextures(1, &mut id) };
        object_or_none(id).map(TextureHandle)
    }

    fn active_texture(&self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) }
    }

    fn bind_texture_2d(&self, texture: Option<TextureHandle>) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture.map_or(0, |t| t.0)) }
    }

    fn texture_2d_default_parameters(&self) {
        unsafe {
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
        }
    }

    fn texture_2d_image(&self, width: i32, height: i32, format: PixelFormat, pixels: &[u8]) {
        let gl_format = match format {
            PixelFormat::Rgb => gl::RGB,
            PixelFormat::Rgba => gl::RGBA,
        };
        unsafe {
            // RGB rows are not 4-byte aligned in general
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl_format as GLint,
                width,
                height,
                0,
                gl_format,
                gl::UNSIGNED_BYTE,
                pixels.as_ptr() as *const c_void,
            );
        }
    }

    fn generate_mipmap_2d(&self) {
        unsafe { gl::GenerateMipmap(gl::TEXTURE_2D) }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { gl::DeleteTextures(1, &texture.0) }
    }

    fn clear_color(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear(&self, mask: ClearMask) {
        let mut bits: GLbitfield = 0;
        if mask.color {
            bits |= gl::COLOR_BUFFER_BIT;
        }
        if mask.depth {
            bits |= gl::DEPTH_BUFFER_BIT;
        }
        unsafe { gl::Clear(bits) }
    }

    fn enable_depth_test(&self) {
        unsafe { gl::Enable(gl::DEPTH_TEST) }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { gl::Viewport(0, 0, width, height) }
    }

    fn draw_triangles(&self, first: i32, count: i32) {
        unsafe { gl::DrawArrays(gl::TRIANGLES, first, count) }
    }
}
