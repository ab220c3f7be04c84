// shaders.rs - Shader program build, link and uniform upload

use glam::Mat4;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CString, NulError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::gl::{
    GraphicsApi, ProgramHandle, ShaderHandle, ShaderStage, UniformLocation, INFO_LOG_CAPACITY,
};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} shader source is empty")]
    EmptySource { stage: ShaderStage },
    #[error("{stage} shader source contains a nul byte: {source}")]
    Nul {
        stage: ShaderStage,
        #[source]
        source: NulError,
    },
    #[error("failed to read {stage} shader {}: {source}", .path.display())]
    Io {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create {stage} shader object")]
    CreateShader { stage: ShaderStage },
    #[error("failed to create program object")]
    CreateProgram,
    #[error("{stage} shader compilation failed: {log}")]
    Compilation { stage: ShaderStage, log: String },
    #[error("program linking failed: {log}")]
    Linking { log: String },
}

impl ShaderError {
    /// The stage at fault, or `None` for program-level failures.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            ShaderError::EmptySource { stage }
            | ShaderError::Nul { stage, .. }
            | ShaderError::Io { stage, .. }
            | ShaderError::CreateShader { stage }
            | ShaderError::Compilation { stage, .. } => Some(*stage),
            ShaderError::CreateProgram | ShaderError::Linking { .. } => None,
        }
    }
}

/// Vertex and fragment source text for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    vertex: String,
    fragment: String,
}

impl ShaderSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn from_files(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let read = |stage: ShaderStage, path: &Path| {
            fs::read_to_string(path).map_err(|source| ShaderError::Io {
                stage,
                path: path.to_path_buf(),
                source,
            })
        };
        Ok(Self {
            vertex: read(ShaderStage::Vertex, vertex_path.as_ref())?,
            fragment: read(ShaderStage::Fragment, fragment_path.as_ref())?,
        })
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

/// A compiled stage object, deleted when it goes out of scope.
struct CompiledStage<'gl, G: GraphicsApi> {
    gl: &'gl G,
    handle: ShaderHandle,
}

impl<'gl, G: GraphicsApi> CompiledStage<'gl, G> {
    fn compile(gl: &'gl G, stage: ShaderStage, source: &str) -> Result<Self, ShaderError> {
        if source.trim().is_empty() {
            return Err(ShaderError::EmptySource { stage });
        }
        let source = CString::new(source).map_err(|source| ShaderError::Nul { stage, source })?;

        let handle = gl
            .create_shader(stage)
            .ok_or(ShaderError::CreateShader { stage })?;
        let compiled = Self { gl, handle };

        gl.shader_source(handle, &source);
        gl.compile_shader(handle);

        if !gl.shader_compile_status(handle) {
            let log = gl.shader_info_log(handle, INFO_LOG_CAPACITY);
            return Err(ShaderError::Compilation {
                stage,
                log: describe_log(log),
            });
        }

        log::debug!("Compiled {} shader {}", stage, handle.0);
        Ok(compiled)
    }
}

impl<G: GraphicsApi> Drop for CompiledStage<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.handle);
    }
}

fn describe_log(log: String) -> String {
    if log.trim().is_empty() {
        "driver returned no diagnostic".to_string()
    } else {
        log
    }
}

/// A linked GPU program bound to the context that created it.
///
/// Construction either yields a usable program or a [`ShaderError`]; there is
/// no half-built state to draw with. The program object is deleted on drop.
pub struct ShaderProgram<'gl, G: GraphicsApi> {
    gl: &'gl G,
    handle: ProgramHandle,
    uniforms: RefCell<HashMap<String, Option<UniformLocation>>>,
}

impl<'gl, G: GraphicsApi> ShaderProgram<'gl, G> {
    pub fn build(gl: &'gl G, source: &ShaderSource) -> Result<Self, ShaderError> {
        let vertex = CompiledStage::compile(gl, ShaderStage::Vertex, source.vertex())?;
        let fragment = CompiledStage::compile(gl, ShaderStage::Fragment, source.fragment())?;

        let handle = gl.create_program().ok_or(ShaderError::CreateProgram)?;
        let program = Self {
            gl,
            handle,
            uniforms: RefCell::new(HashMap::new()),
        };

        gl.attach_shader(handle, vertex.handle);
        gl.attach_shader(handle, fragment.handle);
        gl.link_program(handle);

        // Stage objects are released here whether or not the link succeeded.
        drop(vertex);
        drop(fragment);

        if !gl.program_link_status(handle) {
            let log = gl.program_info_log(handle, INFO_LOG_CAPACITY);
            return Err(ShaderError::Linking {
                log: describe_log(log),
            });
        }

        log::debug!("Linked shader program {}", handle.0);
        Ok(program)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Makes this the active program for subsequent draws.
    pub fn set_used(&self) {
        self.gl.use_program(Some(self.handle));
    }

    /// Checks for an active uniform without logging when it is absent.
    pub fn has_uniform(&self, name: &str) -> bool {
        if let Some(location) = self.uniforms.borrow().get(name) {
            return location.is_some();
        }
        CString::new(name)
            .ok()
            .and_then(|cname| self.gl.uniform_location(self.handle, &cname))
            .is_some()
    }

    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.uniforms.borrow().get(name) {
            return *location;
        }

        let location = CString::new(name)
            .ok()
            .and_then(|cname| self.gl.uniform_location(self.handle, &cname));

        if location.is_none() {
            log::warn!("Uniform '{}' not found in shader program {}", name, self.handle.0);
        }

        self.uniforms.borrow_mut().insert(name.to_string(), location);
        location
    }

    // Uniform setters. Each one makes this program current first, since GL
    // writes uniforms to whichever program is in use.
    pub fn set_int(&self, name: &str, value: i32) {
        self.set_used();
        if let Some(location) = self.uniform_location(name) {
            self.gl.uniform_1i(location, value);
        }
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_used();
        if let Some(location) = self.uniform_location(name) {
            self.gl.uniform_1f(location, value);
        }
    }

    pub fn set_mat4(&self, name: &str, matrix: &Mat4) {
        self.set_used();
        if let Some(location) = self.uniform_location(name) {
            self.gl.uniform_matrix_4f(location, &matrix.to_cols_array());
        }
    }
}

impl<G: GraphicsApi> Drop for ShaderProgram<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_program(self.handle);
    }
}

impl<G: GraphicsApi> std::fmt::Debug for ShaderProgram<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Inline sources for the hello-triangle program.
pub mod triangle_shaders {
    pub const VERTEX_SRC: &str = r#"#version 330 core
layout (location = 0) in vec3 aPos;
void main()
{
   gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
"#;

    pub const FRAGMENT_SRC: &str = r#"#version 330 core
out vec4 FragColor;
void main()
{
   FragColor = vec4(1.0f, 0.5f, 0.2f, 1.0f);
}
"#;
}
