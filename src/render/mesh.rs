use thiserror::Error;

use crate::gl::{BufferHandle, GraphicsApi, VertexArrayHandle};
use crate::render::shaders::ShaderProgram;

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("vertex data is empty")]
    Empty,
    #[error("{len} floats do not divide into vertices of {stride} floats")]
    Misaligned { len: usize, stride: usize },
    #[error("vertex layout has no attributes")]
    EmptyLayout,
    #[error("attribute {location} has {components} components, expected 1 to 4")]
    ComponentCount { location: u32, components: i32 },
    #[error("failed to create vertex array object")]
    CreateVertexArray,
    #[error("failed to create vertex buffer object")]
    CreateBuffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset_floats: usize,
}

/// Interleaved float attributes, bound to locations 0, 1, ... in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride_floats: usize,
}

impl VertexLayout {
    pub fn new(components: &[i32]) -> Self {
        let mut offset = 0;
        let attributes = components
            .iter()
            .enumerate()
            .map(|(location, &count)| {
                let attribute = VertexAttribute {
                    location: location as u32,
                    components: count,
                    offset_floats: offset,
                };
                offset += count.max(0) as usize;
                attribute
            })
            .collect();

        Self {
            attributes,
            stride_floats: offset,
        }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn stride_floats(&self) -> usize {
        self.stride_floats
    }

    pub fn stride_bytes(&self) -> usize {
        self.stride_floats * FLOAT_SIZE
    }
}

/// Static vertex data in its own vertex array and buffer.
pub struct Mesh<'gl, G: GraphicsApi> {
    gl: &'gl G,
    vertex_array: VertexArrayHandle,
    buffer: BufferHandle,
    vertex_count: i32,
}

impl<'gl, G: GraphicsApi> Mesh<'gl, G> {
    pub fn upload(gl: &'gl G, vertices: &[f32], layout: &VertexLayout) -> Result<Self, MeshError> {
        if let Some(bad) = layout
            .attributes()
            .iter()
            .find(|a| !(1..=4).contains(&a.components))
        {
            return Err(MeshError::ComponentCount {
                location: bad.location,
                components: bad.components,
            });
        }
        let stride = layout.stride_floats();
        if stride == 0 {
            return Err(MeshError::EmptyLayout);
        }
        if vertices.is_empty() {
            return Err(MeshError::Empty);
        }
        if vertices.len() % stride != 0 {
            return Err(MeshError::Misaligned {
                len: vertices.len(),
                stride,
            });
        }

        let vertex_array = gl.create_vertex_array().ok_or(MeshError::CreateVertexArray)?;
        let Some(buffer) = gl.create_buffer() else {
            gl.delete_vertex_array(vertex_array);
            return Err(MeshError::CreateBuffer);
        };

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_array_buffer(Some(buffer));
        gl.array_buffer_data(vertices);

        for attribute in layout.attributes() {
            gl.vertex_attrib_pointer(
                attribute.location,
                attribute.components,
                layout.stride_bytes() as i32,
                attribute.offset_floats * FLOAT_SIZE,
            );
            gl.enable_vertex_attrib_array(attribute.location);
        }

        // The attribute pointers keep the buffer reference, so both can be unbound.
        gl.bind_array_buffer(None);
        gl.bind_vertex_array(None);

        let vertex_count = (vertices.len() / stride) as i32;
        log::debug!(
            "Uploaded mesh with {} vertices (vao {}, vbo {})",
            vertex_count,
            vertex_array.0,
            buffer.0
        );

        Ok(Self {
            gl,
            vertex_array,
            buffer,
            vertex_count,
        })
    }

    /// Draws every vertex as triangles with `program`.
    pub fn draw(&self, program: &ShaderProgram<'_, G>) {
        program.set_used();
        self.gl.bind_vertex_array(Some(self.vertex_array));
        self.gl.draw_triangles(0, self.vertex_count);
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }
}

impl<G: GraphicsApi> Drop for Mesh<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.vertex_array);
        self.gl.delete_buffer(self.buffer);
    }
}
