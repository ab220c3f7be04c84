pub mod geometry;
pub mod mesh;
pub mod shaders;
pub mod texture;
pub mod transform;

pub use mesh::{Mesh, MeshError, VertexLayout};
pub use shaders::{ShaderError, ShaderProgram, ShaderSource};
pub use texture::{Texture, TextureError, TextureImage};
pub use transform::Transforms;
