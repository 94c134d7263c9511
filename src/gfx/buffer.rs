//! # Geometry Buffers
//!
//! [`BufferObject`] owns the vertex array / vertex buffer / index buffer triple
//! for one mesh. Setup happens through a [`VertexArrayBinding`], a scope guard
//! that keeps the vertex array bound and unbinds it when dropped, on every exit
//! path.
//!
//! ```no_run
//! use fragtoy::gfx::buffer::{BufferObject, QuadVertex, FULLSCREEN_QUAD, QUAD_INDICES};
//! # fn setup(gl: &dyn fragtoy::gfx::backend::GpuBackend) -> Result<(), fragtoy::gfx::buffer::BufferError> {
//! let quad = BufferObject::generate(gl)?;
//! {
//!     let bound = quad.bind(gl);
//!     bound.upload_vertices(&FULLSCREEN_QUAD);
//!     bound.upload_indices(&QUAD_INDICES);
//!     QuadVertex::describe(&bound);
//! }
//! quad.draw_indexed(gl, QUAD_INDICES.len() as i32);
//! # Ok(())
//! # }
//! ```

use std::mem;

use thiserror::Error;

use super::backend::{BufferTarget, GlHandle, GpuBackend};

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("failed to allocate {what}: {message}")]
    Allocation { what: &'static str, message: String },
}

/// Vertex layout of the full-screen quad: position then texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const STRIDE: i32 = mem::size_of::<QuadVertex>() as i32;

    /// Attribute 0: vec3 position, attribute 1: vec2 uv
    pub fn describe(binding: &VertexArrayBinding<'_>) {
        binding.describe_attribute(0, 3, Self::STRIDE, 0);
        binding.describe_attribute(1, 2, Self::STRIDE, mem::size_of::<[f32; 3]>() as i32);
    }
}

/// Two triangles covering clip space, uv (0,0) at the bottom left
pub const FULLSCREEN_QUAD: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0, 1.0, 0.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, 1.0, 0.0], uv: [1.0, 1.0] },
    QuadVertex { position: [1.0, -1.0, 0.0], uv: [1.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0, 0.0], uv: [0.0, 0.0] },
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Vertex array + vertex buffer + index buffer.
///
/// Indices are always `u32` triangle lists and attributes are always floats.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferObject {
    vertex_array: GlHandle,
    vertex_buffer: GlHandle,
    index_buffer: GlHandle,
}

impl BufferObject {
    /// Allocates the three GPU objects. Anything allocated before a failure is freed.
    pub fn generate(gl: &dyn GpuBackend) -> Result<Self, BufferError> {
        let vertex_array = gl.create_vertex_array().map_err(|message| BufferError::Allocation {
            what: "vertex array",
            message,
        })?;

        let vertex_buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(message) => {
                gl.delete_vertex_array(vertex_array);
                return Err(BufferError::Allocation {
                    what: "vertex buffer",
                    message,
                });
            }
        };

        let index_buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(message) => {
                gl.delete_buffer(vertex_buffer);
                gl.delete_vertex_array(vertex_array);
                return Err(BufferError::Allocation {
                    what: "index buffer",
                    message,
                });
            }
        };

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
        })
    }

    pub fn vertex_array(&self) -> GlHandle {
        self.vertex_array
    }

    pub fn is_released(&self) -> bool {
        self.vertex_array == 0
    }

    /// Binds the vertex array until the returned guard is dropped
    pub fn bind<'a>(&self, gl: &'a dyn GpuBackend) -> VertexArrayBinding<'a> {
        gl.bind_vertex_array(self.vertex_array);
        VertexArrayBinding {
            gl,
            vertex_buffer: self.vertex_buffer,
            index_buffer: self.index_buffer,
        }
    }

    /// Non-indexed draw of `count` vertices starting at `start_index`
    pub fn draw_triangles(&self, gl: &dyn GpuBackend, count: i32, start_index: i32) {
        if self.is_released() {
            log::warn!("draw_triangles on a released buffer object");
            return;
        }
        let _bound = self.bind(gl);
        gl.draw_arrays_triangles(start_index, count);
    }

    /// Indexed draw of the first `index_count` indices
    pub fn draw_indexed(&self, gl: &dyn GpuBackend, index_count: i32) {
        if self.is_released() {
            log::warn!("draw_indexed on a released buffer object");
            return;
        }
        let _bound = self.bind(gl);
        gl.draw_elements_triangles_u32(index_count, 0);
    }

    /// Frees all three objects. Later calls do nothing.
    pub fn release(&mut self, gl: &dyn GpuBackend) {
        if self.is_released() {
            return;
        }
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_buffer(self.vertex_buffer);
        gl.delete_buffer(self.index_buffer);
        self.vertex_array = 0;
        self.vertex_buffer = 0;
        self.index_buffer = 0;
    }
}

/// Scope guard for a bound vertex array.
///
/// Uploads and attribute declarations go through the guard so they can only
/// happen while the array is bound. Dropping it unbinds the vertex buffer and
/// then the vertex array; the index buffer binding is part of the vertex array
/// state and is left alone.
pub struct VertexArrayBinding<'a> {
    gl: &'a dyn GpuBackend,
    vertex_buffer: GlHandle,
    index_buffer: GlHandle,
}

impl VertexArrayBinding<'_> {
    /// Replaces the whole vertex buffer with `vertices`
    pub fn upload_vertices<T: bytemuck::Pod>(&self, vertices: &[T]) {
        self.gl.bind_buffer(BufferTarget::Array, self.vertex_buffer);
        self.gl
            .buffer_data_static(BufferTarget::Array, bytemuck::cast_slice(vertices));
    }

    /// Replaces the whole index buffer with `indices`
    pub fn upload_indices(&self, indices: &[u32]) {
        self.gl
            .bind_buffer(BufferTarget::ElementArray, self.index_buffer);
        self.gl
            .buffer_data_static(BufferTarget::ElementArray, bytemuck::cast_slice(indices));
    }

    /// Declares float attribute `slot` with `components` values per vertex
    pub fn describe_attribute(&self, slot: u32, components: i32, stride: i32, byte_offset: i32) {
        self.gl.enable_vertex_attrib_array(slot);
        self.gl
            .vertex_attrib_pointer_f32(slot, components, stride, byte_offset);
    }
}

impl Drop for VertexArrayBinding<'_> {
    fn drop(&mut self) {
        self.gl.bind_buffer(BufferTarget::Array, 0);
        self.gl.bind_vertex_array(0);
    }
}
