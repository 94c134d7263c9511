//! # GPU Backend
//!
//! The OpenGL command surface consumed by programs, buffers and textures.
//!
//! Handles are plain `u32` names with `0` meaning "no object", exactly as the
//! driver reports them. Keeping the trait object-safe lets the core take a
//! `&dyn GpuBackend`: [`GlowBackend`] forwards to a live context, while the
//! test-only recording backend captures every call for replay assertions.

mod glow_backend;
#[cfg(test)]
pub mod recording;

pub use glow_backend::GlowBackend;

/// A GL object name. `0` is never a valid object.
pub type GlHandle = u32;

/// Programmable stage a shader object is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Buffer binding points used by the buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex data (`GL_ARRAY_BUFFER`)
    Array,
    /// Index data (`GL_ELEMENT_ARRAY_BUFFER`)
    ElementArray,
}

/// Rasterization mode for front and back faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    Point,
    Line,
    #[default]
    Fill,
}

impl PolygonMode {
    pub const ALL: [PolygonMode; 3] = [PolygonMode::Point, PolygonMode::Line, PolygonMode::Fill];

    pub fn label(self) -> &'static str {
        match self {
            PolygonMode::Point => "Point",
            PolygonMode::Line => "Line",
            PolygonMode::Fill => "Fill",
        }
    }
}

/// The subset of OpenGL the shader toy issues.
///
/// Fallible object creation returns the driver's message on failure. Every
/// other call mirrors a single GL entry point and reports nothing; status and
/// info-log queries are separate calls, as in GL itself.
pub trait GpuBackend {
    // Shaders and programs
    fn create_shader(&self, stage: ShaderStage) -> Result<GlHandle, String>;
    /// Uploads `source` and compiles it
    fn compile_shader(&self, shader: GlHandle, source: &str);
    fn shader_compile_status(&self, shader: GlHandle) -> bool;
    fn shader_info_log(&self, shader: GlHandle) -> String;
    fn delete_shader(&self, shader: GlHandle);

    fn create_program(&self) -> Result<GlHandle, String>;
    fn attach_shader(&self, program: GlHandle, shader: GlHandle);
    fn link_program(&self, program: GlHandle);
    fn program_link_status(&self, program: GlHandle) -> bool;
    fn program_info_log(&self, program: GlHandle) -> String;
    /// Binds `program`; `0` unbinds
    fn use_program(&self, program: GlHandle);
    fn delete_program(&self, program: GlHandle);

    // Uniforms
    fn uniform_location(&self, program: GlHandle, name: &str) -> Option<GlHandle>;
    fn uniform_1_i32(&self, location: GlHandle, value: i32);
    fn uniform_1_f32(&self, location: GlHandle, value: f32);
    fn uniform_2_f32(&self, location: GlHandle, x: f32, y: f32);
    fn uniform_3_f32(&self, location: GlHandle, x: f32, y: f32, z: f32);
    fn uniform_4_f32(&self, location: GlHandle, x: f32, y: f32, z: f32, w: f32);
    /// Column-major, never transposed
    fn uniform_matrix_2_f32(&self, location: GlHandle, value: &[f32; 4]);
    fn uniform_matrix_3_f32(&self, location: GlHandle, value: &[f32; 9]);
    fn uniform_matrix_4_f32(&self, location: GlHandle, value: &[f32; 16]);

    // Textures
    /// Selects texture unit `GL_TEXTURE0 + unit`
    fn active_texture(&self, unit: u32);
    fn create_texture_rgba8(&self, width: u32, height: u32, pixels: &[u8]) -> Result<GlHandle, String>;
    fn bind_texture_2d(&self, texture: GlHandle);
    fn delete_texture(&self, texture: GlHandle);

    // Geometry
    fn create_vertex_array(&self) -> Result<GlHandle, String>;
    fn create_buffer(&self) -> Result<GlHandle, String>;
    fn bind_vertex_array(&self, vertex_array: GlHandle);
    fn bind_buffer(&self, target: BufferTarget, buffer: GlHandle);
    /// Replaces the contents of the buffer bound at `target` (static usage)
    fn buffer_data_static(&self, target: BufferTarget, data: &[u8]);
    fn enable_vertex_attrib_array(&self, index: u32);
    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);
    fn draw_arrays_triangles(&self, first: i32, count: i32);
    /// Indexed triangle list of `u32` indices starting `offset` bytes into the index buffer
    fn draw_elements_triangles_u32(&self, count: i32, offset: i32);
    fn delete_vertex_array(&self, vertex_array: GlHandle);
    fn delete_buffer(&self, buffer: GlHandle);

    // Frame state
    fn clear_color(&self, rgba: [f32; 4]);
    /// Clears color and depth
    fn clear(&self);
    fn polygon_mode(&self, mode: PolygonMode);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn enable_depth_test(&self);
}
