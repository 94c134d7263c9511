use std::{num::NonZeroU32, rc::Rc};

use glow::HasContext;

use super::{BufferTarget, GlHandle, GpuBackend, PolygonMode, ShaderStage};

/// [`GpuBackend`] over a live `glow` context.
///
/// The context is shared with the UI renderer, hence the `Rc`. All calls must
/// happen on the thread that made the context current.
#[derive(Clone)]
pub struct GlowBackend {
    gl: Rc<glow::Context>,
}

impl GlowBackend {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl: Rc::new(gl) }
    }

    /// The raw context, for collaborators that draw with glow directly
    pub fn context(&self) -> &Rc<glow::Context> {
        &self.gl
    }
}

fn name(handle: GlHandle) -> Option<NonZeroU32> {
    NonZeroU32::new(handle)
}

fn shader(handle: GlHandle) -> Option<glow::NativeShader> {
    name(handle).map(glow::NativeShader)
}

fn program(handle: GlHandle) -> Option<glow::NativeProgram> {
    name(handle).map(glow::NativeProgram)
}

fn location(handle: GlHandle) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(handle)
}

fn target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

impl GpuBackend for GlowBackend {
    fn create_shader(&self, stage: ShaderStage) -> Result<GlHandle, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind).map(|s| s.0.get()) }
    }

    fn compile_shader(&self, handle: GlHandle, source: &str) {
        if let Some(s) = shader(handle) {
            unsafe {
                self.gl.shader_source(s, source);
                self.gl.compile_shader(s);
            }
        }
    }

    fn shader_compile_status(&self, handle: GlHandle) -> bool {
        shader(handle).is_some_and(|s| unsafe { self.gl.get_shader_compile_status(s) })
    }

    fn shader_info_log(&self, handle: GlHandle) -> String {
        shader(handle)
            .map(|s| unsafe { self.gl.get_shader_info_log(s) })
            .unwrap_or_default()
    }

    fn delete_shader(&self, handle: GlHandle) {
        if let Some(s) = shader(handle) {
            unsafe { self.gl.delete_shader(s) }
        }
    }

    fn create_program(&self) -> Result<GlHandle, String> {
        unsafe { self.gl.create_program().map(|p| p.0.get()) }
    }

    fn attach_shader(&self, prog: GlHandle, handle: GlHandle) {
        if let (Some(p), Some(s)) = (program(prog), shader(handle)) {
            unsafe { self.gl.attach_shader(p, s) }
        }
    }

    fn link_program(&self, prog: GlHandle) {
        if let Some(p) = program(prog) {
            unsafe { self.gl.link_program(p) }
        }
    }

    fn program_link_status(&self, prog: GlHandle) -> bool {
        program(prog).is_some_and(|p| unsafe { self.gl.get_program_link_status(p) })
    }

    fn program_info_log(&self, prog: GlHandle) -> String {
        program(prog)
            .map(|p| unsafe { self.gl.get_program_info_log(p) })
            .unwrap_or_default()
    }

    fn use_program(&self, prog: GlHandle) {
        unsafe { self.gl.use_program(program(prog)) }
    }

    fn delete_program(&self, prog: GlHandle) {
        if let Some(p) = program(prog) {
            unsafe { self.gl.delete_program(p) }
        }
    }

    fn uniform_location(&self, prog: GlHandle, uniform: &str) -> Option<GlHandle> {
        let p = program(prog)?;
        unsafe { self.gl.get_uniform_location(p, uniform).map(|l| l.0) }
    }

    fn uniform_1_i32(&self, loc: GlHandle, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&location(loc)), value) }
    }

    fn uniform_1_f32(&self, loc: GlHandle, value: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&location(loc)), value) }
    }

    fn uniform_2_f32(&self, loc: GlHandle, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(Some(&location(loc)), x, y) }
    }

    fn uniform_3_f32(&self, loc: GlHandle, x: f32, y: f32, z: f32) {
        unsafe { self.gl.uniform_3_f32(Some(&location(loc)), x, y, z) }
    }

    fn uniform_4_f32(&self, loc: GlHandle, x: f32, y: f32, z: f32, w: f32) {
        unsafe { self.gl.uniform_4_f32(Some(&location(loc)), x, y, z, w) }
    }

    fn uniform_matrix_2_f32(&self, loc: GlHandle, value: &[f32; 4]) {
        unsafe {
            self.gl
                .uniform_matrix_2_f32_slice(Some(&location(loc)), false, value)
        }
    }

    fn uniform_matrix_3_f32(&self, loc: GlHandle, value: &[f32; 9]) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(&location(loc)), false, value)
        }
    }

    fn uniform_matrix_4_f32(&self, loc: GlHandle, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location(loc)), false, value)
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn create_texture_rgba8(&self, width: u32, height: u32, pixels: &[u8]) -> Result<GlHandle, String> {
        unsafe {
            let texture = self.gl.create_texture()?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(texture.0.get())
        }
    }

    fn bind_texture_2d(&self, texture: GlHandle) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, name(texture).map(glow::NativeTexture))
        }
    }

    fn delete_texture(&self, texture: GlHandle) {
        if let Some(t) = name(texture) {
            unsafe { self.gl.delete_texture(glow::NativeTexture(t)) }
        }
    }

    fn create_vertex_array(&self) -> Result<GlHandle, String> {
        unsafe { self.gl.create_vertex_array().map(|v| v.0.get()) }
    }

    fn create_buffer(&self) -> Result<GlHandle, String> {
        unsafe { self.gl.create_buffer().map(|b| b.0.get()) }
    }

    fn bind_vertex_array(&self, vertex_array: GlHandle) {
        unsafe {
            self.gl
                .bind_vertex_array(name(vertex_array).map(glow::NativeVertexArray))
        }
    }

    fn bind_buffer(&self, buffer_target: BufferTarget, buffer: GlHandle) {
        unsafe {
            self.gl
                .bind_buffer(target(buffer_target), name(buffer).map(glow::NativeBuffer))
        }
    }

    fn buffer_data_static(&self, buffer_target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(target(buffer_target), data, glow::STATIC_DRAW)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, glow::FLOAT, false, stride, offset)
        }
    }

    fn draw_arrays_triangles(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }

    fn draw_elements_triangles_u32(&self, count: i32, offset: i32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, offset)
        }
    }

    fn delete_vertex_array(&self, vertex_array: GlHandle) {
        if let Some(v) = name(vertex_array) {
            unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(v)) }
        }
    }

    fn delete_buffer(&self, buffer: GlHandle) {
        if let Some(b) = name(buffer) {
            unsafe { self.gl.delete_buffer(glow::NativeBuffer(b)) }
        }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        unsafe { self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]) }
    }

    fn clear(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) }
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Point => glow::POINT,
            PolygonMode::Line => glow::LINE,
            PolygonMode::Fill => glow::FILL,
        };
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn enable_depth_test(&self) {
        unsafe { self.gl.enable(glow::DEPTH_TEST) }
    }
}
