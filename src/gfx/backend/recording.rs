//! Record-replay backend for tests.
//!
//! Every call is appended to a log that tests inspect afterwards. Shader
//! compilation is simulated: a stage compiles when it declares `void main` and
//! its braces balance. A program links when exactly one compiled vertex stage
//! and one compiled fragment stage are attached, and every fragment `in` has a
//! vertex `out` of the same name. Uniform locations are handed
//! out for names whose root identifier is declared as a `uniform`.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use super::{BufferTarget, GlHandle, GpuBackend, PolygonMode, ShaderStage};

#[derive(Debug, Clone, PartialEq)]
pub enum UniformWrite {
    I32(i32),
    F32(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderStage, GlHandle),
    CompileShader(GlHandle),
    DeleteShader(GlHandle),
    CreateProgram(GlHandle),
    AttachShader(GlHandle, GlHandle),
    LinkProgram(GlHandle),
    UseProgram(GlHandle),
    DeleteProgram(GlHandle),
    UniformLocation(GlHandle, String, Option<GlHandle>),
    Uniform(GlHandle, UniformWrite),
    ActiveTexture(u32),
    CreateTexture(GlHandle, u32, u32),
    BindTexture(GlHandle),
    DeleteTexture(GlHandle),
    CreateVertexArray(GlHandle),
    CreateBuffer(GlHandle),
    BindVertexArray(GlHandle),
    BindBuffer(BufferTarget, GlHandle),
    BufferData(BufferTarget, Vec<u8>),
    EnableAttrib(u32),
    AttribPointer { index: u32, size: i32, stride: i32, offset: i32 },
    DrawArrays { first: i32, count: i32 },
    DrawElements { count: i32, offset: i32 },
    DeleteVertexArray(GlHandle),
    DeleteBuffer(GlHandle),
    ClearColor([f32; 4]),
    Clear,
    PolygonMode(PolygonMode),
    Viewport(i32, i32, i32, i32),
    EnableDepthTest,
}

#[derive(Default)]
struct ShaderRecord {
    stage: Option<ShaderStage>,
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct ProgramRecord {
    attached: Vec<GlHandle>,
    linked: bool,
    link_log: String,
    declared: HashSet<String>,
    locations: HashMap<String, GlHandle>,
}

#[derive(Default)]
struct State {
    calls: Vec<GlCall>,
    next_name: GlHandle,
    shaders: HashMap<GlHandle, ShaderRecord>,
    programs: HashMap<GlHandle, ProgramRecord>,
    fail_object_creation: bool,
}

impl State {
    fn gen_name(&mut self) -> GlHandle {
        self.next_name += 1;
        self.next_name
    }
}

#[derive(Default)]
pub struct RecordingBackend {
    state: RefCell<State>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `create_*` call fail, as a lost context would
    pub fn failing_object_creation() -> Self {
        let backend = Self::default();
        backend.state.borrow_mut().fail_object_creation = true;
        backend
    }

    /// From now on every `create_*` call fails; objects made earlier survive
    pub fn lose_context(&self) {
        self.state.borrow_mut().fail_object_creation = true;
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// `(location, value)` for every uniform write, in order
    pub fn uniform_writes(&self) -> Vec<(GlHandle, UniformWrite)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                GlCall::Uniform(location, value) => Some((*location, value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. }))
            .cloned()
            .collect()
    }

    /// Programs created and not yet deleted
    pub fn live_programs(&self) -> Vec<GlHandle> {
        let mut live: Vec<_> = self.state.borrow().programs.keys().copied().collect();
        live.sort_unstable();
        live
    }

    pub fn live_shaders(&self) -> Vec<GlHandle> {
        let mut live: Vec<_> = self.state.borrow().shaders.keys().copied().collect();
        live.sort_unstable();
        live
    }

    pub fn is_linked(&self, program: GlHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn create_object(&self, make: impl FnOnce(GlHandle) -> GlCall) -> Result<GlHandle, String> {
        let mut state = self.state.borrow_mut();
        if state.fail_object_creation {
            return Err("context lost".to_string());
        }
        let handle = state.gen_name();
        state.calls.push(make(handle));
        Ok(handle)
    }
}

fn compiles(source: &str) -> bool {
    let mut depth = 0i32;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0 && source.contains("void main")
}

/// Identifiers declared by `uniform <type> <name>;` lines
fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    declarations(source, "uniform")
}

/// Identifiers declared by `<qualifier> <type> <name>;` lines, ignoring a
/// leading `layout(...)`
fn declarations<'a>(source: &'a str, qualifier: &'a str) -> impl Iterator<Item = String> + 'a {
    source.lines().filter_map(move |line| {
        let line = line.trim();
        let line = match line.strip_prefix("layout") {
            Some(rest) => rest.split_once(')')?.1,
            None => line,
        };
        let mut words = line.split_whitespace();
        if words.next()? != qualifier {
            return None;
        }
        let _ty = words.next()?;
        let name = words.next()?;
        let name = name.trim_end_matches(';');
        let name = name.split('[').next()?;
        Some(name.to_string())
    })
}

impl GpuBackend for RecordingBackend {
    fn create_shader(&self, stage: ShaderStage) -> Result<GlHandle, String> {
        let handle = self.create_object(|h| GlCall::CreateShader(stage, h))?;
        self.state.borrow_mut().shaders.insert(
            handle,
            ShaderRecord {
                stage: Some(stage),
                ..Default::default()
            },
        );
        Ok(handle)
    }

    fn compile_shader(&self, shader: GlHandle, source: &str) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::CompileShader(shader));
        if let Some(record) = state.shaders.get_mut(&shader) {
            record.source = source.to_string();
            record.compiled = compiles(source);
        }
    }

    fn shader_compile_status(&self, shader: GlHandle) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: GlHandle) -> String {
        if self.shader_compile_status(shader) {
            String::new()
        } else {
            format!("0:1(1): error: syntax error in shader {shader}\n{}", "x".repeat(2048))
        }
    }

    fn delete_shader(&self, shader: GlHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteShader(shader));
        state.shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<GlHandle, String> {
        let handle = self.create_object(GlCall::CreateProgram)?;
        self.state
            .borrow_mut()
            .programs
            .insert(handle, ProgramRecord::default());
        Ok(handle)
    }

    fn attach_shader(&self, program: GlHandle, shader: GlHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::AttachShader(program, shader));
        if let Some(record) = state.programs.get_mut(&program) {
            record.attached.push(shader);
        }
    }

    fn link_program(&self, program: GlHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::LinkProgram(program));

        let Some(attached) = state.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };
        let stages: Vec<_> = attached
            .iter()
            .filter_map(|s| state.shaders.get(s))
            .filter(|s| s.compiled)
            .collect();
        let vertex = stages.iter().filter(|s| s.stage == Some(ShaderStage::Vertex)).count();
        let fragment = stages.iter().filter(|s| s.stage == Some(ShaderStage::Fragment)).count();
        let outputs: HashSet<String> = stages
            .iter()
            .filter(|s| s.stage == Some(ShaderStage::Vertex))
            .flat_map(|s| declarations(&s.source, "out"))
            .collect();
        let unmatched: Vec<String> = stages
            .iter()
            .filter(|s| s.stage == Some(ShaderStage::Fragment))
            .flat_map(|s| declarations(&s.source, "in"))
            .filter(|input| !outputs.contains(input))
            .collect();

        let link_log = if attached.len() != 2 || vertex != 1 || fragment != 1 {
            "error: linking with uncompiled/unspecialized shader".to_string()
        } else if !unmatched.is_empty() {
            let mut log = String::new();
            for input in &unmatched {
                log.push_str(&format!(
                    "error: fragment shader input `{input}` has no matching vertex shader output\n"
                ));
            }
            log.push_str(&"x".repeat(2048));
            log
        } else {
            String::new()
        };
        let declared: HashSet<String> = stages
            .iter()
            .flat_map(|s| declared_uniforms(&s.source))
            .collect();

        if let Some(record) = state.programs.get_mut(&program) {
            record.linked = link_log.is_empty();
            record.link_log = link_log;
            record.declared = declared;
        }
    }

    fn program_link_status(&self, program: GlHandle) -> bool {
        self.is_linked(program)
    }

    fn program_info_log(&self, program: GlHandle) -> String {
        match self.state.borrow().programs.get(&program) {
            Some(record) if !record.linked && record.link_log.is_empty() => {
                "error: program not linked".to_string()
            }
            Some(record) => record.link_log.clone(),
            None => format!("error: {program} is not a program"),
        }
    }

    fn use_program(&self, program: GlHandle) {
        self.record(GlCall::UseProgram(program));
    }

    fn delete_program(&self, program: GlHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(GlCall::DeleteProgram(program));
        state.programs.remove(&program);
    }

    fn uniform_location(&self, program: GlHandle, name: &str) -> Option<GlHandle> {
        let mut state = self.state.borrow_mut();
        let root = name.split(['.', '[']).next().unwrap_or(name).to_string();
        let location = match state.programs.get_mut(&program) {
            Some(record) if record.linked && record.declared.contains(&root) => {
                let next = record.locations.len() as GlHandle;
                Some(*record.locations.entry(name.to_string()).or_insert(next))
            }
            _ => None,
        };
        state
            .calls
            .push(GlCall::UniformLocation(program, name.to_string(), location));
        location
    }

    fn uniform_1_i32(&self, location: GlHandle, value: i32) {
        self.record(GlCall::Uniform(location, UniformWrite::I32(value)));
    }

    fn uniform_1_f32(&self, location: GlHandle, value: f32) {
        self.record(GlCall::Uniform(location, UniformWrite::F32(value)));
    }

    fn uniform_2_f32(&self, location: GlHandle, x: f32, y: f32) {
        self.record(GlCall::Uniform(location, UniformWrite::Vec2([x, y])));
    }

    fn uniform_3_f32(&self, location: GlHandle, x: f32, y: f32, z: f32) {
        self.record(GlCall::Uniform(location, UniformWrite::Vec3([x, y, z])));
    }

    fn uniform_4_f32(&self, location: GlHandle, x: f32, y: f32, z: f32, w: f32) {
        self.record(GlCall::Uniform(location, UniformWrite::Vec4([x, y, z, w])));
    }

    fn uniform_matrix_2_f32(&self, location: GlHandle, value: &[f32; 4]) {
        self.record(GlCall::Uniform(location, UniformWrite::Mat2(*value)));
    }

    fn uniform_matrix_3_f32(&self, location: GlHandle, value: &[f32; 9]) {
        self.record(GlCall::Uniform(location, UniformWrite::Mat3(*value)));
    }

    fn uniform_matrix_4_f32(&self, location: GlHandle, value: &[f32; 16]) {
        self.record(GlCall::Uniform(location, UniformWrite::Mat4(*value)));
    }

    fn active_texture(&self, unit: u32) {
        self.record(GlCall::ActiveTexture(unit));
    }

    fn create_texture_rgba8(&self, width: u32, height: u32, pixels: &[u8]) -> Result<GlHandle, String> {
        if pixels.len() != (width * height * 4) as usize {
            return Err(format!("expected {} bytes of RGBA8", width * height * 4));
        }
        self.create_object(|h| GlCall::CreateTexture(h, width, height))
    }

    fn bind_texture_2d(&self, texture: GlHandle) {
        self.record(GlCall::BindTexture(texture));
    }

    fn delete_texture(&self, texture: GlHandle) {
        self.record(GlCall::DeleteTexture(texture));
    }

    fn create_vertex_array(&self) -> Result<GlHandle, String> {
        self.create_object(GlCall::CreateVertexArray)
    }

    fn create_buffer(&self) -> Result<GlHandle, String> {
        self.create_object(GlCall::CreateBuffer)
    }

    fn bind_vertex_array(&self, vertex_array: GlHandle) {
        self.record(GlCall::BindVertexArray(vertex_array));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: GlHandle) {
        self.record(GlCall::BindBuffer(target, buffer));
    }

    fn buffer_data_static(&self, target: BufferTarget, data: &[u8]) {
        self.record(GlCall::BufferData(target, data.to_vec()));
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableAttrib(index));
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        self.record(GlCall::AttribPointer {
            index,
            size,
            stride,
            offset,
        });
    }

    fn draw_arrays_triangles(&self, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { first, count });
    }

    fn draw_elements_triangles_u32(&self, count: i32, offset: i32) {
        self.record(GlCall::DrawElements { count, offset });
    }

    fn delete_vertex_array(&self, vertex_array: GlHandle) {
        self.record(GlCall::DeleteVertexArray(vertex_array));
    }

    fn delete_buffer(&self, buffer: GlHandle) {
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(GlCall::ClearColor(rgba));
    }

    fn clear(&self) {
        self.record(GlCall::Clear);
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        self.record(GlCall::PolygonMode(mode));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    fn enable_depth_test(&self) {
        self.record(GlCall::EnableDepthTest);
    }
}
