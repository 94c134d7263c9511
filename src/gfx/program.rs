//! # Shader Programs
//!
//! A [`Program`] is a vertex stage and a fragment stage compiled and linked
//! into one executable GPU program.
//!
//! Construction either yields a fully linked program or an error; there is no
//! partially linked state. Callers that want to keep rendering after a shader
//! failure substitute [`Program::unlinked`], whose uniform writes and binds
//! are harmless no-ops.
//!
//! ## Uniform naming contract
//!
//! The convenience setters write fixed names that paired shaders must declare:
//!
//! | call                  | uniforms                                                     |
//! |-----------------------|--------------------------------------------------------------|
//! | [`Program::set_matrices`] | `model`, `view`, `projection`                            |
//! | [`Program::set_material`] | `mat.ambient`, `mat.diffuse`, `mat.specular`, `mat.shininess` |
//! | [`Program::set_light`]    | `light.position`, `light.ambient`, `light.diffuse`, `light.specular` |
//!
//! Nothing checks this at compile time; a missing name is silently skipped.
//!
//! Locations are looked up on every write. That is fine for a handful of
//! uniforms per frame.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use thiserror::Error;

use super::{
    backend::{GlHandle, GpuBackend, ShaderStage},
    material::{LightSource, Material, ShaderTemplate},
    texture::{Texture, TextureBinding, TextureUnit},
};
use crate::resources::ResourceResolver;

/// Info logs are cut to this many bytes before being reported
pub const INFO_LOG_CAPACITY: usize = 1024;

/// What a status check inspects: one stage's compile status, or the link status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
    Combined,
}

impl ShaderKind {
    fn tag(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "VERTEX",
            ShaderKind::Fragment => "FRAGMENT",
            ShaderKind::Combined => "PROGRAM",
        }
    }
}

impl From<ShaderStage> for ShaderKind {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => ShaderKind::Vertex,
            ShaderStage::Fragment => ShaderKind::Fragment,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("failed to read {kind} shader source {path}")]
    SourceRead {
        kind: ShaderKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create {kind} object: {message}")]
    Create { kind: ShaderKind, message: String },
    #[error("{kind} shader failed to compile:\n{log}")]
    Compile { kind: ShaderKind, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
}

/// A value a uniform can be set to.
///
/// `Texture` selects the unit, binds the texture there and writes the unit
/// index to the sampler uniform.
#[derive(Clone, Copy)]
pub enum UniformValue<'a> {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2(Vector2<f32>),
    Vec3(Vector3<f32>),
    Vec4(Vector4<f32>),
    Mat2(Matrix2<f32>),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
    Texture(TextureUnit, &'a dyn TextureBinding),
}

macro_rules! uniform_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue<'_> {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value.into())
                }
            }
        )*
    };
}

uniform_from! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    Vector2<f32> => Vec2,
    [f32; 2] => Vec2,
    Vector3<f32> => Vec3,
    [f32; 3] => Vec3,
    Vector4<f32> => Vec4,
    [f32; 4] => Vec4,
    Matrix2<f32> => Mat2,
    Matrix3<f32> => Mat3,
    Matrix4<f32> => Mat4,
}

impl<'a> From<(TextureUnit, &'a Texture)> for UniformValue<'a> {
    fn from((unit, texture): (TextureUnit, &'a Texture)) -> Self {
        UniformValue::Texture(unit, texture)
    }
}

/// A linked vertex + fragment program, or the unlinked placeholder (id 0)
#[derive(Debug, PartialEq, Eq)]
pub struct Program {
    id: GlHandle,
}

impl Default for Program {
    fn default() -> Self {
        Self::unlinked()
    }
}

impl Program {
    /// Placeholder that binds nothing and ignores uniform writes
    pub const fn unlinked() -> Self {
        Self { id: 0 }
    }

    pub fn id(&self) -> GlHandle {
        self.id
    }

    pub fn is_linked(&self) -> bool {
        self.id != 0
    }

    /// Reads both stages from disk, then compiles and links them
    pub fn from_files(
        gl: &dyn GpuBackend,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ProgramError> {
        let vertex = read_source(vertex_path.as_ref(), ShaderKind::Vertex)?;
        let fragment = read_source(fragment_path.as_ref(), ShaderKind::Fragment)?;
        Self::from_sources(gl, &vertex, &fragment)
    }

    /// Compiles and links two literal sources.
    ///
    /// Every intermediate object is deleted on failure, so an `Err` never
    /// leaves a program or shader alive on the GPU.
    pub fn from_sources(
        gl: &dyn GpuBackend,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ProgramError> {
        let vertex = Self::compile_stage(gl, vertex_source, ShaderStage::Vertex)?;
        if let Some(log) = diagnostics(gl, vertex, ShaderKind::Vertex) {
            gl.delete_shader(vertex);
            return Err(ProgramError::Compile {
                kind: ShaderKind::Vertex,
                log,
            });
        }

        let fragment = match Self::compile_stage(gl, fragment_source, ShaderStage::Fragment) {
            Ok(fragment) => fragment,
            Err(err) => {
                gl.delete_shader(vertex);
                return Err(err);
            }
        };
        if let Some(log) = diagnostics(gl, fragment, ShaderKind::Fragment) {
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            return Err(ProgramError::Compile {
                kind: ShaderKind::Fragment,
                log,
            });
        }

        let id = match gl.create_program() {
            Ok(id) => id,
            Err(message) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                log::error!("ERROR::{}::CREATE failed: {message}", ShaderKind::Combined);
                return Err(ProgramError::Create {
                    kind: ShaderKind::Combined,
                    message,
                });
            }
        };
        gl.attach_shader(id, vertex);
        gl.attach_shader(id, fragment);
        gl.link_program(id);
        let link_log = diagnostics(gl, id, ShaderKind::Combined);

        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        if let Some(log) = link_log {
            gl.delete_program(id);
            return Err(ProgramError::Link { log });
        }

        log::debug!("Linked program {id}");
        Ok(Self { id })
    }

    /// Creates a shader object for `stage` and compiles `source` into it.
    ///
    /// The compile status is not inspected here; see [`Program::check_errors`].
    pub fn compile_stage(
        gl: &dyn GpuBackend,
        source: &str,
        stage: ShaderStage,
    ) -> Result<GlHandle, ProgramError> {
        let shader = gl.create_shader(stage).map_err(|message| {
            log::error!("ERROR::{}::CREATE failed: {message}", ShaderKind::from(stage));
            ProgramError::Create {
                kind: stage.into(),
                message,
            }
        })?;
        gl.compile_shader(shader, source);
        Ok(shader)
    }

    /// Returns `true` when `handle` failed to compile (stage kinds) or link
    /// (`Combined`). The info log is reported through the logger.
    pub fn check_errors(gl: &dyn GpuBackend, handle: GlHandle, kind: ShaderKind) -> bool {
        diagnostics(gl, handle, kind).is_some()
    }

    /// Makes this the active program. Binding the unlinked placeholder unbinds.
    pub fn use_program(&self, gl: &dyn GpuBackend) {
        gl.use_program(self.id);
    }

    /// Deletes the GPU program. Later calls do nothing.
    pub fn release(&mut self, gl: &dyn GpuBackend) {
        if self.id != 0 {
            gl.delete_program(self.id);
            self.id = 0;
        }
    }

    fn location(&self, gl: &dyn GpuBackend, name: &str) -> Option<GlHandle> {
        if !self.is_linked() {
            return None;
        }
        let location = gl.uniform_location(self.id, name);
        if location.is_none() {
            log::trace!("uniform `{name}` not active in program {}", self.id);
        }
        location
    }

    /// Writes one uniform of the active program.
    ///
    /// Names the program does not declare are skipped. A texture value is
    /// bound to its unit even when the sampler name is inactive, except on
    /// the unlinked placeholder, which touches nothing.
    pub fn set<'a>(&self, gl: &dyn GpuBackend, name: &str, value: impl Into<UniformValue<'a>>) {
        if !self.is_linked() {
            return;
        }
        let value = value.into();
        let location = self.location(gl, name);

        if let UniformValue::Texture(unit, texture) = value {
            gl.active_texture(unit.0);
            if let Some(location) = location {
                gl.uniform_1_i32(location, unit.0 as i32);
            }
            texture.bind(gl);
            return;
        }

        let Some(location) = location else {
            return;
        };
        match value {
            UniformValue::Bool(v) => gl.uniform_1_i32(location, v as i32),
            UniformValue::Int(v) => gl.uniform_1_i32(location, v),
            UniformValue::Float(v) => gl.uniform_1_f32(location, v),
            UniformValue::Vec2(v) => gl.uniform_2_f32(location, v.x, v.y),
            UniformValue::Vec3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
            UniformValue::Vec4(v) => gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
            UniformValue::Mat2(m) => gl.uniform_matrix_2_f32(location, m.as_ref()),
            UniformValue::Mat3(m) => gl.uniform_matrix_3_f32(location, m.as_ref()),
            UniformValue::Mat4(m) => gl.uniform_matrix_4_f32(location, m.as_ref()),
            UniformValue::Texture(..) => {}
        }
    }

    /// Binds `texture` on `unit` and points the sampler `name` at it
    pub fn set_texture(
        &self,
        gl: &dyn GpuBackend,
        name: &str,
        unit: TextureUnit,
        texture: &dyn TextureBinding,
    ) {
        self.set(gl, name, UniformValue::Texture(unit, texture));
    }

    pub fn set_matrices(
        &self,
        gl: &dyn GpuBackend,
        model: Matrix4<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
    ) {
        self.set(gl, "model", model);
        self.set(gl, "view", view);
        self.set(gl, "projection", projection);
    }

    pub fn set_material(
        &self,
        gl: &dyn GpuBackend,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        shininess: f32,
    ) {
        self.set(gl, "mat.ambient", ambient);
        self.set(gl, "mat.diffuse", diffuse);
        self.set(gl, "mat.specular", specular);
        self.set(gl, "mat.shininess", shininess);
    }

    pub fn set_light(&self, gl: &dyn GpuBackend, light: &LightSource) {
        self.set(gl, "light.position", light.position);
        self.set(gl, "light.ambient", light.ambient);
        self.set(gl, "light.diffuse", light.diffuse);
        self.set(gl, "light.specular", light.specular);
    }

    /// Writes `material` in the layout its template expects.
    ///
    /// Textured fields go to units 0, 1 and 2 (ambient, diffuse, specular);
    /// a field without a texture falls back to its color.
    pub fn apply_material(&self, gl: &dyn GpuBackend, material: &Material) {
        match material.template() {
            ShaderTemplate::Color3d => self.set_material(
                gl,
                material.ambient().color,
                material.diffuse().color,
                material.specular().color,
                material.shininess(),
            ),
            ShaderTemplate::Texture3d => {
                let fields = [
                    ("mat.ambient", material.ambient()),
                    ("mat.diffuse", material.diffuse()),
                    ("mat.specular", material.specular()),
                ];
                for (unit, (name, field)) in fields.into_iter().enumerate() {
                    match &field.texture {
                        Some(texture) => self.set_texture(gl, name, TextureUnit(unit as u32), texture),
                        None => self.set(gl, name, field.color),
                    }
                }
                self.set(gl, "mat.shininess", material.shininess());
            }
        }
    }
}

/// Builds one program per [`ShaderTemplate`], in declaration order.
///
/// A template that fails to load is logged and replaced by
/// [`Program::unlinked`] so indices stay aligned with `ShaderTemplate::ALL`.
pub fn load_template_programs(gl: &dyn GpuBackend, resolver: &ResourceResolver) -> Vec<Program> {
    ShaderTemplate::ALL
        .iter()
        .map(|template| {
            Program::from_files(
                gl,
                resolver.get_path(template.vertex_path()),
                resolver.get_path(template.fragment_path()),
            )
            .unwrap_or_else(|err| {
                log::error!("{} unavailable: {err}", template.display_name());
                Program::unlinked()
            })
        })
        .collect()
}

fn read_source(path: &Path, kind: ShaderKind) -> Result<String, ProgramError> {
    fs::read_to_string(path).map_err(|source| {
        log::error!("ERROR::{kind}::FILE {} not loaded: {source}", path.display());
        ProgramError::SourceRead {
            kind,
            path: path.to_path_buf(),
            source,
        }
    })
}

/// The capped info log when `handle` failed its compile or link check
fn diagnostics(gl: &dyn GpuBackend, handle: GlHandle, kind: ShaderKind) -> Option<String> {
    let ok = match kind {
        ShaderKind::Combined => gl.program_link_status(handle),
        ShaderKind::Vertex | ShaderKind::Fragment => gl.shader_compile_status(handle),
    };
    if ok {
        return None;
    }
    let log = truncate_log(match kind {
        ShaderKind::Combined => gl.program_info_log(handle),
        ShaderKind::Vertex | ShaderKind::Fragment => gl.shader_info_log(handle),
    });
    match kind {
        ShaderKind::Combined => log::error!("ERROR::PROGRAM::LINKING failed\n{log}"),
        _ => log::error!("ERROR::{kind}::COMPILATION failed\n{log}"),
    }
    Some(log)
}

fn truncate_log(mut log: String) -> String {
    if log.len() > INFO_LOG_CAPACITY {
        let mut end = INFO_LOG_CAPACITY;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}
