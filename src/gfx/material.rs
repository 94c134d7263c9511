//! Phong material and light records
//!
//! These are plain values consumed by [`Program::apply_material`] and
//! [`Program::set_light`]. The only GPU state they own is the optional
//! textures, which [`Material::release`] deletes.
//!
//! [`Program::apply_material`]: super::program::Program::apply_material
//! [`Program::set_light`]: super::program::Program::set_light

use cgmath::Vector3;
use thiserror::Error;

use super::{backend::GpuBackend, texture::Texture};
use crate::config::{DEFAULT_LIGHT_COLOR, DEFAULT_SHADER_COLOR, WORLD_ORIGIN};

pub const DEFAULT_SHININESS: f32 = 64.0;

#[derive(Debug, Error, PartialEq)]
pub enum MaterialError {
    #[error("shininess must be a positive finite number, got {0}")]
    InvalidShininess(f32),
}

/// Shading models shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderTemplate {
    #[default]
    Color3d,
    Texture3d,
}

impl ShaderTemplate {
    pub const ALL: [ShaderTemplate; 2] = [ShaderTemplate::Color3d, ShaderTemplate::Texture3d];

    /// Name shown in the UI
    pub fn display_name(self) -> &'static str {
        match self {
            ShaderTemplate::Color3d => "Color Shader",
            ShaderTemplate::Texture3d => "Texture Shader",
        }
    }

    pub fn vertex_path(self) -> &'static str {
        "shaders/3dshaders/lighting.vs"
    }

    pub fn fragment_path(self) -> &'static str {
        match self {
            ShaderTemplate::Color3d => "shaders/3dshaders/lighting.fs",
            ShaderTemplate::Texture3d => "shaders/3dshaders/lighting_texture.fs",
        }
    }
}

/// One Phong term: a flat color, optionally replaced by a texture
#[derive(Debug, PartialEq)]
pub struct MaterialField {
    pub color: Vector3<f32>,
    pub texture: Option<Texture>,
}

impl MaterialField {
    pub fn color(color: Vector3<f32>) -> Self {
        Self {
            color,
            texture: None,
        }
    }

    pub fn textured(texture: Texture) -> Self {
        Self {
            color: DEFAULT_SHADER_COLOR,
            texture: Some(texture),
        }
    }
}

impl Default for MaterialField {
    fn default() -> Self {
        Self::color(DEFAULT_SHADER_COLOR)
    }
}

/// Surface description for a lit actor
#[derive(Debug, PartialEq)]
pub struct Material {
    ambient: MaterialField,
    diffuse: MaterialField,
    specular: MaterialField,
    shininess: f32,
    template: ShaderTemplate,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: MaterialField::default(),
            diffuse: MaterialField::default(),
            specular: MaterialField::default(),
            shininess: DEFAULT_SHININESS,
            template: ShaderTemplate::Color3d,
        }
    }
}

impl Material {
    /// Creates a flat-colored material using the color template
    pub fn new(
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        shininess: f32,
    ) -> Result<Self, MaterialError> {
        Self::with_fields(
            MaterialField::color(ambient),
            MaterialField::color(diffuse),
            MaterialField::color(specular),
            shininess,
            ShaderTemplate::Color3d,
        )
    }

    pub fn with_fields(
        ambient: MaterialField,
        diffuse: MaterialField,
        specular: MaterialField,
        shininess: f32,
        template: ShaderTemplate,
    ) -> Result<Self, MaterialError> {
        if !(shininess.is_finite() && shininess > 0.0) {
            return Err(MaterialError::InvalidShininess(shininess));
        }
        Ok(Self {
            ambient,
            diffuse,
            specular,
            shininess,
            template,
        })
    }

    pub fn ambient(&self) -> &MaterialField {
        &self.ambient
    }

    pub fn diffuse(&self) -> &MaterialField {
        &self.diffuse
    }

    pub fn specular(&self) -> &MaterialField {
        &self.specular
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn template(&self) -> ShaderTemplate {
        self.template
    }

    /// Deletes the textures this material owns
    pub fn release(&mut self, gl: &dyn GpuBackend) {
        for field in [&mut self.ambient, &mut self.diffuse, &mut self.specular] {
            if let Some(texture) = field.texture.as_mut() {
                texture.release(gl);
            }
        }
    }
}

/// A point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl Default for LightSource {
    /// Neutral white light at the world origin
    fn default() -> Self {
        Self {
            position: WORLD_ORIGIN,
            ambient: DEFAULT_LIGHT_COLOR,
            diffuse: DEFAULT_LIGHT_COLOR,
            specular: DEFAULT_LIGHT_COLOR,
        }
    }
}

impl LightSource {
    pub fn new(
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        position: Vector3<f32>,
    ) -> Self {
        Self {
            position,
            ambient,
            diffuse,
            specular,
        }
    }
}
