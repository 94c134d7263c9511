//! # Graphics Module
//!
//! Everything that talks to the GPU, on top of the [`backend::GpuBackend`]
//! command surface.
//!
//! ## Architecture Overview
//!
//! - **Backend** ([`backend`]) - The GL calls the crate issues, over `glow`
//! - **Programs** ([`program`]) - Shader compile/link and the uniform family
//! - **Buffers** ([`buffer`]) - Vertex array / vertex buffer / index buffer triple
//! - **Textures** ([`texture`]) - RGBA textures bound through sampler uniforms
//! - **Materials** ([`material`]) - Material and light records for the lit templates
//! - **Camera** ([`camera`]) - Free-look camera and its input rig
//!
//! ## Usage
//!
//! ```no_run
//! use fragtoy::gfx::{backend::GpuBackend, program::Program};
//!
//! # fn frame(gl: &dyn GpuBackend, vs: &str, fs: &str) {
//! let program = Program::from_sources(gl, vs, fs).unwrap_or_default();
//! program.use_program(gl);
//! program.set(gl, "iTime", 1.5_f32);
//! # }
//! ```

pub mod backend;
pub mod buffer;
pub mod camera;
pub mod material;
pub mod program;
pub mod texture;

// Re-export commonly used types
pub use buffer::BufferObject;
pub use camera::{CameraRig, FlyCamera};
pub use program::{Program, UniformValue};
pub use texture::{Texture, TextureUnit};
