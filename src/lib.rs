// src/lib.rs
//! Fragtoy
//!
//! A fragment-shader playground on OpenGL: one shader program drawn over a
//! full-screen quad, fed time, resolution, camera and texture uniforms, with a
//! Dear ImGui overlay for render settings.

pub mod app;
pub mod config;
pub mod gfx;
pub mod logging;
pub mod resources;
pub mod ui;
pub mod window;

// Re-export main types for convenience
pub use app::ShaderToyApp;
pub use config::AppConfig;
