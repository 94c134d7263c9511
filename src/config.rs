//! # Configuration
//!
//! Compile-time constants for the shader toy plus the [`AppConfig`] record that
//! bundles them for the application loop. Nothing here is persisted at runtime;
//! the only environment input is the resource root (`FRAGTOY_ROOT`).

use std::path::PathBuf;

use cgmath::{Vector3, Vector4};

/// Title of the main window
pub const WINDOW_NAME: &str = "Shader Toy";

/// Open the window fullscreen on the primary monitor
pub const ENABLE_FULLSCREEN: bool = false;

/// Keep the window at `ASPECT_RATIO_X : ASPECT_RATIO_Y` when windowed
pub const ENABLE_FIXED_ASPECT_RATIO: bool = true;
pub const ASPECT_RATIO_X: u32 = 16;
pub const ASPECT_RATIO_Y: u32 = 9;

pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;

/// Requested OpenGL core profile version
pub const GL_VERSION_MAJOR: u8 = 3;
pub const GL_VERSION_MINOR: u8 = 3;

/// `iTime` wraps back by this many seconds once it passes it
pub const TIME_WRAP_SECONDS: f32 = 300.0;

pub const DEFAULT_BACKGROUND_COLOR: Vector4<f32> = Vector4::new(0.2, 0.3, 0.2, 1.0);
pub const DEFAULT_SHADER_COLOR: Vector3<f32> = Vector3::new(1.0, 0.5, 0.31);
pub const DEFAULT_LIGHT_COLOR: Vector3<f32> = Vector3::new(1.0, 1.0, 1.0);
pub const WORLD_ORIGIN: Vector3<f32> = Vector3::new(0.0, 0.0, 0.0);

/// Environment variable overriding the resource root directory
pub const RESOURCE_ROOT_ENV: &str = "FRAGTOY_ROOT";

/// Window creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// `Some((x, y))` locks the windowed aspect ratio to `x : y`
    pub fixed_aspect: Option<(u32, u32)>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: WINDOW_NAME.to_string(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            fullscreen: ENABLE_FULLSCREEN,
            fixed_aspect: (ENABLE_FIXED_ASPECT_RATIO && !ENABLE_FULLSCREEN)
                .then_some((ASPECT_RATIO_X, ASPECT_RATIO_Y)),
        }
    }
}

/// Everything the shader toy loop needs to start up
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub gl_version: (u8, u8),
    /// Logical path of the vertex stage, resolved against `resource_root`
    pub vertex_shader: String,
    /// Logical path of the fragment stage, resolved against `resource_root`
    pub fragment_shader: String,
    /// Logical path of the `iChannel0` image
    pub channel0_texture: String,
    pub resource_root: PathBuf,
    pub background_color: Vector4<f32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            gl_version: (GL_VERSION_MAJOR, GL_VERSION_MINOR),
            vertex_shader: "shaders/2dshaders/shaderToy.vs".to_string(),
            fragment_shader: "shaders/2dshaders/shaderToy.fs".to_string(),
            channel0_texture: "resources/textures/channel0.png".to_string(),
            resource_root: default_resource_root(),
            background_color: DEFAULT_BACKGROUND_COLOR,
        }
    }
}

impl AppConfig {
    /// Builder pattern: Replace the window settings
    pub fn with_window(mut self, window: WindowSettings) -> Self {
        self.window = window;
        self
    }

    /// Builder pattern: Use a different fragment shader
    pub fn with_fragment_shader(mut self, logical_path: &str) -> Self {
        self.fragment_shader = logical_path.to_owned();
        self
    }

    /// Builder pattern: Resolve resources against `root`
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = root.into();
        self
    }

    /// The `#version` line handed to the UI renderer, e.g. `#version 330`
    pub fn glsl_version(&self) -> String {
        format!("#version {}{}0", self.gl_version.0, self.gl_version.1)
    }
}

/// `FRAGTOY_ROOT` when set, otherwise the crate directory
pub fn default_resource_root() -> PathBuf {
    std::env::var_os(RESOURCE_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")))
}
