// src/ui/manager.rs
//! ImGui UI manager for the shader toy
//!
//! Handles ImGui integration with glow and winit, providing frame management,
//! input handling, and rendering of the overlay on top of the scene.

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_glow_renderer::{Renderer, SimpleTextureMap};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use thiserror::Error;
use winit::{event::Event, window::Window};

#[derive(Debug, Error)]
pub enum UiError {
    #[error("failed to initialize the UI renderer: {0}")]
    Init(String),
    #[error("failed to render the UI: {0}")]
    Render(String),
}

/// ImGui UI manager
///
/// Owns the ImGui context, the winit platform glue and the glow renderer.
/// The renderer draws into whatever framebuffer is bound, after the scene.
pub struct UiManager {
    pub context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    texture_map: SimpleTextureMap,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
}

impl UiManager {
    /// Creates a new UI manager
    ///
    /// # Arguments
    /// * `gl` - Current GL context the overlay renders with
    /// * `window` - Window for platform integration
    /// * `glsl_version` - Shading language version of the context, e.g. `#version 330`
    pub fn new(gl: &glow::Context, window: &Window, glsl_version: &str) -> Result<Self, UiError> {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Default);

        let font_size = (16.0 * window.scale_factor()) as f32;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);
        context.io_mut().font_global_scale = (1.0 / window.scale_factor()) as f32;

        let mut texture_map = SimpleTextureMap::default();
        let renderer = Renderer::new(gl, &mut context, &mut texture_map, false)
            .map_err(|err| UiError::Init(err.to_string()))?;
        log::debug!("UI overlay initialized for {glsl_version}");

        Ok(Self {
            context,
            platform,
            renderer,
            texture_map,
            last_frame: Instant::now(),
            last_cursor: None,
        })
    }

    /// Feeds one window event to ImGui
    pub fn handle_event(&mut self, window: &Window, event: &Event<()>) {
        self.platform
            .handle_event(self.context.io_mut(), window, event);
    }

    /// True when the pointer is over a UI element
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    pub fn wants_keyboard(&self) -> bool {
        self.context.io().want_capture_keyboard
    }

    /// Starts a frame, runs the UI callback and returns whether the UI wants input
    pub fn frame<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(err) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::warn!("Failed to prepare UI frame: {err}");
        }

        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }

        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Renders the UI built in the last [`frame`](Self::frame) call
    pub fn render(&mut self, gl: &glow::Context) -> Result<(), UiError> {
        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return Ok(());
        }
        self.renderer
            .render(gl, &self.texture_map, draw_data)
            .map_err(|err| UiError::Render(err.to_string()))
    }

    /// Frees the renderer's GL objects. The context must still be current.
    pub fn destroy(mut self, gl: &glow::Context) {
        self.renderer.destroy(gl);
    }
}
