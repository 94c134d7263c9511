// src/ui/panel.rs
//! Control panel for the shader toy
//!
//! A single window of render settings the frame loop reads back every frame.

use crate::config::DEFAULT_BACKGROUND_COLOR;
use crate::gfx::backend::PolygonMode;

/// Render settings edited through the "UI Box" window
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanel {
    pub background_color: [f32; 4],
    pub polygon_mode: PolygonMode,
    pub vsync: bool,
    pub show_fps: bool,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND_COLOR.into(),
            polygon_mode: PolygonMode::Fill,
            vsync: true,
            show_fps: true,
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the panel's widgets for this frame
    ///
    /// # Arguments
    /// * `ui` - ImGui UI context
    pub fn draw(&mut self, ui: &imgui::Ui) {
        ui.window("UI Box")
            .size([320.0, 170.0], imgui::Condition::FirstUseEver)
            .position([20.0, 20.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.color_edit4("Background Color", &mut self.background_color);

                let labels = PolygonMode::ALL.map(PolygonMode::label);
                let mut index = mode_index(self.polygon_mode);
                if ui.combo_simple_string("RenderMode", &mut index, &labels) {
                    self.polygon_mode = mode_at(index);
                }

                ui.checkbox("VSync", &mut self.vsync);
                ui.checkbox("Show FPS", &mut self.show_fps);
                if self.show_fps {
                    ui.text(fps_label(ui.io().framerate));
                }
            });
    }
}

fn mode_index(mode: PolygonMode) -> usize {
    PolygonMode::ALL
        .iter()
        .position(|candidate| *candidate == mode)
        .unwrap_or(PolygonMode::ALL.len() - 1)
}

fn mode_at(index: usize) -> PolygonMode {
    PolygonMode::ALL.get(index).copied().unwrap_or_default()
}

fn fps_label(framerate: f32) -> String {
    format!("{:.0} FPS", framerate)
}
