//! # User Interface Module
//!
//! Dear ImGui overlay drawn after the shader each frame.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui context, winit input glue and glow renderer
//! - [`ControlPanel`] - The "UI Box" window: background color, render mode,
//!   vsync and an FPS readout
//!
//! ## Input Handling
//!
//! When ImGui wants the mouse, free-look stays disabled so dragging a widget
//! never turns the camera.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::{UiError, UiManager};
pub use panel::ControlPanel;
