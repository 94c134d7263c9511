//! # Window and Frame Driving
//!
//! [`FrameDriver`] owns the window/context lifecycle and per-frame timing on top
//! of a [`Platform`], the windowing provider. The driver walks a fixed state
//! machine:
//!
//! ```text
//! Uninitialized -> ContextReady -> WindowOpen -> Running -> Closed
//! ```
//!
//! [`WinitPlatform`] is the desktop provider (winit window, glutin context,
//! glow function table). Tests drive the same state machine with a scripted
//! stub.

pub mod driver;
pub mod timer;
mod winit_platform;

use thiserror::Error;
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::config::WindowSettings;
use crate::gfx::backend::GpuBackend;

pub use driver::{DriverError, DriverState, FrameDriver};
pub use timer::FrameTimer;
pub use winit_platform::WinitPlatform;

/// Graphics API context request made before any window exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRequest {
    pub major: u8,
    pub minor: u8,
    pub core_profile: bool,
    /// Required by macOS for any core profile above 3.0
    pub forward_compatible: bool,
}

impl ContextRequest {
    pub fn core(major: u8, minor: u8) -> Self {
        Self {
            major,
            minor,
            core_profile: true,
            forward_compatible: cfg!(target_os = "macos"),
        }
    }
}

/// Input the platform collected since the last poll, in arrival order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformEvent {
    Resized { width: u32, height: u32 },
    CursorMoved { x: f64, y: f64 },
    Scrolled { dy: f32 },
    CloseRequested,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("event loop unavailable: {0}")]
    EventLoop(String),
    #[error("window creation failed: {0}")]
    Window(String),
    #[error("GL context error: {0}")]
    Context(String),
    #[error("GL surface error: {0}")]
    Surface(String),
    #[error("GL function loading failed: {0}")]
    Loader(String),
    #[error("{0} is not available yet")]
    NotReady(&'static str),
}

/// Windowing and context provider consumed by [`FrameDriver`].
///
/// Calls arrive in state-machine order; the driver never calls a method whose
/// prerequisite step failed.
pub trait Platform {
    /// GL command surface produced by loading the function table
    type Backend: GpuBackend;

    fn init_context(&mut self, request: ContextRequest) -> Result<(), PlatformError>;
    fn create_window(&mut self, settings: &WindowSettings) -> Result<(), PlatformError>;
    fn make_current(&mut self) -> Result<(), PlatformError>;
    fn load_gl(&mut self) -> Result<Self::Backend, PlatformError>;
    /// Keep the window at `x:y` when it is resized; `None` unlocks it
    fn set_aspect_lock(&mut self, ratio: Option<(u32, u32)>);

    fn should_close(&self) -> bool;
    fn request_close(&mut self);
    /// Processes pending window-system events, appending what happened to `events`
    fn poll_events(&mut self, events: &mut Vec<PlatformEvent>);
    fn is_key_down(&self, key: KeyCode) -> bool;
    fn is_mouse_down(&self, button: MouseButton) -> bool;

    /// Seconds since the platform was created
    fn time(&self) -> f64;
    fn swap_buffers(&mut self) -> Result<(), PlatformError>;
    fn set_swap_interval(&mut self, vsync: bool) -> Result<(), PlatformError>;
    fn set_cursor_captured(&mut self, captured: bool);
    fn framebuffer_size(&self) -> (u32, u32);
    fn terminate(&mut self);
}
