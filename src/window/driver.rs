use thiserror::Error;
use winit::{event::MouseButton, keyboard::KeyCode};

use super::{ContextRequest, FrameTimer, Platform, PlatformError, PlatformEvent};
use crate::config::WindowSettings;
use crate::gfx::backend::GpuBackend;
use crate::gfx::camera::CameraRig;

/// Lifecycle of a [`FrameDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    ContextReady,
    WindowOpen,
    Running,
    Closed,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot {operation} while the driver is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: DriverState,
    },
    #[error("failed to initialize the graphics context")]
    Context(#[source] PlatformError),
    #[error("failed to create the window")]
    WindowCreation(#[source] PlatformError),
    #[error("failed to load the OpenGL function table")]
    Loader(#[source] PlatformError),
    #[error("failed to present the frame")]
    Present(#[source] PlatformError),
}

/// Window/context lifecycle, input polling, timing and presentation.
///
/// Every startup step checks the current [`DriverState`], so the steps can
/// only run in order. A failed window creation terminates the platform and
/// leaves the driver `Closed`.
pub struct FrameDriver<P: Platform> {
    platform: P,
    state: DriverState,
    backend: Option<P::Backend>,
    timer: FrameTimer,
    aspect_lock: Option<(u32, u32)>,
    cursor_visible: bool,
    events: Vec<PlatformEvent>,
}

impl<P: Platform> FrameDriver<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            state: DriverState::Uninitialized,
            backend: None,
            timer: FrameTimer::new(),
            aspect_lock: None,
            cursor_visible: true,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// The loaded GL backend, available once the driver is `Running`
    pub fn gl(&self) -> Option<&P::Backend> {
        self.backend.as_ref()
    }

    fn expect_state(&self, expected: DriverState, operation: &'static str) -> Result<(), DriverError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DriverError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Requests an OpenGL `major.minor` core context
    pub fn init_context(&mut self, major: u8, minor: u8) -> Result<(), DriverError> {
        self.expect_state(DriverState::Uninitialized, "initialize the context")?;
        let request = ContextRequest::core(major, minor);
        log::debug!(
            "Requesting OpenGL {}.{} core context (forward compatible: {})",
            major,
            minor,
            request.forward_compatible
        );
        self.platform.init_context(request).map_err(DriverError::Context)?;
        self.state = DriverState::ContextReady;
        Ok(())
    }

    /// Opens the window. Failure is fatal: the platform is terminated and the
    /// driver cannot proceed to activation.
    pub fn create_window(&mut self, settings: &WindowSettings) -> Result<(), DriverError> {
        self.expect_state(DriverState::ContextReady, "create a window")?;
        if let Err(err) = self.platform.create_window(settings) {
            log::error!("Failed to create window: {err}");
            self.terminate();
            return Err(DriverError::WindowCreation(err));
        }
        self.aspect_lock = if settings.fullscreen {
            None
        } else {
            settings.fixed_aspect
        };
        log::info!(
            "Opened window \"{}\" ({}x{}{})",
            settings.title,
            settings.width,
            settings.height,
            if settings.fullscreen { ", fullscreen" } else { "" }
        );
        self.state = DriverState::WindowOpen;
        Ok(())
    }

    /// Makes the context current, locks the aspect ratio and loads the GL
    /// function table. Loader failure is returned rather than ignored.
    pub fn activate_context(&mut self) -> Result<(), DriverError> {
        self.expect_state(DriverState::WindowOpen, "activate the context")?;
        self.platform.make_current().map_err(DriverError::Context)?;
        self.platform.set_aspect_lock(self.aspect_lock);

        let backend = match self.platform.load_gl() {
            Ok(backend) => backend,
            Err(err) => {
                log::error!("Failed to initialize GL function loader: {err}");
                return Err(DriverError::Loader(err));
            }
        };

        let (width, height) = self.framebuffer_size();
        backend.viewport(0, 0, width as i32, height as i32);
        backend.enable_depth_test();
        self.backend = Some(backend);
        self.state = DriverState::Running;
        Ok(())
    }

    pub fn should_close(&self) -> bool {
        self.state != DriverState::Running || self.platform.should_close()
    }

    pub fn request_close(&mut self) {
        self.platform.request_close();
    }

    /// Pumps the platform and returns the events seen since the last poll.
    /// Resizes are applied to the viewport before they are returned.
    pub fn poll_input(&mut self) -> Vec<PlatformEvent> {
        if self.state != DriverState::Running {
            return Vec::new();
        }
        self.platform.poll_events(&mut self.events);
        for event in &self.events {
            if let PlatformEvent::Resized { width, height } = *event {
                if let Some(backend) = &self.backend {
                    backend.viewport(0, 0, width as i32, height as i32);
                }
            }
        }
        std::mem::take(&mut self.events)
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.platform.is_key_down(key)
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.platform.is_mouse_down(button)
    }

    pub fn start_timer(&mut self) {
        self.timer.start(self.platform.time());
    }

    /// Seconds since the previous tick; 0 on the first tick after `start_timer`
    pub fn tick(&mut self) -> f32 {
        self.timer.tick(self.platform.time())
    }

    /// Sets the swap interval for this frame and swaps buffers
    pub fn present(&mut self, vsync: bool) -> Result<(), DriverError> {
        self.expect_state(DriverState::Running, "present")?;
        self.platform
            .set_swap_interval(vsync)
            .map_err(DriverError::Present)?;
        self.platform.swap_buffers().map_err(DriverError::Present)
    }

    /// Shows the cursor, or hides and captures it for free-look
    pub fn set_cursor_mode(&mut self, visible: bool) {
        if self.cursor_visible != visible {
            self.platform.set_cursor_captured(!visible);
            self.cursor_visible = visible;
        }
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Consumes the rig's pointer delta and captures the cursor while free-look is active
    pub fn process_mouse(&mut self, rig: &mut CameraRig, active: bool) {
        let captured = rig.process_mouse(active);
        self.set_cursor_mode(!captured);
    }

    /// Current framebuffer size, never smaller than 1x1
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.platform.framebuffer_size();
        (width.max(1), height.max(1))
    }

    /// Releases the platform. Safe to call from any state, and more than once.
    pub fn terminate(&mut self) {
        if self.state == DriverState::Closed {
            return;
        }
        self.backend = None;
        self.platform.terminate();
        self.state = DriverState::Closed;
        log::debug!("Frame driver terminated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::recording::{GlCall, RecordingBackend};
    use crate::gfx::camera::FlyCamera;
    use std::cell::Cell;

    #[derive(Default)]
    struct StubPlatform {
        fail_window: bool,
        fail_loader: bool,
        calls: Vec<&'static str>,
        now: Cell<f64>,
        queued: Vec<PlatformEvent>,
        close: bool,
        size: (u32, u32),
        captured: Vec<bool>,
        intervals: Vec<bool>,
    }

    impl Platform for StubPlatform {
        type Backend = RecordingBackend;

        fn init_context(&mut self, _request: ContextRequest) -> Result<(), PlatformError> {
            self.calls.push("init_context");
            Ok(())
        }

        fn create_window(&mut self, _settings: &WindowSettings) -> Result<(), PlatformError> {
            self.calls.push("create_window");
            if self.fail_window {
                Err(PlatformError::Window("no display".into()))
            } else {
                Ok(())
            }
        }

        fn make_current(&mut self) -> Result<(), PlatformError> {
            self.calls.push("make_current");
            Ok(())
        }

        fn load_gl(&mut self) -> Result<RecordingBackend, PlatformError> {
            self.calls.push("load_gl");
            if self.fail_loader {
                Err(PlatformError::Loader("glGetString missing".into()))
            } else {
                Ok(RecordingBackend::new())
            }
        }

        fn set_aspect_lock(&mut self, _ratio: Option<(u32, u32)>) {
            self.calls.push("set_aspect_lock");
        }

        fn should_close(&self) -> bool {
            self.close
        }

        fn request_close(&mut self) {
            self.close = true;
        }

        fn poll_events(&mut self, events: &mut Vec<PlatformEvent>) {
            events.append(&mut self.queued);
        }

        fn is_key_down(&self, key: KeyCode) -> bool {
            key == KeyCode::Escape && self.close
        }

        fn is_mouse_down(&self, _button: MouseButton) -> bool {
            false
        }

        fn time(&self) -> f64 {
            self.now.get()
        }

        fn swap_buffers(&mut self) -> Result<(), PlatformError> {
            self.calls.push("swap_buffers");
            Ok(())
        }

        fn set_swap_interval(&mut self, vsync: bool) -> Result<(), PlatformError> {
            self.intervals.push(vsync);
            Ok(())
        }

        fn set_cursor_captured(&mut self, captured: bool) {
            self.captured.push(captured);
        }

        fn framebuffer_size(&self) -> (u32, u32) {
            self.size
        }

        fn terminate(&mut self) {
            self.calls.push("terminate");
        }
    }

    fn running(platform: StubPlatform) -> FrameDriver<StubPlatform> {
        let mut driver = FrameDriver::new(platform);
        driver.init_context(3, 3).unwrap();
        driver.create_window(&WindowSettings::default()).unwrap();
        driver.activate_context().unwrap();
        driver
    }

    #[test]
    fn test_startup_walks_states_in_order() {
        let mut driver = FrameDriver::new(StubPlatform {
            size: (800, 450),
            ..Default::default()
        });
        assert_eq!(driver.state(), DriverState::Uninitialized);
        assert!(driver.should_close());

        driver.init_context(3, 3).unwrap();
        assert_eq!(driver.state(), DriverState::ContextReady);
        driver.create_window(&WindowSettings::default()).unwrap();
        assert_eq!(driver.state(), DriverState::WindowOpen);
        driver.activate_context().unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert!(!driver.should_close());

        let gl = driver.gl().unwrap();
        assert_eq!(
            gl.calls(),
            vec![GlCall::Viewport(0, 0, 800, 450), GlCall::EnableDepthTest]
        );
    }

    #[test]
    fn test_window_failure_stops_before_activation() {
        let mut driver = FrameDriver::new(StubPlatform {
            fail_window: true,
            ..Default::default()
        });
        driver.init_context(3, 3).unwrap();

        let err = driver.create_window(&WindowSettings::default()).unwrap_err();
        assert!(matches!(err, DriverError::WindowCreation(_)));
        assert_eq!(driver.state(), DriverState::Closed);

        let err = driver.activate_context().unwrap_err();
        assert!(matches!(err, DriverError::InvalidState { .. }));
        assert_eq!(
            driver.platform().calls,
            vec!["init_context", "create_window", "terminate"]
        );
        assert!(driver.gl().is_none());
    }

    #[test]
    fn test_loader_failure_is_an_error() {
        let mut driver = FrameDriver::new(StubPlatform {
            fail_loader: true,
            ..Default::default()
        });
        driver.init_context(3, 3).unwrap();
        driver.create_window(&WindowSettings::default()).unwrap();

        let err = driver.activate_context().unwrap_err();
        assert!(matches!(err, DriverError::Loader(_)));
        assert_ne!(driver.state(), DriverState::Running);
    }

    #[test]
    fn test_out_of_order_calls_are_rejected() {
        let mut driver = FrameDriver::new(StubPlatform::default());
        assert!(matches!(
            driver.create_window(&WindowSettings::default()),
            Err(DriverError::InvalidState {
                state: DriverState::Uninitialized,
                ..
            })
        ));
        assert!(driver.present(true).is_err());
        assert!(driver.platform().calls.is_empty());
    }

    #[test]
    fn test_timer_first_tick_zero_then_deltas() {
        let mut driver = running(StubPlatform::default());
        driver.platform().now.set(2.0);
        driver.start_timer();
        // Startup work between start_timer and the first frame
        driver.platform().now.set(2.5);
        assert_eq!(driver.tick(), 0.0);

        driver.platform().now.set(2.516);
        let delta = driver.tick();
        assert!((delta - 0.016).abs() < 1e-6);

        driver.platform().now.set(2.55);
        let delta = driver.tick();
        assert!((delta - 0.034).abs() < 1e-6);
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut driver = running(StubPlatform {
            size: (100, 100),
            ..Default::default()
        });
        driver.gl().unwrap().clear_calls();
        driver.platform_mut().queued = vec![
            PlatformEvent::CursorMoved { x: 1.0, y: 2.0 },
            PlatformEvent::Resized {
                width: 640,
                height: 360,
            },
        ];

        let events = driver.poll_input();
        assert_eq!(events.len(), 2);
        assert_eq!(
            driver.gl().unwrap().calls(),
            vec![GlCall::Viewport(0, 0, 640, 360)]
        );
        assert!(driver.poll_input().is_empty());
    }

    #[test]
    fn test_present_sets_interval_every_frame() {
        let mut driver = running(StubPlatform::default());
        driver.present(true).unwrap();
        driver.present(false).unwrap();
        assert_eq!(driver.platform().intervals, vec![true, false]);
        let swaps = driver
            .platform()
            .calls
            .iter()
            .filter(|call| **call == "swap_buffers")
            .count();
        assert_eq!(swaps, 2);
    }

    #[test]
    fn test_cursor_mode_follows_free_look() {
        let mut driver = running(StubPlatform::default());
        let mut rig = CameraRig::new(FlyCamera::default(), 800, 600);

        driver.process_mouse(&mut rig, true);
        driver.process_mouse(&mut rig, true);
        assert!(!driver.cursor_visible());
        driver.process_mouse(&mut rig, false);
        assert!(driver.cursor_visible());

        // Only transitions reach the platform
        assert_eq!(driver.platform().captured, vec![true, false]);
    }

    #[test]
    fn test_request_close_and_terminate_twice() {
        let mut driver = running(StubPlatform::default());
        driver.request_close();
        assert!(driver.should_close());
        assert!(driver.is_key_down(KeyCode::Escape));

        driver.terminate();
        driver.terminate();
        let terminates = driver
            .platform()
            .calls
            .iter()
            .filter(|call| **call == "terminate")
            .count();
        assert_eq!(terminates, 1);
        assert_eq!(driver.state(), DriverState::Closed);
    }

    #[test]
    fn test_framebuffer_size_never_zero() {
        let driver = FrameDriver::new(StubPlatform {
            size: (0, 0),
            ..Default::default()
        });
        assert_eq!(driver.framebuffer_size(), (1, 1));
    }
}
