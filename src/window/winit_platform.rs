//! Desktop [`Platform`]: a winit window with a glutin OpenGL context.
//!
//! The frame loop owns the pace, so instead of handing control to
//! `EventLoop::run_app` the platform pumps pending events once per frame
//! with a zero timeout.

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use glow::HasContext;
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentContext, NotCurrentGlContext,
    PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{
    DeviceEvent, DeviceId, ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{CursorGrabMode, Fullscreen, Window, WindowId};

use super::{ContextRequest, Platform, PlatformError, PlatformEvent};
use crate::config::WindowSettings;
use crate::gfx::backend::GlowBackend;

/// Pixel scroll deltas (touchpads) are converted to lines at this rate
const PIXELS_PER_LINE: f32 = 20.0;

#[derive(Default)]
struct InputState {
    keys: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    close_requested: bool,
    cursor: (f64, f64),
    /// Unbounded pointer position while the cursor is captured
    virtual_cursor: (f64, f64),
    ui_events: Vec<Event<()>>,
}

pub struct WinitPlatform {
    event_loop: Option<EventLoop<()>>,
    request: Option<ContextRequest>,
    window: Option<Window>,
    gl_config: Option<Config>,
    pending_context: Option<NotCurrentContext>,
    context: Option<PossiblyCurrentContext>,
    surface: Option<Surface<WindowSurface>>,
    input: InputState,
    aspect_lock: Option<(u32, u32)>,
    cursor_captured: bool,
    started: Instant,
}

impl Default for WinitPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitPlatform {
    pub fn new() -> Self {
        Self {
            event_loop: None,
            request: None,
            window: None,
            gl_config: None,
            pending_context: None,
            context: None,
            surface: None,
            input: InputState::default(),
            aspect_lock: None,
            cursor_captured: false,
            started: Instant::now(),
        }
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    /// Raw window events from the last poll, for the UI overlay
    pub fn take_ui_events(&mut self) -> Vec<Event<()>> {
        std::mem::take(&mut self.input.ui_events)
    }
}

/// The candidate with the most samples; the first one wins ties
fn most_samples<T>(candidates: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    candidates.reduce(|best, candidate| {
        if samples(&candidate) > samples(&best) {
            candidate
        } else {
            best
        }
    })
}

// glutin's `find_configs` returns `BadConfig` before the picker runs when
// nothing matches the template, and `DisplayBuilder::build` surfaces that as
// `PlatformError::Window`. The picker has no error channel of its own, so an
// empty iterator here is a broken glutin invariant.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    match most_samples(configs, |config| config.num_samples()) {
        Some(config) => config,
        None => {
            log::error!("glutin offered no GL config to choose from");
            unreachable!("glutin calls the config picker with at least one config")
        }
    }
}

/// Requests a height matching `x:y` when the window drifts off the ratio
fn enforce_aspect(window: &Window, size: PhysicalSize<u32>, lock: Option<(u32, u32)>) {
    let Some((x, y)) = lock else {
        return;
    };
    if x == 0 || size.width == 0 {
        return;
    }
    let wanted = size.width * y / x;
    if size.height.abs_diff(wanted) > 1 {
        let _ = window.request_inner_size(PhysicalSize::new(size.width, wanted));
    }
}

impl Platform for WinitPlatform {
    type Backend = GlowBackend;

    fn init_context(&mut self, request: ContextRequest) -> Result<(), PlatformError> {
        let event_loop = EventLoop::new().map_err(|err| PlatformError::EventLoop(err.to_string()))?;
        self.event_loop = Some(event_loop);
        self.request = Some(request);
        Ok(())
    }

    fn create_window(&mut self, settings: &WindowSettings) -> Result<(), PlatformError> {
        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or(PlatformError::NotReady("event loop"))?;
        let request = self.request.ok_or(PlatformError::NotReady("context request"))?;

        let mut attributes = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(settings.width, settings.height));
        if settings.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_depth_size(24);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, template, pick_config)
            .map_err(|err| PlatformError::Window(err.to_string()))?;
        let window = window.ok_or_else(|| PlatformError::Window("no window was created".into()))?;

        let raw_handle = window.window_handle().ok().map(|handle| handle.as_raw());
        let profile = if request.core_profile {
            GlProfile::Core
        } else {
            GlProfile::Compatibility
        };
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(profile)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                request.major,
                request.minor,
            ))))
            .build(raw_handle);

        let display = gl_config.display();
        let context = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(|err| PlatformError::Context(err.to_string()))?;
        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|err| PlatformError::Surface(err.to_string()))?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|err| PlatformError::Surface(err.to_string()))?;

        self.window = Some(window);
        self.gl_config = Some(gl_config);
        self.pending_context = Some(context);
        self.surface = Some(surface);
        Ok(())
    }

    fn make_current(&mut self) -> Result<(), PlatformError> {
        let surface = self.surface.as_ref().ok_or(PlatformError::NotReady("window surface"))?;
        let context = self
            .pending_context
            .take()
            .ok_or(PlatformError::NotReady("GL context"))?;
        let context = context
            .make_current(surface)
            .map_err(|err| PlatformError::Context(err.to_string()))?;
        self.context = Some(context);
        Ok(())
    }

    fn load_gl(&mut self) -> Result<GlowBackend, PlatformError> {
        let request = self.request.ok_or(PlatformError::NotReady("context request"))?;
        let display = self
            .gl_config
            .as_ref()
            .ok_or(PlatformError::NotReady("GL config"))?
            .display();
        if self.context.is_none() {
            return Err(PlatformError::NotReady("current GL context"));
        }
        if display.get_proc_address(c"glGetString").is_null() {
            return Err(PlatformError::Loader("glGetString could not be resolved".into()));
        }

        let gl = unsafe { glow::Context::from_loader_function_cstr(|symbol| display.get_proc_address(symbol)) };
        let version = gl.version();
        let required = (u32::from(request.major), u32::from(request.minor));
        if (version.major, version.minor) < required {
            return Err(PlatformError::Loader(format!(
                "context provides OpenGL {}.{}, {}.{} required",
                version.major, version.minor, required.0, required.1
            )));
        }
        log::info!(
            "Loaded OpenGL {}.{} ({})",
            version.major,
            version.minor,
            version.vendor_info
        );
        Ok(GlowBackend::new(gl))
    }

    fn set_aspect_lock(&mut self, ratio: Option<(u32, u32)>) {
        self.aspect_lock = ratio;
        if let Some(window) = &self.window {
            enforce_aspect(window, window.inner_size(), ratio);
        }
    }

    fn should_close(&self) -> bool {
        self.input.close_requested
    }

    fn request_close(&mut self) {
        self.input.close_requested = true;
    }

    fn poll_events(&mut self, events: &mut Vec<PlatformEvent>) {
        let (Some(event_loop), Some(window)) = (self.event_loop.as_mut(), self.window.as_ref())
        else {
            return;
        };
        let gl = match (&self.surface, &self.context) {
            (Some(surface), Some(context)) => Some((surface, context)),
            _ => None,
        };
        let mut pump = EventPump {
            window,
            gl,
            input: &mut self.input,
            aspect_lock: self.aspect_lock,
            cursor_captured: self.cursor_captured,
            events,
        };
        if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut pump) {
            log::debug!("Event loop exited with code {code}");
            self.input.close_requested = true;
        }
    }

    fn is_key_down(&self, key: KeyCode) -> bool {
        self.input.keys.contains(&key)
    }

    fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.input.buttons.contains(&button)
    }

    fn time(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn swap_buffers(&mut self) -> Result<(), PlatformError> {
        let (Some(surface), Some(context)) = (&self.surface, &self.context) else {
            return Err(PlatformError::NotReady("current GL context"));
        };
        surface
            .swap_buffers(context)
            .map_err(|err| PlatformError::Surface(err.to_string()))
    }

    fn set_swap_interval(&mut self, vsync: bool) -> Result<(), PlatformError> {
        let (Some(surface), Some(context)) = (&self.surface, &self.context) else {
            return Err(PlatformError::NotReady("current GL context"));
        };
        let interval = if vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        surface
            .set_swap_interval(context, interval)
            .map_err(|err| PlatformError::Surface(err.to_string()))
    }

    fn set_cursor_captured(&mut self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };
        let grab = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(err) = grab {
            log::warn!("Cursor grab unavailable: {err}");
        }
        window.set_cursor_visible(!captured);
        if captured {
            self.input.virtual_cursor = self.input.cursor;
        }
        self.cursor_captured = captured;
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.window
            .as_ref()
            .map(|window| {
                let size = window.inner_size();
                (size.width, size.height)
            })
            .unwrap_or((0, 0))
    }

    fn terminate(&mut self) {
        self.surface = None;
        self.context = None;
        self.pending_context = None;
        self.gl_config = None;
        self.window = None;
        self.event_loop = None;
    }
}

/// One pump's worth of borrowed platform state
struct EventPump<'a> {
    window: &'a Window,
    gl: Option<(&'a Surface<WindowSurface>, &'a PossiblyCurrentContext)>,
    input: &'a mut InputState,
    aspect_lock: Option<(u32, u32)>,
    cursor_captured: bool,
    events: &'a mut Vec<PlatformEvent>,
}

impl ApplicationHandler for EventPump<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if window_id != self.window.id() {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.input.close_requested = true;
                self.events.push(PlatformEvent::CloseRequested);
            }
            WindowEvent::Resized(size) => {
                if let (Some((surface, context)), Some(width), Some(height)) = (
                    self.gl,
                    NonZeroU32::new(size.width),
                    NonZeroU32::new(size.height),
                ) {
                    surface.resize(context, width, height);
                }
                enforce_aspect(self.window, *size, self.aspect_lock);
                self.events.push(PlatformEvent::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor = (position.x, position.y);
                if !self.cursor_captured {
                    self.events.push(PlatformEvent::CursorMoved {
                        x: position.x,
                        y: position.y,
                    });
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
                };
                self.events.push(PlatformEvent::Scrolled { dy });
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.input.buttons.insert(*button);
                }
                ElementState::Released => {
                    self.input.buttons.remove(button);
                }
            },
            WindowEvent::KeyboardInput { event: key, .. } => {
                if let PhysicalKey::Code(code) = key.physical_key {
                    match key.state {
                        ElementState::Pressed => {
                            self.input.keys.insert(code);
                        }
                        ElementState::Released => {
                            self.input.keys.remove(&code);
                        }
                    }
                }
            }
            WindowEvent::Focused(false) => {
                self.input.keys.clear();
                self.input.buttons.clear();
            }
            _ => {}
        }

        self.input.ui_events.push(Event::WindowEvent { window_id, event });
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        // A captured cursor stops producing window positions on some
        // platforms, so raw motion drives a virtual position instead.
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.cursor_captured {
                self.input.virtual_cursor.0 += dx;
                self.input.virtual_cursor.1 += dy;
                let (x, y) = self.input.virtual_cursor;
                self.events.push(PlatformEvent::CursorMoved { x, y });
            }
        }
    }
}
