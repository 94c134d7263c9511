//! # Shader Toy Application
//!
//! [`ShaderToyApp`] composes the frame driver, the shader program, the
//! full-screen quad and the UI overlay. Each frame runs, in order:
//!
//! 1. tick the timer and advance `iTime` (wrapping every 300 s)
//! 2. drain window events into the UI and the camera rig
//! 3. clear, set the polygon mode, write uniforms and draw the quad
//! 4. build and render the "UI Box" panel
//! 5. present with the panel's vsync setting

use anyhow::{Context, Result};
use cgmath::{EuclideanSpace, Point3, Vector2, Vector3};
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::config::{AppConfig, TIME_WRAP_SECONDS};
use crate::gfx::backend::{GlowBackend, GpuBackend, PolygonMode};
use crate::gfx::buffer::{BufferObject, QuadVertex, FULLSCREEN_QUAD, QUAD_INDICES};
use crate::gfx::camera::{CameraMovement, CameraRig, FlyCamera};
use crate::gfx::program::Program;
use crate::gfx::texture::{Texture, TextureUnit};
use crate::resources::ResourceResolver;
use crate::ui::{ControlPanel, UiManager};
use crate::window::{FrameDriver, PlatformEvent, WinitPlatform};

const MOVEMENT_KEYS: [(KeyCode, CameraMovement); 4] = [
    (KeyCode::KeyW, CameraMovement::Forward),
    (KeyCode::KeyS, CameraMovement::Backward),
    (KeyCode::KeyA, CameraMovement::Left),
    (KeyCode::KeyD, CameraMovement::Right),
];

/// Per-frame values fed to the shader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub time: f32,
    pub delta: f32,
    pub resolution: (u32, u32),
    pub camera_position: Point3<f32>,
    pub camera_front: Vector3<f32>,
}

/// Adds `delta` to the shader clock, wrapping back by [`TIME_WRAP_SECONDS`]
pub fn advance_time(time: f32, delta: f32) -> f32 {
    let time = time + delta;
    if time > TIME_WRAP_SECONDS {
        time - TIME_WRAP_SECONDS
    } else {
        time
    }
}

/// GPU resources of the shader toy: program, quad and `iChannel0`
pub struct ShaderToyScene {
    program: Program,
    quad: BufferObject,
    channel0: Texture,
}

impl ShaderToyScene {
    /// Loads the configured shader pair and channel texture.
    ///
    /// A broken shader leaves an unlinked program and the scene still loads;
    /// a missing texture is replaced by a 1x1 white one.
    pub fn load(gl: &dyn GpuBackend, config: &AppConfig) -> Result<Self> {
        let resolver = ResourceResolver::new(config.resource_root.clone());

        let program = Program::from_files(
            gl,
            resolver.get_path(&config.vertex_shader),
            resolver.get_path(&config.fragment_shader),
        )
        .unwrap_or_else(|err| {
            log::error!("Shader program unavailable, drawing nothing: {err}");
            Program::unlinked()
        });

        let channel0 = match Texture::from_file(gl, resolver.get_path(&config.channel0_texture)) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("{err}; iChannel0 falls back to white");
                Texture::solid(gl, [255, 255, 255, 255])
                    .context("creating the fallback iChannel0 texture")?
            }
        };

        Self::with_program(gl, program, channel0)
    }

    /// Builds the quad around an existing program and texture. Both are
    /// released if the quad cannot be allocated.
    pub fn with_program(
        gl: &dyn GpuBackend,
        mut program: Program,
        mut channel0: Texture,
    ) -> Result<Self> {
        let quad = match BufferObject::generate(gl) {
            Ok(quad) => quad,
            Err(err) => {
                program.release(gl);
                channel0.release(gl);
                return Err(err).context("allocating the full-screen quad");
            }
        };
        {
            let bound = quad.bind(gl);
            bound.upload_vertices(&FULLSCREEN_QUAD);
            bound.upload_indices(&QUAD_INDICES);
            QuadVertex::describe(&bound);
        }
        Ok(Self {
            program,
            quad,
            channel0,
        })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Clears the target and draws the quad with this frame's uniforms
    pub fn draw(&self, gl: &dyn GpuBackend, frame: &FrameInputs, background: [f32; 4], mode: PolygonMode) {
        gl.clear_color(background);
        gl.clear();
        gl.polygon_mode(mode);

        let program = &self.program;
        program.use_program(gl);
        program.set(gl, "iTime", frame.time);
        program.set(gl, "iTimeDelta", frame.delta);
        program.set(
            gl,
            "iResolution",
            Vector2::new(frame.resolution.0 as f32, frame.resolution.1 as f32),
        );
        program.set(gl, "iChannel0", (TextureUnit(0), &self.channel0));
        program.set(gl, "iCameraPosition", frame.camera_position.to_vec());
        program.set(gl, "iCameraFront", frame.camera_front);

        self.quad.draw_indexed(gl, QUAD_INDICES.len() as i32);
    }

    pub fn release(&mut self, gl: &dyn GpuBackend) {
        self.program.release(gl);
        self.quad.release(gl);
        self.channel0.release(gl);
    }
}

/// Walks the driver from `Uninitialized` to `Running`
fn open_window(driver: &mut FrameDriver<WinitPlatform>, config: &AppConfig) -> Result<()> {
    let (major, minor) = config.gl_version;
    driver
        .init_context(major, minor)
        .context("requesting the OpenGL context")?;
    driver
        .create_window(&config.window)
        .context("opening the main window")?;
    driver
        .activate_context()
        .context("activating the OpenGL context")
}

/// The shader toy window
pub struct ShaderToyApp {
    config: AppConfig,
    panel: ControlPanel,
    rig: CameraRig,
    time: f32,
}

impl ShaderToyApp {
    pub fn new(config: AppConfig) -> Self {
        let panel = ControlPanel {
            background_color: config.background_color.into(),
            ..ControlPanel::default()
        };
        let rig = CameraRig::new(FlyCamera::default(), config.window.width, config.window.height);
        Self {
            config,
            panel,
            rig,
            time: 0.0,
        }
    }

    /// Opens the window and runs until it is closed or Escape is pressed.
    ///
    /// Startup failures (window, context, GL loader) are returned; the
    /// platform is terminated on every path.
    pub fn run(mut self) -> Result<()> {
        let mut driver = FrameDriver::new(WinitPlatform::new());
        let result = match open_window(&mut driver, &self.config) {
            Ok(()) => self.run_frames(&mut driver),
            Err(err) => Err(err),
        };
        driver.terminate();
        result
    }

    fn run_frames(&mut self, driver: &mut FrameDriver<WinitPlatform>) -> Result<()> {
        let gl = driver.gl().cloned().context("GL backend missing after activation")?;
        let window = driver
            .platform()
            .window()
            .context("window missing after activation")?;
        let mut ui = UiManager::new(gl.context(), window, &self.config.glsl_version())?;
        let mut scene = match ShaderToyScene::load(&gl, &self.config) {
            Ok(scene) => scene,
            Err(err) => {
                ui.destroy(gl.context());
                return Err(err);
            }
        };

        let (width, height) = driver.framebuffer_size();
        self.rig.reset(FlyCamera::default(), width, height);
        driver.start_timer();
        log::info!("Entering frame loop");

        let result = self.frame_loop(driver, &gl, &mut ui, &scene);

        ui.destroy(gl.context());
        scene.release(&gl);
        result
    }

    fn frame_loop(
        &mut self,
        driver: &mut FrameDriver<WinitPlatform>,
        gl: &GlowBackend,
        ui: &mut UiManager,
        scene: &ShaderToyScene,
    ) -> Result<()> {
        while !driver.should_close() {
            let delta = driver.tick();
            self.time = advance_time(self.time, delta);

            let events = driver.poll_input();
            let ui_events = driver.platform_mut().take_ui_events();
            if let Some(window) = driver.platform().window() {
                for event in &ui_events {
                    ui.handle_event(window, event);
                }
            }
            for event in events {
                match event {
                    PlatformEvent::CursorMoved { x, y } => self.rig.on_cursor_moved(x, y),
                    PlatformEvent::Scrolled { dy } if !ui.wants_mouse() => self.rig.on_scroll(dy),
                    _ => {}
                }
            }

            if driver.is_key_down(KeyCode::Escape) {
                driver.request_close();
            }

            let free_look = driver.is_mouse_down(MouseButton::Right) && !ui.wants_mouse();
            driver.process_mouse(&mut self.rig, free_look);
            if free_look && !ui.wants_keyboard() {
                for (key, direction) in MOVEMENT_KEYS {
                    if driver.is_key_down(key) {
                        self.rig.camera.process_keyboard(direction, delta);
                    }
                }
            }

            let frame = FrameInputs {
                time: self.time,
                delta,
                resolution: driver.framebuffer_size(),
                camera_position: self.rig.camera.position,
                camera_front: self.rig.camera.front(),
            };
            scene.draw(gl, &frame, self.panel.background_color, self.panel.polygon_mode);

            let window = driver
                .platform()
                .window()
                .context("window closed during the frame")?;
            let panel = &mut self.panel;
            ui.frame(window, |ui| panel.draw(ui));
            ui.render(gl.context())?;

            driver.present(self.panel.vsync)?;
        }
        log::info!("Frame loop finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::recording::{GlCall, RecordingBackend, UniformWrite};
    use crate::gfx::texture::TextureBinding;

    const TOY_VS: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec2 aTexCoord;
out vec2 TexCoord;
void main() { gl_Position = vec4(aPos, 1.0); TexCoord = aTexCoord; }
";

    const TOY_FS: &str = "#version 330 core
out vec4 FragColor;
in vec2 TexCoord;
uniform float iTime;
uniform float iTimeDelta;
uniform vec2 iResolution;
uniform sampler2D iChannel0;
void main() { FragColor = texture(iChannel0, TexCoord) * abs(sin(iTime)); }
";

    fn frame() -> FrameInputs {
        FrameInputs {
            time: 1.5,
            delta: 0.016,
            resolution: (1280, 720),
            camera_position: Point3::new(0.0, 0.0, 3.0),
            camera_front: Vector3::new(0.0, 0.0, -1.0),
        }
    }

    fn scene(gl: &RecordingBackend) -> ShaderToyScene {
        let program = Program::from_sources(gl, TOY_VS, TOY_FS).unwrap();
        let channel0 = Texture::solid(gl, [255, 0, 0, 255]).unwrap();
        ShaderToyScene::with_program(gl, program, channel0).unwrap()
    }

    #[test]
    fn test_advance_time_wraps() {
        assert_eq!(advance_time(1.0, 0.5), 1.5);
        assert_eq!(advance_time(300.0, 0.0), 300.0);
        assert!((advance_time(299.9, 0.2) - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_draw_order_and_uniforms() {
        let gl = RecordingBackend::new();
        let scene = scene(&gl);
        gl.clear_calls();

        scene.draw(&gl, &frame(), [0.1, 0.2, 0.3, 1.0], PolygonMode::Line);

        let calls = gl.calls();
        assert_eq!(calls[0], GlCall::ClearColor([0.1, 0.2, 0.3, 1.0]));
        assert_eq!(calls[1], GlCall::Clear);
        assert_eq!(calls[2], GlCall::PolygonMode(PolygonMode::Line));
        assert_eq!(calls[3], GlCall::UseProgram(scene.program().id()));

        let writes: Vec<UniformWrite> = gl.uniform_writes().into_iter().map(|(_, w)| w).collect();
        assert!(writes.contains(&UniformWrite::F32(1.5)));
        assert!(writes.contains(&UniformWrite::F32(0.016)));
        assert!(writes.contains(&UniformWrite::Vec2([1280.0, 720.0])));
        assert!(writes.contains(&UniformWrite::I32(0)));
        assert!(calls.contains(&GlCall::ActiveTexture(0)));

        assert_eq!(gl.draw_calls(), vec![GlCall::DrawElements { count: 6, offset: 0 }]);
    }

    #[test]
    fn test_broken_program_still_draws_quad() {
        let gl = RecordingBackend::new();
        let channel0 = Texture::solid(&gl, [255, 255, 255, 255]).unwrap();
        let scene = ShaderToyScene::with_program(&gl, Program::unlinked(), channel0).unwrap();
        gl.clear_calls();

        scene.draw(&gl, &frame(), [0.0; 4], PolygonMode::Fill);
        assert!(gl.uniform_writes().is_empty());
        assert_eq!(gl.draw_calls().len(), 1);
    }

    #[test]
    fn test_quad_allocation_failure_releases_program_and_texture() {
        let gl = RecordingBackend::new();
        let program = Program::from_sources(&gl, TOY_VS, TOY_FS).unwrap();
        let channel0 = Texture::solid(&gl, [255, 0, 0, 255]).unwrap();
        let texture_id = channel0.id();
        gl.lose_context();

        assert!(ShaderToyScene::with_program(&gl, program, channel0).is_err());
        assert!(gl.live_programs().is_empty());
        assert!(gl.calls().contains(&GlCall::DeleteTexture(texture_id)));
    }

    #[test]
    fn test_load_falls_back_when_files_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default().with_resource_root(dir.path());
        let gl = RecordingBackend::new();

        let scene = ShaderToyScene::load(&gl, &config).unwrap();
        assert!(!scene.program().is_linked());
        assert!(gl
            .calls()
            .iter()
            .any(|call| matches!(call, GlCall::CreateTexture(_, 1, 1))));
    }

    #[test]
    fn test_load_reads_configured_shaders() {
        let dir = tempfile::tempdir().unwrap();
        let shaders = dir.path().join("shaders/2dshaders");
        std::fs::create_dir_all(&shaders).unwrap();
        std::fs::write(shaders.join("shaderToy.vs"), TOY_VS).unwrap();
        std::fs::write(shaders.join("shaderToy.fs"), TOY_FS).unwrap();

        let config = AppConfig::default().with_resource_root(dir.path());
        let gl = RecordingBackend::new();
        let mut scene = ShaderToyScene::load(&gl, &config).unwrap();
        assert!(scene.program().is_linked());

        scene.release(&gl);
        assert!(gl.live_programs().is_empty());
    }
}
