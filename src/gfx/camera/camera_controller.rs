use super::fly_camera::FlyCamera;

/// Pointer bookkeeping between windowing callbacks and frame updates.
///
/// Callbacks may fire several times per frame; deltas accumulate here and are
/// consumed exactly once by [`CameraRig::process_mouse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub last_x: f64,
    pub last_y: f64,
    pub x_offset: f32,
    pub y_offset: f32,
    pub is_first_move: bool,
}

impl PointerState {
    fn centered(width: u32, height: u32) -> Self {
        Self {
            last_x: width as f64 / 2.0,
            last_y: height as f64 / 2.0,
            x_offset: 0.0,
            y_offset: 0.0,
            is_first_move: true,
        }
    }
}

/// Camera plus the input state that drives it.
///
/// The rig is owned by the application loop and handed to the frame driver's
/// event pump, so there is no global input state.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: FlyCamera,
    pointer: PointerState,
    is_active: bool,
}

impl CameraRig {
    pub fn new(camera: FlyCamera, width: u32, height: u32) -> Self {
        Self {
            camera,
            pointer: PointerState::centered(width, height),
            is_active: false,
        }
    }

    /// Replaces the camera and re-centres the pointer record
    pub fn reset(&mut self, camera: FlyCamera, width: u32, height: u32) {
        self.camera = camera;
        self.pointer = PointerState::centered(width, height);
        self.is_active = false;
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Pointer-move callback. The first move after a reset or activation only
    /// seeds the last position, so grabbing the cursor never causes a jump.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        if self.pointer.is_first_move {
            self.pointer.is_first_move = false;
        } else {
            self.pointer.x_offset += (x - self.pointer.last_x) as f32;
            self.pointer.y_offset += (y - self.pointer.last_y) as f32;
        }
        self.pointer.last_x = x;
        self.pointer.last_y = y;
    }

    /// Scroll callback, applied to the camera immediately
    pub fn on_scroll(&mut self, dy: f32) {
        self.camera.process_scroll(dy);
    }

    /// Deltas accumulated since the last [`CameraRig::process_mouse`]
    pub fn pending_delta(&self) -> (f32, f32) {
        (self.pointer.x_offset, self.pointer.y_offset)
    }

    /// Consumes this frame's pointer delta.
    ///
    /// The delta turns the camera only while `active`; it is cleared either
    /// way. Returns whether free-look is engaged (cursor should be captured).
    pub fn process_mouse(&mut self, active: bool) -> bool {
        let (dx, dy) = self.pending_delta();
        self.pointer.x_offset = 0.0;
        self.pointer.y_offset = 0.0;

        if active && !self.is_active {
            self.pointer.is_first_move = true;
        }
        if active && self.is_active {
            self.camera.process_mouse(dx, dy);
        }
        self.is_active = active;
        active
    }
}
