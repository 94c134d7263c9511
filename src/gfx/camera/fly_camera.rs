use cgmath::*;

/// Free-look camera driven by pointer deltas.
///
/// Angles are kept in degrees. Yaw starts at -90° so the camera looks down -Z.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    pub world_up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    pub mouse_sensitivity: f32,
    pub movement_speed: f32,
    pub bounds: FlyCameraBounds,
    pub znear: f32,
    pub zfar: f32,
}

/// Directions for keyboard movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct FlyCameraBounds {
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for FlyCameraBounds {
    fn default() -> Self {
        Self {
            min_pitch: -89.0,
            max_pitch: 89.0,
            min_zoom: 1.0,
            max_zoom: 45.0,
        }
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 3.0))
    }
}

impl FlyCamera {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            world_up: Vector3::unit_y(),
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            mouse_sensitivity: 0.1,
            movement_speed: 2.5,
            bounds: FlyCameraBounds::default(),
            znear: 0.1,
            zfar: 100.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn front(&self) -> Vector3<f32> {
        let (yaw, pitch) = (Deg(self.yaw), Deg(self.pitch));
        Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.front().cross(self.world_up).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.front()).normalize()
    }

    /// Applies one frame's pointer movement. Screen y grows downwards, so a
    /// positive `dy` pitches the camera down.
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.mouse_sensitivity;
        self.pitch = (self.pitch - dy * self.mouse_sensitivity)
            .clamp(self.bounds.min_pitch, self.bounds.max_pitch);
    }

    /// Scrolling up narrows the field of view
    pub fn process_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(self.bounds.min_zoom, self.bounds.max_zoom);
    }

    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        let offset = match direction {
            CameraMovement::Forward => self.front() * velocity,
            CameraMovement::Backward => -self.front() * velocity,
            CameraMovement::Left => -self.right() * velocity,
            CameraMovement::Right => self.right() * velocity,
        };
        self.position += offset;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front(), self.up())
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        perspective(Deg(self.zoom), aspect, self.znear, self.zfar)
    }
}
