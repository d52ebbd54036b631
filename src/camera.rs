use glam::{Mat4, Vec3};

/// A fixed camera: a view matrix plus a perspective frustum.
///
/// The view matrix and the eye position are set independently. The eye is
/// only used for specular highlights, so a scene can move the world with
/// `view` and still light it as if seen from `position`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            position: Vec3::ZERO,
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, view: Mat4) -> Self {
        self.view = view;
        self
    }

    /// Eye position used for lighting.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    pub fn with_depth_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Matches the aspect ratio to a `width` x `height` viewport.
    ///
    /// A zero-sized viewport (minimized window) keeps the previous ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Right-handed perspective projection mapping depth to `[0, 1]`.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }
}
