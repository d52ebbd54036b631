//! Declarative scene construction.

use crate::animation::AngleId;
use crate::camera::Camera;
use crate::controls::{Controls, Manipulator};
use crate::drawable::{DrawableId, VertexData};
use crate::phong::{Light, LightingConfig};
use crate::program::{ProgramId, ProgramSource};

use super::{Color, Scene, SceneObject};

/// Everything a demo declares before the first frame.
///
/// Handles returned here are only meaningful for this setup. Nothing touches
/// the GPU until the setup is passed to
/// [`FrameRenderer::initialize`](crate::FrameRenderer::initialize).
///
/// # Example
///
/// ```
/// use vitrine::{drawable, Camera, ProgramSource, Rotation, SceneObject, SceneSetup};
/// use vitrine::Vec3;
///
/// let mut setup = SceneSetup::new();
/// let cube = setup.add_drawable(drawable::color_cube(0.5));
/// let program = setup.add_program(ProgramSource::color());
/// let spin = setup.animate(0.0, 0.02);
///
/// setup
///     .camera(Camera::new().with_fov(60.0))
///     .add_object(SceneObject::new(cube, program).rotated(Rotation::animated(Vec3::Y, spin)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct SceneSetup {
    pub(crate) drawables: Vec<VertexData>,
    pub(crate) programs: Vec<ProgramSource>,
    pub(crate) scene: Scene,
    pub(crate) controls: Controls,
}

impl SceneSetup {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Register vertex data. Validated at initialization.
    pub fn add_drawable(&mut self, data: VertexData) -> DrawableId {
        self.drawables.push(data);
        DrawableId(self.drawables.len() - 1)
    }

    /// Register a program. Compiled and linked at initialization, in
    /// registration order.
    pub fn add_program(&mut self, source: ProgramSource) -> ProgramId {
        self.programs.push(source);
        ProgramId(self.programs.len() - 1)
    }

    /// Add an animation slot advanced by `increment` degrees per tick.
    pub fn animate(&mut self, initial: f32, increment: f32) -> AngleId {
        self.scene.angles.add(initial, increment)
    }

    // ========================================================================
    // Scene
    // ========================================================================

    /// Append an object. Objects draw in the order they were added.
    pub fn add_object(&mut self, object: SceneObject) -> &mut Self {
        self.scene.objects.push(object);
        self
    }

    pub fn camera(&mut self, camera: Camera) -> &mut Self {
        self.scene.camera = camera;
        self
    }

    /// Enable lighting uniforms with this light.
    pub fn light(&mut self, light: Light) -> &mut Self {
        self.scene.light = Some(light);
        self
    }

    pub fn lighting(&mut self, config: LightingConfig) -> &mut Self {
        self.scene.lighting = config;
        self
    }

    pub fn clear_color(&mut self, color: Color) -> &mut Self {
        self.scene.clear_color = color;
        self
    }

    // ========================================================================
    // Controls
    // ========================================================================

    /// Let Digit1 / Digit2 switch the composition mode of every object.
    pub fn mode_keys(&mut self) -> &mut Self {
        self.controls.mode_keys = true;
        self
    }

    /// Edit the object at `index` (in add order) from the keyboard.
    pub fn manipulate(&mut self, index: usize) -> &mut Self {
        self.controls.manipulator = Some(Manipulator::new(index));
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}
