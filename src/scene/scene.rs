//! The mutable state one demo draws from.

use crate::animation::AnimationStepper;
use crate::camera::Camera;
use crate::phong::{Light, LightingConfig};
use crate::transform::{Composition, CompositionMode};

use super::SceneObject;

/// Uniform names the renderer fills in. Programs declare whichever they read.
pub mod uniforms {
    pub const MODEL: &str = "model";
    pub const VIEW: &str = "view";
    pub const PROJECTION: &str = "projection";
    pub const OBJECT_COLOR: &str = "object_color";
    pub const LIGHT_COLOR: &str = "light_color";
    pub const LIGHT_POSITION: &str = "light_position";
    pub const CAMERA_POSITION: &str = "camera_position";
    pub const KA: &str = "ka";
    pub const KD: &str = "kd";
    pub const KS: &str = "ks";
    pub const SHININESS: &str = "shininess";
}

/// RGBA clear color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    /// Dark teal used by the bundled demos.
    pub const SLATE: Color = Color::rgb(0.2, 0.3, 0.3);

    pub(crate) fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: f64::from(self.r),
            g: f64::from(self.g),
            b: f64::from(self.b),
            a: f64::from(self.a),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Objects in draw order, their shared animation slots, the camera and the light.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub angles: AnimationStepper,
    pub camera: Camera,
    /// Without a light, `light_color` and `light_position` are pushed as zero.
    pub light: Option<Light>,
    pub lighting: LightingConfig,
    pub clear_color: Color,
}

impl Scene {
    /// Switches every object that uses a named mode. Explicit chains are left alone.
    ///
    /// Returns how many objects changed.
    pub fn set_composition_mode(&mut self, mode: CompositionMode) -> usize {
        let mut changed = 0;
        for object in &mut self.objects {
            if let Composition::Mode(current) = &mut object.composition {
                if *current != mode {
                    *current = mode;
                    changed += 1;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::DrawableId;
    use crate::program::ProgramId;
    use crate::transform::Step;

    #[test]
    fn mode_switch_skips_chains() {
        let mut scene = Scene::default();
        scene
            .objects
            .push(SceneObject::new(DrawableId(0), ProgramId(0)));
        scene.objects.push(
            SceneObject::new(DrawableId(0), ProgramId(0))
                .composed(Composition::Chain(vec![Step::Translate])),
        );

        assert_eq!(scene.set_composition_mode(CompositionMode::Orbit), 1);
        assert_eq!(
            scene.objects[0].composition,
            Composition::Mode(CompositionMode::Orbit)
        );
        assert_eq!(
            scene.objects[1].composition,
            Composition::Chain(vec![Step::Translate])
        );
        assert_eq!(scene.set_composition_mode(CompositionMode::Orbit), 0);
    }

    #[test]
    fn clear_color_converts_to_wgpu() {
        let c = Color::SLATE.to_wgpu();
        assert_eq!((c.r as f32, c.g as f32, c.b as f32, c.a), (0.2, 0.3, 0.3, 1.0));
    }
}
