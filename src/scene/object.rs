//! Drawable instances and their transform state.

use glam::{Mat4, Vec3};

use crate::animation::{AngleId, AnimationStepper};
use crate::drawable::{DrawStyle, DrawableId};
use crate::program::ProgramId;
use crate::transform::{self, Composition, Factors};

/// An angle in degrees, either constant or driven by an animation slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Angle {
    Fixed(f32),
    Animated(AngleId),
}

impl Angle {
    pub fn degrees(&self, angles: &AnimationStepper) -> f32 {
        match *self {
            Angle::Fixed(degrees) => degrees,
            Angle::Animated(id) => angles.value(id),
        }
    }
}

/// Rotation about `axis` by `angle`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub axis: Vec3,
    pub angle: Angle,
}

impl Rotation {
    pub fn fixed(axis: Vec3, degrees: f32) -> Self {
        Self {
            axis,
            angle: Angle::Fixed(degrees),
        }
    }

    pub fn animated(axis: Vec3, angle: AngleId) -> Self {
        Self {
            axis,
            angle: Angle::Animated(angle),
        }
    }

    pub fn matrix(&self, angles: &AnimationStepper) -> Mat4 {
        transform::rotate(self.axis, self.angle.degrees(angles))
    }
}

/// One drawable placed in the scene.
///
/// Built with chained setters:
///
/// ```ignore
/// SceneObject::new(cube, program)
///     .scaled(Vec3::splat(0.3))
///     .rotated(Rotation::animated(Vec3::Y, spin))
///     .translated(Vec3::new(0.0, 0.0, -2.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub drawable: DrawableId,
    pub program: ProgramId,
    pub translation: Vec3,
    /// Multiplied in listed order, so the last one is applied first.
    pub rotations: Vec<Rotation>,
    pub scale: Vec3,
    pub composition: Composition,
    /// Pushed as `object_color` when set.
    pub color: Option<Vec3>,
    pub style: DrawStyle,
}

impl SceneObject {
    pub fn new(drawable: DrawableId, program: ProgramId) -> Self {
        Self {
            drawable,
            program,
            translation: Vec3::ZERO,
            rotations: Vec::new(),
            scale: Vec3::ONE,
            composition: Composition::default(),
            color: None,
            style: DrawStyle::Faces,
        }
    }

    pub fn translated(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotations.push(rotation);
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn composed(mut self, composition: impl Into<Composition>) -> Self {
        self.composition = composition.into();
        self
    }

    pub fn colored(mut self, color: Vec3) -> Self {
        self.color = Some(color);
        self
    }

    pub fn styled(mut self, style: DrawStyle) -> Self {
        self.style = style;
        self
    }

    /// Animation slots this object reads.
    pub fn angle_ids(&self) -> impl Iterator<Item = AngleId> + '_ {
        self.rotations.iter().filter_map(|r| match r.angle {
            Angle::Animated(id) => Some(id),
            Angle::Fixed(_) => None,
        })
    }

    /// Model matrix for the current animation state.
    pub fn model_matrix(&self, angles: &AnimationStepper) -> Mat4 {
        let rotations: Vec<Mat4> = self.rotations.iter().map(|r| r.matrix(angles)).collect();
        self.composition.model_matrix(&Factors {
            translation: transform::translate(self.translation),
            rotations: &rotations,
            scale: transform::scale(self.scale),
        })
    }
}
