//! Homogeneous 4×4 transforms and the policies that combine them.
//!
//! Every builder here returns a plain [`Mat4`]. Composition is matrix
//! multiplication read right to left: in `A * B * C` the vertex passes
//! through `C` first, then `B`, then `A`.
//!
//! # Composition modes
//!
//! The same translate/rotate/scale triple can be combined in different
//! orders, and the order is what the demos are about:
//!
//! | Mode                              | Matrix      | Visual result                     |
//! |-----------------------------------|-------------|-----------------------------------|
//! | [`CompositionMode::PivotThenPlace`] | `T · R · S` | object spins about its own origin |
//! | [`CompositionMode::Orbit`]          | `R · T · S` | object circles the world origin   |
//!
//! Scenes that need a longer chain (the projection demo translates twice
//! around a rotation) describe it with [`Composition::Chain`].
//!
//! # Example
//!
//! ```
//! use vitrine::transform::{self, CompositionMode};
//! use vitrine::{Mat4, Vec3};
//!
//! let t = transform::translate(Vec3::new(0.5, -0.5, 0.0));
//! let r = transform::rotate(Vec3::Z, 30.0);
//! let s = transform::scale(Vec3::new(0.3, 0.5, 1.0));
//!
//! let spin = CompositionMode::PivotThenPlace.compose(t, r, s);
//! assert_eq!(spin, transform::compose(&[t, r, s]));
//! ```

use glam::{Mat4, Vec3};

/// Translation by `offset`.
pub fn translate(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Right-handed rotation of `degrees` about `axis`.
///
/// The axis is normalized here, so `(0, 0, 2)` and `(0, 0, 1)` describe the
/// same rotation. A zero-length axis has no direction and yields the identity.
pub fn rotate(axis: Vec3, degrees: f32) -> Mat4 {
    match axis.try_normalize() {
        Some(axis) => Mat4::from_axis_angle(axis, degrees.to_radians()),
        None => Mat4::IDENTITY,
    }
}

/// Per-axis scale. Use `Vec3::splat` for a uniform scale.
pub fn scale(factors: Vec3) -> Mat4 {
    Mat4::from_scale(factors)
}

/// Multiplies `steps` in the order given: `compose(&[a, b, c]) == a * b * c`.
///
/// An empty list is the identity.
pub fn compose(steps: &[Mat4]) -> Mat4 {
    steps.iter().fold(Mat4::IDENTITY, |acc, step| acc * *step)
}

/// Named ordering policy for a translate/rotate/scale triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositionMode {
    /// Scale, rotate about the local origin, then move into place: `T · R · S`.
    #[default]
    PivotThenPlace,
    /// Scale, move away from the origin, then rotate about the world origin: `R · T · S`.
    Orbit,
}

impl CompositionMode {
    pub fn compose(self, translation: Mat4, rotation: Mat4, scale: Mat4) -> Mat4 {
        match self {
            CompositionMode::PivotThenPlace => translation * rotation * scale,
            CompositionMode::Orbit => rotation * translation * scale,
        }
    }

    /// Short label used in log output.
    pub fn name(self) -> &'static str {
        match self {
            CompositionMode::PivotThenPlace => "pivot-then-place",
            CompositionMode::Orbit => "orbit",
        }
    }
}

/// One factor of an explicit chain.
///
/// Steps refer to the owning object's state so the chain stays valid while
/// the animation mutates that state.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// The object's translation.
    Translate,
    /// The object's rotation at this index.
    Rotate(usize),
    /// All of the object's rotations, multiplied in listed order.
    Rotations,
    /// The object's scale.
    Scale,
    /// A constant matrix.
    Fixed(Mat4),
}

/// How an object turns its translation, rotations and scale into a model matrix.
#[derive(Clone, Debug, PartialEq)]
pub enum Composition {
    /// A named policy. Mode keys switch between these at runtime.
    Mode(CompositionMode),
    /// An explicit product, left to right. Mode keys leave it alone.
    Chain(Vec<Step>),
}

impl Default for Composition {
    fn default() -> Self {
        Composition::Mode(CompositionMode::default())
    }
}

impl From<CompositionMode> for Composition {
    fn from(mode: CompositionMode) -> Self {
        Composition::Mode(mode)
    }
}

impl From<Vec<Step>> for Composition {
    fn from(steps: Vec<Step>) -> Self {
        Composition::Chain(steps)
    }
}

/// Resolved factors of one object for the current frame.
pub(crate) struct Factors<'a> {
    pub translation: Mat4,
    pub rotations: &'a [Mat4],
    pub scale: Mat4,
}

impl Factors<'_> {
    fn rotation(&self) -> Mat4 {
        compose(self.rotations)
    }
}

impl Composition {
    pub(crate) fn model_matrix(&self, factors: &Factors) -> Mat4 {
        match self {
            Composition::Mode(mode) => {
                mode.compose(factors.translation, factors.rotation(), factors.scale)
            }
            Composition::Chain(steps) => steps.iter().fold(Mat4::IDENTITY, |acc, step| {
                let m = match step {
                    Step::Translate => factors.translation,
                    Step::Rotate(i) => match factors.rotations.get(*i) {
                        Some(r) => *r,
                        None => {
                            log::warn!("chain refers to missing rotation {i}; using identity");
                            Mat4::IDENTITY
                        }
                    },
                    Step::Rotations => factors.rotation(),
                    Step::Scale => factors.scale,
                    Step::Fixed(m) => *m,
                };
                acc * m
            }),
        }
    }
}
