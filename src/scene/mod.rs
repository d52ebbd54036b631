//! Scene state: objects, animation slots, camera and light.
//!
//! A [`SceneSetup`] collects drawables, programs and objects. The
//! [`FrameRenderer`](crate::FrameRenderer) turns it into GPU resources and
//! then owns the resulting [`Scene`], mutating it on every tick.

mod object;
mod scene;
mod setup;

pub use object::{Angle, Rotation, SceneObject};
pub use scene::{Color, Scene, uniforms};
pub use setup::SceneSetup;
