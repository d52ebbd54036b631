//! # Vitrine
//!
//! **Small interactive 3D scenes on wgpu: transforms, animation and Phong lighting.**
//!
//! A scene is declared once as a [`SceneSetup`] (vertex data, WGSL programs,
//! objects, camera, light) and handed to [`run`], which opens a window and
//! redraws it continuously.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vitrine::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut setup = SceneSetup::new();
//!     let cube = setup.add_drawable(drawable::color_cube(0.5));
//!     let program = setup.add_program(ProgramSource::color());
//!     let spin = setup.animate(0.0, 0.02);
//!
//!     setup
//!         .camera(Camera::new().with_view(transform::translate(Vec3::new(0.0, 0.0, -3.0))))
//!         .add_object(SceneObject::new(cube, program).rotated(Rotation::animated(Vec3::Y, spin)));
//!
//!     run(AppConfig::new().title("Cube"), setup)
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`transform`]: translate / rotate / scale and their composition policies.
//! - [`animation`]: per-tick angle stepping with wraparound.
//! - [`phong`]: the lighting model on the CPU, matching the shipped shader.
//! - [`program`]: WGSL compile, link and uniform reflection.
//! - [`FrameRenderer`]: per-frame orchestration over any [`RenderBackend`].

mod app;
mod backend;
mod camera;
mod controls;
mod error;
mod gpu;
mod renderer;
mod scene;
mod wgpu_backend;

pub mod animation;
pub mod demos;
pub mod drawable;
pub mod logging;
pub mod phong;
pub mod program;
pub mod transform;

pub use animation::{AngleId, AnimationStepper};
pub use app::{AppConfig, run};
pub use backend::{FrameStart, RenderBackend};
pub use camera::Camera;
pub use controls::{Controls, EditTarget, KeyAction, Manipulator};
pub use drawable::{DrawStyle, DrawableId, VertexAttribute, VertexData, VertexLayout};
pub use error::{GpuInitError, ProgramError, RenderError, ShaderStage};
pub use gpu::GpuContext;
pub use phong::{Light, LightingConfig};
pub use program::{ProgramId, ProgramManager, ProgramSource, UniformKind, UniformValue};
pub use renderer::{FrameRenderer, FrameState};
pub use scene::{Angle, Color, Rotation, Scene, SceneObject, SceneSetup, uniforms};
pub use transform::{Composition, CompositionMode, Step};
pub use wgpu_backend::WgpuBackend;

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec3};

// Re-export the key type controls are written against
pub use winit::keyboard::KeyCode;
