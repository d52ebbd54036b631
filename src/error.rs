//! Error types for program building, drawing and device setup.

use std::fmt;

use crate::animation::AngleId;
use crate::drawable::DrawableId;
use crate::program::ProgramId;

/// Pipeline stage a shader source belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// A program that could not be built. Nothing bound to it is drawn.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link:\n{log}")]
    Link { log: String },
}

/// Fatal problems found while setting up or drawing a scene.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("program '{label}' could not be built")]
    Program {
        label: String,
        #[source]
        source: ProgramError,
    },
    #[error("drawable '{label}' ({id:?}) has no usable vertex data: {reason}")]
    InvalidDrawable {
        id: DrawableId,
        label: String,
        reason: String,
    },
    #[error("drawable '{drawable}' does not provide the vertex inputs program '{program}' reads")]
    LayoutMismatch { drawable: String, program: String },
    #[error("scene object {object} refers to unknown program {program:?}")]
    UnknownProgram { object: usize, program: ProgramId },
    #[error("scene object {object} refers to unknown drawable {drawable:?}")]
    UnknownDrawable { object: usize, drawable: DrawableId },
    #[error("scene object {object} refers to unknown animated angle {angle:?}")]
    UnknownAngle { object: usize, angle: AngleId },
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Failures while acquiring a GPU device for a window.
#[derive(Debug, thiserror::Error)]
pub enum GpuInitError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
