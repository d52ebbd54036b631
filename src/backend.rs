//! The seam between frame orchestration and the graphics API.
//!
//! [`FrameRenderer`](crate::FrameRenderer) decides what to draw and with which
//! uniform values; a [`RenderBackend`] turns that into API calls. The shipped
//! backend is [`WgpuBackend`](crate::WgpuBackend).

use crate::drawable::{DrawStyle, VertexData};
use crate::error::{ProgramError, RenderError};
use crate::program::{ProgramInterface, ProgramSource};
use crate::scene::Color;

/// Outcome of [`RenderBackend::begin_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStart {
    Ready,
    /// No target this frame (surface lost or timed out). Nothing is drawn.
    Skipped,
}

pub trait RenderBackend {
    /// A linked GPU program. Released on drop.
    type Program;
    /// An uploaded vertex buffer. Released on drop.
    type Mesh;

    /// Creates the GPU side of a program that already passed reflection.
    ///
    /// Errors raised by the device here are reported as [`ProgramError::Link`].
    fn create_program(
        &mut self,
        source: &ProgramSource,
        interface: &ProgramInterface,
    ) -> Result<Self::Program, ProgramError>;

    fn create_mesh(&mut self, data: &VertexData) -> Self::Mesh;

    fn resize(&mut self, width: u32, height: u32);

    /// Starts a frame cleared to `clear`.
    fn begin_frame(&mut self, clear: Color) -> Result<FrameStart, RenderError>;

    /// Queues one draw. `uniforms` is the program's uniform block as it is
    /// right now; later writes do not affect this draw.
    fn draw(
        &mut self,
        program: &Self::Program,
        uniforms: &[u8],
        mesh: &Self::Mesh,
        vertex_count: u32,
        style: DrawStyle,
    );

    /// Submits and presents everything queued since `begin_frame`.
    fn end_frame(&mut self);
}

#[cfg(test)]
pub(crate) mod recording {
    //! A backend that records calls instead of drawing.

    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        CreateProgram(String),
        CreateMesh(String),
        Resize(u32, u32),
        Begin(Color),
        Draw {
            program: String,
            uniforms: Vec<u8>,
            mesh: String,
            vertex_count: u32,
            style: DrawStyle,
        },
        End,
    }

    /// Counts drops into a shared counter.
    pub struct Resource {
        pub label: String,
        released: Rc<Cell<usize>>,
    }

    impl Drop for Resource {
        fn drop(&mut self) {
            self.released.set(self.released.get() + 1);
        }
    }

    #[derive(Default)]
    pub struct RecordingBackend {
        pub calls: Vec<Call>,
        pub released: Rc<Cell<usize>>,
        /// Program label whose creation fails as a link error.
        pub fail_program: Option<String>,
        /// Number of upcoming frames reported as skipped.
        pub skip_frames: usize,
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn draws(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Draw { .. }))
                .collect()
        }

        fn resource(&self, label: &str) -> Resource {
            Resource {
                label: label.to_string(),
                released: Rc::clone(&self.released),
            }
        }
    }

    impl RenderBackend for RecordingBackend {
        type Program = Resource;
        type Mesh = Resource;

        fn create_program(
            &mut self,
            source: &ProgramSource,
            _interface: &ProgramInterface,
        ) -> Result<Resource, ProgramError> {
            if self.fail_program.as_deref() == Some(source.label.as_str()) {
                return Err(ProgramError::Link {
                    log: "pipeline rejected".into(),
                });
            }
            self.calls.push(Call::CreateProgram(source.label.clone()));
            Ok(self.resource(&source.label))
        }

        fn create_mesh(&mut self, data: &VertexData) -> Resource {
            self.calls.push(Call::CreateMesh(data.label.clone()));
            self.resource(&data.label)
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.calls.push(Call::Resize(width, height));
        }

        fn begin_frame(&mut self, clear: Color) -> Result<FrameStart, RenderError> {
            if self.skip_frames > 0 {
                self.skip_frames -= 1;
                return Ok(FrameStart::Skipped);
            }
            self.calls.push(Call::Begin(clear));
            Ok(FrameStart::Ready)
        }

        fn draw(
            &mut self,
            program: &Resource,
            uniforms: &[u8],
            mesh: &Resource,
            vertex_count: u32,
            style: DrawStyle,
        ) {
            self.calls.push(Call::Draw {
                program: program.label.clone(),
                uniforms: uniforms.to_vec(),
                mesh: mesh.label.clone(),
                vertex_count,
                style,
            });
        }

        fn end_frame(&mut self) {
            self.calls.push(Call::End);
        }
    }
}
