//! [`RenderBackend`] on wgpu.
//!
//! # Uniforms
//!
//! Every program reads its uniform block from `@group(0) @binding(0)`. Draws
//! are queued during a frame and each one gets its own slot in a single
//! uniform buffer, selected with a dynamic offset. This lets several objects
//! share a program while receiving different matrices in the same frame.
//!
//! ```text
//! uniform buffer:  | draw 0 block | pad | draw 1 block | pad | ...
//!                  ^ offset 0           ^ offset stride
//! ```
//!
//! The stride is the largest block of any program, rounded up to the
//! device's `min_uniform_buffer_offset_alignment`.
//!
//! # Pipelines
//!
//! Each program is linked twice: once as a triangle list for
//! [`DrawStyle::Faces`] and once as a line strip for
//! [`DrawStyle::Wireframe`]. Both test against a `Depth32Float` buffer and
//! neither culls.

use std::num::NonZeroU64;

use crate::backend::{FrameStart, RenderBackend};
use crate::drawable::{DrawStyle, VertexData};
use crate::error::{ProgramError, RenderError};
use crate::gpu::GpuContext;
use crate::program::{ProgramInterface, ProgramSource};
use crate::scene::Color;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_UNIFORM_SLOTS: u64 = 16;

/// A program linked for both draw styles.
pub struct WgpuProgram {
    faces: wgpu::RenderPipeline,
    wireframe: wgpu::RenderPipeline,
}

/// An uploaded vertex buffer.
pub struct WgpuMesh {
    buffer: wgpu::Buffer,
}

struct QueuedDraw {
    pipeline: wgpu::RenderPipeline,
    vertices: wgpu::Buffer,
    vertex_count: u32,
    uniform_offset: u32,
}

struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    clear: Color,
}

pub struct WgpuBackend {
    gpu: GpuContext,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    staging: Vec<u8>,
    draws: Vec<QueuedDraw>,
    frame: Option<Frame>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Block Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Program Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let uniform_stride = Self::align(&gpu, 16);
        let uniform_buffer = Self::create_uniform_buffer(&gpu, uniform_stride * INITIAL_UNIFORM_SLOTS);
        let uniform_bind_group =
            Self::create_uniform_bind_group(&gpu, &bind_group_layout, &uniform_buffer, uniform_stride);
        let depth_view = Self::create_depth_view(&gpu);
        let depth_size = (gpu.width(), gpu.height());

        Self {
            gpu,
            bind_group_layout,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            staging: Vec::new(),
            draws: Vec::new(),
            frame: None,
            depth_view,
            depth_size,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn align(gpu: &GpuContext, size: u64) -> u64 {
        let alignment = u64::from(gpu.device.limits().min_uniform_buffer_offset_alignment).max(1);
        size.max(16).div_ceil(alignment) * alignment
    }

    fn create_uniform_buffer(gpu: &GpuContext, size: u64) -> wgpu::Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Per-Draw Uniforms"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_uniform_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        stride: u64,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Per-Draw Uniform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(stride),
                }),
            }],
        })
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface size changed.
    fn ensure_depth_size(&mut self) {
        let size = (self.gpu.width(), self.gpu.height());
        if self.depth_size != size {
            self.depth_view = Self::create_depth_view(&self.gpu);
            self.depth_size = size;
        }
    }

    /// Grows the uniform buffer to hold everything staged this frame.
    fn ensure_uniform_capacity(&mut self) {
        let needed = self.staging.len() as u64;
        if needed <= self.uniform_buffer.size() {
            return;
        }
        let size = needed.next_power_of_two();
        log::debug!("growing per-draw uniform buffer to {size} bytes");
        self.uniform_buffer = Self::create_uniform_buffer(&self.gpu, size);
        self.uniform_bind_group = Self::create_uniform_bind_group(
            &self.gpu,
            &self.bind_group_layout,
            &self.uniform_buffer,
            self.uniform_stride,
        );
    }

    /// Widens the per-draw slot for a program with a larger block.
    fn ensure_uniform_stride(&mut self, block_size: u32) {
        let stride = Self::align(&self.gpu, u64::from(block_size));
        if stride <= self.uniform_stride {
            return;
        }
        self.uniform_stride = stride;
        if self.uniform_buffer.size() < stride * INITIAL_UNIFORM_SLOTS {
            self.uniform_buffer = Self::create_uniform_buffer(&self.gpu, stride * INITIAL_UNIFORM_SLOTS);
        }
        self.uniform_bind_group = Self::create_uniform_bind_group(
            &self.gpu,
            &self.bind_group_layout,
            &self.uniform_buffer,
            self.uniform_stride,
        );
    }

    fn create_pipeline(
        &self,
        label: &str,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        interface: &ProgramInterface,
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        let layout = &interface.vertex_layout;
        let attributes: Vec<wgpu::VertexAttribute> = layout
            .offsets()
            .map(|(attr, offset)| wgpu::VertexAttribute {
                format: vertex_format(attr.components),
                offset,
                shader_location: attr.location,
            })
            .collect();

        let buffers = [wgpu::VertexBufferLayout {
            array_stride: layout.stride_bytes(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        self.gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(interface.vertex_entry.as_str()),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(interface.fragment_entry.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }
}

fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

impl RenderBackend for WgpuBackend {
    type Program = WgpuProgram;
    type Mesh = WgpuMesh;

    fn create_program(
        &mut self,
        source: &ProgramSource,
        interface: &ProgramInterface,
    ) -> Result<WgpuProgram, ProgramError> {
        self.ensure_uniform_stride(interface.uniform_block_size);

        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex", source.label)),
            source: wgpu::ShaderSource::Wgsl(source.vertex.clone()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment", source.label)),
            source: wgpu::ShaderSource::Wgsl(source.fragment.clone()),
        });

        let faces = self.create_pipeline(
            &format!("{} faces", source.label),
            &vertex,
            &fragment,
            interface,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let wireframe = self.create_pipeline(
            &format!("{} wireframe", source.label),
            &vertex,
            &fragment,
            interface,
            wgpu::PrimitiveTopology::LineStrip,
        );

        if let Some(err) = pollster::block_on(self.gpu.device.pop_error_scope()) {
            return Err(ProgramError::Link {
                log: err.to_string(),
            });
        }

        Ok(WgpuProgram { faces, wireframe })
    }

    fn create_mesh(&mut self, data: &VertexData) -> WgpuMesh {
        use wgpu::util::DeviceExt;

        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&data.label),
                contents: data.as_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        WgpuMesh { buffer }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn begin_frame(&mut self, clear: Color) -> Result<FrameStart, RenderError> {
        self.ensure_depth_size();
        self.draws.clear();
        self.staging.clear();

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                return Ok(FrameStart::Skipped);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(FrameStart::Skipped);
            }
            Err(err) => return Err(err.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame {
            output,
            view,
            clear,
        });
        Ok(FrameStart::Ready)
    }

    fn draw(
        &mut self,
        program: &WgpuProgram,
        uniforms: &[u8],
        mesh: &WgpuMesh,
        vertex_count: u32,
        style: DrawStyle,
    ) {
        let offset = self.staging.len();
        let Ok(uniform_offset) = u32::try_from(offset) else {
            log::warn!("too many draws in one frame, dropping the rest");
            return;
        };
        self.staging.resize(offset + self.uniform_stride as usize, 0);
        let len = uniforms.len().min(self.uniform_stride as usize);
        self.staging[offset..offset + len].copy_from_slice(&uniforms[..len]);

        let pipeline = match style {
            DrawStyle::Faces => &program.faces,
            DrawStyle::Wireframe => &program.wireframe,
        };
        self.draws.push(QueuedDraw {
            pipeline: pipeline.clone(),
            vertices: mesh.buffer.clone(),
            vertex_count,
            uniform_offset,
        });
    }

    fn end_frame(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };

        self.ensure_uniform_capacity();
        if !self.staging.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.uniform_buffer, 0, &self.staging);
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &self.draws {
                render_pass.set_pipeline(&draw.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                render_pass.set_vertex_buffer(0, draw.vertices.slice(..));
                render_pass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.output.present();
        self.draws.clear();
    }
}
