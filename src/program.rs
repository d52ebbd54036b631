//! Shader programs: compile, link, reflect and feed uniforms.
//!
//! A program is a pair of WGSL sources, one per stage. Building one goes
//! through three steps:
//!
//! 1. **Compile**: each stage is parsed and validated with naga. Failures
//!    become [`ProgramError::Compile`] carrying naga's rendered diagnostic.
//! 2. **Link**: the two modules are checked against each other (every
//!    fragment input must be written by the vertex stage, shared uniform
//!    members must agree) and reflected into a [`ProgramInterface`].
//! 3. **Create**: the backend turns the sources into a GPU pipeline. Errors
//!    reported by the device at this point are also link errors.
//!
//! # Uniforms
//!
//! All uniforms live in one struct bound at `@group(0) @binding(0)`:
//!
//! ```wgsl
//! struct Uniforms {
//!     model: mat4x4<f32>,
//!     view: mat4x4<f32>,
//!     projection: mat4x4<f32>,
//! }
//! @group(0) @binding(0) var<uniform> u: Uniforms;
//! ```
//!
//! Member names are the uniform names. Their byte offsets are resolved once
//! at link time, and [`ProgramManager::set_uniform`] writes into a CPU copy
//! of the block. Names the program does not declare are ignored: compilers
//! are free to drop unused uniforms, so a missing one is not an error.

use std::borrow::Cow;
use std::collections::BTreeMap;

use glam::{Mat4, Vec3};

use crate::backend::RenderBackend;
use crate::drawable::{VertexAttribute, VertexLayout};
use crate::error::{ProgramError, ShaderStage};

/// Handle to a program built by a [`ProgramManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) usize);

/// Vertex and fragment WGSL for one program.
#[derive(Clone, Debug)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ProgramSource {
    pub fn new(
        label: impl Into<String>,
        vertex: impl Into<Cow<'static, str>>,
        fragment: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            label: label.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Vertex colors passed straight through; reads only `model`.
    pub fn flat() -> Self {
        Self::new(
            "flat",
            include_str!("shaders/flat.vert.wgsl"),
            include_str!("shaders/color.frag.wgsl"),
        )
    }

    /// Vertex colors with the full model/view/projection chain.
    pub fn color() -> Self {
        Self::new(
            "color",
            include_str!("shaders/color.vert.wgsl"),
            include_str!("shaders/color.frag.wgsl"),
        )
    }

    /// Per-fragment Phong lighting of a single-colored surface.
    pub fn phong() -> Self {
        Self::new(
            "phong",
            include_str!("shaders/phong.vert.wgsl"),
            include_str!("shaders/phong.frag.wgsl"),
        )
    }

    fn stage_source(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

/// Type of an active uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Float,
    Int,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec3 => 12,
            UniformKind::Float | UniformKind::Int => 4,
        }
    }

    fn from_naga(inner: &naga::TypeInner) -> Option<Self> {
        use naga::{Scalar, TypeInner, VectorSize};
        match *inner {
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformKind::Mat4),
            TypeInner::Vector {
                size: VectorSize::Tri,
                scalar,
            } if scalar == Scalar::F32 => Some(UniformKind::Vec3),
            TypeInner::Scalar(scalar) if scalar == Scalar::F32 => Some(UniformKind::Float),
            TypeInner::Scalar(scalar) if scalar == Scalar::I32 => Some(UniformKind::Int),
            _ => None,
        }
    }
}

/// A value for [`ProgramManager::set_uniform`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec3(Vec3),
    Float(f32),
    Int(i32),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
        }
    }

    fn write(&self, dst: &mut [u8]) {
        match self {
            UniformValue::Mat4(m) => dst.copy_from_slice(bytemuck::cast_slice(&m.to_cols_array())),
            UniformValue::Vec3(v) => dst.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Float(f) => dst.copy_from_slice(bytemuck::bytes_of(f)),
            UniformValue::Int(i) => dst.copy_from_slice(bytemuck::bytes_of(i)),
        }
    }

    fn read(kind: UniformKind, src: &[u8]) -> Self {
        match kind {
            UniformKind::Mat4 => {
                UniformValue::Mat4(Mat4::from_cols_array(&bytemuck::pod_read_unaligned(src)))
            }
            UniformKind::Vec3 => {
                UniformValue::Vec3(Vec3::from_array(bytemuck::pod_read_unaligned(src)))
            }
            UniformKind::Float => UniformValue::Float(bytemuck::pod_read_unaligned(src)),
            UniformKind::Int => UniformValue::Int(bytemuck::pod_read_unaligned(src)),
        }
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<f32> for UniformValue {
    fn from(f: f32) -> Self {
        UniformValue::Float(f)
    }
}

impl From<i32> for UniformValue {
    fn from(i: i32) -> Self {
        UniformValue::Int(i)
    }
}

/// Where an active uniform lives inside the uniform block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// Everything the renderer needs to know about a linked program.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Active uniforms by name.
    pub uniforms: BTreeMap<String, UniformSlot>,
    /// Size of the uniform block in bytes, zero when the program has none.
    pub uniform_block_size: u32,
    /// Vertex inputs the program reads, ordered by location.
    pub vertex_layout: VertexLayout,
}

impl ProgramInterface {
    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }
}

/// One stage that parsed and validated.
#[derive(Debug)]
pub struct CompiledStage {
    pub stage: ShaderStage,
    pub entry_point: String,
    module: naga::Module,
}

/// Parses and validates one stage.
///
/// A module without an entry point for `stage` fails here too.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<CompiledStage, ProgramError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ProgramError::Compile {
        stage,
        log: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| ProgramError::Compile {
            stage,
            log: e.emit_to_string(source),
        })?;

    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga())
        .map(|ep| ep.name.clone())
        .ok_or_else(|| ProgramError::Compile {
            stage,
            log: format!("no @{stage} entry point"),
        })?;

    Ok(CompiledStage {
        stage,
        entry_point,
        module,
    })
}

impl CompiledStage {
    fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point && ep.stage == self.stage.naga())
    }

    /// `(name, location, type)` for every `@location` input of the entry point.
    fn inputs(&self) -> Vec<(String, u32, &naga::TypeInner)> {
        let mut out = Vec::new();
        if let Some(ep) = self.entry() {
            for arg in &ep.function.arguments {
                let name = arg.name.clone().unwrap_or_default();
                self.collect_locations(&name, arg.ty, arg.binding.as_ref(), &mut out);
            }
        }
        out
    }

    /// `(name, location, type)` for every `@location` output of the entry point.
    fn outputs(&self) -> Vec<(String, u32, &naga::TypeInner)> {
        let mut out = Vec::new();
        if let Some(result) = self.entry().and_then(|ep| ep.function.result.as_ref()) {
            self.collect_locations("", result.ty, result.binding.as_ref(), &mut out);
        }
        out
    }

    fn collect_locations<'a>(
        &'a self,
        name: &str,
        ty: naga::Handle<naga::Type>,
        binding: Option<&naga::Binding>,
        out: &mut Vec<(String, u32, &'a naga::TypeInner)>,
    ) {
        let inner = &self.module.types[ty].inner;
        match binding {
            Some(naga::Binding::Location { location, .. }) => {
                out.push((name.to_string(), *location, inner));
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = inner {
                    for member in members {
                        let member_name = member.name.clone().unwrap_or_default();
                        self.collect_locations(&member_name, member.ty, member.binding.as_ref(), out);
                    }
                }
            }
        }
    }

    /// The uniform block members and block size, if the stage declares one.
    fn uniform_block(&self) -> Result<Option<(Vec<(String, UniformSlot)>, u32)>, ProgramError> {
        let mut block = None;

        for (_, var) in self.module.global_variables.iter() {
            let name = var.name.as_deref().unwrap_or("<unnamed>");
            let Some(binding) = &var.binding else {
                continue;
            };

            if !matches!(var.space, naga::AddressSpace::Uniform) {
                return Err(link_error(format!(
                    "{} stage binds '{name}' at @group({}) @binding({}); only the uniform block is supported",
                    self.stage, binding.group, binding.binding
                )));
            }
            if binding.group != 0 || binding.binding != 0 {
                return Err(link_error(format!(
                    "{} stage binds uniform '{name}' at @group({}) @binding({}); expected @group(0) @binding(0)",
                    self.stage, binding.group, binding.binding
                )));
            }
            if block.is_some() {
                return Err(link_error(format!(
                    "{} stage declares more than one uniform block",
                    self.stage
                )));
            }

            let naga::TypeInner::Struct { members, span } = &self.module.types[var.ty].inner else {
                return Err(link_error(format!(
                    "uniform '{name}' in the {} stage must be a struct",
                    self.stage
                )));
            };

            let mut slots = Vec::with_capacity(members.len());
            for member in members {
                let Some(member_name) = member.name.clone() else {
                    continue;
                };
                match UniformKind::from_naga(&self.module.types[member.ty].inner) {
                    Some(kind) => slots.push((
                        member_name,
                        UniformSlot {
                            offset: member.offset,
                            kind,
                        },
                    )),
                    None => log::debug!(
                        "uniform '{member_name}' has a type that cannot be set from the host; leaving it zeroed"
                    ),
                }
            }
            block = Some((slots, *span));
        }

        Ok(block)
    }
}

fn link_error(log: String) -> ProgramError {
    ProgramError::Link { log }
}

fn overlaps(a: &UniformSlot, b: &UniformSlot) -> bool {
    let (a_start, b_start) = (a.offset as usize, b.offset as usize);
    a_start < b_start + b.kind.size() && b_start < a_start + a.kind.size()
}

/// Checks two compiled stages against each other and reflects their interface.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<ProgramInterface, ProgramError> {
    let outputs = vertex.outputs();
    for (name, location, ty) in fragment.inputs() {
        match outputs.iter().find(|(_, l, _)| *l == location) {
            Some((_, _, out_ty)) if *out_ty == ty => {}
            Some((out_name, _, _)) => {
                return Err(link_error(format!(
                    "fragment input '{name}' at @location({location}) does not match the type of vertex output '{out_name}'"
                )));
            }
            None => {
                return Err(link_error(format!(
                    "fragment input '{name}' at @location({location}) is not written by the vertex stage"
                )));
            }
        }
    }

    let mut uniforms = BTreeMap::new();
    let mut uniform_block_size = 0;
    for stage in [vertex, fragment] {
        let Some((slots, span)) = stage.uniform_block()? else {
            continue;
        };
        uniform_block_size = uniform_block_size.max(span);
        for (name, slot) in slots {
            match uniforms.get(&name) {
                Some(existing) if *existing != slot => {
                    return Err(link_error(format!(
                        "uniform '{name}' is declared differently in the vertex and fragment stages"
                    )));
                }
                Some(_) => {}
                None => {
                    if let Some((other, _)) = uniforms.iter().find(|(_, o)| overlaps(o, &slot)) {
                        return Err(link_error(format!(
                            "uniform '{name}' overlaps '{other}' in the uniform block; the stages disagree on its layout"
                        )));
                    }
                    uniforms.insert(name, slot);
                }
            }
        }
    }

    let mut attributes = Vec::new();
    for (name, location, ty) in vertex.inputs() {
        let components = match *ty {
            naga::TypeInner::Scalar(scalar) if scalar == naga::Scalar::F32 => 1,
            naga::TypeInner::Vector { size, scalar } if scalar == naga::Scalar::F32 => size as u32,
            _ => {
                return Err(link_error(format!(
                    "vertex input '{name}' at @location({location}) must be f32 or a vector of f32"
                )));
            }
        };
        attributes.push(VertexAttribute {
            location,
            components,
        });
    }
    attributes.sort_by_key(|a| a.location);

    Ok(ProgramInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        uniforms,
        uniform_block_size,
        vertex_layout: VertexLayout::new(attributes),
    })
}

/// Compiles and links `source` without touching a device.
pub fn reflect(source: &ProgramSource) -> Result<ProgramInterface, ProgramError> {
    let vertex = compile_stage(ShaderStage::Vertex, source.stage_source(ShaderStage::Vertex))?;
    let fragment = compile_stage(
        ShaderStage::Fragment,
        source.stage_source(ShaderStage::Fragment),
    )?;
    link(&vertex, &fragment)
}

/// A linked program, its reflected interface and the CPU copy of its uniforms.
pub struct Program<P> {
    label: String,
    interface: ProgramInterface,
    block: Vec<u8>,
    gpu: P,
}

impl<P> Program<P> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    /// Current contents of the uniform block.
    pub fn uniform_block(&self) -> &[u8] {
        &self.block
    }

    pub fn gpu(&self) -> &P {
        &self.gpu
    }

    /// Reads back the value last written to an active uniform.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        let slot = self.interface.uniform(name)?;
        let start = slot.offset as usize;
        let bytes = self.block.get(start..start + slot.kind.size())?;
        Some(UniformValue::read(slot.kind, bytes))
    }

    fn set(&mut self, name: &str, value: UniformValue) {
        let Some(slot) = self.interface.uniform(name) else {
            log::debug!("program '{}' has no active uniform '{name}'", self.label);
            return;
        };
        if slot.kind != value.kind() {
            log::warn!(
                "uniform '{name}' of program '{}' is {:?}, ignoring {:?} value",
                self.label,
                slot.kind,
                value.kind()
            );
            return;
        }
        let start = slot.offset as usize;
        if let Some(dst) = self.block.get_mut(start..start + slot.kind.size()) {
            value.write(dst);
        }
    }
}

/// Owns every program of a scene and tracks which one is bound.
pub struct ProgramManager<P> {
    programs: Vec<Program<P>>,
    bound: Option<ProgramId>,
}

impl<P> Default for ProgramManager<P> {
    fn default() -> Self {
        Self {
            programs: Vec::new(),
            bound: None,
        }
    }
}

impl<P> ProgramManager<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles, links and creates a program on `backend`.
    pub fn build<B>(&mut self, backend: &mut B, source: &ProgramSource) -> Result<ProgramId, ProgramError>
    where
        B: RenderBackend<Program = P>,
    {
        let interface = reflect(source)?;
        let gpu = backend.create_program(source, &interface)?;

        log::info!(
            "built program '{}': {} active uniform(s), {}-byte block, {} vertex input(s)",
            source.label,
            interface.uniforms.len(),
            interface.uniform_block_size,
            interface.vertex_layout.attributes.len()
        );

        self.programs.push(Program {
            label: source.label.clone(),
            block: vec![0; interface.uniform_block_size as usize],
            interface,
            gpu,
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    /// Writes `value` into the program's uniform block.
    ///
    /// Unknown programs and names are ignored, as are values whose type does
    /// not match the declared uniform.
    pub fn set_uniform(&mut self, id: ProgramId, name: &str, value: impl Into<UniformValue>) {
        match self.programs.get_mut(id.0) {
            Some(program) => program.set(name, value.into()),
            None => log::debug!("set_uniform on unknown program {id:?}"),
        }
    }

    /// Makes `id` the program later draws use.
    pub fn bind(&mut self, id: ProgramId) {
        self.bound = Some(id);
    }

    pub fn bound(&self) -> Option<&Program<P>> {
        self.bound.and_then(|id| self.programs.get(id.0))
    }

    pub fn get(&self, id: ProgramId) -> Option<&Program<P>> {
        self.programs.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
