//! Per-frame orchestration: step the animation, push uniforms, draw.

use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::backend::{FrameStart, RenderBackend};
use crate::controls::{Controls, KeyAction};
use crate::drawable::DrawableId;
use crate::error::RenderError;
use crate::phong::Light;
use crate::program::ProgramManager;
use crate::scene::{Scene, SceneSetup, uniforms};

/// Where the renderer is in its tick cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for the next tick or redraw.
    #[default]
    Idle,
    /// Animation slots are advancing.
    Stepping,
    /// Uniforms are being pushed and draws issued.
    Drawing,
}

struct Mesh<M> {
    gpu: M,
    vertex_count: u32,
}

/// Owns a scene and its GPU resources and draws it on request.
///
/// Every tick runs the full cycle `Idle → Stepping → Drawing → Idle`. All
/// animation state is updated before the first uniform of that frame is
/// written. A resize draws once without stepping.
pub struct FrameRenderer<B: RenderBackend> {
    backend: B,
    programs: ProgramManager<B::Program>,
    meshes: Vec<Mesh<B::Mesh>>,
    scene: Scene,
    controls: Controls,
    state: FrameState,
    viewport: (u32, u32),
    frames: u64,
}

impl<B: RenderBackend> FrameRenderer<B> {
    /// Validates `setup`, builds its programs and uploads its drawables.
    ///
    /// Fails on the first drawable without usable vertex data, the first
    /// program that does not compile or link, or the first object that refers
    /// to something the setup does not contain.
    pub fn initialize(
        mut backend: B,
        width: u32,
        height: u32,
        setup: SceneSetup,
    ) -> Result<Self, RenderError> {
        let SceneSetup {
            drawables,
            programs: sources,
            mut scene,
            controls,
        } = setup;

        let mut vertex_counts = Vec::with_capacity(drawables.len());
        for (index, data) in drawables.iter().enumerate() {
            vertex_counts.push(data.validate(DrawableId(index))?);
        }

        let mut programs = ProgramManager::new();
        for source in &sources {
            if let Err(err) = programs.build(&mut backend, source) {
                log::error!("{err}");
                return Err(RenderError::Program {
                    label: source.label.clone(),
                    source: err,
                });
            }
        }

        for (index, object) in scene.objects.iter().enumerate() {
            let Some(program) = programs.get(object.program) else {
                return Err(RenderError::UnknownProgram {
                    object: index,
                    program: object.program,
                });
            };
            let Some(data) = drawables.get(object.drawable.0) else {
                return Err(RenderError::UnknownDrawable {
                    object: index,
                    drawable: object.drawable,
                });
            };
            if let Some(angle) = object.angle_ids().find(|id| scene.angles.get(*id).is_none()) {
                return Err(RenderError::UnknownAngle { object: index, angle });
            }
            if data.layout != program.interface().vertex_layout {
                return Err(RenderError::LayoutMismatch {
                    drawable: data.label.clone(),
                    program: program.label().to_string(),
                });
            }
        }

        let meshes = drawables
            .iter()
            .zip(vertex_counts)
            .map(|(data, vertex_count)| Mesh {
                gpu: backend.create_mesh(data),
                vertex_count,
            })
            .collect::<Vec<_>>();

        scene.camera.set_viewport(width, height);

        log::info!(
            "scene ready: {} object(s), {} program(s), {} drawable(s), {} animated angle(s)",
            scene.objects.len(),
            programs.len(),
            meshes.len(),
            scene.angles.len()
        );

        Ok(Self {
            backend,
            programs,
            meshes,
            scene,
            controls,
            state: FrameState::Idle,
            viewport: (width, height),
            frames: 0,
        })
    }

    /// One update: advance every animated angle, then draw.
    pub fn on_tick(&mut self) -> Result<(), RenderError> {
        self.state = FrameState::Stepping;
        self.scene.angles.tick();
        self.render_frame()
    }

    /// Applies a new viewport size and redraws without stepping.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.viewport = (width, height);
        self.backend.resize(width, height);
        if width == 0 || height == 0 {
            log::debug!("viewport collapsed to {width}x{height}, not drawing");
            return Ok(());
        }
        self.scene.camera.set_viewport(width, height);
        self.render_frame()
    }

    pub fn on_key(&mut self, key: KeyCode) -> KeyAction {
        self.controls.handle(key, &mut self.scene)
    }

    /// Clears, then draws every object in order with freshly computed uniforms.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        self.state = FrameState::Drawing;
        let started = self.backend.begin_frame(self.scene.clear_color);
        let started = match started {
            Ok(started) => started,
            Err(err) => {
                self.state = FrameState::Idle;
                return Err(err);
            }
        };
        if started == FrameStart::Skipped {
            log::debug!("frame {} skipped", self.frames);
            self.state = FrameState::Idle;
            return Ok(());
        }

        let camera = &self.scene.camera;
        let view = camera.view;
        let projection = camera.projection();

        for object in &self.scene.objects {
            let id = object.program;
            self.programs.bind(id);
            self.programs.set_uniform(id, uniforms::MODEL, object.model_matrix(&self.scene.angles));
            self.programs.set_uniform(id, uniforms::VIEW, view);
            self.programs.set_uniform(id, uniforms::PROJECTION, projection);

            // Every object rewrites the whole block; a program's block is shared.
            let light = self.scene.light.unwrap_or(Light::new(Vec3::ZERO, Vec3::ZERO));
            let lighting = &self.scene.lighting;
            self.programs.set_uniform(id, uniforms::LIGHT_COLOR, light.color);
            self.programs.set_uniform(id, uniforms::LIGHT_POSITION, light.position);
            self.programs.set_uniform(id, uniforms::CAMERA_POSITION, camera.position);
            self.programs.set_uniform(id, uniforms::KA, lighting.ka);
            self.programs.set_uniform(id, uniforms::KD, lighting.kd);
            self.programs.set_uniform(id, uniforms::KS, lighting.ks);
            self.programs.set_uniform(id, uniforms::SHININESS, lighting.shininess);
            self.programs.set_uniform(
                id,
                uniforms::OBJECT_COLOR,
                object.color.unwrap_or(Vec3::ZERO),
            );

            let (Some(program), Some(mesh)) =
                (self.programs.bound(), self.meshes.get(object.drawable.0))
            else {
                continue;
            };
            self.backend.draw(
                program.gpu(),
                program.uniform_block(),
                &mesh.gpu,
                mesh.vertex_count,
                object.style,
            );
        }

        self.backend.end_frame();
        self.frames += 1;
        self.state = FrameState::Idle;
        Ok(())
    }

    /// Releases every program and vertex buffer.
    pub fn shutdown(self) {
        log::info!(
            "shutting down after {} frame(s): releasing {} program(s) and {} vertex buffer(s)",
            self.frames,
            self.programs.len(),
            self.meshes.len()
        );
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Frames actually drawn (skipped frames excluded).
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Call, RecordingBackend};
    use crate::drawable::{self, DrawStyle, VertexData, VertexLayout};
    use crate::program::{ProgramSource, UniformValue};
    use crate::scene::{Color, Rotation, SceneObject};
    use crate::transform::{Composition, CompositionMode};
    use crate::{AngleId, Camera, ProgramId};
    use glam::Mat4;

    fn transform_setup() -> (SceneSetup, AngleId) {
        let mut setup = SceneSetup::new();
        let quad = setup.add_drawable(drawable::color_quad());
        let program = setup.add_program(ProgramSource::flat());
        let spin = setup.animate(0.0, 0.05);
        setup
            .clear_color(Color::SLATE)
            .mode_keys()
            .add_object(
                SceneObject::new(quad, program)
                    .translated(Vec3::new(0.5, -0.5, 0.0))
                    .rotated(Rotation::animated(Vec3::Z, spin))
                    .scaled(Vec3::new(0.3, 0.5, 1.0)),
            );
        (setup, spin)
    }

    fn lit_setup() -> SceneSetup {
        let mut setup = SceneSetup::new();
        let cube = setup.add_drawable(drawable::normal_cube());
        let program = setup.add_program(ProgramSource::phong());
        setup
            .camera(Camera::new().with_view(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))))
            .light(Light::new(Vec3::new(1.0, 0.0, 2.0), Vec3::ONE))
            .add_object(
                SceneObject::new(cube, program)
                    .rotated(Rotation::fixed(Vec3::X, 10.0))
                    .rotated(Rotation::fixed(Vec3::Y, -30.0))
                    .colored(Vec3::new(0.5, 0.1, 0.1)),
            );
        setup
    }

    fn renderer(setup: SceneSetup) -> FrameRenderer<RecordingBackend> {
        FrameRenderer::initialize(RecordingBackend::new(), 800, 600, setup).unwrap()
    }

    fn model_of(r: &FrameRenderer<RecordingBackend>) -> Mat4 {
        match r.programs.get(ProgramId(0)).and_then(|p| p.uniform("model")) {
            Some(UniformValue::Mat4(m)) => m,
            other => panic!("model not set: {other:?}"),
        }
    }

    #[test]
    fn initialize_builds_programs_then_uploads_meshes() {
        let r = renderer(transform_setup().0);
        assert_eq!(
            r.backend().calls,
            vec![
                Call::CreateProgram("flat".into()),
                Call::CreateMesh("quad".into())
            ]
        );
        assert_eq!(r.state(), FrameState::Idle);
        assert_eq!(r.scene().camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn tick_steps_before_drawing() {
        let (setup, spin) = transform_setup();
        let mut r = renderer(setup);
        r.on_tick().unwrap();

        assert_eq!(r.scene().angles.value(spin), 0.05);
        let expected = r.scene().objects[0].model_matrix(&r.scene().angles);
        assert!(model_of(&r).abs_diff_eq(expected, 1e-6));
        assert_eq!(r.state(), FrameState::Idle);
        assert_eq!(r.frames(), 1);

        let calls = &r.backend().calls[2..];
        assert_eq!(calls[0], Call::Begin(Color::SLATE));
        assert!(matches!(
            &calls[1],
            Call::Draw { program, mesh, vertex_count: 6, style: DrawStyle::Faces, .. }
                if program == "flat" && mesh == "quad"
        ));
        assert_eq!(calls[2], Call::End);
    }

    #[test]
    fn resize_changes_only_aspect_and_does_not_step() {
        let (setup, spin) = transform_setup();
        let mut r = renderer(setup);
        r.on_tick().unwrap();
        let objects_before = r.scene().objects.clone();
        let angle_before = r.scene().angles.value(spin);
        let ticks_before = r.scene().angles.ticks();

        r.on_resize(600, 600).unwrap();

        assert_eq!(r.scene().camera.aspect, 1.0);
        assert_eq!(r.scene().objects, objects_before);
        assert_eq!(r.scene().angles.value(spin), angle_before);
        assert_eq!(r.scene().angles.ticks(), ticks_before);
        assert_eq!(r.viewport(), (600, 600));
        assert_eq!(r.frames(), 2);
        assert!(r.backend().calls.contains(&Call::Resize(600, 600)));
    }

    #[test]
    fn zero_sized_resize_does_not_draw() {
        let mut r = renderer(transform_setup().0);
        r.on_resize(0, 0).unwrap();
        assert_eq!(r.frames(), 0);
        assert_eq!(r.scene().camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn shared_program_gets_per_object_uniforms() {
        let mut setup = SceneSetup::new();
        let quad = setup.add_drawable(drawable::color_quad());
        let program = setup.add_program(ProgramSource::flat());
        setup
            .add_object(SceneObject::new(quad, program).translated(Vec3::X))
            .add_object(SceneObject::new(quad, program).translated(Vec3::Y));
        let mut r = renderer(setup);
        r.render_frame().unwrap();

        let blocks: Vec<&Vec<u8>> = r
            .backend()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw { uniforms, .. } => Some(uniforms),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.len(), 2);
        assert_ne!(blocks[0], blocks[1]);
    }

    #[test]
    fn lighting_uniforms_are_pushed_when_a_light_exists() {
        let mut r = renderer(lit_setup());
        r.render_frame().unwrap();

        let program = r.programs.get(ProgramId(0)).unwrap();
        assert_eq!(
            program.uniform("object_color"),
            Some(UniformValue::Vec3(Vec3::new(0.5, 0.1, 0.1)))
        );
        assert_eq!(
            program.uniform("light_position"),
            Some(UniformValue::Vec3(Vec3::new(1.0, 0.0, 2.0)))
        );
        assert_eq!(program.uniform("camera_position"), Some(UniformValue::Vec3(Vec3::ZERO)));
        assert_eq!(program.uniform("ka"), Some(UniformValue::Float(0.5)));
        assert_eq!(program.uniform("shininess"), Some(UniformValue::Float(3.0)));
        assert_eq!(
            program.uniform("view"),
            Some(UniformValue::Mat4(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0))))
        );
    }

    #[test]
    fn without_light_lighting_uniforms_stay_zero() {
        let mut setup = lit_setup();
        setup.scene.light = None;
        let mut r = renderer(setup);
        r.render_frame().unwrap();
        let program = r.programs.get(ProgramId(0)).unwrap();
        assert_eq!(program.uniform("light_color"), Some(UniformValue::Vec3(Vec3::ZERO)));
    }

    #[test]
    fn uncolored_object_does_not_inherit_previous_color() {
        let mut setup = SceneSetup::new();
        let cube = setup.add_drawable(drawable::normal_cube());
        let program = setup.add_program(ProgramSource::phong());
        setup
            .light(Light::default())
            .add_object(SceneObject::new(cube, program).colored(Vec3::X))
            .add_object(SceneObject::new(cube, program));
        let mut r = renderer(setup);
        r.render_frame().unwrap();

        let program = r.programs.get(ProgramId(0)).unwrap();
        assert_eq!(program.uniform("object_color"), Some(UniformValue::Vec3(Vec3::ZERO)));

        let offset = program.interface().uniform("object_color").unwrap().offset as usize;
        let draws = r.backend().draws();
        let Call::Draw { uniforms: first, .. } = draws[0] else {
            unreachable!()
        };
        assert_eq!(&first[offset..offset + 12], bytemuck::cast_slice::<f32, u8>(&[1.0, 0.0, 0.0]));
    }

    #[test]
    fn removing_the_light_clears_light_uniforms() {
        let mut r = renderer(lit_setup());
        r.render_frame().unwrap();
        r.scene.light = None;
        r.render_frame().unwrap();

        let program = r.programs.get(ProgramId(0)).unwrap();
        assert_eq!(program.uniform("light_color"), Some(UniformValue::Vec3(Vec3::ZERO)));
        assert_eq!(program.uniform("light_position"), Some(UniformValue::Vec3(Vec3::ZERO)));
    }

    #[test]
    fn mode_key_changes_next_frame_model() {
        let (setup, _) = transform_setup();
        let mut r = renderer(setup);
        r.on_tick().unwrap();
        let pivot = model_of(&r);

        assert_eq!(r.on_key(KeyCode::Digit2), KeyAction::Changed);
        assert_eq!(
            r.scene().objects[0].composition,
            Composition::Mode(CompositionMode::Orbit)
        );
        r.render_frame().unwrap();
        assert!(!model_of(&r).abs_diff_eq(pivot, 1e-6));
    }

    #[test]
    fn quit_keys_request_quit() {
        let mut r = renderer(transform_setup().0);
        assert_eq!(r.on_key(KeyCode::Escape), KeyAction::Quit);
        assert_eq!(r.on_key(KeyCode::KeyQ), KeyAction::Quit);
    }

    #[test]
    fn skipped_frame_draws_nothing() {
        let mut backend = RecordingBackend::new();
        backend.skip_frames = 1;
        let mut r = FrameRenderer::initialize(backend, 800, 600, transform_setup().0).unwrap();
        r.on_tick().unwrap();
        assert!(r.backend().draws().is_empty());
        assert_eq!(r.frames(), 0);
        assert_eq!(r.state(), FrameState::Idle);
        r.on_tick().unwrap();
        assert_eq!(r.backend().draws().len(), 1);
    }

    #[test]
    fn wireframe_style_reaches_backend() {
        let mut setup = SceneSetup::new();
        let cube = setup.add_drawable(drawable::color_cube(0.25));
        let program = setup.add_program(ProgramSource::flat());
        setup.add_object(SceneObject::new(cube, program).styled(DrawStyle::Wireframe));
        let mut r = renderer(setup);
        r.render_frame().unwrap();
        assert!(matches!(
            r.backend().draws()[0],
            Call::Draw { style: DrawStyle::Wireframe, vertex_count: 36, .. }
        ));
    }

    #[test]
    fn empty_drawable_fails_initialize() {
        let mut setup = SceneSetup::new();
        setup.add_drawable(VertexData::new("empty", VertexLayout::position_color(), vec![]));
        let err = FrameRenderer::initialize(RecordingBackend::new(), 1, 1, setup).err();
        assert!(matches!(err, Some(RenderError::InvalidDrawable { .. })));
    }

    #[test]
    fn compile_failure_fails_initialize_before_uploading() {
        let mut setup = SceneSetup::new();
        setup.add_drawable(drawable::color_quad());
        setup.add_program(ProgramSource::new("broken", "not wgsl", "@fragment fn f() {}"));
        let err = FrameRenderer::initialize(RecordingBackend::new(), 1, 1, setup).err();
        match err {
            Some(RenderError::Program { label, source }) => {
                assert_eq!(label, "broken");
                assert!(matches!(source, crate::ProgramError::Compile { .. }));
            }
            other => panic!("expected program error, got {other:?}"),
        }
    }

    #[test]
    fn backend_link_failure_is_reported() {
        let mut backend = RecordingBackend::new();
        backend.fail_program = Some("flat".into());
        let err = FrameRenderer::initialize(backend, 1, 1, transform_setup().0).err();
        assert!(matches!(
            err,
            Some(RenderError::Program {
                source: crate::ProgramError::Link { .. },
                ..
            })
        ));
    }

    #[test]
    fn dangling_references_fail_initialize() {
        let mut setup = SceneSetup::new();
        let quad = setup.add_drawable(drawable::color_quad());
        setup.add_object(SceneObject::new(quad, ProgramId(3)));
        assert!(matches!(
            FrameRenderer::initialize(RecordingBackend::new(), 1, 1, setup).err(),
            Some(RenderError::UnknownProgram { object: 0, .. })
        ));

        let mut setup = SceneSetup::new();
        let program = setup.add_program(ProgramSource::flat());
        setup.add_object(SceneObject::new(DrawableId(9), program));
        assert!(matches!(
            FrameRenderer::initialize(RecordingBackend::new(), 1, 1, setup).err(),
            Some(RenderError::UnknownDrawable { .. })
        ));

        let mut setup = SceneSetup::new();
        let quad = setup.add_drawable(drawable::color_quad());
        let program = setup.add_program(ProgramSource::flat());
        setup.add_object(
            SceneObject::new(quad, program).rotated(Rotation::animated(Vec3::Z, AngleId(5))),
        );
        assert!(matches!(
            FrameRenderer::initialize(RecordingBackend::new(), 1, 1, setup).err(),
            Some(RenderError::UnknownAngle { .. })
        ));
    }

    #[test]
    fn layout_mismatch_fails_initialize() {
        let mut setup = SceneSetup::new();
        let points = setup.add_drawable(VertexData::new(
            "points",
            VertexLayout::new(vec![crate::drawable::VertexAttribute {
                location: 0,
                components: 3,
            }]),
            vec![0.0; 9],
        ));
        let program = setup.add_program(ProgramSource::flat());
        setup.add_object(SceneObject::new(points, program));
        assert!(matches!(
            FrameRenderer::initialize(RecordingBackend::new(), 1, 1, setup).err(),
            Some(RenderError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn shutdown_releases_each_resource_once() {
        let mut setup = SceneSetup::new();
        let quad = setup.add_drawable(drawable::color_quad());
        let cube = setup.add_drawable(drawable::color_cube(0.5));
        let flat = setup.add_program(ProgramSource::flat());
        setup.add_program(ProgramSource::color());
        setup
            .add_object(SceneObject::new(quad, flat))
            .add_object(SceneObject::new(cube, flat));

        let backend = RecordingBackend::new();
        let released = std::rc::Rc::clone(&backend.released);
        let mut r = FrameRenderer::initialize(backend, 800, 600, setup).unwrap();
        r.on_tick().unwrap();
        assert_eq!(released.get(), 0);

        r.shutdown();
        assert_eq!(released.get(), 4);
    }
}
