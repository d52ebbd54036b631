//! The bundled demo scenes.
//!
//! Each function returns the window configuration and the scene it opens
//! with. The binary picks one by name; tests build them without a window.

use glam::Vec3;

use crate::app::AppConfig;
use crate::camera::Camera;
use crate::drawable;
use crate::phong::{Light, LightingConfig};
use crate::program::ProgramSource;
use crate::scene::{Color, Rotation, SceneObject, SceneSetup};
use crate::transform::{self, CompositionMode, Step};

/// An empty window cleared to slate.
pub fn window() -> (AppConfig, SceneSetup) {
    let mut setup = SceneSetup::new();
    setup.clear_color(Color::SLATE);
    (AppConfig::new().title("Window"), setup)
}

/// Two colored triangles forming a quad.
pub fn triangle() -> (AppConfig, SceneSetup) {
    let mut setup = SceneSetup::new();
    let quad = setup.add_drawable(drawable::color_quad());
    let flat = setup.add_program(ProgramSource::flat());

    setup
        .clear_color(Color::SLATE)
        .add_object(SceneObject::new(quad, flat));
    (AppConfig::new().title("Triangle"), setup)
}

/// A quad spinning about z. Keys 1 and 2 switch between rotating in place
/// and orbiting the origin.
pub fn transform() -> (AppConfig, SceneSetup) {
    let mut setup = SceneSetup::new();
    let quad = setup.add_drawable(drawable::color_quad());
    let flat = setup.add_program(ProgramSource::flat());
    let spin = setup.animate(0.0, 0.05);

    setup
        .clear_color(Color::SLATE)
        .mode_keys()
        .add_object(
            SceneObject::new(quad, flat)
                .translated(Vec3::new(0.5, -0.5, 0.0))
                .rotated(Rotation::animated(Vec3::Z, spin))
                .scaled(Vec3::new(0.3, 0.5, 1.0))
                .composed(CompositionMode::PivotThenPlace),
        );
    (AppConfig::new().title("Transform"), setup)
}

/// A cube edited from the keyboard. See [`Manipulator`](crate::controls::Manipulator).
pub fn manipulate() -> (AppConfig, SceneSetup) {
    let mut setup = SceneSetup::new();
    let cube = setup.add_drawable(drawable::color_cube(0.25));
    let flat = setup.add_program(ProgramSource::flat());

    setup
        .clear_color(Color::SLATE)
        .add_object(
            SceneObject::new(cube, flat)
                .rotated(Rotation::fixed(Vec3::X, 0.0))
                .rotated(Rotation::fixed(Vec3::Y, 0.0))
                .rotated(Rotation::fixed(Vec3::Z, 0.0))
                .composed(vec![
                    Step::Translate,
                    Step::Scale,
                    Step::Rotate(2),
                    Step::Rotate(0),
                    Step::Rotate(1),
                ]),
        )
        .manipulate(0);
    (AppConfig::new().title("Manipulate"), setup)
}

/// A pyramid and a cube under perspective, five angles animated.
pub fn projection() -> (AppConfig, SceneSetup) {
    let mut setup = SceneSetup::new();
    let pyramid = setup.add_drawable(drawable::color_pyramid());
    let cube = setup.add_drawable(drawable::color_cube(0.5));
    let color = setup.add_program(ProgramSource::color());

    let pyramid_x = setup.animate(0.0, 0.01);
    let pyramid_y = setup.animate(0.0, 0.02);
    let cube_x = setup.animate(0.0, 0.01);
    let cube_y = setup.animate(0.0, 0.03);
    let cube_z = setup.animate(0.0, 0.02);

    setup
        .clear_color(Color::SLATE)
        .camera(
            Camera::new()
                .with_view(transform::translate(Vec3::new(0.0, 0.0, -3.0)))
                .with_fov(60.0)
                .with_depth_range(0.1, 100.0),
        )
        .add_object(
            SceneObject::new(pyramid, color)
                .translated(Vec3::new(0.0, 0.0, -1.0))
                .rotated(Rotation::animated(Vec3::Y, pyramid_y))
                .rotated(Rotation::animated(Vec3::X, pyramid_x))
                .scaled(Vec3::splat(0.5))
                .composed(CompositionMode::PivotThenPlace),
        )
        .add_object(
            SceneObject::new(cube, color)
                .translated(Vec3::new(0.0, 0.0, -2.0))
                .rotated(Rotation::animated(Vec3::Y, cube_y))
                .rotated(Rotation::animated(Vec3::X, cube_x))
                .rotated(Rotation::animated(Vec3::Z, cube_z))
                .scaled(Vec3::splat(0.3))
                .composed(vec![
                    Step::Translate,
                    Step::Rotate(0),
                    Step::Translate,
                    Step::Rotate(1),
                    Step::Rotate(2),
                    Step::Scale,
                ]),
        );
    (AppConfig::new().title("Perspective Projection").size(600, 600), setup)
}

/// A tilted cube lit by one white point light.
pub fn phong() -> (AppConfig, SceneSetup) {
    let mut setup = SceneSetup::new();
    let cube = setup.add_drawable(drawable::normal_cube());
    let phong = setup.add_program(ProgramSource::phong());

    setup
        .clear_color(Color::SLATE)
        .camera(
            Camera::new()
                .with_view(transform::translate(Vec3::new(0.0, 0.0, -5.0)))
                .at(Vec3::ZERO)
                .with_fov(45.0),
        )
        .light(Light::default())
        .lighting(LightingConfig::default())
        .add_object(
            SceneObject::new(cube, phong)
                .rotated(Rotation::fixed(Vec3::X, 10.0))
                .rotated(Rotation::fixed(Vec3::Y, -30.0))
                .colored(Vec3::new(0.5, 0.1, 0.1)),
        );
    (AppConfig::new().title("Phong").size(600, 600), setup)
}
