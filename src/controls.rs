//! Keyboard controls.
//!
//! | Key          | Action                                          |
//! |--------------|-------------------------------------------------|
//! | Escape, Q    | quit                                            |
//! | 1 / 2        | pivot-then-place / orbit (when mode keys are on) |
//! | R / T / E    | edit rotation / translation / scale             |
//! | S F, G H, A D| adjust the edited value (see [`Manipulator`])   |
//! | W            | reset scale                                     |
//! | V            | toggle faces / wireframe                        |
//!
//! The last four rows only apply to a demo with a [`Manipulator`].

use glam::Vec3;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::scene::{Angle, Scene, SceneObject};
use crate::transform::CompositionMode;

/// What the caller should do after a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Scene state changed.
    Changed,
    Ignored,
}

/// Physical key of a press or auto-repeat, if it maps to a [`KeyCode`].
pub fn pressed_key(event: &KeyEvent) -> Option<KeyCode> {
    match (event.state, event.physical_key) {
        (ElementState::Pressed, PhysicalKey::Code(key)) => Some(key),
        _ => None,
    }
}

/// Which part of the manipulated object the adjust keys change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditTarget {
    #[default]
    Rotate,
    Translate,
    Scale,
}

const ROTATION_STEP: f32 = 1.0;
const TRANSLATION_STEP: f32 = 0.1;
const SCALE_UP: f32 = 1.5;
const SCALE_DOWN: f32 = 0.5;

/// Interactive editing of one object's translation, rotations and scale.
///
/// Adjust keys come in pairs; the first increases, the second decreases.
///
/// | Pair | Rotate (±1°) | Translate (±0.1) | Scale (1.5 / 0.5) |
/// |------|--------------|------------------|-------------------|
/// | S F  | x            | y                | y                 |
/// | G H  | y            | x                | x                 |
/// | A D  | z            | z                | z                 |
///
/// Rotation keys change the first fixed rotation about the matching axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Manipulator {
    pub object: usize,
    pub target: EditTarget,
}

impl Manipulator {
    pub fn new(object: usize) -> Self {
        Self {
            object,
            target: EditTarget::default(),
        }
    }

    fn handle(&mut self, key: KeyCode, object: &mut SceneObject) -> KeyAction {
        match key {
            KeyCode::KeyR => self.target = EditTarget::Rotate,
            KeyCode::KeyT => self.target = EditTarget::Translate,
            KeyCode::KeyE => self.target = EditTarget::Scale,
            KeyCode::KeyW => object.scale = Vec3::ONE,
            KeyCode::KeyV => object.style = object.style.toggled(),
            _ => {
                let Some((pair, increase)) = adjust_key(key) else {
                    return KeyAction::Ignored;
                };
                self.adjust(object, pair, increase);
            }
        }
        log::info!("{}", describe(self.target, object));
        KeyAction::Changed
    }

    fn adjust(&self, object: &mut SceneObject, pair: KeyPair, increase: bool) {
        let sign = if increase { 1.0 } else { -1.0 };
        match self.target {
            EditTarget::Rotate => {
                let axis = match pair {
                    KeyPair::Sf => Vec3::X,
                    KeyPair::Gh => Vec3::Y,
                    KeyPair::Ad => Vec3::Z,
                };
                let fixed = object
                    .rotations
                    .iter_mut()
                    .filter(|r| r.axis == axis)
                    .find_map(|r| match &mut r.angle {
                        Angle::Fixed(degrees) => Some(degrees),
                        Angle::Animated(_) => None,
                    });
                match fixed {
                    Some(degrees) => *degrees += sign * ROTATION_STEP,
                    None => log::debug!("no fixed rotation about {axis} to adjust"),
                }
            }
            EditTarget::Translate => {
                *component(&mut object.translation, pair) += sign * TRANSLATION_STEP;
            }
            EditTarget::Scale => {
                *component(&mut object.scale, pair) = if increase { SCALE_UP } else { SCALE_DOWN };
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyPair {
    Sf,
    Gh,
    Ad,
}

fn adjust_key(key: KeyCode) -> Option<(KeyPair, bool)> {
    match key {
        KeyCode::KeyS => Some((KeyPair::Sf, true)),
        KeyCode::KeyF => Some((KeyPair::Sf, false)),
        KeyCode::KeyG => Some((KeyPair::Gh, true)),
        KeyCode::KeyH => Some((KeyPair::Gh, false)),
        KeyCode::KeyA => Some((KeyPair::Ad, true)),
        KeyCode::KeyD => Some((KeyPair::Ad, false)),
        _ => None,
    }
}

/// Component a pair edits for translation and scale.
fn component(v: &mut Vec3, pair: KeyPair) -> &mut f32 {
    match pair {
        KeyPair::Sf => &mut v.y,
        KeyPair::Gh => &mut v.x,
        KeyPair::Ad => &mut v.z,
    }
}

fn describe(target: EditTarget, object: &SceneObject) -> String {
    let angles: Vec<String> = object
        .rotations
        .iter()
        .map(|r| match r.angle {
            Angle::Fixed(degrees) => format!("{degrees:.1}° about {}", r.axis),
            Angle::Animated(id) => format!("animated {id:?} about {}", r.axis),
        })
        .collect();
    format!(
        "editing {target:?} | translation {} | rotation [{}] | scale {} | {:?}",
        object.translation,
        angles.join(", "),
        object.scale,
        object.style
    )
}

/// Key bindings enabled for one demo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    /// Digit1 / Digit2 switch composition mode.
    pub mode_keys: bool,
    pub manipulator: Option<Manipulator>,
}

impl Controls {
    pub fn handle(&mut self, key: KeyCode, scene: &mut Scene) -> KeyAction {
        match key {
            KeyCode::Escape | KeyCode::KeyQ => return KeyAction::Quit,
            KeyCode::Digit1 | KeyCode::Digit2 if self.mode_keys => {
                let mode = if key == KeyCode::Digit1 {
                    CompositionMode::PivotThenPlace
                } else {
                    CompositionMode::Orbit
                };
                let changed = scene.set_composition_mode(mode);
                log::info!("composition mode: {} ({changed} object(s) changed)", mode.name());
                return KeyAction::Changed;
            }
            _ => {}
        }

        let Some(manipulator) = &mut self.manipulator else {
            return KeyAction::Ignored;
        };
        match scene.objects.get_mut(manipulator.object) {
            Some(object) => manipulator.handle(key, object),
            None => {
                log::warn!("manipulated object {} does not exist", manipulator.object);
                KeyAction::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{DrawStyle, DrawableId};
    use crate::program::ProgramId;
    use crate::scene::Rotation;
    use crate::transform::{Composition, Step};

    fn manipulated_scene() -> (Scene, Controls) {
        let mut scene = Scene::default();
        scene.objects.push(
            SceneObject::new(DrawableId(0), ProgramId(0))
                .rotated(Rotation::fixed(Vec3::X, 0.0))
                .rotated(Rotation::fixed(Vec3::Y, 0.0))
                .rotated(Rotation::fixed(Vec3::Z, 0.0))
                .composed(Composition::Chain(vec![Step::Translate, Step::Scale])),
        );
        let controls = Controls {
            mode_keys: false,
            manipulator: Some(Manipulator::new(0)),
        };
        (scene, controls)
    }

    fn angle(scene: &Scene, index: usize) -> f32 {
        match scene.objects[0].rotations[index].angle {
            Angle::Fixed(d) => d,
            Angle::Animated(_) => panic!("expected fixed angle"),
        }
    }

    #[test]
    fn escape_and_q_both_quit() {
        let mut scene = Scene::default();
        let mut controls = Controls::default();
        assert_eq!(controls.handle(KeyCode::Escape, &mut scene), KeyAction::Quit);
        assert_eq!(controls.handle(KeyCode::KeyQ, &mut scene), KeyAction::Quit);
    }

    #[test]
    fn mode_keys_need_enabling() {
        let mut scene = Scene::default();
        scene
            .objects
            .push(SceneObject::new(DrawableId(0), ProgramId(0)));
        let mut controls = Controls::default();

        assert_eq!(controls.handle(KeyCode::Digit2, &mut scene), KeyAction::Ignored);
        assert_eq!(
            scene.objects[0].composition,
            Composition::Mode(CompositionMode::PivotThenPlace)
        );

        controls.mode_keys = true;
        assert_eq!(controls.handle(KeyCode::Digit2, &mut scene), KeyAction::Changed);
        assert_eq!(
            scene.objects[0].composition,
            Composition::Mode(CompositionMode::Orbit)
        );
        controls.handle(KeyCode::Digit1, &mut scene);
        assert_eq!(
            scene.objects[0].composition,
            Composition::Mode(CompositionMode::PivotThenPlace)
        );
    }

    #[test]
    fn rotation_keys_adjust_matching_axis() {
        let (mut scene, mut controls) = manipulated_scene();
        controls.handle(KeyCode::KeyS, &mut scene);
        controls.handle(KeyCode::KeyS, &mut scene);
        controls.handle(KeyCode::KeyH, &mut scene);
        controls.handle(KeyCode::KeyA, &mut scene);
        assert_eq!(angle(&scene, 0), 2.0);
        assert_eq!(angle(&scene, 1), -1.0);
        assert_eq!(angle(&scene, 2), 1.0);
    }

    #[test]
    fn translation_keys_use_their_own_axis_map() {
        let (mut scene, mut controls) = manipulated_scene();
        controls.handle(KeyCode::KeyT, &mut scene);
        controls.handle(KeyCode::KeyS, &mut scene);
        controls.handle(KeyCode::KeyG, &mut scene);
        controls.handle(KeyCode::KeyD, &mut scene);
        let t = scene.objects[0].translation;
        assert!(t.abs_diff_eq(Vec3::new(0.1, 0.1, -0.1), 1e-6));
        assert_eq!(angle(&scene, 0), 0.0);
    }

    #[test]
    fn scale_keys_set_and_reset() {
        let (mut scene, mut controls) = manipulated_scene();
        controls.handle(KeyCode::KeyE, &mut scene);
        controls.handle(KeyCode::KeyS, &mut scene);
        controls.handle(KeyCode::KeyH, &mut scene);
        controls.handle(KeyCode::KeyD, &mut scene);
        assert_eq!(scene.objects[0].scale, Vec3::new(0.5, 1.5, 0.5));

        controls.handle(KeyCode::KeyW, &mut scene);
        assert_eq!(scene.objects[0].scale, Vec3::ONE);
    }

    #[test]
    fn v_toggles_wireframe() {
        let (mut scene, mut controls) = manipulated_scene();
        assert_eq!(controls.handle(KeyCode::KeyV, &mut scene), KeyAction::Changed);
        assert_eq!(scene.objects[0].style, DrawStyle::Wireframe);
        controls.handle(KeyCode::KeyV, &mut scene);
        assert_eq!(scene.objects[0].style, DrawStyle::Faces);
    }

    #[test]
    fn unbound_key_is_ignored() {
        let (mut scene, mut controls) = manipulated_scene();
        let before = scene.objects[0].clone();
        assert_eq!(controls.handle(KeyCode::KeyZ, &mut scene), KeyAction::Ignored);
        assert_eq!(scene.objects[0], before);
    }

    #[test]
    fn missing_manipulated_object_is_ignored() {
        let mut scene = Scene::default();
        let mut controls = Controls {
            mode_keys: false,
            manipulator: Some(Manipulator::new(4)),
        };
        assert_eq!(controls.handle(KeyCode::KeyS, &mut scene), KeyAction::Ignored);
    }
}
