//! CPU reference for the Phong reflection model.
//!
//! The lit demos evaluate this model per fragment on the GPU
//! (`shaders/phong.frag.wgsl`). The functions here compute the same color on
//! the CPU so the lighting math can be checked without a device.
//!
//! ```text
//! ambient  = ka * Lc
//! diffuse  = kd * max(n·l, 0) * Lc
//! specular = ks * max(v·r, 0)^s * Lc        r = reflect(-l, n)
//! color    = (ambient + diffuse + specular) * Kobj
//! ```

use glam::Vec3;

/// Reflection coefficients shared by every lit object.
///
/// These are pushed to the GPU as the `ka`, `kd`, `ks` and `shininess`
/// uniforms, so the shader and [`shade`] always agree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingConfig {
    /// Ambient coefficient.
    pub ka: f32,
    /// Diffuse coefficient.
    pub kd: f32,
    /// Specular coefficient.
    pub ks: f32,
    /// Specular exponent.
    pub shininess: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ka: 0.5,
            kd: 0.8,
            ks: 1.0,
            shininess: 3.0,
        }
    }
}

/// A single point light without attenuation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
}

impl Light {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::new(1.0, 0.0, 2.0), Vec3::ONE)
    }
}

/// The three light contributions before they are tinted by the object color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhongTerms {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl PhongTerms {
    /// Sum of the terms, tinted by `object_color`.
    pub fn color(&self, object_color: Vec3) -> Vec3 {
        (self.ambient + self.diffuse + self.specular) * object_color
    }
}

/// Evaluates the three Phong terms at one surface point.
///
/// `normal` does not have to be unit length. Degenerate directions (light or
/// eye exactly at the fragment) contribute no diffuse or specular light.
pub fn phong_terms(
    normal: Vec3,
    position: Vec3,
    light: &Light,
    eye: Vec3,
    config: &LightingConfig,
) -> PhongTerms {
    let n = normal.normalize_or_zero();
    let ambient = config.ka * light.color;

    let l = (light.position - position).normalize_or_zero();
    let diff = n.dot(l).max(0.0);
    let diffuse = config.kd * diff * light.color;

    let v = (eye - position).normalize_or_zero();
    let r = reflect(-l, n);
    let rv = v.dot(r);
    let spec = if rv > 0.0 { rv.powf(config.shininess) } else { 0.0 };
    let specular = config.ks * spec * light.color;

    PhongTerms {
        ambient,
        diffuse,
        specular,
    }
}

/// Final fragment color for an object of `object_color`.
pub fn shade(
    normal: Vec3,
    position: Vec3,
    light: &Light,
    eye: Vec3,
    object_color: Vec3,
    config: &LightingConfig,
) -> Vec3 {
    phong_terms(normal, position, light, eye, config).color(object_color)
}

/// Mirrors `incident` about the plane with unit normal `n`, as WGSL's `reflect` does.
fn reflect(incident: Vec3, n: Vec3) -> Vec3 {
    incident - 2.0 * n.dot(incident) * n
}
