//! Vertex streams and the built-in demo geometry.
//!
//! A drawable is an interleaved `f32` stream plus a [`VertexLayout`] that says
//! which shader location each group of floats feeds. Every demo shape uses
//! two `vec3` attributes: position at location 0 and either a color or a
//! normal at location 1.
//!
//! | Attribute      | Format    | Offset | Shader Location |
//! |----------------|-----------|--------|-----------------|
//! | position       | Float32x3 | 0      | 0               |
//! | color / normal | Float32x3 | 12     | 1               |

use crate::error::RenderError;

/// Handle to a drawable registered with a [`SceneSetup`](crate::SceneSetup).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DrawableId(pub(crate) usize);

/// One vertex input: `components` floats (1 to 4) read at `location`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
}

/// Tightly packed attribute list, ordered by offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// `vec3` position at location 0, `vec3` color at location 1.
    pub fn position_color() -> Self {
        Self::new(vec![
            VertexAttribute {
                location: 0,
                components: 3,
            },
            VertexAttribute {
                location: 1,
                components: 3,
            },
        ])
    }

    /// `vec3` position at location 0, `vec3` normal at location 1.
    ///
    /// Identical in shape to [`position_color`](Self::position_color); the
    /// shader decides what the second attribute means.
    pub fn position_normal() -> Self {
        Self::position_color()
    }

    /// Floats per vertex.
    pub fn stride_floats(&self) -> u32 {
        self.attributes.iter().map(|a| a.components).sum()
    }

    /// Bytes per vertex.
    pub fn stride_bytes(&self) -> u64 {
        u64::from(self.stride_floats()) * std::mem::size_of::<f32>() as u64
    }

    /// Byte offset of each attribute, in listed order.
    pub fn offsets(&self) -> impl Iterator<Item = (VertexAttribute, u64)> + '_ {
        self.attributes.iter().scan(0u64, |offset, attr| {
            let this = *offset;
            *offset += u64::from(attr.components) * std::mem::size_of::<f32>() as u64;
            Some((*attr, this))
        })
    }
}

/// How a drawable's vertices are assembled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawStyle {
    /// Every three vertices form a filled triangle.
    #[default]
    Faces,
    /// The same vertices joined as one line strip.
    Wireframe,
}

impl DrawStyle {
    pub fn toggled(self) -> Self {
        match self {
            DrawStyle::Faces => DrawStyle::Wireframe,
            DrawStyle::Wireframe => DrawStyle::Faces,
        }
    }
}

/// An interleaved vertex stream ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexData {
    pub label: String,
    pub layout: VertexLayout,
    pub data: Vec<f32>,
}

impl VertexData {
    pub fn new(label: impl Into<String>, layout: VertexLayout, data: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            layout,
            data,
        }
    }

    /// Whole vertices in the stream.
    pub fn vertex_count(&self) -> u32 {
        match self.layout.stride_floats() {
            0 => 0,
            stride => (self.data.len() / stride as usize) as u32,
        }
    }

    /// Checks that the stream can actually be drawn and returns its vertex count.
    pub fn validate(&self, id: DrawableId) -> Result<u32, RenderError> {
        let invalid = |reason: String| RenderError::InvalidDrawable {
            id,
            label: self.label.clone(),
            reason,
        };

        let stride = self.layout.stride_floats() as usize;
        if stride == 0 {
            return Err(invalid("layout has no attributes".into()));
        }
        if self.data.is_empty() {
            return Err(invalid("no vertices".into()));
        }
        if self.data.len() % stride != 0 {
            return Err(invalid(format!(
                "{} floats is not a whole number of {stride}-float vertices",
                self.data.len()
            )));
        }
        Ok(self.vertex_count())
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// A red/blue quad made of two triangles, spanning [-0.5, 0.5] on x and y.
pub fn color_quad() -> VertexData {
    #[rustfmt::skip]
    let data = vec![
        // position          color
        -0.5, -0.5, 0.0,     0.0, 0.0, 1.0,
         0.5, -0.5, 0.0,     1.0, 0.0, 0.0,
        -0.5,  0.5, 0.0,     1.0, 0.0, 0.0,

         0.5, -0.5, 0.0,     1.0, 0.0, 0.0,
         0.5,  0.5, 0.0,     0.0, 1.0, 0.0,
        -0.5,  0.5, 0.0,     1.0, 0.0, 0.0,
    ];
    VertexData::new("quad", VertexLayout::position_color(), data)
}

/// A cube of the given half extent with one flat color per face.
pub fn color_cube(half: f32) -> VertexData {
    const FACE_COLORS: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0], // front
        [0.0, 1.0, 0.0], // right
        [0.0, 1.0, 1.0], // back
        [1.0, 0.0, 0.0], // left
        [1.0, 0.0, 1.0], // top
        [1.0, 1.0, 1.0], // bottom
    ];

    let mut data = Vec::with_capacity(36 * 6);
    for (face, color) in cube_faces(half).iter().zip(FACE_COLORS) {
        for corner in face.corners {
            data.extend_from_slice(&corner);
            data.extend_from_slice(&color);
        }
    }
    VertexData::new("color cube", VertexLayout::position_color(), data)
}

/// A unit cube (half extent 0.5) carrying per-face normals for lighting.
pub fn normal_cube() -> VertexData {
    let mut data = Vec::with_capacity(36 * 6);
    for face in cube_faces(0.5) {
        for corner in face.corners {
            data.extend_from_slice(&corner);
            data.extend_from_slice(&face.normal);
        }
    }
    VertexData::new("lit cube", VertexLayout::position_normal(), data)
}

/// A four-sided pyramid with its apex at (0, 1, 0), one color per face.
pub fn color_pyramid() -> VertexData {
    #[rustfmt::skip]
    let data = vec![
        // front
         0.0,  1.0,  0.0,    0.0, 0.0, 1.0,
        -1.0, -1.0,  0.0,    0.0, 0.0, 1.0,
         1.0, -1.0,  0.0,    0.0, 0.0, 1.0,
        // right
         1.0, -1.0,  0.0,    0.0, 1.0, 0.0,
         0.0,  1.0,  0.0,    0.0, 1.0, 0.0,
         0.0, -1.0, -1.0,    0.0, 1.0, 0.0,
        // left
        -1.0, -1.0,  0.0,    0.0, 1.0, 1.0,
         0.0,  1.0,  0.0,    0.0, 1.0, 1.0,
         0.0, -1.0, -1.0,    0.0, 1.0, 1.0,
        // bottom
        -1.0, -1.0,  0.0,    1.0, 0.0, 0.0,
         1.0, -1.0,  0.0,    1.0, 0.0, 0.0,
         0.0, -1.0, -1.0,    1.0, 0.0, 0.0,
    ];
    VertexData::new("pyramid", VertexLayout::position_color(), data)
}

struct Face {
    normal: [f32; 3],
    corners: [[f32; 3]; 6],
}

/// Six faces, two counter-clockwise triangles each, in front/right/back/left/top/bottom order.
fn cube_faces(h: f32) -> [Face; 6] {
    let n = -h;
    [
        Face {
            normal: [0.0, 0.0, 1.0],
            corners: [[n, n, h], [h, n, h], [h, h, h], [n, n, h], [h, h, h], [n, h, h]],
        },
        Face {
            normal: [1.0, 0.0, 0.0],
            corners: [[h, n, h], [h, n, n], [h, h, n], [h, n, h], [h, h, n], [h, h, h]],
        },
        Face {
            normal: [0.0, 0.0, -1.0],
            corners: [[h, n, n], [n, n, n], [n, h, n], [h, n, n], [n, h, n], [h, h, n]],
        },
        Face {
            normal: [-1.0, 0.0, 0.0],
            corners: [[n, n, n], [n, n, h], [n, h, h], [n, n, n], [n, h, h], [n, h, n]],
        },
        Face {
            normal: [0.0, 1.0, 0.0],
            corners: [[n, h, h], [h, h, h], [h, h, n], [n, h, h], [h, h, n], [n, h, n]],
        },
        Face {
            normal: [0.0, -1.0, 0.0],
            corners: [[n, n, h], [n, n, n], [h, n, h], [n, n, n], [h, n, n], [h, n, h]],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn layout_offsets_are_packed() {
        let layout = VertexLayout::position_color();
        let offsets: Vec<u64> = layout.offsets().map(|(_, o)| o).collect();
        assert_eq!(offsets, vec![0, 12]);
        assert_eq!(layout.stride_bytes(), 24);
    }

    #[test]
    fn builtin_shapes_have_expected_vertex_counts() {
        assert_eq!(color_quad().vertex_count(), 6);
        assert_eq!(color_cube(0.5).vertex_count(), 36);
        assert_eq!(normal_cube().vertex_count(), 36);
        assert_eq!(color_pyramid().vertex_count(), 12);
    }

    #[test]
    fn builtin_shapes_validate() {
        for shape in [color_quad(), color_cube(0.25), normal_cube(), color_pyramid()] {
            assert!(shape.validate(DrawableId(0)).is_ok(), "{}", shape.label);
        }
    }

    #[test]
    fn empty_stream_is_invalid() {
        let empty = VertexData::new("empty", VertexLayout::position_color(), vec![]);
        assert!(matches!(
            empty.validate(DrawableId(3)),
            Err(RenderError::InvalidDrawable { id: DrawableId(3), .. })
        ));
    }

    #[test]
    fn partial_vertex_is_invalid() {
        let ragged = VertexData::new("ragged", VertexLayout::position_color(), vec![0.0; 7]);
        assert!(ragged.validate(DrawableId(0)).is_err());
    }

    #[test]
    fn cube_normals_point_away_from_center() {
        let cube = normal_cube();
        for vertex in cube.data.chunks(6) {
            let position = Vec3::from_slice(&vertex[0..3]);
            let normal = Vec3::from_slice(&vertex[3..6]);
            assert!(position.dot(normal) > 0.0);
        }
    }

    #[test]
    fn cube_triangles_wind_counter_clockwise_from_outside() {
        let cube = normal_cube();
        let vertices: Vec<&[f32]> = cube.data.chunks(6).collect();
        for tri in vertices.chunks(3) {
            let a = Vec3::from_slice(&tri[0][0..3]);
            let b = Vec3::from_slice(&tri[1][0..3]);
            let c = Vec3::from_slice(&tri[2][0..3]);
            let normal = Vec3::from_slice(&tri[0][3..6]);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }
}
