use gfx_maths::{Vec2, Vec3};

/// One corner of a triangle. Indices are 1-based, as in the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceVertex {
    pub position: usize,
    pub texcoord: usize,
    pub normal: Option<usize>,
}

impl FaceVertex {
    pub fn new(position: usize, texcoord: usize, normal: Option<usize>) -> Self {
        Self {
            position,
            texcoord,
            normal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle(pub [FaceVertex; 3]);

/// Attribute arrays as handed over by ingestion, plus the triangles
/// indexing into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    pub positions: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<Triangle>,
}

impl RawMesh {
    pub fn face_vertex_count(&self) -> usize {
        self.faces.len() * 3
    }

    /// Stores every texture coordinate as `(u, 1 - v)`.
    pub fn flip_texcoord_v(&mut self) {
        for texcoord in self.texcoords.iter_mut() {
            texcoord.y = 1.0 - texcoord.y;
        }
    }
}
