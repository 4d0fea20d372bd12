use gfx_maths::{Vec2, Vec3};
use std::hash::{Hash, Hasher};

/// The attribute values a single face-vertex resolves to.
///
/// Two packed vertices are equal iff every component has the same bit
/// pattern, so `0.0` and `-0.0` stay distinct vertices while identical `NaN`s
/// collapse into one. Hashing follows the same rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedVertex {
    pub position: Vec3,
    pub texcoord: Vec2,
    pub normal: Option<Vec3>,
}

impl PackedVertex {
    pub fn new(position: Vec3, texcoord: Vec2, normal: Option<Vec3>) -> Self {
        Self {
            position,
            texcoord,
            normal,
        }
    }

    pub fn position_components(&self) -> [f32; 3] {
        [self.position.x, self.position.y, self.position.z]
    }

    pub fn texcoord_components(&self) -> [f32; 2] {
        [self.texcoord.x, self.texcoord.y]
    }

    /// Missing normals are written as zero vectors.
    pub fn normal_components(&self) -> [f32; 3] {
        self.normal.map_or([0.0; 3], |n| [n.x, n.y, n.z])
    }

    fn bits(&self) -> ([u32; 3], [u32; 2], Option<[u32; 3]>) {
        (
            self.position_components().map(f32::to_bits),
            self.texcoord_components().map(f32::to_bits),
            self.normal
                .map(|n| [n.x.to_bits(), n.y.to_bits(), n.z.to_bits()]),
        )
    }
}

impl PartialEq for PackedVertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for PackedVertex {}

impl Hash for PackedVertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// Deduplicated mesh: every distinct packed vertex once, in first-occurrence
/// order, and three indices per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactMesh {
    pub vertices: Vec<PackedVertex>,
    pub indices: Vec<u32>,
}

impl CompactMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        self.vertices.iter().any(|v| v.normal.is_some())
    }

    /// Resolves the triangle at `i` into its three packed vertices.
    pub fn triangle(&self, i: usize) -> Option<[PackedVertex; 3]> {
        let corners = self.indices.get(i * 3..i * 3 + 3)?;
        let vertex = |c: usize| self.vertices.get(corners[c] as usize).copied();
        Some([vertex(0)?, vertex(1)?, vertex(2)?])
    }
}
