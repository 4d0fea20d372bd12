use gfx_maths::{Vec2, Vec3};
use ivx::{RawMesh, Triangle};

/// A parsed OBJ file: the `o` name, if any, and its attribute arrays.
#[derive(Debug, Default)]
pub(crate) struct ObjMesh {
    pub(crate) name: Option<String>,
    pub(crate) raw: RawMesh,
}

#[derive(Debug, Default)]
pub(crate) struct ObjMeshBuilder {
    pub(crate) mesh: ObjMesh,
    /// store texture coordinates as `1 - v` once the mesh is built
    pub(crate) flip_v: bool,
}

impl ObjMeshBuilder {
    pub(crate) fn new(flip_v: bool) -> Self {
        Self {
            flip_v,
            ..Default::default()
        }
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.mesh.name = if name.is_empty() {
            None
        } else {
            Some(name.into())
        };
    }

    pub(crate) fn push_vertex(&mut self, position: [f32; 3]) {
        let [x, y, z] = position;
        self.mesh.raw.positions.push(Vec3::new(x, y, z));
    }

    pub(crate) fn push_uv(&mut self, uv: [f32; 2]) {
        let [u, v] = uv;
        self.mesh.raw.texcoords.push(Vec2::new(u, v));
    }

    pub(crate) fn push_normal(&mut self, normal: [f32; 3]) {
        let [x, y, z] = normal;
        self.mesh.raw.normals.push(Vec3::new(x, y, z));
    }

    pub(crate) fn push_face(&mut self, face: Triangle) {
        self.mesh.raw.faces.push(face);
    }

    pub(crate) fn build_mesh(mut self) -> ObjMesh {
        if self.flip_v {
            self.mesh.raw.flip_texcoord_v();
        }
        self.mesh
    }
}
