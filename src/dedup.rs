use crate::{
    error::{Error, Result},
    raw::{FaceVertex, RawMesh},
};
use ahash::AHashMap;
use ivx_format::{CompactMesh, PackedVertex};
use log::debug;

/// Assigns dense indices to packed vertices in the order they are first seen.
#[derive(Debug, Clone, Default)]
pub struct VertexTable {
    lookup: AHashMap<PackedVertex, u32>,
    vertices: Vec<PackedVertex>,
}

impl VertexTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lookup: AHashMap::with_capacity(capacity),
            vertices: Vec::with_capacity(capacity),
        }
    }

    /// Returns the index of `vertex`, appending it if it is new.
    pub fn insert(&mut self, vertex: PackedVertex) -> u32 {
        if let Some(&index) = self.lookup.get(&vertex) {
            return index;
        }

        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        self.lookup.insert(vertex, index);
        index
    }

    pub fn get(&self, vertex: &PackedVertex) -> Option<u32> {
        self.lookup.get(vertex).copied()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn into_vertices(self) -> Vec<PackedVertex> {
        self.vertices
    }
}

/// Collapses every face-vertex of `raw` into a shared vertex buffer.
///
/// With `with_normals` the normal is part of the vertex identity and every
/// face-vertex must reference one; otherwise normal indices are ignored.
pub fn deduplicate(raw: &RawMesh, with_normals: bool) -> Result<CompactMesh> {
    let mut table = VertexTable::with_capacity(raw.faces.len());
    let mut indices = Vec::with_capacity(raw.face_vertex_count());

    for (face, triangle) in raw.faces.iter().enumerate() {
        for corner in &triangle.0 {
            let vertex = resolve(raw, face, corner, with_normals)?;
            indices.push(table.insert(vertex));
        }
    }

    debug!(
        "Indexed {} face-vertices into {} unique vertices",
        indices.len(),
        table.len()
    );

    Ok(CompactMesh {
        vertices: table.into_vertices(),
        indices,
    })
}

fn resolve(raw: &RawMesh, face: usize, corner: &FaceVertex, with_normals: bool) -> Result<PackedVertex> {
    let position = lookup(&raw.positions, face, "position", corner.position)?;
    let texcoord = lookup(&raw.texcoords, face, "texcoord", corner.texcoord)?;

    let normal = if with_normals {
        let index = corner.normal.ok_or(Error::MissingNormal { face })?;
        Some(lookup(&raw.normals, face, "normal", index)?)
    } else {
        None
    };

    Ok(PackedVertex::new(position, texcoord, normal))
}

// indices are 1-based
fn lookup<T: Copy>(values: &[T], face: usize, attribute: &'static str, index: usize) -> Result<T> {
    index
        .checked_sub(1)
        .and_then(|i| values.get(i))
        .copied()
        .ok_or(Error::IndexOutOfRange {
            face,
            attribute,
            index,
            len: values.len(),
        })
}
