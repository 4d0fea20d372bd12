use crate::{
    config::{Layout, NumericMode},
    encode::from_fixed_point,
    error::{FormatError, Result},
    header::{
        read_version, ContainerDescriptor, HeaderV1, HeaderV2, POSITION_SLOT, TEXCOORD_SLOT,
    },
    mesh::{CompactMesh, PackedVertex},
};
use byteorder::{LittleEndian, ReadBytesExt};
use gfx_maths::{Vec2, Vec3};
use std::{
    io::{Cursor, Read, Seek, SeekFrom},
    ops::Range,
    path::Path,
};

/// A fully decoded container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub descriptor: ContainerDescriptor,
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Container {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let version = read_version(&mut cursor)?;

        match version.layout()? {
            Layout::Fixed => {
                let header = HeaderV1::read_after_version(version, &mut cursor)?;
                read_fixed(header, &mut cursor)
            }
            Layout::AttributeTable => {
                let header = HeaderV2::read_after_version(version, &mut cursor)?;
                read_attribute_table(header, &mut cursor)
            }
        }
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Container::from_bytes(&data)
    }

    pub fn name(&self) -> String {
        self.descriptor.name()
    }

    /// Reassembles the deduplicated mesh. Normals are only present if the
    /// container stored them.
    pub fn to_compact_mesh(&self) -> CompactMesh {
        let vertices = self
            .positions
            .iter()
            .zip(&self.texcoords)
            .enumerate()
            .map(|(i, (p, t))| {
                PackedVertex::new(
                    Vec3::new(p[0], p[1], p[2]),
                    Vec2::new(t[0], t[1]),
                    self.normals.get(i).map(|n| Vec3::new(n[0], n[1], n[2])),
                )
            })
            .collect();

        CompactMesh {
            vertices,
            indices: self.indices.clone(),
        }
    }
}

fn invalid(message: String) -> FormatError {
    FormatError::InvalidLayout(message)
}

fn read_fixed(header: HeaderV1, cursor: &mut Cursor<&[u8]>) -> Result<Container> {
    let mode = match header.vertex_bytes {
        12 => NumericMode::Float,
        24 => NumericMode::FixedPoint,
        n => return Err(invalid(format!("unknown vertex element width {}", n))),
    };
    let component = mode.component_bytes();

    let expected_index_bytes = if header.is_index_size_short { 2 } else { 4 };
    if header.index_bytes != expected_index_bytes {
        return Err(invalid(format!(
            "index element width {} does not match the index size flag",
            header.index_bytes
        )));
    }
    if header.coords_bytes != 2 * component
        || (header.has_normals() && header.normal_bytes != 3 * component)
    {
        return Err(invalid("element widths of the sections disagree".into()));
    }
    if header.coords_count != header.vertex_count
        || (header.has_normals() && header.normal_count != header.vertex_count)
    {
        return Err(invalid("attribute sections differ in length".into()));
    }

    let available = cursor.get_ref().len() as u64 - header.size();
    let data_len = header.data_len()?;
    if data_len > available {
        return Err(invalid(format!(
            "sections need {} bytes, but only {} follow the header",
            data_len, available
        )));
    }

    let positions = read_vec3s(cursor, mode, header.vertex_count)?;
    let texcoords = read_vec2s(cursor, mode, header.coords_count)?;
    let indices = (0..header.index_count)
        .map(|_| match header.index_bytes {
            2 => cursor.read_u16::<LittleEndian>().map(u32::from),
            _ => cursor.read_u32::<LittleEndian>(),
        })
        .collect::<std::io::Result<_>>()?;
    let normals = if header.has_normals() {
        read_vec3s(cursor, mode, header.normal_count)?
    } else {
        Vec::new()
    };

    Ok(Container {
        descriptor: ContainerDescriptor::V1(header),
        positions,
        texcoords,
        normals,
        indices,
    })
}

fn read_attribute_table(header: HeaderV2, cursor: &mut Cursor<&[u8]>) -> Result<Container> {
    let len = cursor.get_ref().len() as u64;

    let mut sections: Vec<Range<u64>> = vec![header.index_range()?];
    for slot in 0..header.attributes.len() {
        sections.extend(header.attribute_range(slot)?);
    }
    for section in &sections {
        if section.start < HeaderV2::SIZE || section.end > len {
            return Err(invalid(format!(
                "section {:?} lies outside of the data area {:?}",
                section,
                HeaderV2::SIZE..len
            )));
        }
    }

    let mut occupied: Vec<&Range<u64>> = sections.iter().filter(|s| !s.is_empty()).collect();
    occupied.sort_by_key(|s| s.start);
    if let Some(pair) = occupied.windows(2).find(|pair| pair[0].end > pair[1].start) {
        return Err(invalid(format!("sections {:?} and {:?} overlap", pair[0], pair[1])));
    }

    let component_count = |slot: usize| header.attributes[slot].component_count;
    if component_count(POSITION_SLOT) != 3 || component_count(TEXCOORD_SLOT) != 2 {
        return Err(invalid("position and texcoord slots are not 3 and 2 components".into()));
    }

    cursor.seek(SeekFrom::Start(header.index_byte_offset))?;
    let indices = (0..header.index_count)
        .map(|_| cursor.read_u32::<LittleEndian>())
        .collect::<std::io::Result<_>>()?;

    cursor.seek(SeekFrom::Start(header.attributes[POSITION_SLOT].byte_offset))?;
    let positions = read_vec3s(cursor, NumericMode::Float, header.vertex_count)?;

    cursor.seek(SeekFrom::Start(header.attributes[TEXCOORD_SLOT].byte_offset))?;
    let texcoords = read_vec2s(cursor, NumericMode::Float, header.vertex_count)?;

    Ok(Container {
        descriptor: ContainerDescriptor::V2(header),
        positions,
        texcoords,
        normals: Vec::new(),
        indices,
    })
}

fn read_component<R: Read>(r: &mut R, mode: NumericMode) -> std::io::Result<f32> {
    match mode {
        NumericMode::Float => r.read_f32::<LittleEndian>(),
        NumericMode::FixedPoint => r.read_i64::<LittleEndian>().map(from_fixed_point),
    }
}

fn read_vec3s<R: Read>(r: &mut R, mode: NumericMode, count: u64) -> std::io::Result<Vec<[f32; 3]>> {
    (0..count)
        .map(|_| {
            Ok([
                read_component(r, mode)?,
                read_component(r, mode)?,
                read_component(r, mode)?,
            ])
        })
        .collect()
}

fn read_vec2s<R: Read>(r: &mut R, mode: NumericMode, count: u64) -> std::io::Result<Vec<[f32; 2]>> {
    (0..count)
        .map(|_| Ok([read_component(r, mode)?, read_component(r, mode)?]))
        .collect()
}
