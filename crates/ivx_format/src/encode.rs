use crate::{
    config::{FormatConfig, IndexWidth, Layout, NumericMode},
    error::{FormatError, Result},
    header::{AttributeSlot, ContainerDescriptor, HeaderV1, HeaderV2, POSITION_SLOT, TEXCOORD_SLOT},
    mesh::{CompactMesh, PackedVertex},
};
use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use std::io::{self, Cursor, Seek, SeekFrom, Write};

/// Resolution of the fixed point numeric mode.
pub const FIXED_POINT_SCALE: f32 = 1_000_000.0;

/// Scales by 1e6 in single precision and truncates toward zero.
pub fn to_fixed_point(x: f32) -> i64 {
    (x * FIXED_POINT_SCALE) as i64
}

pub fn from_fixed_point(value: i64) -> f32 {
    (value as f64 / FIXED_POINT_SCALE as f64) as f32
}

/// Vertex attributes of the attribute table layout, in the order they are
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Position,
    Texcoord,
}

const TABLE_ATTRIBUTES: [Attribute; 2] = [Attribute::Position, Attribute::Texcoord];

impl Attribute {
    fn slot(self) -> usize {
        match self {
            Attribute::Position => POSITION_SLOT,
            Attribute::Texcoord => TEXCOORD_SLOT,
        }
    }

    fn component_count(self) -> u64 {
        match self {
            Attribute::Position => 3,
            Attribute::Texcoord => 2,
        }
    }

    fn write<W: Write>(self, w: &mut W, vertex: &PackedVertex) -> io::Result<()> {
        match self {
            Attribute::Position => write_components(w, NumericMode::Float, &vertex.position_components()),
            Attribute::Texcoord => write_components(w, NumericMode::Float, &vertex.texcoord_components()),
        }
    }
}

/// Serializes `mesh` into `sink` using the layout selected by
/// `config.version` and returns the header that was written.
///
/// The attribute table layout seeks back to the position `sink` had on entry
/// to rewrite its header, and leaves `sink` positioned after the last
/// section.
pub fn encode<W: Write + Seek>(
    mesh: &CompactMesh,
    name: &str,
    config: &FormatConfig,
    mut sink: W,
) -> Result<ContainerDescriptor> {
    config.validate()?;

    let descriptor = match config.layout()? {
        Layout::Fixed => ContainerDescriptor::V1(encode_fixed(mesh, name, config, &mut sink)?),
        Layout::AttributeTable => {
            ContainerDescriptor::V2(encode_attribute_table(mesh, name, config, &mut sink)?)
        }
    };
    sink.flush()?;

    debug!(
        "Encoded IVX {} container: {} vertices, {} indices",
        descriptor.version(),
        descriptor.vertex_count(),
        descriptor.index_count()
    );

    Ok(descriptor)
}

pub fn encode_to_vec(mesh: &CompactMesh, name: &str, config: &FormatConfig) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode(mesh, name, config, &mut cursor)?;
    Ok(cursor.into_inner())
}

fn encode_fixed<W: Write>(
    mesh: &CompactMesh,
    name: &str,
    config: &FormatConfig,
    sink: &mut W,
) -> Result<HeaderV1> {
    let index_width = config.effective_index_width();
    let mode = config.effective_numeric_mode();

    // every index must fit, checked before anything is written
    if index_width == IndexWidth::U16 && mesh.vertices.len() > u16::MAX as usize + 1 {
        return Err(FormatError::IndexOverflow {
            vertex_count: mesh.vertices.len(),
        });
    }

    let mut header = HeaderV1::new(config.version, name, index_width, mode);
    header.vertex_count = mesh.vertices.len() as u64;
    header.coords_count = mesh.vertices.len() as u64;
    header.index_count = mesh.indices.len() as u64;
    if header.has_normals() {
        header.normal_count = mesh.vertices.len() as u64;
    }
    header.write_to(sink)?;

    for vertex in &mesh.vertices {
        write_components(sink, mode, &vertex.position_components())?;
    }
    for vertex in &mesh.vertices {
        write_components(sink, mode, &vertex.texcoord_components())?;
    }
    for &index in &mesh.indices {
        match index_width {
            IndexWidth::U16 => sink.write_u16::<LittleEndian>(index as u16)?,
            IndexWidth::U32 => sink.write_u32::<LittleEndian>(index)?,
        }
    }
    if header.has_normals() {
        for vertex in &mesh.vertices {
            write_components(sink, mode, &vertex.normal_components())?;
        }
    }

    Ok(header)
}

fn encode_attribute_table<W: Write + Seek>(
    mesh: &CompactMesh,
    name: &str,
    config: &FormatConfig,
    sink: &mut W,
) -> Result<HeaderV2> {
    let start = sink.stream_position()?;

    // reserve space, offsets are filled in below
    let mut header = HeaderV2::new(config.version, name);
    header.write_to(sink)?;

    header.index_count = mesh.indices.len() as u64;
    header.index_byte_offset = sink.stream_position()? - start;
    for &index in &mesh.indices {
        sink.write_u32::<LittleEndian>(index)?;
    }

    header.vertex_count = mesh.vertices.len() as u64;
    for attribute in TABLE_ATTRIBUTES.iter().copied() {
        header.attributes[attribute.slot()] = AttributeSlot {
            component_count: attribute.component_count(),
            byte_offset: sink.stream_position()? - start,
        };
        for vertex in &mesh.vertices {
            attribute.write(sink, vertex)?;
        }
    }

    let end = sink.stream_position()?;
    sink.seek(SeekFrom::Start(start))?;
    header.write_to(sink)?;
    sink.seek(SeekFrom::Start(end))?;

    Ok(header)
}

fn write_components<W: Write>(w: &mut W, mode: NumericMode, components: &[f32]) -> io::Result<()> {
    for &component in components {
        match mode {
            NumericMode::Float => w.write_f32::<LittleEndian>(component)?,
            NumericMode::FixedPoint => w.write_i64::<LittleEndian>(to_fixed_point(component))?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Version;
    use byteorder::ByteOrder;
    use gfx_maths::{Vec2, Vec3};

    fn triangle() -> CompactMesh {
        let normal = Some(Vec3::new(0.0, 0.0, 1.0));
        CompactMesh {
            vertices: vec![
                PackedVertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 1.0), normal),
                PackedVertex::new(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 1.0), normal),
                PackedVertex::new(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 0.0), normal),
            ],
            indices: vec![0, 1, 2],
        }
    }

    fn u64_at(bytes: &[u8], offset: usize) -> u64 {
        LittleEndian::read_u64(&bytes[offset..offset + 8])
    }

    #[test]
    fn test_fixed_point() {
        assert_eq!(to_fixed_point(1.5), 1_500_000);
        assert_eq!(to_fixed_point(-0.25), -250_000);
        // truncation toward zero, not rounding
        assert_eq!(to_fixed_point(0.0000019), 1);
        assert_eq!(to_fixed_point(-0.0000015), -1);
        assert_eq!(from_fixed_point(-250_000), -0.25);
    }

    #[test]
    fn test_fixed_point_tolerance() {
        for i in -4000..=4000 {
            let x = i as f32 * 0.000_999_7;
            let decoded = from_fixed_point(to_fixed_point(x)) as f64;
            assert!((decoded - x as f64).abs() <= 1.5e-6, "{} decoded as {}", x, decoded);
        }
    }

    #[test]
    fn test_v1_1_layout() -> Result<()> {
        let bytes = encode_to_vec(&triangle(), "tri", &FormatConfig::new(Version::V1_1))?;
        assert_eq!(bytes.len(), 1112 + 3 * 12 + 3 * 8 + 3 * 4 + 3 * 12);

        assert_eq!(u64_at(&bytes, 0), 1);
        assert_eq!(u64_at(&bytes, 8), 1);
        assert_eq!(u64_at(&bytes, 16), 0);
        assert_eq!(&bytes[24..28], b"tri\0");

        // vertex_count .. index_bytes, then normal_count, normal_bytes
        let counts: Vec<u64> = (0..8).map(|i| u64_at(&bytes, 1048 + i * 8)).collect();
        assert_eq!(counts, vec![3, 3, 3, 12, 8, 4, 3, 12]);

        // second vertex x, first texcoord v, last index, last normal z
        assert_eq!(LittleEndian::read_f32(&bytes[1112 + 12..]), 1.0);
        assert_eq!(LittleEndian::read_f32(&bytes[1148 + 4..]), 1.0);
        assert_eq!(LittleEndian::read_u32(&bytes[1172 + 8..]), 2);
        assert_eq!(LittleEndian::read_f32(&bytes[bytes.len() - 4..]), 1.0);

        Ok(())
    }

    #[test]
    fn test_v1_0_short_fixed_point() -> Result<()> {
        let config = FormatConfig::new(Version::V1_0)
            .with_index_width(IndexWidth::U16)
            .with_numeric_mode(NumericMode::FixedPoint);
        let bytes = encode_to_vec(&triangle(), "tri", &config)?;
        assert_eq!(bytes.len(), 1096 + 3 * 24 + 3 * 16 + 3 * 2);
        assert_eq!(u64_at(&bytes, 16), 1);

        let widths: Vec<u64> = (3..6).map(|i| u64_at(&bytes, 1048 + i * 8)).collect();
        assert_eq!(widths, vec![24, 16, 2]);

        // x of the second vertex
        assert_eq!(LittleEndian::read_i64(&bytes[1096 + 24..]), 1_000_000);
        assert_eq!(LittleEndian::read_u16(&bytes[bytes.len() - 2..]), 2);

        Ok(())
    }

    #[test]
    fn test_short_index_overflow() {
        let vertices: Vec<PackedVertex> = (0..70_000)
            .map(|i| PackedVertex::new(Vec3::new(i as f32, 0.0, 0.0), Vec2::new(0.0, 0.0), None))
            .collect();
        let mesh = CompactMesh {
            indices: (0..70_002).map(|i| i % 70_000).collect(),
            vertices,
        };

        let short = FormatConfig::new(Version::V1_1).with_index_width(IndexWidth::U16);
        let mut sink = Cursor::new(Vec::new());
        assert!(matches!(
            encode(&mesh, "big", &short, &mut sink),
            Err(FormatError::IndexOverflow { vertex_count: 70_000 })
        ));
        assert!(sink.get_ref().is_empty());

        let wide = FormatConfig::new(Version::V1_1);
        assert!(encode_to_vec(&mesh, "big", &wide).is_ok());
    }

    #[test]
    fn test_short_index_limit() -> Result<()> {
        let vertices: Vec<PackedVertex> = (0..=u16::MAX as u32)
            .map(|i| PackedVertex::new(Vec3::new(i as f32, 0.0, 0.0), Vec2::new(0.0, 0.0), None))
            .collect();
        let mesh = CompactMesh {
            indices: vec![0, 1, u16::MAX as u32],
            vertices,
        };

        let config = FormatConfig::new(Version::V1_0).with_index_width(IndexWidth::U16);
        let bytes = encode_to_vec(&mesh, "", &config)?;
        assert_eq!(LittleEndian::read_u16(&bytes[bytes.len() - 2..]), u16::MAX);

        Ok(())
    }

    #[test]
    fn test_v2_offsets() -> Result<()> {
        let mut sink = Cursor::new(Vec::new());
        let descriptor = encode(&triangle(), "tri", &FormatConfig::new(Version::V2_0), &mut sink)?;
        let bytes = sink.into_inner();
        assert_eq!(bytes.len(), 1192 + 3 * 4 + 3 * 12 + 3 * 8);

        let header = match descriptor {
            ContainerDescriptor::V2(header) => header,
            ContainerDescriptor::V1(_) => panic!("expected an attribute table header"),
        };
        assert_eq!(header.index_range()?, 1192..1204);
        assert_eq!(header.attribute_range(POSITION_SLOT)?, Some(1204..1240));
        assert_eq!(header.attribute_range(TEXCOORD_SLOT)?, Some(1240..1264));
        assert!(header.attributes[2..].iter().all(|a| *a == AttributeSlot::default()));

        // the rewritten header on disk matches the returned one
        assert_eq!(u64_at(&bytes, 1040), 3);
        assert_eq!(u64_at(&bytes, 1048), 1192);
        assert_eq!(u64_at(&bytes, 1056), 3);
        assert_eq!((u64_at(&bytes, 1064), u64_at(&bytes, 1072)), (3, 1204));
        assert_eq!((u64_at(&bytes, 1080), u64_at(&bytes, 1088)), (2, 1240));

        // texcoords are written as given
        assert_eq!(LittleEndian::read_f32(&bytes[1240 + 4..]), 1.0);

        Ok(())
    }

    #[test]
    fn test_v2_offsets_relative_to_start() -> Result<()> {
        let mut sink = Cursor::new(vec![0xAA; 16]);
        sink.seek(SeekFrom::End(0))?;
        encode(&triangle(), "tri", &FormatConfig::new(Version::V2_0), &mut sink)?;

        let bytes = sink.into_inner();
        assert_eq!(&bytes[..16], &[0xAA; 16]);
        assert_eq!(u64_at(&bytes, 16), 2);
        assert_eq!(u64_at(&bytes, 16 + 1048), 1192);

        Ok(())
    }

    #[test]
    fn test_empty_mesh() -> Result<()> {
        let empty = CompactMesh::default();

        let bytes = encode_to_vec(&empty, "empty", &FormatConfig::new(Version::V1_1))?;
        assert_eq!(bytes.len(), 1112);
        assert!((0..3).all(|i| u64_at(&bytes, 1048 + i * 8) == 0));

        let bytes = encode_to_vec(&empty, "empty", &FormatConfig::new(Version::V2_0))?;
        assert_eq!(bytes.len(), 1192);
        assert_eq!(u64_at(&bytes, 1040), 0);
        assert_eq!(u64_at(&bytes, 1056), 0);

        Ok(())
    }

    #[test]
    fn test_unsupported_version() {
        let config = FormatConfig::new(Version::new(0, 9));
        assert!(matches!(
            encode_to_vec(&triangle(), "", &config),
            Err(FormatError::UnsupportedVersion { .. })
        ));
    }
}
