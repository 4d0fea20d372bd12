//! In-memory mirror of the container headers.
//!
//! All integers are little-endian `u64`. The headers contain no padding, so
//! their size is the sum of their fields.

use crate::{
    config::{IndexWidth, NumericMode, Version},
    error::{FormatError, Result},
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::{
    io::{self, Read, Write},
    ops::Range,
};

/// Size of the zero padded name field.
pub const NAME_LEN: usize = 1024;
/// Capacity of the attribute table.
pub const MAX_ATTRIBUTES: usize = 8;

pub const POSITION_SLOT: usize = 0;
pub const TEXCOORD_SLOT: usize = 1;

const FIELD: u64 = 8;
const PREFIX_SIZE: u64 = 2 * FIELD + NAME_LEN as u64;

/// Stores up to `NAME_LEN - 1` bytes of `name`, the rest stays zero.
pub fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut field = [0u8; NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(NAME_LEN - 1);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

pub fn decode_name(field: &[u8; NAME_LEN]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

pub(crate) fn read_version<R: Read>(r: &mut R) -> io::Result<Version> {
    let major = r.read_u64::<LittleEndian>()?;
    let minor = r.read_u64::<LittleEndian>()?;
    Ok(Version::new(major, minor))
}

fn write_version<W: Write>(w: &mut W, version: Version) -> io::Result<()> {
    w.write_u64::<LittleEndian>(version.major)?;
    w.write_u64::<LittleEndian>(version.minor)
}

fn read_name<R: Read>(r: &mut R) -> io::Result<[u8; NAME_LEN]> {
    let mut name = [0u8; NAME_LEN];
    r.read_exact(&mut name)?;
    Ok(name)
}

// ----------------------------------------------------------------------------
// 1.x
// ----------------------------------------------------------------------------

/// Header of the fixed layout. Section offsets are implicit: vertices,
/// texcoords, indices and (from 1.1 on) normals follow back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderV1 {
    pub version: Version,
    pub is_index_size_short: bool,
    pub name: [u8; NAME_LEN],

    pub vertex_count: u64,
    pub coords_count: u64,
    pub index_count: u64,

    /// size of a single element
    pub vertex_bytes: u64,
    pub coords_bytes: u64,
    pub index_bytes: u64,

    /// only on disk if [`HeaderV1::has_normals`]
    pub normal_count: u64,
    pub normal_bytes: u64,
}

impl HeaderV1 {
    /// Creates a header with all counts zero and element widths derived from
    /// the index width and numeric mode.
    pub fn new(version: Version, name: &str, index_width: IndexWidth, mode: NumericMode) -> Self {
        let component = mode.component_bytes();
        let has_normals = version.combined() >= 101;

        Self {
            version,
            is_index_size_short: index_width == IndexWidth::U16,
            name: encode_name(name),
            vertex_count: 0,
            coords_count: 0,
            index_count: 0,
            vertex_bytes: 3 * component,
            coords_bytes: 2 * component,
            index_bytes: index_width.bytes(),
            normal_count: 0,
            normal_bytes: if has_normals { 3 * component } else { 0 },
        }
    }

    pub fn has_normals(&self) -> bool {
        self.version.combined() >= 101
    }

    pub fn size(&self) -> u64 {
        let normals = if self.has_normals() { 2 * FIELD } else { 0 };
        PREFIX_SIZE + 7 * FIELD + normals
    }

    /// Byte length of all sections following the header.
    ///
    /// Fails with [`FormatError::InvalidLayout`] if the counts of a read
    /// header do not fit into 64 bits.
    pub fn data_len(&self) -> Result<u64> {
        let mut sections = vec![
            (self.vertex_count, self.vertex_bytes),
            (self.coords_count, self.coords_bytes),
            (self.index_count, self.index_bytes),
        ];
        if self.has_normals() {
            sections.push((self.normal_count, self.normal_bytes));
        }

        sections
            .into_iter()
            .try_fold(0u64, |len, (count, bytes)| {
                count.checked_mul(bytes).and_then(|n| len.checked_add(n))
            })
            .ok_or_else(|| FormatError::InvalidLayout("section sizes overflow".into()))
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_version(w, self.version)?;
        w.write_u64::<LittleEndian>(self.is_index_size_short as u64)?;
        w.write_all(&self.name)?;

        for field in &[
            self.vertex_count,
            self.coords_count,
            self.index_count,
            self.vertex_bytes,
            self.coords_bytes,
            self.index_bytes,
        ] {
            w.write_u64::<LittleEndian>(*field)?;
        }

        if self.has_normals() {
            w.write_u64::<LittleEndian>(self.normal_count)?;
            w.write_u64::<LittleEndian>(self.normal_bytes)?;
        }

        Ok(())
    }

    /// Reads the rest of the header after the version prefix.
    pub fn read_after_version<R: Read>(version: Version, r: &mut R) -> io::Result<Self> {
        let is_index_size_short = r.read_u64::<LittleEndian>()? != 0;
        let name = read_name(r)?;

        let mut header = Self {
            version,
            is_index_size_short,
            name,
            vertex_count: r.read_u64::<LittleEndian>()?,
            coords_count: r.read_u64::<LittleEndian>()?,
            index_count: r.read_u64::<LittleEndian>()?,
            vertex_bytes: r.read_u64::<LittleEndian>()?,
            coords_bytes: r.read_u64::<LittleEndian>()?,
            index_bytes: r.read_u64::<LittleEndian>()?,
            normal_count: 0,
            normal_bytes: 0,
        };

        if header.has_normals() {
            header.normal_count = r.read_u64::<LittleEndian>()?;
            header.normal_bytes = r.read_u64::<LittleEndian>()?;
        }

        Ok(header)
    }
}

// ----------------------------------------------------------------------------
// 2.x
// ----------------------------------------------------------------------------

/// One entry of the attribute table. An unused slot is all zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeSlot {
    pub component_count: u64,
    pub byte_offset: u64,
}

impl AttributeSlot {
    pub fn is_used(&self) -> bool {
        self.component_count != 0
    }
}

/// Header of the attribute table layout. Indices are always `u32` and
/// attribute components always `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderV2 {
    pub version: Version,
    pub name: [u8; NAME_LEN],

    pub index_count: u64,
    pub index_byte_offset: u64,
    pub vertex_count: u64,

    pub attributes: [AttributeSlot; MAX_ATTRIBUTES],
}

impl HeaderV2 {
    pub const SIZE: u64 = PREFIX_SIZE + 3 * FIELD + MAX_ATTRIBUTES as u64 * 2 * FIELD;
    pub const INDEX_BYTES: u64 = 4;
    pub const COMPONENT_BYTES: u64 = 4;

    /// A header with zeroed counts and offsets, used to reserve space.
    pub fn new(version: Version, name: &str) -> Self {
        Self {
            version,
            name: encode_name(name),
            index_count: 0,
            index_byte_offset: 0,
            vertex_count: 0,
            attributes: Default::default(),
        }
    }

    pub fn index_range(&self) -> Result<Range<u64>> {
        section_range(self.index_byte_offset, &[self.index_count, Self::INDEX_BYTES])
    }

    /// Byte range of `slot`, `None` if the slot is unused.
    pub fn attribute_range(&self, slot: usize) -> Result<Option<Range<u64>>> {
        match self.attributes.get(slot).filter(|a| a.is_used()) {
            Some(attribute) => section_range(
                attribute.byte_offset,
                &[attribute.component_count, Self::COMPONENT_BYTES, self.vertex_count],
            )
            .map(Some),
            None => Ok(None),
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_version(w, self.version)?;
        w.write_all(&self.name)?;
        w.write_u64::<LittleEndian>(self.index_count)?;
        w.write_u64::<LittleEndian>(self.index_byte_offset)?;
        w.write_u64::<LittleEndian>(self.vertex_count)?;

        for attribute in &self.attributes {
            w.write_u64::<LittleEndian>(attribute.component_count)?;
            w.write_u64::<LittleEndian>(attribute.byte_offset)?;
        }

        Ok(())
    }

    pub fn read_after_version<R: Read>(version: Version, r: &mut R) -> io::Result<Self> {
        let mut header = Self {
            version,
            name: read_name(r)?,
            index_count: r.read_u64::<LittleEndian>()?,
            index_byte_offset: r.read_u64::<LittleEndian>()?,
            vertex_count: r.read_u64::<LittleEndian>()?,
            attributes: Default::default(),
        };

        for attribute in header.attributes.iter_mut() {
            attribute.component_count = r.read_u64::<LittleEndian>()?;
            attribute.byte_offset = r.read_u64::<LittleEndian>()?;
        }

        Ok(header)
    }
}

fn section_range(start: u64, factors: &[u64]) -> Result<Range<u64>> {
    factors
        .iter()
        .try_fold(1u64, |len, &factor| len.checked_mul(factor))
        .and_then(|len| start.checked_add(len))
        .map(|end| start..end)
        .ok_or_else(|| {
            FormatError::InvalidLayout(format!("section at offset {} does not fit into 64 bits", start))
        })
}

// ----------------------------------------------------------------------------

/// Header of a written container, as returned by the encoder and reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerDescriptor {
    V1(HeaderV1),
    V2(HeaderV2),
}

impl ContainerDescriptor {
    pub fn version(&self) -> Version {
        match self {
            ContainerDescriptor::V1(h) => h.version,
            ContainerDescriptor::V2(h) => h.version,
        }
    }

    pub fn name(&self) -> String {
        match self {
            ContainerDescriptor::V1(h) => decode_name(&h.name),
            ContainerDescriptor::V2(h) => decode_name(&h.name),
        }
    }

    pub fn vertex_count(&self) -> u64 {
        match self {
            ContainerDescriptor::V1(h) => h.vertex_count,
            ContainerDescriptor::V2(h) => h.vertex_count,
        }
    }

    pub fn index_count(&self) -> u64 {
        match self {
            ContainerDescriptor::V1(h) => h.index_count,
            ContainerDescriptor::V2(h) => h.index_count,
        }
    }

    pub fn header_size(&self) -> u64 {
        match self {
            ContainerDescriptor::V1(h) => h.size(),
            ContainerDescriptor::V2(_) => HeaderV2::SIZE,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_name_field() {
        let field = encode_name("cube");
        assert_eq!(&field[..4], b"cube");
        assert!(field[4..].iter().all(|&b| b == 0));
        assert_eq!(decode_name(&field), "cube");

        let long = "x".repeat(2000);
        let field = encode_name(&long);
        assert_eq!(field[NAME_LEN - 1], 0);
        assert_eq!(decode_name(&field).len(), NAME_LEN - 1);
    }

    #[test]
    fn test_header_sizes() -> io::Result<()> {
        for (version, size) in &[(Version::V1_0, 1096), (Version::V1_1, 1112)] {
            let header = HeaderV1::new(*version, "a", IndexWidth::U32, NumericMode::Float);
            assert_eq!(header.size(), *size);

            let mut bytes = Vec::new();
            header.write_to(&mut bytes)?;
            assert_eq!(bytes.len() as u64, *size);
        }

        let mut bytes = Vec::new();
        HeaderV2::new(Version::V2_0, "a").write_to(&mut bytes)?;
        assert_eq!(bytes.len() as u64, HeaderV2::SIZE);
        assert_eq!(HeaderV2::SIZE, 1192);

        Ok(())
    }

    #[test]
    fn test_element_widths() {
        let float = HeaderV1::new(Version::V1_1, "", IndexWidth::U16, NumericMode::Float);
        assert!(float.is_index_size_short);
        assert_eq!(
            (float.vertex_bytes, float.coords_bytes, float.index_bytes, float.normal_bytes),
            (12, 8, 2, 12)
        );

        let fixed = HeaderV1::new(Version::V1_0, "", IndexWidth::U32, NumericMode::FixedPoint);
        assert!(!fixed.is_index_size_short);
        assert_eq!(
            (fixed.vertex_bytes, fixed.coords_bytes, fixed.index_bytes, fixed.normal_bytes),
            (24, 16, 4, 0)
        );
    }

    #[test]
    fn test_read_back() -> Result<()> {
        let mut v1 = HeaderV1::new(Version::V1_1, "mesh", IndexWidth::U32, NumericMode::Float);
        v1.vertex_count = 3;
        v1.normal_count = 3;

        let mut bytes = Vec::new();
        v1.write_to(&mut bytes)?;
        let mut cursor = Cursor::new(bytes);
        let version = read_version(&mut cursor)?;
        assert_eq!(HeaderV1::read_after_version(version, &mut cursor)?, v1);

        let mut v2 = HeaderV2::new(Version::V2_0, "mesh");
        v2.vertex_count = 4;
        v2.attributes[TEXCOORD_SLOT] = AttributeSlot {
            component_count: 2,
            byte_offset: 2000,
        };

        let mut bytes = Vec::new();
        v2.write_to(&mut bytes)?;
        let mut cursor = Cursor::new(bytes);
        let version = read_version(&mut cursor)?;
        let read = HeaderV2::read_after_version(version, &mut cursor)?;
        assert_eq!(read, v2);
        assert_eq!(read.attribute_range(TEXCOORD_SLOT)?, Some(2000..2032));
        assert_eq!(read.attribute_range(POSITION_SLOT)?, None);

        Ok(())
    }

    #[test]
    fn test_huge_counts() -> Result<()> {
        let mut v1 = HeaderV1::new(Version::V1_1, "", IndexWidth::U32, NumericMode::Float);
        v1.vertex_count = 2;
        v1.index_count = 3;
        v1.normal_count = 2;
        assert_eq!(v1.data_len()?, 2 * 12 + 3 * 4 + 2 * 12);

        v1.vertex_count = u64::MAX / 4;
        assert!(matches!(v1.data_len(), Err(FormatError::InvalidLayout(_))));

        let mut v2 = HeaderV2::new(Version::V2_0, "");
        v2.index_count = u64::MAX / 2;
        assert!(matches!(v2.index_range(), Err(FormatError::InvalidLayout(_))));

        v2.index_count = 1;
        v2.index_byte_offset = u64::MAX - 2;
        assert!(matches!(v2.index_range(), Err(FormatError::InvalidLayout(_))));

        v2.vertex_count = u64::MAX / 8;
        v2.attributes[POSITION_SLOT] = AttributeSlot {
            component_count: 3,
            byte_offset: HeaderV2::SIZE,
        };
        assert!(matches!(
            v2.attribute_range(POSITION_SLOT),
            Err(FormatError::InvalidLayout(_))
        ));
        assert_eq!(v2.attribute_range(TEXCOORD_SLOT)?, None);

        Ok(())
    }

    #[test]
    fn test_huge_minor_version() {
        let header = HeaderV1::new(Version::new(1, u64::MAX), "", IndexWidth::U32, NumericMode::Float);
        assert!(header.has_normals());
        assert_eq!(header.size(), 1112);
    }
}
