use crate::error::{FormatError, Result};
use serde::Deserialize;
use std::{fmt, mem, str::FromStr};

/// Container version as written into the first two header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
}

impl Version {
    pub const V1_0: Version = Version::new(1, 0);
    pub const V1_1: Version = Version::new(1, 1);
    pub const V2_0: Version = Version::new(2, 0);

    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// `major * 100 + minor`, the number feature gates are compared against.
    /// Saturates for versions read from untrusted input.
    pub fn combined(self) -> u64 {
        self.major.saturating_mul(100).saturating_add(self.minor)
    }

    /// Minor versions from 100 on would collide with the next major version
    /// in [`Version::combined`] and are rejected.
    pub fn layout(self) -> Result<Layout> {
        match self.major {
            _ if self.minor >= 100 => Err(FormatError::UnsupportedVersion {
                major: self.major,
                minor: self.minor,
            }),
            1 => Ok(Layout::Fixed),
            2 => Ok(Layout::AttributeTable),
            _ => Err(FormatError::UnsupportedVersion {
                major: self.major,
                minor: self.minor,
            }),
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// accepts "2" as well as "2.0"
impl FromStr for Version {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FormatError::InvalidVersion(s.to_owned());
        let (major, minor) = match s.trim().split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s.trim(), "0"),
        };

        Ok(Version {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// On-disk layout family selected by the major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 1.x: header followed by sections in a fixed order
    Fixed,
    /// 2.x: header with an offset table of up to eight attributes
    AttributeTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    pub fn bytes(self) -> u64 {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

impl Default for IndexWidth {
    fn default() -> Self {
        IndexWidth::U32
    }
}

/// How vertex attribute components are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericMode {
    /// IEEE-754 single precision
    Float,
    /// 64 bit integers at a resolution of 1e-6, see [`crate::encode::to_fixed_point`]
    FixedPoint,
}

impl NumericMode {
    pub fn component_bytes(self) -> u64 {
        match self {
            NumericMode::Float => mem::size_of::<f32>() as u64,
            NumericMode::FixedPoint => mem::size_of::<u64>() as u64,
        }
    }
}

impl Default for NumericMode {
    fn default() -> Self {
        NumericMode::Float
    }
}

/// Everything the encoder needs to know besides the mesh and its name.
///
/// The index width and numeric mode only apply to the fixed layout; the
/// attribute table always stores 32 bit indices and floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub version: Version,
    pub index_width: IndexWidth,
    pub numeric_mode: NumericMode,
}

impl FormatConfig {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    pub fn with_index_width(self, index_width: IndexWidth) -> Self {
        Self {
            index_width,
            ..self
        }
    }

    pub fn with_numeric_mode(self, numeric_mode: NumericMode) -> Self {
        Self {
            numeric_mode,
            ..self
        }
    }

    pub fn layout(&self) -> Result<Layout> {
        self.version.layout()
    }

    /// Whether the fixed header carries a normal section (1.1 and later).
    pub fn has_normals(&self) -> bool {
        self.version.major == 1 && self.version.combined() >= 101
    }

    /// Whether normals take part in vertex deduplication.
    ///
    /// This holds for the whole 1.x family, even for 1.0 which does not
    /// write them.
    pub fn packs_normals(&self) -> bool {
        self.version.major == 1
    }

    /// Whether ingestion stores texture coordinates as `1 - v`.
    pub fn flips_texcoord_v(&self) -> bool {
        self.version.major == 1
    }

    pub fn effective_index_width(&self) -> IndexWidth {
        match self.version.major {
            1 => self.index_width,
            _ => IndexWidth::U32,
        }
    }

    pub fn effective_numeric_mode(&self) -> NumericMode {
        match self.version.major {
            1 => self.numeric_mode,
            _ => NumericMode::Float,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.layout()?;

        let float_width = mem::size_of::<f32>();
        if self.effective_numeric_mode() == NumericMode::Float && float_width != 4 {
            return Err(FormatError::UnsupportedFloatWidth(float_width));
        }

        Ok(())
    }
}
