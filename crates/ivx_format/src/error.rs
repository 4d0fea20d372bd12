use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, FormatError>;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unsupported container version {major}.{minor}")]
    UnsupportedVersion { major: u64, minor: u64 },
    #[error("Invalid version string: \"{0}\"")]
    InvalidVersion(String),
    #[error("IVX stores 32 bit floats unless fixed point mode is selected, but f32 is {0} bytes wide on this platform")]
    UnsupportedFloatWidth(usize),
    #[error("{vertex_count} vertices can not be addressed with 16 bit indices")]
    IndexOverflow { vertex_count: usize },
    #[error("Invalid container layout: {0}")]
    InvalidLayout(String),
}
