use ivx_format::FormatError;
use std::{io, path::PathBuf};

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Face {face} references {attribute} {index}, but only {len} are defined")]
    IndexOutOfRange {
        face: usize,
        attribute: &'static str,
        index: usize,
        len: usize,
    },
    #[error("Face {face} has no normal index, but normals are part of this container version")]
    MissingNormal { face: usize },
    #[error("Failed to open IVX file: {}", path.display())]
    SinkOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write IVX file: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
}
