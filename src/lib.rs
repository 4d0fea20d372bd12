//! Collapses independently indexed mesh attributes into one shared vertex
//! buffer and writes the result as an IVX container.

pub mod convert;
pub mod dedup;
pub mod error;
pub mod raw;

pub use convert::{convert, pack, write_container};
pub use dedup::{deduplicate, VertexTable};
pub use error::{Error, Result};
pub use raw::{FaceVertex, RawMesh, Triangle};

pub use ivx_format as format;
