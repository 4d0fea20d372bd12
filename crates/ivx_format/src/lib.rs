//! Binary layouts of the IVX mesh container.
//!
//! Two incompatible layouts exist: the fixed layout of the 1.x family, where
//! sections follow the header in an implicit order, and the attribute table
//! of the 2.x family, where every section is located through recorded byte
//! offsets. Both share the `version_major`, `version_minor` prefix.

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod header;
pub mod mesh;

pub use config::{FormatConfig, IndexWidth, Layout, NumericMode, Version};
pub use decode::Container;
pub use encode::{encode, encode_to_vec};
pub use error::{FormatError, Result};
pub use header::ContainerDescriptor;
pub use mesh::{CompactMesh, PackedVertex};
