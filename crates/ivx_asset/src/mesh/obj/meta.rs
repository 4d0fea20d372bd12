use anyhow::Result;
use ivx_format::FormatConfig;
use serde::Deserialize;
use std::path::Path;

/// Per-file conversion settings, read from `<file>.toml` or `obj.toml`.
///
/// ```toml
/// name = "crate"
///
/// [format]
/// version = "1.1"
/// index_width = "u16"
/// numeric_mode = "fixed_point"
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct ObjMeta {
    /// replaces the name given by the `o` statement
    pub(crate) name: Option<String>,
    pub(crate) format: FormatConfig,
}

impl ObjMeta {
    pub(crate) fn parse(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let meta: Self = toml::from_str(&data)?;
        Ok(meta)
    }
}
