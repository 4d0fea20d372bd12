use crate::{
    dedup,
    error::{Error, Result},
    raw::RawMesh,
};
use ivx_format::{encode, CompactMesh, ContainerDescriptor, FormatConfig};
use log::{debug, info};
use std::{
    ffi::OsString,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

/// Deduplicates `raw` with the normal policy of the configured version.
pub fn pack(raw: &RawMesh, config: &FormatConfig) -> Result<CompactMesh> {
    config.validate()?;

    let mesh = dedup::deduplicate(raw, config.packs_normals())?;
    info!(
        "Indexed {} triangles: {} unique vertices, {} indices",
        mesh.triangle_count(),
        mesh.vertices.len(),
        mesh.indices.len()
    );

    Ok(mesh)
}

/// Writes `mesh` to `path`.
///
/// The container is written to a temporary file next to `path` that replaces
/// `path` only once it is complete. On failure the temporary file is removed
/// and `path` is left untouched.
pub fn write_container(
    path: &Path,
    mesh: &CompactMesh,
    name: &str,
    config: &FormatConfig,
) -> Result<ContainerDescriptor> {
    let temp = temp_path(path);
    debug!("Writing to temporary file {}", temp.display());

    let file = File::create(&temp).map_err(|source| Error::SinkOpenFailed {
        path: temp.clone(),
        source,
    })?;

    let result = write_and_persist(file, &temp, path, mesh, name, config);
    if result.is_err() {
        if let Err(err) = fs::remove_file(&temp) {
            debug!("Could not remove {}: {}", temp.display(), err);
        }
    }
    result
}

/// [`pack`] followed by [`write_container`].
pub fn convert(
    raw: &RawMesh,
    name: &str,
    config: &FormatConfig,
    path: &Path,
) -> Result<ContainerDescriptor> {
    let mesh = pack(raw, config)?;
    write_container(path, &mesh, name, config)
}

fn write_and_persist(
    file: File,
    temp: &Path,
    target: &Path,
    mesh: &CompactMesh,
    name: &str,
    config: &FormatConfig,
) -> Result<ContainerDescriptor> {
    let mut writer = BufWriter::new(file);
    let descriptor = encode(mesh, name, config, &mut writer)?;

    let file = writer.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp, target)?;
    Ok(descriptor)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output.ivx"));
    file_name.push(".tmp");
    path.with_file_name(file_name)
}
