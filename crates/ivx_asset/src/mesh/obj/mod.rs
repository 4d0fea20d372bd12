mod builder;
mod meta;
mod parser;

use anyhow::{Context, Result};
use ivx_format::{ContainerDescriptor, FormatConfig};
use log::info;
use std::path::Path;

use crate::utils;

use self::builder::ObjMesh;
pub(crate) use self::meta::ObjMeta;

fn parse(path: &Path, config: &FormatConfig) -> Result<ObjMesh> {
    Ok(parser::parse(path, config.flips_texcoord_v())?.build_mesh())
}

/// Parse meta from file called `file.toml` or alternativley from folder scoped meta file named `obj.toml` or else use default meta
pub(crate) fn parse_meta(path: &Path) -> Result<ObjMeta> {
    let dir = path
        .parent()
        .with_context(|| format!("Path terminates in root or prefix: {}", path.display()))?;
    let meta_file = utils::file_name(path)?;

    let candidates = [
        utils::combine_path(dir, meta_file, "toml"),
        utils::combine_path(dir, "obj", "toml"),
    ];
    for candidate in candidates.iter() {
        if candidate.is_file() {
            info!("Using meta file {}", candidate.display());
            return ObjMeta::parse(candidate)
                .with_context(|| format!("Invalid meta file: {}", candidate.display()));
        }
    }

    Ok(ObjMeta::default())
}

/// The meta name wins over the `o` statement, which wins over the file name.
fn mesh_name(path: &Path, meta: &ObjMeta, mesh: &ObjMesh) -> Result<String> {
    match meta.name.as_ref().or_else(|| mesh.name.as_ref()) {
        Some(name) => Ok(name.clone()),
        None => Ok(utils::file_name(path)?.to_owned()),
    }
}

pub(crate) fn process(input: &Path, output: &Path, meta: &ObjMeta) -> Result<ContainerDescriptor> {
    info!("Opening OBJ file ({}) ...", input.display());
    let mesh = parse(input, &meta.format)?;
    let name = mesh_name(input, meta, &mesh)?;

    info!("Opened OBJ file, indexing ...");
    let packed = ivx::pack(&mesh.raw, &meta.format)
        .with_context(|| format!("Could not index {}", input.display()))?;

    info!("OBJ file indexed, writing to IVX file ({}) ...", output.display());
    let descriptor = ivx::write_container(output, &packed, &name, &meta.format)?;

    info!("Finished converting successfully");
    Ok(descriptor)
}
