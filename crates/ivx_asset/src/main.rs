pub(crate) mod mesh;
pub(crate) mod utils;

use anyhow::Result;
use ivx_format::{IndexWidth, NumericMode, Version};
use log::{debug, info};
use mesh::obj::{self, ObjMeta};
use std::path::PathBuf;
use structopt::StructOpt;

// Cli arguments
#[derive(StructOpt, Debug)]
#[structopt(name = "obj2ivx")]
struct CliArgs {
    /// Wavefront OBJ file to convert
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// IVX file to write
    #[structopt(parse(from_os_str), default_value = "output.ivx")]
    output: PathBuf,
    /// Container version, e.g. `1.1` or `2.0`; overrides the meta file
    #[structopt(long = "format-version")]
    format_version: Option<Version>,
    /// Write 16 bit indices (1.x only)
    #[structopt(long = "short-indices")]
    short_indices: bool,
    /// Write fixed point integers instead of floats (1.x only)
    #[structopt(long = "readable")]
    readable: bool,
    /// Output debug info
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

impl CliArgs {
    /// Command line flags win over the meta file.
    fn apply_overrides(&self, meta: &mut ObjMeta) {
        if let Some(version) = self.format_version {
            meta.format.version = version;
        }
        if self.short_indices {
            meta.format.index_width = IndexWidth::U16;
        }
        if self.readable {
            meta.format.numeric_mode = NumericMode::FixedPoint;
        }
    }
}

fn main() -> Result<()> {
    let args = CliArgs::from_args();

    let mut logger = if !args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    } else {
        let mut builder = env_logger::Builder::new();
        builder.filter(None, log::LevelFilter::Debug);
        builder
    };
    logger
        .target(env_logger::Target::Stdout)
        .format_timestamp(None)
        .init();

    prepare(args)
}

fn prepare(args: CliArgs) -> Result<()> {
    let mut meta = obj::parse_meta(&args.input)?;
    args.apply_overrides(&mut meta);
    debug!("Converting with {:?}", meta);

    info!(
        "Wavefront OBJ to IVX file converter, writing v{}",
        meta.format.version
    );
    obj::process(&args.input, &args.output, &meta)?;

    Ok(())
}
