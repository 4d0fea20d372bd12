use std::fs;
use std::io::{self, BufRead};
use std::{
    num,
    path::{Path, PathBuf},
};

use ivx::{FaceVertex, Triangle};
use log::{debug, error, warn};

use super::builder::*;

#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("Failed to open OBJ file: {}", path.display())]
    SourceOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse float.")]
    ParseFloat(#[from] num::ParseFloatError),
    #[error("Failed to read model.")]
    Io(#[from] io::Error),
    #[error("Expected {expected} numbers, found \"{value}\"")]
    MissingComponents { expected: usize, value: String },
    #[error("Face \"{face}\" on line {line} is not a triangle of v/t/n or v/t indices, try exporting with different options")]
    MalformedFace { line: usize, face: String },
}

// parses the subset of wavefront obj (https://en.wikipedia.org/wiki/Wavefront_.obj_file)
// needed for triangle meshes; unsupported statements are logged and skipped
pub(crate) fn parse(filepath: &Path, flip_v: bool) -> Result<ObjMeshBuilder, ParserError> {
    let mut builder = ObjMeshBuilder::new(flip_v);

    let lines = read_lines(filepath).map_err(|source| ParserError::SourceOpenFailed {
        path: filepath.to_owned(),
        source,
    })?;
    debug!("Loading mesh: {}", filepath.display());

    for (number, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (token, value) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        parse_token(token, value.trim(), number + 1, &mut builder).map_err(|err| {
            error!("Could not parse line {}: \"{}\"", number + 1, line);
            err
        })?;
    }

    Ok(builder)
}

// `line` is 1-based and only used for error reporting
fn parse_token(
    token: &str,
    value: &str,
    line: usize,
    builder: &mut ObjMeshBuilder,
) -> Result<(), ParserError> {
    match token {
        // comment
        t if t.starts_with('#') => debug!("Comment: {:?}", value),
        // name
        "o" => builder.set_name(value),
        // vertex
        "v" => builder.push_vertex(parse_numbers(value)?),
        // texture coordinates
        "vt" => builder.push_uv(parse_numbers(value)?),
        // vertex normals
        "vn" => builder.push_normal(parse_numbers(value)?),
        "f" => builder.push_face(parse_face(value, line)?),
        // group (submesh)
        "g" => debug!("Groups are merged into one mesh. Ignoring \"{}\".", value),
        "mtllib" | "usemtl" => debug!("Materials not supported. Ignoring."),
        // smoothing groups
        "s" => debug!("Smoothing groups not supported. Ignoring."),
        // parameter space vertices
        "vp" => warn!("Parameter space vertices not supported. Ignoring."),
        _ => warn!("Found unsupported token: \"{}\"", token),
    };

    Ok(())
}

// parses the first N numbers seperated by whitespace, any further ones
// (w components, vertex colors) are dropped
fn parse_numbers<const N: usize>(value: &str) -> Result<[f32; N], ParserError> {
    let mut numbers = [0.0; N];
    let mut found = value.split_whitespace();

    for number in numbers.iter_mut() {
        *number = found
            .next()
            .ok_or_else(|| ParserError::MissingComponents {
                expected: N,
                value: value.to_owned(),
            })?
            .parse()?;
    }

    Ok(numbers)
}

// parses exactly three face indexes seperated by whitespace
fn parse_face(value: &str, line: usize) -> Result<Triangle, ParserError> {
    let malformed = || ParserError::MalformedFace {
        line,
        face: value.to_owned(),
    };

    let corners = value
        .split_whitespace()
        .map(parse_face_index)
        .collect::<Option<Vec<FaceVertex>>>()
        .ok_or_else(malformed)?;

    match *corners.as_slice() {
        [a, b, c] => Ok(Triangle([a, b, c])),
        _ => Err(malformed()),
    }
}

// parses a single face index, the texture coordinate is required, the normal
// is optional
fn parse_face_index(value: &str) -> Option<FaceVertex> {
    let triplet = parse_triplet(value).ok()?;
    if value.split('/').count() > 3 {
        return None;
    }

    Some(FaceVertex {
        position: triplet[0]?,
        texcoord: triplet[1]?,
        normal: triplet[2],
    })
}

// parse a triplet seperated by slashes
fn parse_triplet(value: &str) -> Result<Vec<Option<usize>>, num::ParseIntError> {
    let mut ret = vec![None; 3];

    for (a, b) in ret.iter_mut().zip(value.split('/')) {
        *a = if b.is_empty() { None } else { Some(b.parse()?) }
    }

    Ok(ret)
}

// The output is wrapped in a Result to allow matching on errors
// Returns an Iterator to the Reader of the lines of the file.
fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<fs::File>>>
where
    P: AsRef<Path>,
{
    let file = fs::File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}
