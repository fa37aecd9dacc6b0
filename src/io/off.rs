//! Object File Format (OFF) reader and writer
//!
//! Only triangle faces are accepted. Planar meshes are written with `z = 0`.

use crate::error::{MeshError, Result};
use crate::io::MAX_PREALLOC;
use crate::mesh::types::{Dimensionality, Face, Point};
use crate::mesh::{MeshView, TriMesh};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Read an OFF file
///
/// With `dim = None` the mesh is planar when every z coordinate is 0 and a
/// surface otherwise.
pub fn read_off<P: AsRef<Path>>(path: P, dim: Option<Dimensionality>) -> Result<TriMesh> {
    let path = path.as_ref();
    log::info!("Reading OFF mesh from {:?}", path);

    let file = File::open(path)?;
    let mut mesh = parse_off(BufReader::new(file), dim)?;

    if let Some(stem) = path.file_stem() {
        mesh.set_name(stem.to_string_lossy());
    }

    log::info!(
        "Read {} vertices and {} faces",
        mesh.nvertices(),
        mesh.nfaces()
    );
    Ok(mesh)
}

/// Parse OFF text from any reader
pub fn parse_off<R: Read>(reader: R, dim: Option<Dimensionality>) -> Result<TriMesh> {
    let mut tokens = Tokens::new(BufReader::new(reader))?;

    let header = tokens.next_token("header")?;
    if header != "OFF" {
        return Err(MeshError::ParseError(format!(
            "Expected 'OFF' header, found '{}'",
            header
        )));
    }

    let nv: usize = tokens.parse("vertex count")?;
    let nf: usize = tokens.parse("face count")?;
    let _ne: usize = tokens.parse("edge count")?;

    let mut vertices = Vec::with_capacity(nv.min(MAX_PREALLOC));
    for _ in 0..nv {
        let x: f64 = tokens.parse("vertex coordinate")?;
        let y: f64 = tokens.parse("vertex coordinate")?;
        let z: f64 = tokens.parse("vertex coordinate")?;
        vertices.push(Point::new(x, y, z));
    }

    let mut faces = Vec::with_capacity(nf.min(MAX_PREALLOC));
    for i in 0..nf {
        let count: usize = tokens.parse("face size")?;
        if count != 3 {
            return Err(MeshError::ParseError(format!(
                "Face {} has {} vertices; only triangles are supported",
                i, count
            )));
        }
        let a: usize = tokens.parse("face index")?;
        let b: usize = tokens.parse("face index")?;
        let c: usize = tokens.parse("face index")?;
        faces.push(Face::new([a, b, c]));
    }

    let dim = dim.unwrap_or_else(|| {
        if vertices.iter().all(|p| p.z == 0.0) {
            Dimensionality::Planar
        } else {
            Dimensionality::Surface
        }
    });

    TriMesh::from_parts(vertices, faces, dim)
}

/// Write a mesh as OFF text
pub fn write_off<M: MeshView, P: AsRef<Path>>(mesh: &M, path: P) -> Result<()> {
    let path = path.as_ref();
    log::info!(
        "Writing mesh '{}' with {} faces to {:?}",
        mesh.name(),
        mesh.nfaces(),
        path
    );

    let mut writer = BufWriter::new(File::create(path)?);
    format_off(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Format a mesh as OFF text into any writer
pub fn format_off<M: MeshView, W: Write>(mesh: &M, writer: &mut W) -> Result<()> {
    writeln!(writer, "OFF")?;
    writeln!(writer, "{} {} 0", mesh.nvertices(), mesh.nfaces())?;

    for p in mesh.vertices() {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    for face in mesh.faces() {
        let [a, b, c] = face.vertex_ids;
        writeln!(writer, "3 {} {} {}", a, b, c)?;
    }

    Ok(())
}

/// Whitespace tokenizer that skips `#` comments
struct Tokens {
    tokens: std::vec::IntoIter<String>,
}

impl Tokens {
    fn new<R: BufRead>(reader: R) -> Result<Self> {
        let mut tokens = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let content = line.split('#').next().unwrap_or("");
            tokens.extend(content.split_whitespace().map(str::to_string));
        }
        Ok(Self {
            tokens: tokens.into_iter(),
        })
    }

    fn next_token(&mut self, what: &str) -> Result<String> {
        self.tokens
            .next()
            .ok_or_else(|| MeshError::ParseError(format!("Unexpected end of file reading {}", what)))
    }

    fn parse<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.next_token(what)?;
        token
            .parse()
            .map_err(|_| MeshError::ParseError(format!("Invalid {} '{}'", what, token)))
    }
}
