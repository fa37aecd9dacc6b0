//! Compact little-endian mesh dump
//!
//! Layout:
//!
//! ```text
//! magic     4 bytes  "TMSH"
//! version   u32
//! dim       u32      2 or 3 coordinate components per vertex
//! nvertices u64
//! nfaces    u64
//! nfields   u64
//! name      u32 length + UTF-8 bytes
//! coords    nvertices * dim f64
//! faces     nfaces * 3 u64
//! fields    nfields * (u32 length + UTF-8 name + nvertices f64), sorted by name
//! ```

use crate::error::{MeshError, Result};
use crate::io::MAX_PREALLOC;
use crate::mesh::types::{Dimensionality, Face, Point};
use crate::mesh::{MeshView, TriMesh};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// File magic
pub const MAGIC: &[u8; 4] = b"TMSH";

/// Current format version
pub const FORMAT_VERSION: u32 = 1;

/// Write a mesh dump to a file
pub fn write_binary<M: MeshView, P: AsRef<Path>>(mesh: &M, path: P) -> Result<()> {
    let path = path.as_ref();
    log::info!("Writing binary mesh '{}' to {:?}", mesh.name(), path);

    let mut writer = BufWriter::new(File::create(path)?);
    encode_mesh(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a mesh dump from a file
pub fn read_binary<P: AsRef<Path>>(path: P) -> Result<TriMesh> {
    let path = path.as_ref();
    log::info!("Reading binary mesh from {:?}", path);

    let mut reader = BufReader::new(File::open(path)?);
    decode_mesh(&mut reader)
}

/// Serialize a mesh into any writer
pub fn encode_mesh<M: MeshView, W: Write>(mesh: &M, writer: &mut W) -> Result<()> {
    let dim = mesh.dimensionality();

    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&(dim.components() as u32).to_le_bytes())?;
    writer.write_all(&(mesh.nvertices() as u64).to_le_bytes())?;
    writer.write_all(&(mesh.nfaces() as u64).to_le_bytes())?;
    writer.write_all(&(mesh.fields().len() as u64).to_le_bytes())?;
    write_string(writer, mesh.name())?;

    for p in mesh.vertices() {
        for d in 0..dim.components() {
            writer.write_all(&p[d].to_le_bytes())?;
        }
    }

    for face in mesh.faces() {
        for &v in &face.vertex_ids {
            writer.write_all(&(v as u64).to_le_bytes())?;
        }
    }

    let mut names: Vec<&String> = mesh.fields().keys().collect();
    names.sort();
    for name in names {
        write_string(writer, name)?;
        if let Some(values) = mesh.field(name) {
            for value in values {
                writer.write_all(&value.to_le_bytes())?;
            }
        }
    }

    Ok(())
}

/// Deserialize a mesh from any reader
pub fn decode_mesh<R: Read>(reader: &mut R) -> Result<TriMesh> {
    let mut magic = [0u8; 4];
    read_exact(reader, &mut magic, "magic")?;
    if &magic != MAGIC {
        return Err(MeshError::ParseError(format!(
            "Not a mesh dump (magic {:?})",
            magic
        )));
    }

    let version = read_u32(reader, "version")?;
    if version != FORMAT_VERSION {
        return Err(MeshError::ParseError(format!(
            "Unsupported mesh dump version {}",
            version
        )));
    }

    let dim = Dimensionality::from_components(read_u32(reader, "dimensionality")? as usize)
        .map_err(|e| MeshError::ParseError(e.to_string()))?;
    let nv = read_count(reader, "vertex count")?;
    let nf = read_count(reader, "face count")?;
    let nfields = read_count(reader, "field count")?;
    let name = read_string(reader, "mesh name")?;

    let mut vertices = Vec::with_capacity(nv.min(MAX_PREALLOC));
    for _ in 0..nv {
        let mut p = Point::origin();
        for d in 0..dim.components() {
            p[d] = read_f64(reader, "coordinates")?;
        }
        vertices.push(p);
    }

    let mut faces = Vec::with_capacity(nf.min(MAX_PREALLOC));
    for _ in 0..nf {
        let mut ids = [0usize; 3];
        for id in ids.iter_mut() {
            *id = read_count(reader, "faces")?;
        }
        faces.push(Face::new(ids));
    }

    let mut mesh = TriMesh::from_parts(vertices, faces, dim)?;
    mesh.set_name(name);

    for _ in 0..nfields {
        let field_name = read_string(reader, "field name")?;
        let values = (0..nv)
            .map(|_| read_f64(reader, "field values"))
            .collect::<Result<Vec<f64>>>()?;
        mesh.set_field(field_name, values)?;
    }

    Ok(mesh)
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    writer.write_all(&(s.len() as u32).to_le_bytes())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            MeshError::ParseError(format!("Truncated mesh dump while reading {}", what))
        }
        _ => MeshError::IoError(e),
    })
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, what)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, what)?;
    usize::try_from(u64::from_le_bytes(buf))
        .map_err(|_| MeshError::ParseError(format!("{} does not fit in memory", what)))
}

fn read_f64<R: Read>(reader: &mut R, what: &str) -> Result<f64> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, what)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_string<R: Read>(reader: &mut R, what: &str) -> Result<String> {
    let len = read_u32(reader, what)? as usize;
    let mut buf = Vec::with_capacity(len.min(MAX_PREALLOC));
    Read::take(&mut *reader, len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(MeshError::ParseError(format!(
            "Truncated mesh dump while reading {}",
            what
        )));
    }
    String::from_utf8(buf).map_err(|_| MeshError::ParseError(format!("{} is not valid UTF-8", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_planar() -> TriMesh {
        let mut mesh = TriMesh::from_flat(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], 2).unwrap();
        mesh.set_faces_flat(&[0, 1, 2]).unwrap();
        mesh.set_name("tri");
        mesh.set_field("phi", vec![0.5, 1.5, 2.5]).unwrap();
        mesh
    }

    #[test]
    fn test_header_layout() {
        let mut buffer = Vec::new();
        encode_mesh(&make_planar(), &mut buffer).unwrap();

        assert_eq!(&buffer[..4], b"TMSH");
        assert_eq!(u32::from_le_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]), 1);
        assert_eq!(u32::from_le_bytes([buffer[8], buffer[9], buffer[10], buffer[11]]), 2);
        // header 36 + name 7 + coords 48 + faces 24 + field 7 + 24
        assert_eq!(buffer.len(), 36 + 7 + 48 + 24 + 7 + 24);
    }

    #[test]
    fn test_encode_decode() {
        let mesh = make_planar();
        let mut buffer = Vec::new();
        encode_mesh(&mesh, &mut buffer).unwrap();

        let decoded = decode_mesh(&mut buffer.as_slice()).unwrap();

        assert_eq!(decoded.name(), "tri");
        assert_eq!(decoded.dimensionality(), Dimensionality::Planar);
        assert_eq!(decoded.vertices(), mesh.vertices());
        assert_eq!(decoded.faces(), mesh.faces());
        assert_eq!(decoded.field("phi"), Some(&[0.5, 1.5, 2.5][..]));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let result = decode_mesh(&mut &b"MESH\x01\x00\x00\x00"[..]);
        assert!(matches!(result, Err(MeshError::ParseError(_))));
    }

    #[test]
    fn test_rejects_truncated() {
        let mut buffer = Vec::new();
        encode_mesh(&make_planar(), &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 5);

        assert!(matches!(
            decode_mesh(&mut buffer.as_slice()),
            Err(MeshError::ParseError(_))
        ));
    }

    fn header(nvertices: u64, name_len: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(MAGIC);
        buffer.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buffer.extend_from_slice(&3u32.to_le_bytes());
        buffer.extend_from_slice(&nvertices.to_le_bytes());
        buffer.extend_from_slice(&0u64.to_le_bytes());
        buffer.extend_from_slice(&0u64.to_le_bytes());
        buffer.extend_from_slice(&name_len.to_le_bytes());
        buffer
    }

    #[test]
    fn test_huge_counts_fail_cleanly() {
        let buffer = header(u64::MAX / 2, 0);
        assert!(matches!(
            decode_mesh(&mut buffer.as_slice()),
            Err(MeshError::ParseError(_))
        ));

        let mut buffer = header(0, u32::MAX);
        buffer.extend_from_slice(b"abc");
        assert!(matches!(
            decode_mesh(&mut buffer.as_slice()),
            Err(MeshError::ParseError(_))
        ));
    }
}
