//! STL encoding.
//!
//! Binary output is the fixed 84-byte preamble followed by one 50-byte
//! record per facet. ASCII output follows the canonical
//! `solid`/`facet normal`/`outer loop`/`vertex` grammar with every number in
//! scientific notation at a fixed precision.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::detect::{StlFormat, FACET_LEN, HEADER_LEN, PREAMBLE_LEN};
use crate::error::{Result, StlError};
use crate::mesh::{Mesh, Vec3};

/// Solid name used when neither the options nor the mesh supply one.
pub const DEFAULT_SOLID_NAME: &str = "mesh";

/// Options for ASCII output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiOptions {
    /// Name written after `solid` and `endsolid`.
    ///
    /// Falls back to the mesh header, then to [`DEFAULT_SOLID_NAME`].
    pub solid_name: Option<String>,
    /// Digits after the decimal point.
    pub precision: usize,
}

impl Default for AsciiOptions {
    fn default() -> Self {
        Self {
            solid_name: None,
            precision: 6,
        }
    }
}

impl AsciiOptions {
    fn resolve_name(&self, mesh: &Mesh) -> String {
        let name = self
            .solid_name
            .as_deref()
            .or(mesh.header.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SOLID_NAME);
        name.chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect()
    }
}

/// Encode a mesh to bytes, binary or ASCII.
pub fn encode(mesh: &Mesh, binary: bool) -> Result<Vec<u8>> {
    if binary {
        encode_binary(mesh)
    } else {
        encode_ascii(mesh, &AsciiOptions::default())
    }
}

/// Encode a mesh as binary STL bytes.
pub fn encode_binary(mesh: &Mesh) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(PREAMBLE_LEN + mesh.len() * FACET_LEN);
    write_binary(mesh, &mut data)?;
    Ok(data)
}

/// Encode a mesh as ASCII STL bytes.
pub fn encode_ascii(mesh: &Mesh, options: &AsciiOptions) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    write_ascii(mesh, &mut data, options)?;
    Ok(data)
}

/// Write binary STL to a byte sink.
///
/// The facet count is checked before anything is written.
pub fn write_binary<W: Write>(mesh: &Mesh, mut writer: W) -> Result<()> {
    let count = mesh.binary_facet_count()?;

    writer
        .write_all(&header_bytes(mesh.header.as_deref()))
        .map_err(StlError::Encode)?;
    writer
        .write_all(&count.to_le_bytes())
        .map_err(StlError::Encode)?;

    let mut record = [0u8; FACET_LEN];
    for facet in &mesh.facets {
        let vectors = [
            facet.normal,
            facet.vertices[0],
            facet.vertices[1],
            facet.vertices[2],
        ];
        let values = vectors.iter().flat_map(|v| [v.x, v.y, v.z]);
        for (slot, value) in record.chunks_exact_mut(4).zip(values) {
            slot.copy_from_slice(&value.to_le_bytes());
        }
        // Attribute byte count
        record[48..].fill(0);
        writer.write_all(&record).map_err(StlError::Encode)?;
    }
    writer.flush().map_err(StlError::Encode)
}

/// The 80 header bytes for a mesh header.
///
/// Text is cut at the last character boundary that fits and padded with
/// spaces. No header gives 80 zero bytes.
fn header_bytes(header: Option<&str>) -> [u8; HEADER_LEN] {
    let Some(text) = header else {
        return [0u8; HEADER_LEN];
    };
    let mut end = text.len().min(HEADER_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut bytes = [b' '; HEADER_LEN];
    bytes[..end].copy_from_slice(&text.as_bytes()[..end]);
    bytes
}

/// Write ASCII STL to a byte sink.
pub fn write_ascii<W: Write>(mesh: &Mesh, writer: W, options: &AsciiOptions) -> Result<()> {
    write_ascii_inner(mesh, writer, options).map_err(StlError::Encode)
}

fn write_ascii_inner<W: Write>(
    mesh: &Mesh,
    mut w: W,
    options: &AsciiOptions,
) -> std::io::Result<()> {
    let name = options.resolve_name(mesh);
    let p = options.precision;
    let fmt = |v: &Vec3| format!("{:.p$e} {:.p$e} {:.p$e}", v.x, v.y, v.z);

    writeln!(w, "solid {name}")?;
    for facet in &mesh.facets {
        writeln!(w, "  facet normal {}", fmt(&facet.normal))?;
        writeln!(w, "    outer loop")?;
        for vertex in &facet.vertices {
            writeln!(w, "      vertex {}", fmt(vertex))?;
        }
        writeln!(w, "    endloop")?;
        writeln!(w, "  endfacet")?;
    }
    writeln!(w, "endsolid {name}")?;
    w.flush()
}

/// Write a mesh to a `.stl` file, binary or ASCII.
///
/// # Example
///
/// ```no_run
/// use rescale_stl::{read_stl, write_stl};
///
/// let decoded = read_stl("part.stl").unwrap();
/// write_stl(&decoded.mesh, "part-copy.stl", true).unwrap();
/// ```
pub fn write_stl(mesh: &Mesh, path: impl AsRef<Path>, binary: bool) -> Result<()> {
    let format = if binary {
        StlFormat::Binary
    } else {
        StlFormat::Ascii
    };
    write_stl_with(mesh, path, format, &AsciiOptions::default())
}

/// Write a mesh to a `.stl` file with explicit format and ASCII options.
///
/// The extension is checked before the file is created.
pub fn write_stl_with(
    mesh: &Mesh,
    path: impl AsRef<Path>,
    format: StlFormat,
    options: &AsciiOptions,
) -> Result<()> {
    let path = path.as_ref();
    check_target(path)?;
    if format == StlFormat::Binary {
        mesh.validate()?;
    }

    let file = File::create(path).map_err(StlError::Encode)?;
    let writer = BufWriter::new(file);
    match format {
        StlFormat::Binary => write_binary(mesh, writer)?,
        StlFormat::Ascii => write_ascii(mesh, writer, options)?,
    }
    debug!(path = %path.display(), facets = mesh.len(), %format, "wrote STL");
    Ok(())
}

/// Check that an output path ends in `.stl` (any case).
pub fn check_target(path: &Path) -> Result<()> {
    let is_stl = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("stl"));
    if is_stl {
        Ok(())
    } else {
        Err(StlError::InvalidTarget {
            path: path.to_path_buf(),
        })
    }
}
