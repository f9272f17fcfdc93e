//! STL decoding.
//!
//! Bytes are classified with [`detect_bytes`] and then parsed by the binary
//! or ASCII reader. Binary parsing is exact: every facet must be a complete
//! 50-byte record. ASCII parsing is lenient per field: a normal or vertex
//! whose numbers do not parse becomes `(0, 0, 0)` and the recovery is
//! reported as a [`DecodeWarning`]. With [`DecodeOptions::strict`] the first
//! such recovery is an error instead.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::detect::{
    detect_bytes, preamble_facet_count, StlFormat, FACET_LEN, HEADER_LEN, PREAMBLE_LEN,
};
use crate::error::{Result, StlError};
use crate::mesh::{Facet, Mesh, Vec3};

/// Options controlling how tolerant decoding is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Fail on the first recovered ASCII field or short facet.
    pub strict: bool,
}

impl DecodeOptions {
    /// Lenient decoding (the default).
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Strict decoding.
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Which part of a facet a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
    /// The `facet normal` line.
    Normal,
    /// The n-th `vertex` line (0-based).
    Vertex(usize),
}

impl fmt::Display for FacetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetField::Normal => write!(f, "normal"),
            FacetField::Vertex(k) => write!(f, "vertex {k}"),
        }
    }
}

/// A recoverable problem found while decoding ASCII STL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A field did not hold three parseable numbers and was set to zero.
    DefaultedField {
        /// Facet index (0-based).
        facet: usize,
        /// Source line number (1-based).
        line: usize,
        /// The field that was defaulted.
        field: FacetField,
    },
    /// A facet loop ended before three `vertex` lines were seen.
    ///
    /// The missing vertices are filled with the origin.
    ShortFacet {
        /// Facet index (0-based).
        facet: usize,
        /// Source line number of the `facet normal` line (1-based).
        line: usize,
        /// Number of vertices actually present.
        vertices: usize,
    },
}

impl DecodeWarning {
    /// Source line the warning points at.
    pub fn line(&self) -> usize {
        match self {
            DecodeWarning::DefaultedField { line, .. }
            | DecodeWarning::ShortFacet { line, .. } => *line,
        }
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::DefaultedField { facet, line, field } => {
                write!(f, "facet {facet}: unparseable {field} on line {line}, using 0 0 0")
            }
            DecodeWarning::ShortFacet {
                facet,
                line,
                vertices,
            } => write!(
                f,
                "facet {facet} (line {line}) has {vertices} of 3 vertices, padding with origin"
            ),
        }
    }
}

/// Result of decoding one STL source.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// The decoded mesh.
    pub mesh: Mesh,
    /// The detected (or requested) source format.
    pub format: StlFormat,
    /// Name from the first `solid` line of an ASCII source.
    pub solid_name: Option<String>,
    /// Per-field recoveries made while decoding (ASCII only).
    pub warnings: Vec<DecodeWarning>,
}

impl Decoded {
    fn binary(mesh: Mesh) -> Self {
        Self {
            mesh,
            format: StlFormat::Binary,
            solid_name: None,
            warnings: Vec::new(),
        }
    }
}

/// Decode an in-memory STL file, detecting its format.
pub fn decode(bytes: &[u8]) -> Result<Decoded> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decode an in-memory STL file with explicit options.
pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    decode_as(bytes, detect_bytes(bytes), options)
}

/// Decode an in-memory STL file as the given format.
pub fn decode_as(bytes: &[u8], format: StlFormat, options: &DecodeOptions) -> Result<Decoded> {
    match format {
        StlFormat::Binary => decode_binary(bytes).map(Decoded::binary),
        StlFormat::Ascii => decode_ascii(bytes, options),
    }
}

/// Read and decode an STL file from disk.
///
/// # Example
///
/// ```no_run
/// use rescale_stl::read_stl;
///
/// let decoded = read_stl("model.stl").unwrap();
/// println!("{} facets ({})", decoded.mesh.len(), decoded.format);
/// ```
pub fn read_stl(path: impl AsRef<Path>) -> Result<Decoded> {
    read_stl_with(path, &DecodeOptions::default())
}

/// Read and decode an STL file from disk with explicit options.
pub fn read_stl_with(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Decoded> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StlError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            StlError::Decode(e)
        }
    })?;
    debug!(path = %path.display(), len = bytes.len(), "read STL source");
    decode_with(&bytes, options)
}

/// Read a whole stream and decode it.
pub fn read_from<R: Read>(mut reader: R, options: &DecodeOptions) -> Result<Decoded> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(StlError::Decode)?;
    decode_with(&bytes, options)
}

// =============================================================================
// Binary
// =============================================================================

/// Decode binary STL.
///
/// Reads exactly the number of facets named in the preamble. Bytes after
/// the last facet are ignored.
pub fn decode_binary(bytes: &[u8]) -> Result<Mesh> {
    let count =
        preamble_facet_count(bytes).ok_or(StlError::TruncatedHeader { len: bytes.len() })?;
    let header = decode_header(&bytes[..HEADER_LEN]);
    let body = &bytes[PREAMBLE_LEN..];

    let mut facets = Vec::with_capacity((count as usize).min(body.len() / FACET_LEN));
    let mut offset = 0usize;
    for index in 0..count {
        let record = body
            .get(offset..offset + FACET_LEN)
            .ok_or(StlError::TruncatedFacet {
                index,
                remaining: body.len() - offset,
            })?;
        facets.push(read_facet(record));
        offset += FACET_LEN;
    }

    debug!(count, header = %header, "decoded binary STL");
    Ok(Mesh {
        header: Some(header),
        facets,
    })
}

/// Header bytes as text, invalid sequences replaced, trailing padding removed.
fn decode_header(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

/// Read one 50-byte record: normal, three vertices, then 2 ignored bytes.
fn read_facet(record: &[u8]) -> Facet {
    let mut values = [0f32; 12];
    for (value, chunk) in values.iter_mut().zip(record[..48].chunks_exact(4)) {
        *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let vec = |i: usize| Vec3::new(values[i], values[i + 1], values[i + 2]);
    Facet::new(vec(0), [vec(3), vec(6), vec(9)])
}

// =============================================================================
// ASCII
// =============================================================================

/// Decode ASCII STL.
///
/// Only `facet normal` lines start a facet; `solid`, `endsolid`, comments
/// and any other lines between facets are skipped. The result has no header.
pub fn decode_ascii(bytes: &[u8], options: &DecodeOptions) -> Result<Decoded> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let mut parser = AsciiParser {
        lines: &lines,
        pos: 0,
        strict: options.strict,
        warnings: Vec::new(),
    };
    let solid_name = parser.solid_name();
    let facets = parser.facets()?;

    debug!(
        facets = facets.len(),
        warnings = parser.warnings.len(),
        "decoded ASCII STL"
    );
    Ok(Decoded {
        mesh: Mesh::from_facets(facets),
        format: StlFormat::Ascii,
        solid_name,
        warnings: parser.warnings,
    })
}

struct AsciiParser<'a> {
    lines: &'a [(usize, &'a str)],
    pos: usize,
    strict: bool,
    warnings: Vec<DecodeWarning>,
}

impl<'a> AsciiParser<'a> {
    fn peek(&self) -> Option<(usize, &'a str)> {
        self.lines.get(self.pos).copied()
    }

    fn solid_name(&self) -> Option<String> {
        self.lines.iter().find_map(|&(_, line)| {
            if !starts_with_keyword(line, "solid") {
                return None;
            }
            let rest = &line["solid".len()..];
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let name = rest.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
    }

    fn facets(&mut self) -> Result<Vec<Facet>> {
        let mut facets = Vec::new();
        while let Some((line_no, line)) = self.peek() {
            if starts_with_keyword(line, "facet normal") {
                let facet = self.facet(facets.len(), line_no, line)?;
                facets.push(facet);
            } else {
                self.pos += 1;
            }
        }
        Ok(facets)
    }

    /// Parse one facet starting at its `facet normal` line.
    fn facet(&mut self, index: usize, line_no: usize, line: &'a str) -> Result<Facet> {
        let normal = self.triple(index, line_no, line, FacetField::Normal)?;
        self.pos += 1;

        if matches!(self.peek(), Some((_, l)) if l.eq_ignore_ascii_case("outer loop")) {
            self.pos += 1;
        }

        let mut vertices = [Vec3::zeros(); 3];
        let mut found = 0;
        while found < 3 {
            match self.peek() {
                Some((n, l)) if starts_with_keyword(l, "vertex") => {
                    vertices[found] = self.triple(index, n, l, FacetField::Vertex(found))?;
                    found += 1;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if found < 3 {
            self.flag(DecodeWarning::ShortFacet {
                facet: index,
                line: line_no,
                vertices: found,
            })?;
        }

        // Everything up to `endfacet` belongs to this facet, including a
        // following `facet normal` when `endfacet` is missing.
        while matches!(self.peek(), Some((_, l)) if !starts_with_keyword(l, "endfacet")) {
            self.pos += 1;
        }

        Ok(Facet::new(normal, vertices))
    }

    /// The last three tokens of a line as a vector, or zero with a warning.
    fn triple(
        &mut self,
        facet: usize,
        line_no: usize,
        line: &str,
        field: FacetField,
    ) -> Result<Vec3> {
        match parse_last_three(line) {
            Some(v) => Ok(v),
            None => {
                self.flag(DecodeWarning::DefaultedField {
                    facet,
                    line: line_no,
                    field,
                })?;
                Ok(Vec3::zeros())
            }
        }
    }

    fn flag(&mut self, warning: DecodeWarning) -> Result<()> {
        if self.strict {
            return Err(StlError::malformed(warning.line(), warning.to_string()));
        }
        warn!("{warning}");
        self.warnings.push(warning);
        Ok(())
    }
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.as_bytes()
        .get(..keyword.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword.as_bytes()))
}

fn parse_last_three(line: &str) -> Option<Vec3> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [x, y, z] = tokens.get(tokens.len().checked_sub(3)?..)? else {
        return None;
    };
    Some(Vec3::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?))
}
