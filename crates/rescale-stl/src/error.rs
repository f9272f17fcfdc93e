//! Error types for STL decoding, encoding and scaling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, transforming or writing an STL mesh.
#[derive(Error, Debug)]
pub enum StlError {
    /// The source path does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Fewer than 84 bytes were handed to the binary decoder.
    #[error("binary STL needs at least 84 bytes of header, got {len}")]
    TruncatedHeader {
        /// Number of bytes available.
        len: usize,
    },

    /// A binary facet record is shorter than 50 bytes.
    #[error("facet {index} is truncated: expected 50 bytes, {remaining} remain")]
    TruncatedFacet {
        /// Zero-based index of the first incomplete facet.
        index: u32,
        /// Bytes left in the input when the facet was read.
        remaining: usize,
    },

    /// Structural problem in an ASCII file beyond per-field recovery.
    #[error("malformed ASCII STL at line {line}: {message}")]
    MalformedAscii {
        /// Line number (1-indexed, counting non-empty lines only).
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The scale factor is not a finite positive number.
    #[error("invalid scale factor: {0}")]
    InvalidFactor(String),

    /// The output path does not carry the `.stl` extension.
    #[error("invalid target {}: expected a .stl file", path.display())]
    InvalidTarget {
        /// Rejected output path.
        path: PathBuf,
    },

    /// More facets than a binary STL facet count can represent.
    #[error("mesh has {0} facets, binary STL holds at most {max}", max = u32::MAX)]
    FacetCountOverflow(usize),

    /// I/O failure while reading a source.
    #[error("failed to decode STL: {0}")]
    Decode(#[source] std::io::Error),

    /// I/O failure while writing a target.
    #[error("failed to encode STL: {0}")]
    Encode(#[source] std::io::Error),
}

impl StlError {
    /// Create a `MalformedAscii` error at the given line.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedAscii {
            line,
            message: message.into(),
        }
    }
}

/// Result type for STL operations.
pub type Result<T> = std::result::Result<T, StlError>;
