//! Binary vs ASCII classification.
//!
//! The decision uses only the file size and the facet count stored at bytes
//! 80..84: a file is binary when its length is exactly `84 + 50 * count`.
//! Content is never inspected for a `solid` keyword, so an ASCII file whose
//! size happens to satisfy the equation is classified as binary and the
//! binary decoder reports the mismatch.

use std::fmt;

use tracing::debug;

/// Size of the free-form binary header.
pub const HEADER_LEN: usize = 80;

/// Size of the header plus the little-endian facet count.
pub const PREAMBLE_LEN: usize = HEADER_LEN + 4;

/// Size of one binary facet record (12 floats + 2 attribute bytes).
pub const FACET_LEN: usize = 50;

/// The two STL serializations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StlFormat {
    /// Fixed-width little-endian records.
    Binary,
    /// Line-oriented text grammar.
    Ascii,
}

impl fmt::Display for StlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StlFormat::Binary => write!(f, "binary"),
            StlFormat::Ascii => write!(f, "ASCII"),
        }
    }
}

/// Facet count stored in a binary preamble, if at least 84 bytes are given.
pub fn preamble_facet_count(preamble: &[u8]) -> Option<u32> {
    let count: [u8; 4] = preamble.get(HEADER_LEN..PREAMBLE_LEN)?.try_into().ok()?;
    Some(u32::from_le_bytes(count))
}

/// Exact byte length of a binary STL holding `facet_count` facets.
pub fn binary_size(facet_count: u32) -> u64 {
    PREAMBLE_LEN as u64 + u64::from(facet_count) * FACET_LEN as u64
}

/// Classify a file from its total length and its first 84 bytes.
///
/// Fewer than 84 bytes always classifies as ASCII.
pub fn detect_format(file_len: u64, preamble: &[u8]) -> StlFormat {
    let Some(count) = preamble_facet_count(preamble) else {
        debug!(file_len, "short preamble, treating as ASCII");
        return StlFormat::Ascii;
    };

    let expected = binary_size(count);
    let format = if expected == file_len {
        StlFormat::Binary
    } else {
        StlFormat::Ascii
    };
    debug!(file_len, count, expected, %format, "detected STL format");
    format
}

/// Classify a complete in-memory file.
pub fn detect_bytes(bytes: &[u8]) -> StlFormat {
    detect_format(bytes.len() as u64, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preamble(count: u32) -> Vec<u8> {
        let mut bytes = vec![b' '; HEADER_LEN];
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes
    }

    #[test]
    fn test_exact_size_is_binary() {
        assert_eq!(detect_format(84, &preamble(0)), StlFormat::Binary);
        assert_eq!(detect_format(134, &preamble(1)), StlFormat::Binary);
        assert_eq!(detect_format(84 + 50 * 12, &preamble(12)), StlFormat::Binary);
    }

    #[test]
    fn test_size_mismatch_is_ascii() {
        assert_eq!(detect_format(135, &preamble(1)), StlFormat::Ascii);
        assert_eq!(detect_format(133, &preamble(1)), StlFormat::Ascii);
        assert_eq!(detect_format(84, &preamble(1)), StlFormat::Ascii);
    }

    #[test]
    fn test_short_input_is_ascii() {
        assert_eq!(detect_bytes(b""), StlFormat::Ascii);
        assert_eq!(detect_bytes(b"solid x\nendsolid x\n"), StlFormat::Ascii);
        assert_eq!(detect_format(0, &[0u8; 83]), StlFormat::Ascii);
    }

    #[test]
    fn test_large_count_does_not_overflow() {
        assert_eq!(binary_size(u32::MAX), 84 + 50 * u64::from(u32::MAX));
        assert_eq!(detect_format(1000, &preamble(u32::MAX)), StlFormat::Ascii);
    }

    #[test]
    fn test_ascii_with_coincidental_size_is_binary() {
        // Bytes 80..84 of this text read as a count whose binary size
        // happens to match the text length.
        let mut text = b"solid coincidence".to_vec();
        text.resize(HEADER_LEN, b' ');
        text.extend_from_slice(&2u32.to_le_bytes());
        text.resize(184, b'x');
        assert_eq!(detect_bytes(&text), StlFormat::Binary);
    }

    #[test]
    fn test_display() {
        assert_eq!(StlFormat::Binary.to_string(), "binary");
        assert_eq!(StlFormat::Ascii.to_string(), "ASCII");
    }
}
