#![warn(missing_docs)]

//! STL codec and uniform scale transform.
//!
//! Reads binary or ASCII STL into an in-memory [`Mesh`], scales it by a
//! validated [`ScaleFactor`] (recomputing facet normals), and writes it back
//! as binary or ASCII STL.
//!
//! Everything here is a plain function over owned values: no global state,
//! no threads, no locks. Independent meshes can be processed concurrently.
//!
//! # Example
//!
//! ```
//! use rescale_stl::{decode, encode, ScaleFactor};
//!
//! let text = "solid t
//! facet normal 0 0 1
//! outer loop
//! vertex 0 0 0
//! vertex 1 0 0
//! vertex 0 1 0
//! endloop
//! endfacet
//! endsolid t
//! ";
//! let mut mesh = decode(text.as_bytes()).unwrap().mesh;
//! mesh.scale_uniform(ScaleFactor::new(2.0).unwrap());
//! assert_eq!(mesh.area(), 2.0);
//!
//! let bytes = encode(&mesh, true).unwrap();
//! assert_eq!(bytes.len(), 134);
//! ```

pub mod decode;
pub mod detect;
pub mod encode;
pub mod error;
pub mod measure;
pub mod mesh;
pub mod scale;

pub use decode::{
    decode, decode_as, decode_ascii, decode_binary, decode_with, read_from, read_stl,
    read_stl_with, DecodeOptions, DecodeWarning, Decoded, FacetField,
};
pub use detect::{detect_bytes, detect_format, StlFormat};
pub use encode::{
    encode, encode_ascii, encode_binary, write_ascii, write_binary, write_stl, write_stl_with,
    AsciiOptions,
};
pub use error::{Result, StlError};
pub use measure::{area, bounds, volume, Bounds, MeshStats};
pub use mesh::{triangle_normal, Facet, Mesh, Vec3};
pub use scale::{apply, scale_copy, scale_in_place, ScaleFactor};
