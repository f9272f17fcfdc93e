//! In-memory triangle mesh model.
//!
//! A [`Mesh`] is an ordered list of [`Facet`]s, each a normal plus three
//! vertices in winding order, with an optional free-form header carried over
//! from binary sources.

use nalgebra::Vector3;

use crate::error::{Result, StlError};

/// A 3D vector with `f32` components, used for both positions and normals.
pub type Vec3 = Vector3<f32>;

/// One triangle: a normal vector and three vertices in winding order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    /// Facet normal as stored in the source (or recomputed after scaling).
    pub normal: Vec3,
    /// The three corners, in winding order.
    pub vertices: [Vec3; 3],
}

impl Facet {
    /// Create a facet from a normal and three vertices.
    pub fn new(normal: Vec3, vertices: [Vec3; 3]) -> Self {
        Self { normal, vertices }
    }

    /// Create a facet whose normal is computed from its vertices.
    pub fn from_vertices(vertices: [Vec3; 3]) -> Self {
        Self {
            normal: triangle_normal(&vertices),
            vertices,
        }
    }

    /// Cross product of the two edges leaving `vertices[0]`.
    ///
    /// Its length is twice the triangle area.
    pub fn edge_cross(&self) -> Vec3 {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Replace the stored normal with one derived from the vertices.
    pub fn recompute_normal(&mut self) {
        self.normal = triangle_normal(&self.vertices);
    }
}

/// Unit normal of a triangle, or the zero vector for degenerate triangles.
pub fn triangle_normal(vertices: &[Vec3; 3]) -> Vec3 {
    let [v0, v1, v2] = *vertices;
    (v1 - v0)
        .cross(&(v2 - v0))
        .try_normalize(0.0)
        .unwrap_or_else(Vec3::zeros)
}

/// A triangle mesh as read from or written to an STL file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Header text from a binary source. `None` for ASCII sources.
    pub header: Option<String>,
    /// Facets in file order.
    pub facets: Vec<Facet>,
}

impl Mesh {
    /// Create an empty mesh without a header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from facets, without a header.
    pub fn from_facets(facets: Vec<Facet>) -> Self {
        Self {
            header: None,
            facets,
        }
    }

    /// Set the header text.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Number of facets.
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// Check if the mesh has no facets.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Facet count as stored in a binary STL preamble.
    ///
    /// Fails with [`StlError::FacetCountOverflow`] when the mesh has more
    /// facets than a `u32` can count.
    pub fn binary_facet_count(&self) -> Result<u32> {
        u32::try_from(self.facets.len())
            .map_err(|_| StlError::FacetCountOverflow(self.facets.len()))
    }

    /// Check that the mesh can be written as binary STL.
    pub fn validate(&self) -> Result<()> {
        self.binary_facet_count().map(|_| ())
    }

    /// Recompute every facet normal from its vertices.
    pub fn recompute_normals(&mut self) {
        for facet in &mut self.facets {
            facet.recompute_normal();
        }
    }

    /// Flat array of vertex positions `[x0, y0, z0, x1, y1, z1, ...]`.
    ///
    /// Three entries per facet, in facet order.
    pub fn vertex_array(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.facets.len() * 9);
        for facet in &self.facets {
            for v in &facet.vertices {
                out.extend_from_slice(&[v.x, v.y, v.z]);
            }
        }
        out
    }

    /// Flat array of per-vertex normals, same layout as [`Mesh::vertex_array`].
    ///
    /// Each facet normal is repeated for its three vertices.
    pub fn normal_array(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.facets.len() * 9);
        for facet in &self.facets {
            let n = facet.normal;
            for _ in 0..3 {
                out.extend_from_slice(&[n.x, n.y, n.z]);
            }
        }
        out
    }
}
