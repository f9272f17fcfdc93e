//! Derived geometric queries over a mesh.
//!
//! All sums are accumulated in `f64`.

use nalgebra::Vector3;
use serde::Serialize;

use crate::mesh::{Facet, Mesh, Vec3};

fn widen(v: &Vec3) -> Vector3<f64> {
    v.cast::<f64>()
}

/// Enclosed volume: `|Σ v0 · (v1 × v2)| / 6` over all facets.
///
/// Only meaningful for closed meshes; open meshes give a number that
/// depends on the origin.
pub fn volume(mesh: &Mesh) -> f64 {
    let signed: f64 = mesh.facets.iter().map(signed_volume6).sum();
    (signed / 6.0).abs()
}

fn signed_volume6(facet: &Facet) -> f64 {
    let [v0, v1, v2] = facet.vertices.each_ref().map(widen);
    v0.dot(&v1.cross(&v2))
}

/// Total surface area: `Σ |(v1 − v0) × (v2 − v0)| / 2`.
pub fn area(mesh: &Mesh) -> f64 {
    mesh.facets.iter().map(facet_area).sum()
}

/// Area of a single facet.
pub fn facet_area(facet: &Facet) -> f64 {
    let [v0, v1, v2] = facet.vertices.each_ref().map(widen);
    (v1 - v0).cross(&(v2 - v0)).norm() / 2.0
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Bounds {
    /// Extent along each axis.
    pub fn dimensions(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Bounding box of all vertices, `None` for an empty mesh.
pub fn bounds(mesh: &Mesh) -> Option<Bounds> {
    let mut vertices = mesh.facets.iter().flat_map(|f| f.vertices.iter());
    let first = vertices.next()?;
    let mut min = *first;
    let mut max = *first;
    for v in vertices {
        min = min.inf(v);
        max = max.sup(v);
    }
    Some(Bounds {
        min: [min.x, min.y, min.z],
        max: [max.x, max.y, max.z],
    })
}

/// Summary of a mesh for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStats {
    /// Number of facets.
    pub facets: usize,
    /// Enclosed volume (cubic model units).
    pub volume: f64,
    /// Surface area (square model units).
    pub area: f64,
    /// Bounding box, absent for an empty mesh.
    pub bounds: Option<Bounds>,
}

impl MeshStats {
    /// Compute all statistics for a mesh.
    pub fn of(mesh: &Mesh) -> Self {
        Self {
            facets: mesh.len(),
            volume: volume(mesh),
            area: area(mesh),
            bounds: bounds(mesh),
        }
    }
}

impl Mesh {
    /// Enclosed volume (see [`volume`]).
    pub fn volume(&self) -> f64 {
        volume(self)
    }

    /// Surface area (see [`area`]).
    pub fn area(&self) -> f64 {
        area(self)
    }

    /// Bounding box (see [`bounds`]).
    pub fn bounds(&self) -> Option<Bounds> {
        bounds(self)
    }
}
