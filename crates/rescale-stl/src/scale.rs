//! Uniform scaling.
//!
//! Every vertex coordinate is multiplied by the same factor and each facet
//! normal is recomputed from the scaled vertices. Factors are validated
//! once, when a [`ScaleFactor`] is built, so the transform itself cannot
//! fail halfway through a mesh.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::{Result, StlError};
use crate::mesh::Mesh;

/// A validated, finite, strictly positive scale factor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// The identity factor.
    pub const ONE: ScaleFactor = ScaleFactor(1.0);

    /// Validate a raw factor.
    ///
    /// Rejects zero, negative, NaN and infinite values, and values that
    /// collapse to zero or infinity at `f32` precision.
    pub fn new(value: f64) -> Result<Self> {
        let narrowed = value as f32;
        if !value.is_finite() || value <= 0.0 || !narrowed.is_finite() || narrowed <= 0.0 {
            return Err(StlError::InvalidFactor(format!(
                "{value} (must be a finite number greater than zero)"
            )));
        }
        Ok(Self(value))
    }

    /// Factor for converting a model from one scale ratio to another.
    ///
    /// A model built at `1:1` converted to `1:36` is multiplied by `1/36`;
    /// one at `1:72` converted to `1:36` is multiplied by `2`.
    pub fn convert(original: &str, desired: &str) -> Result<Self> {
        let from = parse_ratio(original)?;
        let to = parse_ratio(desired)?;
        Self::new(to / from)
    }

    /// The factor as `f64`.
    pub fn get(self) -> f64 {
        self.0
    }

    /// The factor at vertex precision.
    pub fn as_f32(self) -> f32 {
        self.0 as f32
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for ScaleFactor {
    type Error = StlError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

/// Parses a decimal (`"2.5"`) or a ratio (`"1:36"`).
impl FromStr for ScaleFactor {
    type Err = StlError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains(':') {
            Self::new(parse_ratio(s)?)
        } else {
            let value: f64 = s
                .parse()
                .map_err(|_| StlError::InvalidFactor(format!("{s:?} is not a number")))?;
            Self::new(value)
        }
    }
}

/// Parse an `a:b` scale ratio into `a / b`.
pub fn parse_ratio(ratio: &str) -> Result<f64> {
    let invalid = || StlError::InvalidFactor(format!("{ratio:?} is not a scale ratio like 1:36"));
    let (a, b) = ratio.trim().split_once(':').ok_or_else(invalid)?;
    let a: f64 = a.trim().parse().map_err(|_| invalid())?;
    let b: f64 = b.trim().parse().map_err(|_| invalid())?;
    if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
        return Err(invalid());
    }
    Ok(a / b)
}

/// Scale a mesh in place and recompute its normals.
pub fn scale_in_place(mesh: &mut Mesh, factor: ScaleFactor) -> &mut Mesh {
    let f = factor.as_f32();
    for facet in &mut mesh.facets {
        for vertex in &mut facet.vertices {
            *vertex *= f;
        }
        facet.recompute_normal();
    }
    info!(facets = mesh.len(), %factor, "scaled mesh");
    mesh
}

/// Return a scaled deep copy, leaving `mesh` untouched.
pub fn scale_copy(mesh: &Mesh, factor: ScaleFactor) -> Mesh {
    let mut copy = mesh.clone();
    scale_in_place(&mut copy, factor);
    copy
}

/// Scale with a raw factor, either in place or into a copy.
///
/// The factor is validated before the mesh is touched. In place, the
/// returned mesh is `mesh` itself (`None` means "look at your input");
/// otherwise the scaled copy is returned and `mesh` is unchanged.
pub fn apply(mesh: &mut Mesh, factor: f64, inplace: bool) -> Result<Option<Mesh>> {
    let factor = ScaleFactor::new(factor)?;
    if inplace {
        scale_in_place(mesh, factor);
        Ok(None)
    } else {
        Ok(Some(scale_copy(mesh, factor)))
    }
}

impl Mesh {
    /// Scale this mesh in place (see [`scale_in_place`]).
    pub fn scale_uniform(&mut self, factor: ScaleFactor) -> &mut Self {
        scale_in_place(self, factor)
    }

    /// Scaled copy of this mesh (see [`scale_copy`]).
    pub fn scaled(&self, factor: ScaleFactor) -> Mesh {
        scale_copy(self, factor)
    }
}
