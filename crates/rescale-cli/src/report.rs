//! Model summaries printed by `info` and `scale`.

use std::path::Path;

use rescale_stl::{Decoded, MeshStats};
use serde::Serialize;

/// Everything `info` knows about a decoded file.
#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub path: String,
    pub format: String,
    pub header: Option<String>,
    pub solid_name: Option<String>,
    #[serde(flatten)]
    pub stats: MeshStats,
    pub warnings: Vec<String>,
}

impl InfoReport {
    pub fn new(path: &Path, decoded: &Decoded) -> Self {
        Self {
            path: path.display().to_string(),
            format: decoded.format.to_string(),
            header: decoded.mesh.header.clone(),
            solid_name: decoded.solid_name.clone(),
            stats: MeshStats::of(&decoded.mesh),
            warnings: decoded.warnings.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report. Model units are taken to be millimetres.
    pub fn to_text(&self) -> String {
        let mut out = format!("STL file: {}\n  Format: {}\n", self.path, self.format);
        if let Some(header) = self.header.as_deref().filter(|h| !h.is_empty()) {
            out.push_str(&format!("  Header: {header}\n"));
        }
        if let Some(name) = &self.solid_name {
            out.push_str(&format!("  Solid: {name}\n"));
        }
        out.push_str(&stats_text(&self.stats));
        if !self.warnings.is_empty() {
            out.push_str(&format!("\nWarnings ({}):\n", self.warnings.len()));
            for warning in &self.warnings {
                out.push_str(&format!("  {warning}\n"));
            }
        }
        out
    }
}

/// Facet count, dimensions, volume and area in mm and cm.
pub fn stats_text(stats: &MeshStats) -> String {
    let mut out = format!("  Facets: {}\n", stats.facets);
    if let Some(bounds) = &stats.bounds {
        out.push_str("\nDimensions:\n");
        for (axis, size) in ["X", "Y", "Z"].iter().zip(bounds.dimensions()) {
            out.push_str(&format!("  {axis}: {size:.2} mm / {:.2} cm\n", size / 10.0));
        }
    }
    out.push_str(&format!(
        "\nVolume: {:.2} mm³ / {:.2} cm³\n",
        stats.volume,
        stats.volume / 1000.0
    ));
    out.push_str(&format!(
        "Area: {:.2} mm² / {:.2} cm²\n",
        stats.area,
        stats.area / 100.0
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescale_stl::decode;

    const TRIANGLE: &str = "solid t
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 10 0 0
vertex 0 10 0
endloop
endfacet
endsolid t
";

    #[test]
    fn test_text_report() {
        let decoded = decode(TRIANGLE.as_bytes()).unwrap();
        let text = InfoReport::new(Path::new("t.stl"), &decoded).to_text();
        assert!(text.contains("Format: ASCII"));
        assert!(text.contains("Solid: t"));
        assert!(text.contains("Facets: 1"));
        assert!(text.contains("X: 10.00 mm / 1.00 cm"));
        assert!(text.contains("Area: 50.00 mm² / 0.50 cm²"));
        assert!(!text.contains("Warnings"));
    }

    #[test]
    fn test_text_report_lists_warnings() {
        let text = TRIANGLE.replace("vertex 0 10 0\n", "");
        let decoded = decode(text.as_bytes()).unwrap();
        let report = InfoReport::new(Path::new("t.stl"), &decoded).to_text();
        assert!(report.contains("Warnings (1):"));
        assert!(report.ends_with('\n'));
    }

    #[test]
    fn test_json_report_flattens_stats() {
        let text = TRIANGLE.replace("vertex 0 10 0\n", "");
        let decoded = decode(text.as_bytes()).unwrap();
        let json = InfoReport::new(Path::new("t.stl"), &decoded).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["facets"], 1);
        assert_eq!(value["format"], "ASCII");
        assert_eq!(value["bounds"]["max"][0], 10.0);
        assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
    }
}
