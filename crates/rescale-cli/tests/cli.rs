use std::fs;
use std::path::Path;

use assert_cmd::Command;
use rescale_stl::{read_stl, StlFormat, Vec3};

const TRIANGLE: &str = "solid t
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
endsolid t
";

fn rescale(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rescale").unwrap();
    cmd.current_dir(dir).env_remove("RESCALE_DEFAULT_FACTOR");
    cmd
}

fn write_triangle(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("tri.stl");
    fs::write(&path, TRIANGLE).unwrap();
    path
}

#[test]
fn scale_ascii_to_binary() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let output = dir.path().join("big.stl");

    rescale(dir.path())
        .args(["scale", "--factor", "2"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::metadata(&output).unwrap().len(), 134);
    let decoded = read_stl(&output).unwrap();
    assert_eq!(decoded.format, StlFormat::Binary);
    assert_eq!(decoded.mesh.facets[0].vertices[1], Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn scale_by_ratio_pair_to_ascii() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let output = dir.path().join("small.stl");

    rescale(dir.path())
        .args(["scale", "--from", "1:1", "--to", "1:4", "--ascii"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let decoded = read_stl(&output).unwrap();
    assert_eq!(decoded.format, StlFormat::Ascii);
    assert_eq!(decoded.solid_name.as_deref(), Some("t"));
    assert_eq!(decoded.mesh.facets[0].vertices[2], Vec3::new(0.0, 0.25, 0.0));
}

#[test]
fn scale_with_preset_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let output = dir.path().join("preset.stl");
    fs::write(
        dir.path().join("rescale.toml"),
        "[presets.triple]\nfactor = 3.0\n",
    )
    .unwrap();

    rescale(dir.path())
        .args(["scale", "--preset", "triple"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let decoded = read_stl(&output).unwrap();
    assert_eq!(decoded.mesh.facets[0].vertices[1], Vec3::new(3.0, 0.0, 0.0));
}

#[test]
fn default_factor_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let output = dir.path().join("env.stl");

    rescale(dir.path())
        .env("RESCALE_DEFAULT_FACTOR", "5")
        .arg("scale")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let decoded = read_stl(&output).unwrap();
    assert_eq!(decoded.mesh.facets[0].vertices[1], Vec3::new(5.0, 0.0, 0.0));
}

#[test]
fn invalid_factor_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let output = dir.path().join("out.stl");

    for bad in ["0", "-1", "abc", "inf"] {
        rescale(dir.path())
            .args(["scale", "--factor", bad])
            .arg(&input)
            .arg(&output)
            .assert()
            .failure();
    }
    assert!(!output.exists());
}

#[test]
fn wrong_output_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let output = dir.path().join("out.obj");

    rescale(dir.path())
        .args(["scale", "--factor", "2"])
        .arg(&input)
        .arg(&output)
        .assert()
        .failure();
    assert!(!output.exists());
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    rescale(dir.path())
        .args(["info", "absent.stl"])
        .assert()
        .failure();
}

#[test]
fn info_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());

    let out = rescale(dir.path())
        .args(["info", "--json"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["format"], "ASCII");
    assert_eq!(value["facets"], 1);
    assert_eq!(value["area"], 0.5);
}

#[test]
fn strict_mode_rejects_short_facet() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.stl");
    fs::write(&input, TRIANGLE.replace("vertex 0 1 0\n", "")).unwrap();

    rescale(dir.path()).arg("info").arg(&input).assert().success();
    rescale(dir.path())
        .args(["info", "--strict"])
        .arg(&input)
        .assert()
        .failure();
}

#[test]
fn convert_binary_back_to_ascii() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());
    let binary = dir.path().join("tri-bin.stl");
    let ascii = dir.path().join("tri-ascii.stl");

    rescale(dir.path())
        .args(["convert", "--binary"])
        .arg(&input)
        .arg(&binary)
        .assert()
        .success();
    rescale(dir.path())
        .args(["convert", "--ascii"])
        .arg(&binary)
        .arg(&ascii)
        .assert()
        .success();

    let original = read_stl(&input).unwrap();
    let back = read_stl(&ascii).unwrap();
    assert_eq!(back.format, StlFormat::Ascii);
    assert_eq!(back.mesh.facets, original.mesh.facets);
}

#[test]
fn presets_listing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rescale.toml"),
        "[presets.mini]\ndesired_scale = \"1:2\"\nnotes = \"half\"\n",
    )
    .unwrap();

    let out = rescale(dir.path()).arg("presets").output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("mini: x0.5 [1:1 -> 1:2] - half"));
}

#[test]
fn rust_log_enables_library_events() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());

    let out = rescale(dir.path())
        .env("RUST_LOG", "debug")
        .arg("info")
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("read STL source"), "stderr: {stderr}");
}

#[test]
fn quiet_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_triangle(dir.path());

    let out = rescale(dir.path())
        .env_remove("RUST_LOG")
        .arg("info")
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(!String::from_utf8_lossy(&out.stderr).contains("read STL source"));
}
