//! Integration tests for the CLI commands

use assert_cmd::cargo::cargo_bin_cmd;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::path::PathBuf;

fn system_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial Unicode.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

#[test]
fn test_version_command() {
    let mut cmd = cargo_bin_cmd!("passynth");
    cmd.arg("version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("passynth "));
}

#[test]
fn test_version_flag() {
    let mut cmd = cargo_bin_cmd!("passynth");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("passynth "));
}

#[test]
fn test_content_command_prints_json() {
    let mut cmd = cargo_bin_cmd!("passynth");
    cmd.args(["content", "-n", "2", "--seed", "9"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let records: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        assert!(record["surname"].is_string());
        assert!(record["series"].is_string());
        assert!(record["issue_date"].as_str().unwrap().contains('.'));
    }
}

#[test]
fn test_transform_missing_font() {
    let mut cmd = cargo_bin_cmd!("passynth");
    cmd.args([
        "transform",
        "--skeleton-only",
        "--font",
        "/nonexistent/arial.ttf",
        "-i",
        "/nonexistent/passports",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read font"));
}

#[test]
fn test_transform_missing_model() {
    let Some(font) = system_font() else {
        println!("Skipping test: no system font found");
        return;
    };
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("passynth");
    cmd.arg("transform")
        .arg("--font")
        .arg(&font)
        .arg("-m")
        .arg("/nonexistent/final.onnx")
        .arg("-i")
        .arg(dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("model not found"));
}

#[test]
fn test_transform_skeleton_only() {
    let Some(font) = system_font() else {
        println!("Skipping test: no system font found");
        return;
    };
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    RgbImage::from_pixel(200, 120, Rgb([230, 220, 200]))
        .save(input.path().join("scan.png"))
        .unwrap();
    std::fs::write(
        input.path().join("scan.json"),
        r#"{"shapes": [
            {"label": "surname", "points": [[10, 10], [150, 10], [150, 40], [10, 40]]},
            {"label": "photo", "points": [[10, 50], [60, 110]]}
        ]}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("passynth");
    cmd.arg("transform")
        .arg("--skeleton-only")
        .arg("--quiet")
        .arg("--keep-names")
        .arg("--font")
        .arg(&font)
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(output.path());

    let stdout = cmd.assert().success().get_output().stdout.clone();
    let summary: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(summary["written"], 1);
    assert_eq!(summary["failed"], 0);

    let written: Vec<_> = std::fs::read_dir(output.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("scan_") && name.ends_with(".png"), "{name}");

    let result = image::open(written[0].path()).unwrap().to_rgb8();
    assert_eq!(result.dimensions(), (200, 120));
    // The photo is left alone, the surname field now holds gray skeleton text.
    assert_eq!(result.get_pixel(30, 80), &Rgb([230, 220, 200]));
    assert_eq!(result.get_pixel(11, 11), &Rgb([127, 127, 127]));
}
