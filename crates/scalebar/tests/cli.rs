use assert_cmd::Command;
use predicates::prelude::*;
use scalebar::core::{paint_checkerboard, BoardPlacement, GrayImage};
use std::path::{Path, PathBuf};

/// 200x200 white frame with a 4x4 board of 10 px cells in the top right.
fn write_board_png(dir: &Path) -> PathBuf {
    let mut img = GrayImage::filled(200, 200, 255);
    let board = BoardPlacement {
        cols: 4,
        rows: 4,
        cell: 10.0,
        center: [170.0, 40.0],
        angle_deg: 0.0,
    };
    paint_checkerboard(&mut img, &board, 4);
    let path = dir.join("board.png");
    image::GrayImage::from_raw(200, 200, img.data)
        .expect("buffer size")
        .save(&path)
        .expect("write png");
    path
}

fn write_blank_png(dir: &Path) -> PathBuf {
    let path = dir.join("blank.png");
    image::GrayImage::from_pixel(120, 80, image::Luma([200u8]))
        .save(&path)
        .expect("write png");
    path
}

fn scalebar() -> Command {
    Command::cargo_bin("scalebar").expect("binary built")
}

#[test]
fn prints_scale_for_board() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    scalebar()
        .arg(&img)
        .args(["--crop", "0.4"])
        .assert()
        .success()
        .stdout("10.000000\n");
}

#[test]
fn unit_divides_the_scale() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    scalebar()
        .arg(&img)
        .args(["--crop", "0.4", "--unit", "4"])
        .assert()
        .success()
        .stdout("2.500000\n");
}

#[test]
fn auto_position_finds_the_board() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    scalebar()
        .arg(&img)
        .args(["--position", "auto", "--crop", "0.4"])
        .assert()
        .success()
        .stdout("10.000000\n");
}

#[test]
fn blank_image_reports_absence() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_blank_png(dir.path());
    scalebar()
        .arg(&img)
        .assert()
        .success()
        .stdout("no scale estimated\n");
}

#[test]
fn writes_output_file_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    let out = dir.path().join("scale.txt");
    let report = dir.path().join("report.json");
    scalebar()
        .arg(&img)
        .args(["--crop", "0.4"])
        .arg("--output")
        .arg(&out)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "10.000000\n");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["position"], "top_right");
    assert_eq!(json["scale"], 10.0);
    assert!(json["filter_mask"].is_array());
}

#[test]
fn refuses_to_overwrite_output() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    let out = dir.path().join("scale.txt");
    std::fs::write(&out, "old\n").unwrap();
    scalebar()
        .arg(&img)
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "old\n");
}

#[test]
fn config_file_sets_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    let cfg = dir.path().join("params.json");
    std::fs::write(
        &cfg,
        r#"{ "crop": { "fraction": 0.4 }, "square_unit": 2.0 }"#,
    )
    .unwrap();
    scalebar()
        .arg(&img)
        .arg("--config")
        .arg(&cfg)
        .assert()
        .success()
        .stdout("5.000000\n");
}

#[test]
fn rejects_bad_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    scalebar()
        .arg(&img)
        .args(["--crop", "0.2,0.3,0.4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed crop fraction"));
    scalebar()
        .arg(&img)
        .args(["--position", "none"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
    scalebar()
        .arg(&img)
        .args(["--position", "middle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown position"));
}

#[test]
fn verbosity_controls_stderr_logging() {
    let dir = tempfile::tempdir().unwrap();
    let img = write_board_png(dir.path());
    scalebar()
        .arg(&img)
        .args(["--crop", "0.4"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr("");
    scalebar()
        .arg(&img)
        .args(["--crop", "0.4", "-vv"])
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(
            predicate::str::contains("DEBUG")
                .and(predicate::str::contains("scalebar_calib::scale")),
        );
}
