//! Binary-level tests of argument handling and error reporting

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary run from an empty directory, so no config file is picked up
fn clipship(dir: &TempDir) -> Command {
    let mut command = Command::cargo_bin("clipship").unwrap();
    command
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("CLIPSHIP_FFMPEG_PATH", "/nonexistent/ffmpeg")
        .env("CLIPSHIP_TEMP_DIR", dir.path().join("tmp"));
    command
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clip"))
        .stdout(predicate::str::contains("join"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_copy_with_zoom_is_rejected() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .args([
            "clip", "--input", "match.mp4", "--segment", "0,5,1,2", "--encoder", "copy", "--name", "goal",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot apply zoom"));
}

#[test]
fn test_inverted_segment_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .args(["clip", "--input", "match.mp4", "--segment", "40,10", "--name", "goal"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must be greater than start"));
}

#[test]
fn test_unknown_destination_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .args([
            "clip", "--input", "match.mp4", "--segment", "0,5", "--name", "goal", "--destination", "ftp",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid destination"));
}

#[test]
fn test_unconfigured_upload_backend() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .args([
            "clip", "--input", "match.mp4", "--segment", "0,5", "--name", "goal", "--destination",
            "primary-site",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No upload backend configured for primary-site"));
}

#[test]
fn test_probe_without_transcoder() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .args(["probe", "match.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to probe match.mp4"));
}

#[test]
fn test_missing_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    clipship(&dir)
        .args(["--config", "absent.toml", "probe", "match.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file does not exist"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("clipship.toml"), "[upload.video_host]\nchunk_size = 1000\n").unwrap();
    clipship(&dir)
        .args(["probe", "match.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_size"));
}

#[cfg(unix)]
#[test]
fn test_clip_to_library_prints_location() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let program = dir.path().join("fake-ffmpeg");
    std::fs::write(
        &program,
        "#!/bin/sh\nfor out; do :; done\nprintf 'encoded' > \"$out\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    clipship(&dir)
        .env("CLIPSHIP_FFMPEG_PATH", &program)
        .args([
            "clip", "--input", "match.mp4", "--segment", "0:05,0:10", "--name", "goal", "--progress",
            "quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("goal.mp4"));

    let delivered = dir.path().join("clips").join("goal.mp4");
    assert_eq!(std::fs::read_to_string(delivered).unwrap(), "encoded");
    assert_eq!(std::fs::read_dir(dir.path().join("tmp")).unwrap().count(), 0);
}
