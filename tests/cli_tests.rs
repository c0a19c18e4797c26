//! CLI integration tests

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with config, data and cache directories isolated under `home`
fn verse_recorder_bin(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("verse-recorder").expect("binary builds");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("VERSE_RECORDER_LANGUAGE")
        .env_remove("VERSE_RECORDER_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn write_recording(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"not really audio").unwrap();
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--dir"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("verse-recorder"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn record_help_mentions_reference() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .args(["record", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("REFERENCE"))
        .stdout(predicate::str::contains("--language"))
        .stdout(predicate::str::contains(".wav"));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verse-recorder"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .args(["config", "set", "levels.display_bars", "32"])
        .assert()
        .success();

    verse_recorder_bin(home.path())
        .args(["config", "get", "levels.display_bars"])
        .assert()
        .success()
        .stdout(predicate::str::diff("32\n"));

    verse_recorder_bin(home.path())
        .args(["config", "get", "language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn config_init_then_list() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(home.path().join("config/verse-recorder/config.toml").exists());

    verse_recorder_bin(home.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("language"))
        .stdout(predicate::str::contains("levels.dramatic_factor"));
}

#[test]
fn list_on_missing_directory_is_empty() {
    let home = TempDir::new().unwrap();
    verse_recorder_bin(home.path())
        .args(["list", "--dir"])
        .arg(home.path().join("nowhere"))
        .assert()
        .success()
        .stderr(predicate::str::contains("No recordings found"));
}

#[test]
fn list_groups_populated_directory() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("recordings");
    write_recording(&root, "en/GEN/1/en_GEN_1_1-3.wav");
    write_recording(&root, "es/JHN/3/es_JHN_3_16.m4a");
    write_recording(&root, "en/GEN/1/notes.txt");

    verse_recorder_bin(home.path())
        .args(["list", "--dir"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("en_GEN_1_1-3.wav"))
        .stdout(predicate::str::contains("es_JHN_3_16.m4a"))
        .stdout(predicate::str::contains("notes.txt").not());

    assert!(root.join(".verse-recorder-catalog.json").exists());
}

#[test]
fn list_filters_by_language() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("recordings");
    write_recording(&root, "en/GEN/1/en_GEN_1_1.wav");
    write_recording(&root, "es/GEN/1/es_GEN_1_1.wav");

    verse_recorder_bin(home.path())
        .args(["list", "--language", "es", "--dir"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("es_GEN_1_1.wav"))
        .stdout(predicate::str::contains("en_GEN_1_1.wav").not());
}

#[test]
fn list_summary_cascades() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("recordings");
    write_recording(&root, "en/GEN/1/en_GEN_1_1.wav");
    write_recording(&root, "en/EXO/2/en_EXO_2_1.wav");
    write_recording(&root, "fr/MAT/5/fr_MAT_5_1.wav");

    verse_recorder_bin(home.path())
        .args(["list", "--summary", "--language", "en", "--dir"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("EXO"))
        .stdout(predicate::str::contains("GEN"))
        .stdout(predicate::str::contains("MAT").not());
}

#[test]
fn list_uses_directory_from_environment() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("env-recordings");
    write_recording(&root, "en/PSA/23/en_PSA_23_1.wav");

    verse_recorder_bin(home.path())
        .env("VERSE_RECORDER_DIR", &root)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("en_PSA_23_1.wav"));
}

#[test]
fn export_copies_relative_path() {
    let home = TempDir::new().unwrap();
    let root = home.path().join("recordings");
    let dest = home.path().join("out");
    write_recording(&root, "en/GEN/1/en_GEN_1_1.wav");

    verse_recorder_bin(home.path())
        .args(["export", "en/GEN/1/en_GEN_1_1.wav", "--to"])
        .arg(&dest)
        .arg("--dir")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("en_GEN_1_1.wav"));

    assert!(dest.join("en_GEN_1_1.wav").exists());
    assert!(root.join("en/GEN/1/en_GEN_1_1.wav").exists());
}
