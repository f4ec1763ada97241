//! CLI binary tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// flipcache with HOME pointed at an empty directory
fn flipcache(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("flipcache").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn write_config(home: &TempDir, contents: &str) {
    let dir = home.path().join(".config").join("flipcache");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    flipcache(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn project_clamps_each_field() {
    let home = TempDir::new().unwrap();
    flipcache(&home)
        .args([
            "project",
            "--x",
            "150",
            "--y",
            "-10",
            "--width",
            "50",
            "--height",
            "50",
            "--container-width",
            "100",
            "--container-height",
            "100",
        ])
        .assert()
        .success()
        .stdout("x=100.00px y=0.00px w=50.00px h=50.00px\n");
}

#[test]
fn project_json_output() {
    let home = TempDir::new().unwrap();
    flipcache(&home)
        .args([
            "project",
            "--x",
            "10",
            "--y",
            "20",
            "--width",
            "30",
            "--height",
            "40",
            "--container-width",
            "800",
            "--container-height",
            "600",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""x":80.0"#))
        .stdout(predicate::str::contains(r#""height":240.0"#));
}

#[test]
fn project_rejects_negative_container() {
    let home = TempDir::new().unwrap();
    flipcache(&home)
        .args([
            "project",
            "--x",
            "0",
            "--y",
            "0",
            "--width",
            "1",
            "--height",
            "1",
            "--container-width",
            "0",
            "--container-height=-5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be negative"));
}

#[test]
fn config_path_is_under_home() {
    let home = TempDir::new().unwrap();
    let expected = home
        .path()
        .join(".config")
        .join("flipcache")
        .join("config.toml");
    flipcache(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(format!("{}\n", expected.display()));
}

#[test]
fn config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    flipcache(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[memory_cache]"))
        .stdout(predicate::str::contains("max_entries = 100"))
        .stdout(predicate::str::contains(r#"version = "flipbook-v2""#));
}

#[test]
fn config_show_reports_invalid_values() {
    let home = TempDir::new().unwrap();
    write_config(&home, "[preload]\nconcurrency = 0\n");
    flipcache(&home)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("preload.concurrency"));
}

#[test]
fn cache_status_when_disabled() {
    let home = TempDir::new().unwrap();
    write_config(&home, "[persistent_cache]\nenabled = false\n");
    flipcache(&home)
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled or unavailable"));
}

#[test]
fn cache_status_lists_nothing_for_fresh_store() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("store");
    write_config(
        &home,
        &format!(
            "[persistent_cache]\ndirectory = \"{}\"\n",
            dir.display().to_string().replace('\\', "\\\\")
        ),
    );
    flipcache(&home)
        .args(["cache", "status"])
        .assert()
        .success()
        .stdout("No caches.\n");
    assert!(dir.exists());
}
