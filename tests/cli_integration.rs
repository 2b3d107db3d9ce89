//! Integration tests for the Keystash CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  Key
//! material comes from environment variables and values are passed inline
//! or on stdin, so nothing here needs an interactive prompt.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER_V1: &str = "1111111111111111111111111111111111111111111111111111111111111111";
const MASTER_V2: &str = "2222222222222222222222222222222222222222222222222222222222222222";
const INDEX: &str = "7777777777777777777777777777777777777777777777777777777777777777";

/// Helper: a Command for the keystash binary with a clean key environment.
fn keystash(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("keystash").expect("binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("KEYSTASH_STORE")
        .env_remove("KEYSTASH_KEY_VERSION")
        .env_remove("KEYSTASH_PREVIOUS_KEYS")
        .env_remove("KEYSTASH_LOG")
        .env("KEYSTASH_MASTER_KEY", MASTER_V1)
        .env("KEYSTASH_INDEX_KEY", INDEX);
    cmd
}

/// Helper: init a store and add one project with one key.
fn seeded() -> TempDir {
    let dir = TempDir::new().unwrap();
    keystash(&dir).arg("init").assert().success();
    keystash(&dir)
        .args(["project", "add", "billing"])
        .assert()
        .success();
    keystash(&dir)
        .args(["add", "billing", "live", "--service", "stripe", "--env", "prod"])
        .write_stdin("sk-live-abc123\n")
        .assert()
        .success();
    dir
}

/// Id prefix of the only key with the given name, scraped from `list`.
fn key_id(dir: &TempDir, name: &str) -> String {
    let out = keystash(dir).arg("list").output().unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    stdout
        .lines()
        .find(|l| l.contains(name))
        .and_then(|l| {
            l.split(|c: char| !c.is_ascii_hexdigit())
                .find(|w| w.len() == 8)
        })
        .expect("key id in list output")
        .to_string()
}

#[test]
fn help_flag_shows_usage() {
    let dir = TempDir::new().unwrap();
    keystash(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted API key manager"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("reencrypt"));
}

#[test]
fn version_flag_shows_version() {
    let dir = TempDir::new().unwrap();
    keystash(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("keystash"));
}

#[test]
fn keygen_prints_a_usable_key() {
    let dir = TempDir::new().unwrap();
    keystash(&dir)
        .args(["keygen", "--hex"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{64}\n$").unwrap());
}

#[test]
fn missing_master_key_fails_loudly() {
    let dir = TempDir::new().unwrap();
    keystash(&dir)
        .env_remove("KEYSTASH_MASTER_KEY")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEYSTASH_MASTER_KEY"));

    dir.child(".keystash/keys.store").assert(predicate::path::missing());
}

#[test]
fn malformed_master_key_is_rejected_without_echo() {
    let dir = TempDir::new().unwrap();
    keystash(&dir)
        .env("KEYSTASH_MASTER_KEY", "not-a-real-key-value")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not-a-real-key-value").not());
}

#[test]
fn init_creates_store_once() {
    let dir = TempDir::new().unwrap();
    keystash(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Store created"));
    dir.child(".keystash/keys.store").assert(predicate::path::exists());

    keystash(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_then_get_roundtrip() {
    let dir = seeded();
    let id = key_id(&dir, "live");

    keystash(&dir)
        .args(["get", &id])
        .assert()
        .success()
        .stdout("sk-live-abc123\n");
}

#[test]
fn list_never_prints_plaintext() {
    let dir = seeded();
    keystash(&dir)
        .args(["list", "--masked"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stripe"))
        .stdout(predicate::str::contains("sk-****...c123"))
        .stdout(predicate::str::contains("sk-live-abc123").not());
}

#[test]
fn find_matches_by_value() {
    let dir = seeded();
    keystash(&dir)
        .arg("find")
        .write_stdin("sk-live-abc123")
        .assert()
        .success()
        .stdout(predicate::str::contains("live"));

    keystash(&dir)
        .arg("find")
        .write_stdin("sk-live-other")
        .assert()
        .success()
        .stdout(predicate::str::contains("No key holds that value"));
}

#[test]
fn update_replaces_value() {
    let dir = seeded();
    let id = key_id(&dir, "live");

    keystash(&dir)
        .args(["update", &id])
        .write_stdin("sk-live-def456")
        .assert()
        .success();
    keystash(&dir)
        .args(["get", &id])
        .assert()
        .success()
        .stdout("sk-live-def456\n");
}

#[test]
fn export_env_to_stdout() {
    let dir = seeded();
    keystash(&dir)
        .args(["export", "billing"])
        .assert()
        .success()
        .stdout("STRIPE_API_KEY=sk-live-abc123\n");
}

#[test]
fn wrong_master_key_gives_generic_error() {
    let dir = seeded();
    let id = key_id(&dir, "live");

    keystash(&dir)
        .env("KEYSTASH_MASTER_KEY", MASTER_V2)
        .args(["get", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to retrieve key"))
        .stdout(predicate::str::contains("sk-live").not());
}

#[test]
fn rotation_then_reencrypt() {
    let dir = seeded();
    let id = key_id(&dir, "live");
    let previous = format!("v1:{MASTER_V1}");

    keystash(&dir)
        .env("KEYSTASH_MASTER_KEY", MASTER_V2)
        .env("KEYSTASH_KEY_VERSION", "v2")
        .env("KEYSTASH_PREVIOUS_KEYS", &previous)
        .arg("reencrypt")
        .assert()
        .success()
        .stdout(predicate::str::contains("Re-encrypted 1 key(s) under version v2"));

    // v1 is no longer needed.
    keystash(&dir)
        .env("KEYSTASH_MASTER_KEY", MASTER_V2)
        .env("KEYSTASH_KEY_VERSION", "v2")
        .args(["get", &id])
        .assert()
        .success()
        .stdout("sk-live-abc123\n");
}

#[test]
fn delete_project_with_force() {
    let dir = seeded();
    keystash(&dir)
        .args(["project", "delete", "billing", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 key(s) removed"));
    keystash(&dir)
        .args(["export", "billing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn unknown_settings_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    dir.child("keystash.toml")
        .write_str("store_paht = \"x.store\"\n")
        .unwrap();
    keystash(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("keystash.toml"));
}

#[test]
fn store_path_from_settings_is_used() {
    let dir = TempDir::new().unwrap();
    dir.child("keystash.toml")
        .write_str("store_path = \"secrets/team.store\"\n")
        .unwrap();
    keystash(&dir).arg("init").assert().success();
    dir.child("secrets/team.store").assert(predicate::path::exists());
}

#[test]
fn export_refuses_to_overwrite_custom_store() {
    let dir = TempDir::new().unwrap();
    let run = || {
        let mut cmd = keystash(&dir);
        cmd.env("KEYSTASH_STORE", "keys.db");
        cmd
    };
    run().arg("init").assert().success();
    run().args(["project", "add", "billing"]).assert().success();
    run()
        .args(["add", "billing", "live", "--service", "stripe"])
        .write_stdin("sk-live-abc123\n")
        .assert()
        .success();

    for dest in ["keys.db", "./keys.db"] {
        run()
            .args(["export", "billing", "--output", dest])
            .assert()
            .failure()
            .stderr(predicate::str::contains("refusing to export"));
    }

    run()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("stripe"));
}
