use httpmock::prelude::*;
use httpmock::Method::HEAD;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn bin() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("terraurl").expect("binary");
    cmd.env_remove("TERRAURL_CONFIG")
        .env_remove("TERRAURL_STATE")
        .env("NO_COLOR", "1");
    cmd
}

fn write_config(dir: &Path, url: &str) -> std::path::PathBuf {
    let config = dir.join("terraurl.toml");
    fs::write(
        &config,
        format!(
            r#"
[provider]
user_agent = "terraurl-cli-test"

[resource.artifact]
url = "{url}"
target_path = "out/artifact.bin"
"#
        ),
    )
    .expect("write config");
    fs::create_dir_all(dir.join("out")).expect("create out dir");
    config
}

fn write_pair_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let config = dir.join("terraurl.toml");
    fs::write(
        &config,
        format!(
            r#"
[resource.a]
url = "{}"
target_path = "a.bin"

[resource.b]
url = "{}"
target_path = "b.bin"
"#,
            server.url("/a.bin"),
            server.url("/b.bin")
        ),
    )
    .expect("write config");
    config
}

/// GET serving `size` bytes; HEAD is mocked separately so tests can swap it
fn serve_get<'a>(server: &'a MockServer, path: &str, size: usize) -> httpmock::Mock<'a> {
    let path = path.to_string();
    server.mock(move |when, then| {
        when.method(GET).path(path.as_str());
        then.status(200)
            .header("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT")
            .body(vec![1u8; size]);
    })
}

fn serve_head<'a>(
    server: &'a MockServer,
    path: &str,
    size: usize,
    last_modified: &str,
) -> httpmock::Mock<'a> {
    let path = path.to_string();
    let last_modified = last_modified.to_string();
    server.mock(move |when, then| {
        when.method(HEAD).path(path.as_str());
        then.status(200)
            .header("content-length", size.to_string())
            .header("last-modified", last_modified.as_str())
            .body(vec![0u8; size]);
    })
}

fn read_state(dir: &Path) -> Value {
    let text = fs::read_to_string(dir.join("terraurl.state.json")).expect("read state");
    serde_json::from_str(&text).expect("state json")
}

#[test]
fn apply_show_destroy_round() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tmpdir");

    let get = server.mock(|when, then| {
        when.method(GET)
            .path("/artifact.bin")
            .header("user-agent", "terraurl-cli-test");
        then.status(200)
            .header("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT")
            .body(vec![9u8; 512]);
    });
    server.mock(|when, then| {
        when.method(HEAD).path("/artifact.bin");
        then.status(200)
            .header("content-length", "512")
            .header("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT")
            .body(vec![9u8; 512]);
    });

    let config = write_config(tmp.path(), &server.url("/artifact.bin"));
    let target = tmp.path().join("out/artifact.bin");

    bin()
        .arg("-c")
        .arg(&config)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 to add"));
    assert!(!target.exists(), "plan must not download");

    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 created"));
    get.assert();
    assert_eq!(fs::metadata(&target).expect("downloaded").len(), 512);

    let state = read_state(tmp.path());
    assert_eq!(state["serial"], 1);
    assert_eq!(state["resources"]["artifact"]["size"], 512);

    // converged
    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes needed"));
    get.assert_hits(1);

    bin()
        .arg("-c")
        .arg(&config)
        .args(["show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"last_modified\": \"Mon, 01 Jan 2024 00:00:00 GMT\""));

    bin()
        .arg("-c")
        .arg(&config)
        .args(["destroy", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 removed"));
    assert!(!target.exists());
    assert_eq!(read_state(tmp.path())["resources"], serde_json::json!({}));
}

#[test]
fn dry_run_changes_nothing() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tmpdir");
    let get = server.mock(|when, then| {
        when.method(GET).path("/a");
        then.status(200).body("abc");
    });

    let config = write_config(tmp.path(), &server.url("/a"));
    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    get.assert_hits(0);
    assert!(!tmp.path().join("out/artifact.bin").exists());
    assert!(!tmp.path().join("terraurl.state.json").exists());
}

#[test]
fn failed_download_exits_non_zero() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tmpdir");
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    let config = write_config(tmp.path(), &server.url("/missing"));
    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));

    assert!(!tmp.path().join("out/artifact.bin").exists());
    let state = read_state(tmp.path());
    assert_eq!(state["resources"], serde_json::json!({}));
}

#[test]
fn missing_config_is_reported() {
    let tmp = tempdir().expect("tmpdir");
    bin()
        .arg("-c")
        .arg(tmp.path().join("nope.toml"))
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not read"));
}

#[test]
fn show_without_state() {
    let tmp = tempdir().expect("tmpdir");
    bin()
        .arg("-s")
        .arg(tmp.path().join("state.json"))
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources recorded"));
}

#[test]
fn completions_are_generated() {
    bin()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("terraurl"));
}

#[test]
fn refresh_records_drift_without_writing() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tmpdir");
    let get_a = serve_get(&server, "/a.bin", 512);
    let get_b = serve_get(&server, "/b.bin", 512);
    let mut head_a = serve_head(&server, "/a.bin", 512, "Mon, 01 Jan 2024 00:00:00 GMT");
    serve_head(&server, "/b.bin", 512, "Mon, 01 Jan 2024 00:00:00 GMT");

    let config = write_pair_config(tmp.path(), &server);
    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--yes"])
        .assert()
        .success();

    head_a.delete();
    serve_head(&server, "/a.bin", 1024, "Tue, 02 Jan 2024 00:00:00 GMT");
    fs::remove_file(tmp.path().join("b.bin")).expect("remove b");

    bin()
        .arg("-c")
        .arg(&config)
        .arg("refresh")
        .assert()
        .success()
        .stdout(predicate::str::contains("a drifted: last_modified, size"))
        .stdout(predicate::str::contains("b is gone"));

    let state = read_state(tmp.path());
    assert_eq!(state["serial"], 2);
    assert_eq!(state["resources"]["a"]["size"], 1024);
    assert_eq!(
        state["resources"]["a"]["last_modified"],
        "Tue, 02 Jan 2024 00:00:00 GMT"
    );
    assert!(state["resources"].get("b").is_none());

    // nothing downloaded or recreated
    get_a.assert_hits(1);
    get_b.assert_hits(1);
    assert_eq!(fs::metadata(tmp.path().join("a.bin")).expect("a").len(), 512);
    assert!(!tmp.path().join("b.bin").exists());
}

#[test]
fn target_applies_only_the_named_resource() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tmpdir");
    let get_a = serve_get(&server, "/a.bin", 100);
    let get_b = serve_get(&server, "/b.bin", 200);
    serve_head(&server, "/a.bin", 100, "Mon, 01 Jan 2024 00:00:00 GMT");
    serve_head(&server, "/b.bin", 200, "Mon, 01 Jan 2024 00:00:00 GMT");

    let config = write_pair_config(tmp.path(), &server);
    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--yes", "--target", "b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 created"));

    get_a.assert_hits(0);
    assert!(!tmp.path().join("a.bin").exists());
    let state = read_state(tmp.path());
    assert!(state["resources"].get("a").is_none());
    assert_eq!(state["resources"]["b"]["size"], 200);

    bin()
        .arg("-c")
        .arg(&config)
        .args(["apply", "--yes", "--target", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 created"));

    get_a.assert_hits(1);
    get_b.assert_hits(1);
    let state = read_state(tmp.path());
    assert_eq!(state["resources"]["a"]["size"], 100);
    assert_eq!(state["resources"]["b"]["size"], 200);
}

#[test]
fn timeout_fails_slow_download() {
    let server = MockServer::start();
    let tmp = tempdir().expect("tmpdir");
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .delay(std::time::Duration::from_secs(3))
            .body("late");
    });

    let config = write_config(tmp.path(), &server.url("/slow"));
    bin()
        .arg("-c")
        .arg(&config)
        .args(["--timeout", "1", "apply", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("change(s) failed"));

    assert!(!tmp.path().join("out/artifact.bin").exists());
    assert_eq!(read_state(tmp.path())["resources"], serde_json::json!({}));
}
