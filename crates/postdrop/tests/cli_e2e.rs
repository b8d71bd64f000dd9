#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

/// A command isolated from the caller's environment and config files.
fn postdrop_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("postdrop"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("GITHUB_TOKEN")
        .env_remove("POSTDROP_OWNER")
        .env_remove("POSTDROP_REPO")
        .env_remove("POSTDROP_BRANCH")
        .env_remove("POSTDROP_API_BASE");
    cmd
}

fn write_posts(dir: &TempDir) {
    let posts = dir.path().join("drafts");
    fs::create_dir_all(&posts).unwrap();
    fs::write(
        posts.join("2024-01-15-hello.md"),
        "---\ntitle: Hello\ntags: [rust]\n---\n\nFirst post.\n",
    )
    .unwrap();
    fs::write(
        posts.join("weekend notes.md"),
        "---\ntitle: Weekend Notes\ndate: 2024-02-03 10:00:00 +0000\n---\nNotes.\n",
    )
    .unwrap();
    fs::write(posts.join("ignore.txt"), "not a post").unwrap();
}

#[test]
fn test_inspect_shows_metadata_and_candidates() {
    let dir = TempDir::new().unwrap();
    write_posts(&dir);

    postdrop_cmd(&dir)
        .args(["inspect", "drafts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-15-hello.md"))
        .stdout(predicate::str::contains("title:      Hello"))
        .stdout(predicate::str::contains("tags:       rust"))
        .stdout(predicate::str::contains("--rename uses 2024-02-03-weekend-notes.md"))
        .stdout(predicate::str::contains("ignore.txt").not());
}

#[test]
fn test_inspect_reports_broken_header() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.md"), "---\ntitle: [oops\n---\nBody\n").unwrap();

    postdrop_cmd(&dir)
        .args(["inspect", "broken.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid YAML header"))
        .stdout(predicate::str::contains("title:      Broken"));
}

#[test]
fn test_dry_run_needs_no_token() {
    let dir = TempDir::new().unwrap();
    write_posts(&dir);

    postdrop_cmd(&dir)
        .args(["publish", "drafts", "--rename", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would publish _posts/2024-01-15-hello.md"))
        .stdout(predicate::str::contains(
            "Would publish _posts/2024-02-03-weekend-notes.md",
        ))
        .stdout(predicate::str::contains("nothing written"));
}

#[test]
fn test_project_config_file_sets_posts_dir() {
    let dir = TempDir::new().unwrap();
    write_posts(&dir);
    fs::write(dir.path().join("postdrop.toml"), "posts_dir = \"site/_posts\"\n").unwrap();

    postdrop_cmd(&dir)
        .args(["publish", "drafts/2024-01-15-hello.md", "--dry-run", "--branch", "gh-pages"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Would publish site/_posts/2024-01-15-hello.md",
        ))
        .stdout(predicate::str::contains("on gh-pages"));
}

#[test]
fn test_publish_without_token_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    write_posts(&dir);

    postdrop_cmd(&dir)
        .args(["publish", "drafts", "--owner", "octo", "--repo", "site"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Configuration incomplete"))
        .stderr(predicate::str::contains("token"));
}

#[test]
fn test_publish_with_nothing_to_read() {
    let dir = TempDir::new().unwrap();

    postdrop_cmd(&dir)
        .args(["publish", "missing.md"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Path not found"))
        .stderr(predicate::str::contains("no posts to publish"));
}

#[test]
fn test_config_masks_token_and_applies_overrides() {
    let dir = TempDir::new().unwrap();

    postdrop_cmd(&dir)
        .env("GITHUB_TOKEN", "ghp_supersecret1234")
        .env("POSTDROP_REPO", "from-env")
        .args(["config", "--owner", "octo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("****1234"))
        .stdout(predicate::str::contains("supersecret").not())
        .stdout(predicate::str::contains("octo"))
        .stdout(predicate::str::contains("from-env"));
}

#[test]
fn test_dotenv_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "POSTDROP_OWNER=dotenv-owner\n").unwrap();

    postdrop_cmd(&dir)
        .args(["config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dotenv-owner"));
}

/// Answers one connection per `(status, body)` pair and returns the
/// request lines it saw.
fn github_stub(replies: Vec<(&'static str, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0u8; length];
            reader.read_exact(&mut request_body).unwrap();

            write!(
                stream,
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            seen.push(request_line.trim_end().to_string());
        }
        seen
    });

    (base, handle)
}

#[test]
fn test_publish_reports_progress_and_ledger() {
    let dir = TempDir::new().unwrap();
    write_posts(&dir);
    let (base, server) = github_stub(vec![
        ("404 Not Found", r#"{"message":"Not Found"}"#),
        (
            "201 Created",
            r#"{"content":{"sha":"abc","html_url":"https://github.com/octo/site/blob/main/_posts/2024-01-15-hello.md"}}"#,
        ),
    ]);

    postdrop_cmd(&dir)
        .env("GITHUB_TOKEN", "ghp_token\n")
        .env("POSTDROP_API_BASE", &base)
        .args(["publish", "drafts/2024-01-15-hello.md", "--owner", " octo ", "--repo", "site"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[1/1] published"))
        .stdout(predicate::str::contains("Created 2024-01-15-hello.md"))
        .stdout(predicate::str::contains("1 created, 0 updated, 0 failed"));

    let seen = server.join().unwrap();
    assert!(seen[0].starts_with("GET /repos/octo/site/contents/_posts/2024-01-15-hello.md"));
    assert!(seen[1].starts_with("PUT /repos/octo/site/contents/_posts/2024-01-15-hello.md"));
}
