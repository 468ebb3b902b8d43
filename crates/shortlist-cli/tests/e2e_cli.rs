//! E2E tests for the `shortlist` binary that need no network access.
//!
//! Each test runs the binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Build a Command targeting the shortlist binary, rooted in `dir`.
fn shortlist_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("shortlist"));
    cmd.current_dir(dir);
    // Suppress tracing output that goes to stderr
    cmd.env("SHORTLIST_LOG", "error");
    cmd.env_remove("GEMINI_API_KEY");
    cmd.env_remove("PINECONE_API_KEY");
    cmd.env_remove("FORMAT");
    cmd.env_remove("SHORTLIST_TIMING");
    cmd
}

/// Write a job file and a resume directory under `dir`.
fn write_inputs(dir: &Path, job: &str, resumes: &[(&str, &str)]) {
    std::fs::write(dir.join("job.txt"), job).expect("write job");
    let resume_dir = dir.join("resumes");
    std::fs::create_dir_all(&resume_dir).expect("mkdir resumes");
    for (file, text) in resumes {
        std::fs::write(resume_dir.join(file), text).expect("write resume");
    }
}

/// Keep the offline index small.
fn write_small_config(dir: &Path) {
    let config_dir = dir.join(".shortlist");
    std::fs::create_dir_all(&config_dir).expect("mkdir config");
    std::fs::write(
        config_dir.join("config.toml"),
        "[retrieval]\ntop_k = 2\n\n[vector]\nbackend = \"sqlite\"\ndimension = 128\n",
    )
    .expect("write config");
}

fn sample_resumes() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "ada.txt",
            "Ada Byron\nStaff engineer building async rust services with tokio. 8 years experience.",
        ),
        (
            "bo.md",
            "Bo Chef\nHead pastry chef running a bakery kitchen. 12 years experience.",
        ),
        (
            "cy.txt",
            "Cy Young\nJunior rust developer, wasm hobby projects. 1 year experience.",
        ),
    ]
}

#[test]
fn blank_job_description_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path(), "   \n", &sample_resumes());

    shortlist_cmd(dir.path())
        .args(["retrieve", "--job", "job.txt", "--resumes", "resumes", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn empty_resume_directory_fails_with_json_envelope() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path(), "Rust engineer", &[]);

    let output = shortlist_cmd(dir.path())
        .args([
            "retrieve", "--job", "job.txt", "--resumes", "resumes", "--offline", "--json",
        ])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stderr).expect("error JSON on stderr");
    assert_eq!(json["error"]["error_code"], "E1002");
}

#[test]
fn missing_resume_directory_fails_with_code() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("job.txt"), "Rust engineer").expect("write job");

    shortlist_cmd(dir.path())
        .args(["retrieve", "--job", "job.txt", "--resumes", "nowhere", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn online_rank_without_credentials_fails_before_network() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path(), "Rust engineer", &sample_resumes());

    shortlist_cmd(dir.path())
        .args(["rank", "--job", "job.txt", "--resumes", "resumes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1004"))
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn malformed_config_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path(), "Rust engineer", &sample_resumes());
    std::fs::write(dir.path().join("bad.toml"), "[retrieval\ntop_k = ").expect("write");

    shortlist_cmd(dir.path())
        .args([
            "retrieve", "--job", "job.txt", "--resumes", "resumes", "--offline", "--config",
            "bad.toml",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1003"));
}

#[test]
fn completions_emit_script() {
    let dir = TempDir::new().expect("tempdir");
    shortlist_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shortlist"));
}

#[test]
fn offline_retrieve_emits_fused_shortlist() {
    let dir = TempDir::new().expect("tempdir");
    write_small_config(dir.path());
    write_inputs(
        dir.path(),
        "Senior rust engineer for async services with tokio",
        &sample_resumes(),
    );

    let output = shortlist_cmd(dir.path())
        .args([
            "retrieve",
            "--job",
            "job.txt",
            "--resumes",
            "resumes",
            "--offline",
            "--min-experience",
            "5",
            "--format",
            "json",
        ])
        .output()
        .expect("run");
    assert!(
        output.status.success(),
        "retrieve failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["job"]["min_experience_years"], 5);
    assert_eq!(json["index"]["size"], 3);

    let candidates = json["candidates"].as_array().expect("candidates");
    let names: Vec<&str> = candidates
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect();
    // Every resume surfaces: two dense hits, two keyword hits and both
    // experienced candidates through the metadata channel.
    assert_eq!(names.len(), 3, "{names:?}");
    assert!(names.contains(&"Ada Byron"));
    assert!(names.contains(&"Bo Chef"));

    let mut ids: Vec<u64> = candidates
        .iter()
        .map(|c| c["id"].as_u64().expect("id"))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3, "fused set must not repeat candidates");

    for (idx, candidate) in candidates.iter().enumerate() {
        assert_eq!(candidate["position"].as_u64(), Some(idx as u64 + 1));
    }

    let bo = candidates
        .iter()
        .find(|c| c["name"] == "Bo Chef")
        .expect("bo");
    assert_eq!(bo["ranks"]["metadata"], 2);
}

#[test]
fn offline_retrieve_text_output_has_header_row() {
    let dir = TempDir::new().expect("tempdir");
    write_small_config(dir.path());
    write_inputs(dir.path(), "rust tokio services", &sample_resumes());

    shortlist_cmd(dir.path())
        .args([
            "retrieve", "--job", "job.txt", "--resumes", "resumes", "--offline", "--format",
            "text",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pos\tid\tname\tyears\tchannels\torigin\n"));
}

#[test]
fn job_can_come_from_stdin() {
    let dir = TempDir::new().expect("tempdir");
    write_small_config(dir.path());
    write_inputs(dir.path(), "unused", &sample_resumes());

    let output = shortlist_cmd(dir.path())
        .args(["retrieve", "--job", "-", "--resumes", "resumes", "--offline", "--json"])
        .write_stdin("rust engineer, 3 years")
        .output()
        .expect("run");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["job"]["min_experience_years"], 3);
}
