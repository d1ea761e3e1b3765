//! Integration tests for the command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ussg-parser"));
    cmd.env_remove("LLM_API_KEY").env_remove("ANTHROPIC_API_KEY");
    cmd
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("section"))
        .stdout(predicate::str::contains("chapter"));
}

#[test]
fn test_scan_empty_corpus() {
    let pdf_dir = TempDir::new().unwrap();

    cli()
        .arg("scan")
        .arg("--pdf-dir")
        .arg(pdf_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 0 sections"));
}

#[test]
fn test_section_rejects_invalid_id() {
    cli()
        .args(["section", "K2.1", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid section identifier: 'K2.1'"));
}

#[test]
fn test_section_not_found_in_empty_corpus() {
    let pdf_dir = TempDir::new().unwrap();

    cli()
        .args(["section", "2K2.1", "--dry-run", "--pdf-dir"])
        .arg(pdf_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Section 2K2.1 not found"));
}

#[test]
fn test_chapter_without_sections() {
    let pdf_dir = TempDir::new().unwrap();

    cli()
        .args(["chapter", "2K", "--dry-run", "--pdf-dir"])
        .arg(pdf_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No sections found for chapter 2K"));
}

#[test]
fn test_chapter_requires_api_key() {
    let pdf_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    cli()
        .args(["chapter", "2K", "--pdf-dir"])
        .arg(pdf_dir.path())
        .arg("--output-dir")
        .arg(output_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("LLM_API_KEY"));

    assert!(!output_dir.path().join("2K.json").exists());
}

#[test]
fn test_chapter_rejects_invalid_chapter() {
    cli()
        .args(["chapter", "2K2", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid chapter: '2K2'"));
}
