//! Integration tests for the full migration pipeline.
//!
//! These run the whole pass sequence over the testdata fixture, through
//! the public `migrate` entry point, against files in a temp directory.

use std::fs;
use std::path::PathBuf;

use mockshift::{migrate, MigrateOptions};

fn fixture_source() -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/AccountServiceTest.cs");
    fs::read_to_string(path).expect("fixture should exist")
}

fn options() -> MigrateOptions {
    MigrateOptions {
        dry_run: false,
        quiet: true,
    }
}

#[test]
fn test_migrate_rewrites_the_fixture() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("Banking.Tests")).unwrap();
    let file = dir.path().join("Banking.Tests/AccountServiceTest.cs");
    fs::write(&file, fixture_source()).unwrap();

    let summary = migrate(dir.path(), &options()).unwrap();
    assert_eq!(summary.files_rewritten(), 1);
    assert!(!summary.has_failures());

    let output = fs::read_to_string(&file).unwrap();
    assert!(output.contains("using Moq;"));
    assert!(!output.contains("Rhino.Mocks"));
    assert!(output.contains("private Mock<IAccountService> _service;"));
    assert!(output.contains("_service = new Mock<IAccountService>();"));
    assert!(output.contains("_service.Setup (s => s.Deposit (100)).Verifiable();"));
    assert!(output.contains("_service.Setup (s => s.Balance ()).Returns (100);"));
    assert!(output.contains("_service.Setup (_ => _.Balance ()).Returns (5).Verifiable();"));
    assert!(output.contains("It.IsAny<string>()"));
    assert!(output.contains("Process (_service.Object);"));
    assert!(output.contains("_service.Verify ();"));
    assert!(!output.contains("Replay"));
    // Dropped `.Repeat.Any ()` surfaces as a warning.
    assert!(summary.warnings.iter().any(|w| w.message.contains("Repeat")));
}

#[test]
fn test_migration_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("AccountServiceTest.cs");
    fs::write(&file, fixture_source()).unwrap();

    migrate(dir.path(), &options()).unwrap();
    let first = fs::read_to_string(&file).unwrap();

    let second_run = migrate(dir.path(), &options()).unwrap();
    assert_eq!(second_run.files_rewritten(), 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), first);
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("AccountServiceTest.cs");
    fs::write(&file, fixture_source()).unwrap();

    let summary = migrate(
        dir.path(),
        &MigrateOptions {
            dry_run: true,
            quiet: true,
        },
    )
    .unwrap();
    assert_eq!(summary.files_rewritten(), 1);
    assert!(summary.dry_run);
    assert_eq!(fs::read_to_string(&file).unwrap(), fixture_source());
}

#[test]
fn test_byte_order_mark_survives() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("AccountServiceTest.cs");
    let mut bytes = b"\xef\xbb\xbf".to_vec();
    bytes.extend_from_slice(fixture_source().as_bytes());
    fs::write(&file, bytes).unwrap();

    migrate(dir.path(), &options()).unwrap();
    let rewritten = fs::read(&file).unwrap();
    assert!(rewritten.starts_with(b"\xef\xbb\xbf"));
    assert!(String::from_utf8(rewritten).unwrap().contains("using Moq;"));
}

#[test]
fn test_files_without_rhino_are_not_touched() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Plain.cs");
    let source = "using System;\n\npublic class Plain\n{\n}\n";
    fs::write(&file, source).unwrap();

    let summary = migrate(dir.path(), &options()).unwrap();
    assert_eq!(summary.files_rewritten(), 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), source);
}
