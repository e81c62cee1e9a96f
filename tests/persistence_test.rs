#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

mod common;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // First run creates the invoice and takes a partial payment
    let first = common::commands_file(&["create, INV-1, 100, standard", "pay, INV-1, 40,"]);
    let output1 = Command::new(cargo_bin!("invoice-ledger"))
        .arg(first.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("INV-1,standard,100,0,40,1,partially_paid"));

    // Second run settles it against the recovered state
    let second = common::commands_file(&["pay, INV-1, 60,"]);
    let output2 = Command::new(cargo_bin!("invoice-ledger"))
        .arg(second.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("INV-1,standard,100,0,100,2,paid"));
}
