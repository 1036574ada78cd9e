use std::{fs, io::Write};

use assert_cmd::Command;
use predicates::str::contains;
use sheet_entry::rule::{DuplicatePolicy, RuleSet, ValueType};
use tempfile::tempdir;

fn write_sample_csv() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("people.csv");
    let mut file = fs::File::create(&path).expect("create sample csv");
    writeln!(file, "Employee ID,Name,Email,Salary Amount").unwrap();
    writeln!(file, "e-1,Alice,alice@example.com,1000").unwrap();
    writeln!(file, "e-2,Bob,bob@example.com,2000").unwrap();
    (dir, path)
}

fn bin() -> Command {
    Command::cargo_bin("sheet-entry").expect("binary exists")
}

#[test]
fn probe_writes_inferred_rules_yaml() {
    let (dir, csv_path) = write_sample_csv();
    let rules_path = dir.path().join("rules.yaml");
    bin()
        .args([
            "probe",
            "-i",
            csv_path.to_str().unwrap(),
            "-r",
            rules_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let rules = RuleSet::load(&rules_path).expect("parse rules");
    assert_eq!(rules.len(), 4);
    assert_eq!(rules.columns[0].column.name, "Employee ID");
    assert_eq!(rules.columns[0].rule.duplicate_policy, DuplicatePolicy::Strict);
    assert_eq!(rules.columns[2].rule.value_type, ValueType::Email);
}

#[test]
fn check_rejects_invalid_rows_with_nonzero_exit() {
    let (_dir, csv_path) = write_sample_csv();
    bin()
        .args([
            "check",
            "-i",
            csv_path.to_str().unwrap(),
            "e-3",
            "Carol",
            "not-an-email",
            "3000",
        ])
        .assert()
        .failure()
        .stderr(contains("Validation failed"));
}

#[test]
fn append_validates_and_persists_the_row() {
    let (_dir, csv_path) = write_sample_csv();
    bin()
        .args([
            "append",
            "-i",
            csv_path.to_str().unwrap(),
            "e-3",
            "Carol",
            "carol@example.com",
            "3,000.5",
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.contains("e-3,Carol,carol@example.com,3000.5"));
}

#[test]
fn append_rejects_strict_duplicates() {
    let (_dir, csv_path) = write_sample_csv();
    bin()
        .args([
            "append",
            "-i",
            csv_path.to_str().unwrap(),
            "E-1",
            "Dup",
            "dup@example.com",
            "10",
        ])
        .assert()
        .failure()
        .stderr(contains("Validation failed"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(!contents.contains("Dup"));
}

#[test]
fn warned_append_declines_without_force() {
    let (dir, csv_path) = write_sample_csv();
    let rules_path = dir.path().join("rules.yaml");
    bin()
        .args([
            "probe",
            "-i",
            csv_path.to_str().unwrap(),
            "-r",
            rules_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    // Downgrade the Name column to a warn policy via the rules file.
    let mut rules = RuleSet::load(&rules_path).unwrap();
    rules.set_duplicate_policy(2, DuplicatePolicy::Warn).unwrap();
    rules.save(&rules_path).unwrap();

    let args = [
        "append",
        "-i",
        csv_path.to_str().unwrap(),
        "-r",
        rules_path.to_str().unwrap(),
        "e-3",
        "alice",
        "alice2@example.com",
        "500",
    ];

    bin()
        .args(args)
        .assert()
        .failure()
        .stderr(contains("--force"));
    assert!(!fs::read_to_string(&csv_path).unwrap().contains("alice2"));

    bin().args(args).arg("--force").assert().success();
    assert!(fs::read_to_string(&csv_path).unwrap().contains("alice2"));
}

#[test]
fn update_and_delete_modify_rows_in_place() {
    let (_dir, csv_path) = write_sample_csv();
    bin()
        .args([
            "update",
            "-i",
            csv_path.to_str().unwrap(),
            "--row",
            "2",
            "e-2",
            "Robert",
            "bob@example.com",
            "2500",
        ])
        .assert()
        .success();
    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.contains("e-2,Robert,bob@example.com,2500"));
    assert!(!contents.contains("Bob"));

    bin()
        .args(["delete", "-i", csv_path.to_str().unwrap(), "--row", "1"])
        .assert()
        .success();
    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(!contents.contains("Alice"));
    assert!(contents.contains("Robert"));
}
