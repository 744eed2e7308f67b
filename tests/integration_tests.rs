//! Integration tests for the outreach CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const JANE_CSV: &str = "Name,Email,Company,Role,Tags,Status,Last Contacted\n\
Jane Doe,jane@acme.com,Acme,CTO,\"investor, warm\",Reached Out,2024-03-15\n";

/// Helper to get an outreach command with a fixed owner
fn outreach() -> Command {
    let mut cmd = Command::cargo_bin("outreach").unwrap();
    cmd.env("OUTREACH_OWNER", "tester")
        .env_remove("OUTREACH_DB")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    outreach().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

fn write_file(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn list_json(tmp: &TempDir) -> Vec<serde_json::Value> {
    let output = outreach()
        .current_dir(tmp.path())
        .args(["contacts", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    outreach()
        .current_dir(tmp.path())
        .args(["init", "--owner", "Ada"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized outreach workspace"));

    assert!(tmp.path().join(".outreach/config.yaml").is_file());
    assert!(tmp.path().join(".outreach/contacts.db").is_file());
    let config = fs::read_to_string(tmp.path().join(".outreach/config.yaml")).unwrap();
    assert!(config.contains("owner: \"Ada\""));
}

#[test]
fn test_init_twice_reports_existing() {
    let tmp = setup_workspace();
    outreach()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let tmp = TempDir::new().unwrap();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);
    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an outreach workspace"));
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_template() {
    outreach()
        .args(["import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Name,Email,Role,Company,Tags,Date of Contact,Status,LinkedIn URL",
        ));
}

#[test]
fn test_import_jane_doe_csv() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Contacts imported: 1"));

    let contacts = list_json(&tmp);
    assert_eq!(contacts.len(), 1);
    let jane = &contacts[0];
    assert_eq!(jane["name"], "Jane Doe");
    assert_eq!(jane["email"], "jane@acme.com");
    assert_eq!(jane["company"], "Acme");
    assert_eq!(jane["role"], "CTO");
    assert_eq!(jane["tags"], serde_json::json!(["investor", "warm"]));
    assert_eq!(jane["status"], "Reached Out");
    assert_eq!(jane["dateOfContact"], "2024-03-15");
    assert_eq!(jane["owner"], "tester");
}

#[test]
fn test_import_then_undo() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .arg("--undo")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 contact(s)"));

    assert!(list_json(&tmp).is_empty());
}

#[test]
fn test_import_json_report() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);

    let output = outreach()
        .current_dir(tmp.path())
        .args(["import", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["result"]["success"], true);
    assert_eq!(report["result"]["imported"], 1);
    assert_eq!(report["result"]["imported_ids"].as_array().unwrap().len(), 1);
    assert_eq!(report["validation"]["valid"], true);
}

#[test]
fn test_reimport_fails_on_duplicates_unless_skipped() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);
    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success();

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("already exist"))
        .stderr(predicate::str::contains("failed batch"));

    outreach()
        .current_dir(tmp.path())
        .args(["import", "--skip-duplicates", "--quiet"])
        .arg(&file)
        .assert()
        .success()
        .stdout("0\n");

    assert_eq!(list_json(&tmp).len(), 1);
}

#[test]
fn test_import_dry_run_writes_nothing() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);

    outreach()
        .current_dir(tmp.path())
        .args(["import", "--dry-run"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would import 1 contact(s)"));

    assert!(list_json(&tmp).is_empty());
}

#[test]
fn test_import_unsupported_file() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.txt", "Name\nJane\n");

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type"));
}

#[test]
fn test_import_without_date_column_uses_today() {
    let tmp = setup_workspace();
    let file = write_file(
        &tmp,
        "contacts.csv",
        "name,email,job title,tags\nJane Doe,jane@x.com,Engineer,\"ops,lead\"\n",
    );

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Contacts imported: 1"));

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let contacts = list_json(&tmp);
    assert_eq!(contacts.len(), 1);
    let jane = &contacts[0];
    assert_eq!(jane["role"], "Engineer");
    assert_eq!(jane["tags"], serde_json::json!(["ops", "lead"]));
    assert_eq!(jane["status"], "Not Started");
    assert_eq!(jane["dateOfContact"], today.as_str());
}

#[test]
fn test_undo_flag_after_empty_import_succeeds() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);
    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success();

    outreach()
        .current_dir(tmp.path())
        .args(["import", "--skip-duplicates", "--undo"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to undo"));

    assert_eq!(list_json(&tmp).len(), 1);
}

#[test]
fn test_import_requires_name_mapping() {
    let tmp = setup_workspace();
    let file = write_file(&tmp, "contacts.csv", "Email\njane@acme.com\n");

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Required fields must be mapped: name",
        ))
        .stdout(predicate::str::contains("must be mapped: name, dateOfContact").not())
        .stderr(predicate::str::contains("No valid rows to import"));
}

#[test]
fn test_strict_refuses_partially_valid_file() {
    let tmp = setup_workspace();
    let file = write_file(
        &tmp,
        "contacts.csv",
        "Name,Status,Date\nGood,Chatted,2024-01-02\nBad,Ghosted,2024-01-02\n",
    );

    outreach()
        .current_dir(tmp.path())
        .args(["import", "--strict"])
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Row 2: Invalid status: Ghosted"));
    assert!(list_json(&tmp).is_empty());

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Contacts imported: 1"));
    assert_eq!(list_json(&tmp).len(), 1);
}

#[test]
fn test_map_override_and_unmap() {
    let tmp = setup_workspace();
    let file = write_file(
        &tmp,
        "contacts.csv",
        "Who,When,Company\nJane Doe,03/15/2024,Acme\n",
    );

    outreach()
        .current_dir(tmp.path())
        .args(["import", "--map", "Who=name", "--map", "When=dateOfContact", "--unmap", "Company"])
        .arg(&file)
        .assert()
        .success();

    let contacts = list_json(&tmp);
    assert_eq!(contacts[0]["name"], "Jane Doe");
    assert_eq!(contacts[0]["dateOfContact"], "2024-03-15");
    assert!(contacts[0].get("company").is_none());
}

#[test]
fn test_import_xlsx_with_serial_dates() {
    let tmp = setup_workspace();
    let path = tmp.path().join("contacts.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Full Name").unwrap();
    sheet.write_string(0, 1, "Date of Contact").unwrap();
    sheet.write_string(0, 2, "Email").unwrap();
    sheet.write_string(1, 0, "Jane Doe").unwrap();
    sheet.write_number(1, 1, 45366.0).unwrap();
    sheet.write_string(2, 0, "No Mail").unwrap();
    sheet.write_number(2, 1, 45292.0).unwrap();
    workbook.save(&path).unwrap();

    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Contacts imported: 2"));

    let contacts = list_json(&tmp);
    assert_eq!(contacts.len(), 2);
    assert_eq!(contacts[0]["name"], "Jane Doe");
    assert_eq!(contacts[0]["dateOfContact"], "2024-03-15");
    assert_eq!(contacts[1]["name"], "No Mail");
    assert_eq!(contacts[1]["dateOfContact"], "2024-01-01");
    assert!(contacts[1].get("email").is_none());
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_preview_needs_no_workspace() {
    let tmp = TempDir::new().unwrap();
    let file = write_file(&tmp, "contacts.csv", JANE_CSV);

    outreach()
        .current_dir(tmp.path())
        .arg("preview")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Last Contacted"))
        .stdout(predicate::str::contains("dateOfContact"))
        .stdout(predicate::str::contains("Jane Doe"));

    assert!(!tmp.path().join(".outreach").exists());
}

#[test]
fn test_preview_json() {
    let tmp = TempDir::new().unwrap();
    let file = write_file(&tmp, "contacts.csv", "Name,Notes\nJane,hello\n");

    let output = outreach()
        .current_dir(tmp.path())
        .args(["preview", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let preview: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(preview["kind"], "csv");
    assert_eq!(preview["headers"], serde_json::json!(["Name", "Notes"]));
    assert_eq!(preview["validation"]["valid"], true);
    assert_eq!(preview["validation"]["valid_rows"].as_array().unwrap().len(), 1);

    let file = write_file(&tmp, "notes.csv", "Notes,Email
hello,jane@x.com
");
    let output = outreach()
        .current_dir(tmp.path())
        .args(["preview", "--format", "json"])
        .arg(&file)
        .output()
        .unwrap();
    let preview: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(preview["validation"]["valid"], false);
    assert_eq!(
        preview["validation"]["errors"],
        serde_json::json!(["Required fields must be mapped: name"])
    );
}

// ============================================================================
// Contacts
// ============================================================================

#[test]
fn test_contacts_list_filters() {
    let tmp = setup_workspace();
    let file = write_file(
        &tmp,
        "contacts.csv",
        "Name,Email,Tags,Status,Date\n\
         Ann,ann@x.com,vc,Chatted,2024-01-01\n\
         Bob,bob@x.com,\"vc, friend\",Responded,2024-01-02\n\
         Cat,cat@globex.com,,Responded,2024-01-03\n",
    );
    outreach()
        .current_dir(tmp.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success();

    outreach()
        .current_dir(tmp.path())
        .args(["contacts", "list", "--status", "responded", "--tag", "VC"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bob"))
        .stdout(predicate::str::contains("Ann").not())
        .stdout(predicate::str::contains("1 contact(s) found"));

    outreach()
        .current_dir(tmp.path())
        .args(["contacts", "list", "--search", "globex", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("CON-"));

    outreach()
        .current_dir(tmp.path())
        .args(["contacts", "list", "--status", "ghosted"])
        .assert()
        .failure();
}

#[test]
fn test_contacts_list_empty() {
    let tmp = setup_workspace();
    outreach()
        .current_dir(tmp.path())
        .args(["contacts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No contacts found."));
}

#[test]
fn test_completions() {
    outreach()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("outreach"));
}

#[test]
fn test_completions_for_documented_shells() {
    for shell in ["zsh", "fish", "elvish", "powershell"] {
        outreach()
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("outreach"))
            .stdout(predicate::str::contains("import"));
    }
}
