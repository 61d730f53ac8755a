use std::fs;
use std::path::Path;

use predicates::prelude::*;
use tempfile::tempdir;

fn archibon(home: &Path, root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("archibon");
    // keep the operator's own config file out of the way
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .arg("--root")
        .arg(root);
    cmd
}

fn archive(home: &Path, root: &Path, note: &Path, date: &str) {
    archibon(home, root)
        .arg("archive")
        .arg(note)
        .args(["--client", "Acme", "--site", "SiteA", "--equipment", "Crane1"])
        .args(["--date", date])
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived to"));
}

#[test]
fn archive_files_note_and_records_history() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("archive");
    let note = tmp.path().join("bl 42.pdf");
    fs::write(&note, b"%PDF-1.4 not really a pdf").expect("write note");

    archive(tmp.path(), &root, &note, "2025-10-15");

    let archived = root.join("oct25/Acme/SiteA/Crane1/Acme_SiteA_Crane1_bl 42.pdf");
    assert!(archived.is_file());

    let ledger = fs::read_to_string(root.join("historique.csv")).expect("read ledger");
    assert_eq!(ledger.lines().count(), 2);
    assert!(ledger.contains("oct25;Acme;SiteA;Crane1;Acme_SiteA_Crane1_bl 42.pdf"));

    archibon(tmp.path(), &root)
        .args(["history", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"client\": \"Acme\""));
}

#[test]
fn archive_without_fields_fails_and_writes_nothing() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("archive");
    let note = tmp.path().join("bl.pdf");
    fs::write(&note, b"%PDF-1.4 not really a pdf").expect("write note");

    archibon(tmp.path(), &root)
        .arg("archive")
        .arg(&note)
        .args(["--client", "Acme", "--site", "SiteA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required field: equipment"));

    assert!(!root.join("historique.csv").exists());
}

#[test]
fn invoices_list_and_bundle() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("archive");
    let note = tmp.path().join("bl.pdf");
    fs::write(&note, b"%PDF-1.4").expect("write note");
    archive(tmp.path(), &root, &note, "2025-10-15");

    archibon(tmp.path(), &root)
        .args(["invoices", "list", "--month", "oct25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oct25 / Acme / SiteA / Crane1"));

    let archived = root.join("oct25/Acme/SiteA/Crane1/Acme_SiteA_Crane1_bl.pdf");
    let gone = root.join("oct25/Acme/SiteA/Crane1/gone.pdf");
    archibon(tmp.path(), &root)
        .args(["invoices", "bundle", "F-2025-104"])
        .arg(&archived)
        .arg(&gone)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 documents moved"));

    assert!(root.join("Factures/F-2025-104/Acme_SiteA_Crane1_bl.pdf").is_file());
    assert!(!archived.exists());
}

#[test]
fn month_lists_recent_documents() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("archive");
    let note = tmp.path().join("bl.pdf");
    fs::write(&note, b"%PDF-1.4").expect("write note");
    archive(tmp.path(), &root, &note, "2025-10-15");

    archibon(tmp.path(), &root)
        .arg("month")
        .assert()
        .success()
        .stdout(predicate::str::contains("Acme / SiteA / Crane1"));
}

#[test]
fn fetch_refuses_paths_outside_archive() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("archive");
    fs::create_dir_all(&root).expect("mkdir root");
    fs::write(tmp.path().join("secret.pdf"), b"%PDF-1.4").expect("write secret");

    archibon(tmp.path(), &root)
        .args(["fetch", "../secret.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("forbidden path"));

    archibon(tmp.path(), &root)
        .args(["fetch", "nope.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn fetch_copies_archived_pdf() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("archive");
    let note = tmp.path().join("bl.pdf");
    fs::write(&note, b"%PDF-1.4 body").expect("write note");
    archive(tmp.path(), &root, &note, "2025-10-15");

    let out = tmp.path().join("copy.pdf");
    archibon(tmp.path(), &root)
        .args(["fetch", "oct25/Acme/SiteA/Crane1/Acme_SiteA_Crane1_bl.pdf", "--output"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(fs::read(out).expect("read copy"), b"%PDF-1.4 body");
}

#[test]
fn config_set_then_get() {
    let tmp = tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");

    assert_cmd::cargo::cargo_bin_cmd!("archibon")
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("archibon")
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "classification.require_reference_date", "true"])
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("archibon")
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "classification.require_reference_date"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));
}
