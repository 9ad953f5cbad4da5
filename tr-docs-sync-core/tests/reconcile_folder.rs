use std::fs;

use tempfile::tempdir;
use tr_docs_sync_core::reconcile::{reconcile_download_folder, ReconcileOutcome};

#[test]
fn removes_non_empty_download_folder() {
    let temp = tempdir().unwrap();
    let target = temp.path().join("downloads");
    fs::create_dir_all(target.join("2024").join("01")).unwrap();
    fs::write(target.join("2024").join("01").join("statement.pdf"), b"pdf").unwrap();
    fs::write(target.join("all_events.json"), b"[]").unwrap();

    let outcome = reconcile_download_folder(&target).expect("reconcile should succeed");

    assert_eq!(outcome, ReconcileOutcome::Removed);
    assert!(!target.exists(), "non-empty folder should be gone");
}

#[test]
fn leaves_empty_folder_in_place() {
    let temp = tempdir().unwrap();
    let target = temp.path().join("downloads");
    fs::create_dir(&target).unwrap();

    let outcome = reconcile_download_folder(&target).expect("reconcile should succeed");

    assert_eq!(outcome, ReconcileOutcome::Empty);
    assert!(target.is_dir());
}

#[test]
fn absent_folder_is_a_no_op() {
    let temp = tempdir().unwrap();
    let target = temp.path().join("never-created");

    let outcome = reconcile_download_folder(&target).expect("reconcile should succeed");

    assert_eq!(outcome, ReconcileOutcome::Absent);
    assert!(!target.exists());
}

#[test]
fn plain_file_at_download_path_is_not_touched() {
    let temp = tempdir().unwrap();
    let target = temp.path().join("downloads");
    fs::write(&target, b"not a folder").unwrap();

    let outcome = reconcile_download_folder(&target).expect("reconcile should succeed");

    assert_eq!(outcome, ReconcileOutcome::Absent);
    assert_eq!(fs::read(&target).unwrap(), b"not a folder");
}

#[test]
fn running_twice_is_stable() {
    let temp = tempdir().unwrap();
    let target = temp.path().join("downloads");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("doc.pdf"), b"pdf").unwrap();

    assert_eq!(
        reconcile_download_folder(&target).unwrap(),
        ReconcileOutcome::Removed
    );
    assert_eq!(
        reconcile_download_folder(&target).unwrap(),
        ReconcileOutcome::Absent
    );
}
