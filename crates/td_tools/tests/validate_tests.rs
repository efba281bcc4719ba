//! Directory validation tests.

use std::fs;
use std::path::PathBuf;

use td_test_utils::fixtures::{green_plains, single_lane};
use td_tools::validate::validate_path;

#[test]
fn bundled_levels_are_valid() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels");
    let report = validate_path(&dir).unwrap();
    assert!(report.files.len() >= 2);
    assert!(report.is_valid(), "{:?}", report.files);
}

#[test]
fn directory_reports_each_bad_file() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(
        dir.path().join("a_good.json"),
        green_plains().to_json_string().unwrap(),
    )
    .unwrap();

    let mut broken = single_lane(1, 1);
    broken.lives = 0;
    broken.waves[0].spawns[0].enemy_type = "dragon".to_string();
    fs::write(
        dir.path().join("b_bad.json"),
        broken.to_json_string().unwrap(),
    )
    .unwrap();

    fs::write(dir.path().join("c_garbage.ron"), "not a level").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let report = validate_path(dir.path()).unwrap();
    assert_eq!(report.files.len(), 3);
    assert!(!report.is_valid());

    let failed: Vec<_> = report
        .failures()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(failed, vec!["b_bad.json", "c_garbage.ron"]);

    let bad = &report.files[1];
    assert!(bad.issues.len() >= 2);
    assert!(bad.issues.iter().any(|issue| issue.contains("dragon")));
}

#[test]
fn single_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lane.json");
    fs::write(&path, single_lane(3, 2).to_json_string().unwrap()).unwrap();

    let report = validate_path(&path).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(report.is_valid());
}
