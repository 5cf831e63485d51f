use std::path::{Path, PathBuf};

use tempfile::tempdir;
use verup::{
    config::PublishConfig,
    errors::VerupError,
    hasher::ChecksumAlgo,
    resolver::DEFAULT_PROBE_BUDGET,
};

fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("publish.json");
    std::fs::write(&path, body).unwrap();
    (dir, path)
}

#[test]
fn test_empty_config_uses_defaults() {
    let (_dir, path) = write_config("{}");
    let config = PublishConfig::load_from_file(&path).unwrap();

    assert!(config.publish_template.is_none());
    assert!(config.compiled_work_template.is_none());
    assert_eq!(config.probe_budget, DEFAULT_PROBE_BUDGET);
    assert_eq!(config.checksum, ChecksumAlgo::Blake3);
    assert!(config.bump_after_publish);
    assert_eq!(config.resolver().budget(), DEFAULT_PROBE_BUDGET);
}

#[test]
fn test_full_config() {
    let (_dir, path) = write_config(
        r#"{
            "publish_template": "{dir}/../publish/{name}",
            "work_template": "/work/.*_v[0-9]+\\.nk$",
            "ledger_path": "/tmp/verup/ledger.jsonl",
            "probe_budget": 50,
            "checksum": "sha256",
            "tags": ["comp", "review"],
            "bump_after_publish": false
        }"#,
    );
    let config = PublishConfig::load_from_file(&path).unwrap();

    assert!(config.compiled_publish_template.is_some());
    assert_eq!(config.checksum, ChecksumAlgo::Sha256);
    assert_eq!(config.tags, vec!["comp".to_string(), "review".to_string()]);
    assert_eq!(config.resolver().budget(), 50);
    assert!(!config.bump_after_publish);
    assert_eq!(config.ledger_path, Some(PathBuf::from("/tmp/verup/ledger.jsonl")));

    assert_eq!(config.matches_work_template(Path::new("/show/work/comp_v001.nk")), Some(true));
    assert_eq!(config.matches_work_template(Path::new("/show/tmp/comp.nk")), Some(false));
}

#[test]
fn test_no_work_template_matches_nothing() {
    let config = PublishConfig::default().compile().unwrap();
    assert_eq!(config.matches_work_template(Path::new("/any/comp_v001.nk")), None);
}

#[test]
fn test_bad_json_reports_path() {
    let (_dir, path) = write_config("{ not json");
    let err = PublishConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, VerupError::Json { path: p, .. } if p == path));
}

#[test]
fn test_bad_regex() {
    let (_dir, path) = write_config(r#"{ "work_template": "([a-z" }"#);
    let err = PublishConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, VerupError::Regex { .. }));
}

#[test]
fn test_unknown_template_token() {
    let (_dir, path) = write_config(r#"{ "publish_template": "{project}/{name}" }"#);
    let err = PublishConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, VerupError::InvalidTemplate { .. }));
}

#[test]
fn test_zero_budget_rejected() {
    let (_dir, path) = write_config(r#"{ "probe_budget": 0 }"#);
    let err = PublishConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, VerupError::Config(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = PublishConfig::load_from_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, VerupError::Io(_)));
}
