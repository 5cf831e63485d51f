use std::{path::PathBuf, sync::Arc};

use tempfile::tempdir;
use verup::{
    config::PublishConfig,
    errors::VerupError,
    publisher::Publisher,
    registry::JsonLedger,
    session::{FileSession, SessionHost},
    version::VersionNumber,
};

use test_utils::{touch, write_script, MemoryRegistry};

fn n(number: u64) -> VersionNumber {
    VersionNumber::from(number)
}

fn config() -> PublishConfig {
    PublishConfig::default().compile().unwrap()
}

fn config_from(json: &str) -> PublishConfig {
    serde_json::from_str::<PublishConfig>(json).unwrap().compile().unwrap()
}

#[tokio::test]
async fn test_publish_and_bump() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("work/comp_v001.nk"), "Root {}\n");
    let registry = MemoryRegistry::default();

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(registry.clone()), config());
    let outcome = publisher.run().await.unwrap();

    let record = outcome.record.unwrap();
    assert_eq!(record.version, Some(n(1)));
    assert_eq!(record.publish_path, work);
    assert_eq!(record.checksum, blake3::hash(b"Root {}\n").to_hex().to_string());
    assert_eq!(record.checksum_algo, "blake3");

    let next = dir.path().join("work/comp_v002.nk");
    assert_eq!(outcome.next_version, Some((next.clone(), n(2))));
    assert!(next.exists());
    assert_eq!(std::fs::read_to_string(&next).unwrap(), "Root {}\n");
    assert_eq!(publisher.session().current_path(), Some(next));
    assert_eq!(registry.records().len(), 1);
}

#[tokio::test]
async fn test_publish_template_copies_file() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("sh010/work/comp_v004.nk"), "Root {}\n");
    let registry = MemoryRegistry::default();
    let config = config_from(r#"{ "publish_template": "{dir}/../publish/v{version}/{stem}.{ext}" }"#);

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(registry.clone()), config);
    let outcome = publisher.run().await.unwrap();

    let expected = dir.path().join("sh010/work/../publish/v004/comp_v004.nk");
    assert_eq!(outcome.item.publish_path, expected);
    assert!(expected.exists());
    assert_eq!(registry.records()[0].path, work);
}

#[tokio::test]
async fn test_validate_reports_next_free_version() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp_v001.nk"), "Root {}\n");
    touch(&dir.path().join("comp_v002.nk"));
    touch(&dir.path().join("comp_v003.nk"));

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(MemoryRegistry::default()), config());
    let err = publisher.validate().await.unwrap_err();
    let (free, version) = match err {
        VerupError::NextVersionExists { path, version } => (path, version),
        other => panic!("unexpected error: {other:?}"),
    };
    assert_eq!(free, dir.path().join("comp_v004.nk"));
    assert_eq!(version, n(4));

    // Taking the offered version lets the publish go through
    publisher.save_session_to(&free).await.unwrap();
    let outcome = publisher.run().await.unwrap();
    assert_eq!(outcome.item.version, Some(n(4)));
    assert_eq!(outcome.next_version, Some((dir.path().join("comp_v005.nk"), n(5))));
}

#[tokio::test]
async fn test_unsaved_session() {
    let publisher = Publisher::new(FileSession::unsaved(), Arc::new(MemoryRegistry::default()), config());

    let acceptance = publisher.accept();
    assert!(acceptance.accepted);
    assert!(!acceptance.saved);

    let err = publisher.validate().await.unwrap_err();
    assert!(matches!(err, VerupError::SessionNotSaved));
}

#[tokio::test]
async fn test_unversioned_file_is_published_but_not_bumped() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp_final.nk"), "Root {}\n");
    let registry = MemoryRegistry::default();

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(registry.clone()), config());
    let outcome = publisher.run().await.unwrap();

    assert_eq!(outcome.record.unwrap().version, None);
    assert_eq!(outcome.next_version, None);
    assert_eq!(publisher.session().current_path(), Some(work));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp_v001.nk"), "Root {}\n");
    let registry = MemoryRegistry::default();
    let config = config_from(r#"{ "publish_template": "{dir}/publish/{name}" }"#);

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(registry.clone()), config)
        .dry_run(true);
    let outcome = publisher.run().await.unwrap();

    assert!(outcome.record.is_none());
    assert_eq!(outcome.next_version, Some((dir.path().join("comp_v002.nk"), n(2))));
    assert!(!dir.path().join("publish").exists());
    assert!(!dir.path().join("comp_v002.nk").exists());
    assert!(registry.records().is_empty());
}

#[tokio::test]
async fn test_dependencies_are_normalized() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp_v001.nk"), "Root {}\n");
    let registry = MemoryRegistry::default();
    let session = FileSession::open(&work).with_dependencies([
        "/show/plates//bg.%04d.exr",
        "/show/plates/bg.%04d.exr/",
        "",
        "/show/plates/fg.%04d.exr",
    ]);

    let mut publisher = Publisher::new(session, Arc::new(registry.clone()), config());
    publisher.run().await.unwrap();

    assert_eq!(
        registry.records()[0].dependencies,
        vec![
            PathBuf::from("/show/plates/bg.%04d.exr"),
            PathBuf::from("/show/plates/fg.%04d.exr"),
        ]
    );
}

#[tokio::test]
async fn test_previous_publishes_are_counted() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp.nk"), "Root {}\n");
    let ledger = Arc::new(JsonLedger::new(dir.path().join("ledger.jsonl")));

    for expected in 0..3 {
        let mut publisher = Publisher::new(FileSession::open(&work), ledger.clone(), config());
        let mut item = publisher.validate().await.unwrap();
        assert_eq!(item.previous_publishes, expected);
        publisher.publish(&mut item).await.unwrap();
    }
    assert_eq!(ledger.all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_registry_failure_stops_before_bump() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp_v001.nk"), "Root {}\n");

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(MemoryRegistry::failing()), config());
    let err = publisher.run().await.unwrap_err();

    assert!(matches!(err, VerupError::Registry(_)));
    assert!(!dir.path().join("comp_v002.nk").exists());
    assert_eq!(publisher.session().current_path(), Some(work));
}

#[tokio::test]
async fn test_bump_can_be_disabled() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("comp_v001.nk"), "Root {}\n");
    let config = config_from(r#"{ "bump_after_publish": false, "checksum": "sha256" }"#);

    let mut publisher = Publisher::new(FileSession::open(&work), Arc::new(MemoryRegistry::default()), config);
    let outcome = publisher.run().await.unwrap();

    assert_eq!(outcome.next_version, None);
    assert_eq!(outcome.record.unwrap().checksum_algo, "sha256");
    assert!(!dir.path().join("comp_v002.nk").exists());
}

#[tokio::test]
async fn test_work_template_mismatch_only_warns() {
    let dir = tempdir().unwrap();
    let work = write_script(&dir.path().join("scratch/comp_v001.nk"), "Root {}\n");
    let config = config_from(r#"{ "work_template": "/work/[^/]+_v[0-9]+\\.nk$" }"#);

    let publisher = Publisher::new(FileSession::open(&work), Arc::new(MemoryRegistry::default()), config);
    let item = publisher.validate().await.unwrap();
    assert_eq!(item.template_matched, Some(false));
}
