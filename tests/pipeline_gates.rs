// tests/pipeline_gates.rs

mod common;
use crate::common::{harness, init_tracing};

use std::path::Path;

use watchf::engine::Disposition;
use watchf::fs::mock::MockFileSystem;
use watchf::types::{RawEvent, RawEventKind};
use watchf_test_utils::ConfigBuilder;

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/w/main.go", b"package main".to_vec());
    fs.add_file("/w/README.md", b"# readme".to_vec());
    fs
}

#[tokio::test]
async fn non_matching_paths_never_reach_the_runner() {
    init_tracing();
    let cfg = ConfigBuilder::new().pattern(r".*\.go$").command("build %f").build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    for kind in [
        RawEventKind::Create,
        RawEventKind::Modify,
        RawEventKind::Delete,
        RawEventKind::Rename,
    ] {
        let disposition = h
            .pipeline
            .handle(RawEvent::new("/w/README.md", kind))
            .await;
        assert_eq!(disposition, Disposition::DroppedByPattern);
    }

    assert_eq!(h.backend.count(), 0);
}

#[tokio::test]
async fn attribute_changes_are_dropped_even_with_modify_in_the_mask() {
    init_tracing();
    let cfg = ConfigBuilder::new().events(&["modify"]).command("build").build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let disposition = h
        .pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::AttributeChange))
        .await;
    assert_eq!(disposition, Disposition::DroppedByType);

    let disposition = h
        .pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::Create))
        .await;
    assert_eq!(disposition, Disposition::DroppedByType);

    assert_eq!(h.backend.count(), 0);
}

#[tokio::test]
async fn repeated_identical_writes_run_the_commands_once() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .events(&["modify"])
        .pattern(r".*\.go$")
        .command("go build")
        .build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let first = h
        .pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::Modify))
        .await;
    let second = h
        .pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::Modify))
        .await;

    assert!(first.executed());
    assert_eq!(second, Disposition::Unchanged);
    assert_eq!(h.backend.executed(), vec!["go build"]);
}

#[tokio::test]
async fn every_changed_event_executes_without_an_interval() {
    init_tracing();
    let cfg = ConfigBuilder::new().command("echo %t %f").build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    for content in ["one", "two", "three"] {
        h.fs.add_file("/w/main.go", content.as_bytes().to_vec());
        let disposition = h
            .pipeline
            .handle(RawEvent::new("/w/main.go", RawEventKind::Modify))
            .await;
        assert!(disposition.executed());
    }
    let disposition = h
        .pipeline
        .handle(RawEvent::new("/w/new.go", RawEventKind::Create))
        .await;
    assert!(disposition.executed());

    assert_eq!(
        h.backend.executed(),
        vec![
            "echo modify /w/main.go",
            "echo modify /w/main.go",
            "echo modify /w/main.go",
            "echo create /w/new.go",
        ]
    );
}

#[tokio::test]
async fn events_inside_the_interval_are_suppressed() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .interval("1h")
        .command("notify %f")
        .build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let first = h
        .pipeline
        .handle(RawEvent::new("/w/a.txt", RawEventKind::Create))
        .await;
    let second = h
        .pipeline
        .handle(RawEvent::new("/w/b.txt", RawEventKind::Delete))
        .await;

    assert!(first.executed());
    assert_eq!(second, Disposition::Suppressed);
    assert_eq!(h.backend.executed(), vec!["notify /w/a.txt"]);
}

#[tokio::test]
async fn unreadable_modify_fails_closed_and_keeps_the_clock() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .events(&["modify"])
        .interval("1h")
        .command("build")
        .build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    // Vanished before it could be read.
    let gone = h
        .pipeline
        .handle(RawEvent::new("/w/gone.go", RawEventKind::Modify))
        .await;
    assert_eq!(gone, Disposition::Unchanged);

    let real = h
        .pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::Modify))
        .await;
    assert!(real.executed());
    assert_eq!(h.backend.count(), 1);
}

#[tokio::test]
async fn failing_command_stops_the_sequence_unless_configured() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .command("lint %f")
        .command("build")
        .build();
    let mut h = harness(&cfg, project());
    h.backend.fail_program("lint");
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let disposition = h
        .pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::Create))
        .await;
    match disposition {
        Disposition::Executed(report) => {
            assert_eq!(report.failed, vec!["lint /w/main.go"]);
            assert_eq!(report.skipped, 1);
        }
        other => panic!("expected execution, got {other:?}"),
    }
    assert_eq!(h.backend.executed(), vec!["lint /w/main.go"]);

    let cfg = ConfigBuilder::new()
        .command("lint %f")
        .command("build")
        .continue_on_error(true)
        .build();
    let mut h = harness(&cfg, project());
    h.backend.fail_program("lint");
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    h.pipeline
        .handle(RawEvent::new("/w/main.go", RawEventKind::Create))
        .await;
    assert_eq!(h.backend.executed(), vec!["lint /w/main.go", "build"]);
}

#[tokio::test]
async fn burst_of_writes_fires_once_with_the_settled_content() {
    init_tracing();
    let fs = project();
    fs.add_settling_file("/w/out.bin", b"xy".to_vec(), 4);
    let cfg = ConfigBuilder::new()
        .events(&["modify"])
        .stabilize_timeout("5s")
        .command("upload %f")
        .build();
    let mut h = harness(&cfg, fs);
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let path = Path::new("/w/out.bin");
    let first = h.pipeline.handle(RawEvent::new(path, RawEventKind::Modify)).await;
    let second = h.pipeline.handle(RawEvent::new(path, RawEventKind::Modify)).await;

    assert!(first.executed());
    assert_eq!(second, Disposition::Unchanged);
    assert_eq!(h.backend.executed(), vec!["upload /w/out.bin"]);
    assert_eq!(h.pipeline.fingerprints().get(path).map(|fp| fp.size), Some(6));
}

#[tokio::test]
async fn growing_file_is_ignored_once_the_stabilize_timeout_expires() {
    init_tracing();
    let fs = project();
    fs.add_growing_file("/w/app.log");
    let cfg = ConfigBuilder::new()
        .events(&["modify"])
        .stabilize_timeout("30ms")
        .command("tail %f")
        .build();
    let mut h = harness(&cfg, fs);
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let disposition = h
        .pipeline
        .handle(RawEvent::new("/w/app.log", RawEventKind::Modify))
        .await;

    assert_eq!(disposition, Disposition::Unchanged);
    assert_eq!(h.backend.count(), 0);
    assert!(h.pipeline.fingerprints().is_empty());
}

#[tokio::test]
async fn modify_on_a_watched_directory_skips_the_content_check() {
    init_tracing();
    let cfg = ConfigBuilder::new().events(&["modify"]).command("ls %f").build();
    let mut h = harness(&cfg, project());
    h.pipeline.bootstrap(Path::new("/w")).unwrap();

    let disposition = h
        .pipeline
        .handle(RawEvent::new("/w", RawEventKind::Modify))
        .await;

    assert!(disposition.executed());
    assert!(h.pipeline.fingerprints().is_empty());
    assert_eq!(h.backend.executed(), vec!["ls /w"]);
}
