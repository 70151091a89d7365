#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use watchf::config::Config;
use watchf::engine::Pipeline;
use watchf::fs::mock::MockFileSystem;
use watchf::watch::StabilizeSettings;
use watchf_test_utils::{FakeBackend, RecordingSource};

pub use watchf_test_utils::{init_tracing, with_timeout};

/// Size-settling parameters that keep tests fast. The configured
/// `stabilize_timeout` still applies.
pub fn fast_settle(config: &Config) -> StabilizeSettings {
    StabilizeSettings {
        poll_interval: Duration::from_millis(1),
        max_wait: config.stabilize_timeout(),
        ..StabilizeSettings::default()
    }
}

/// A pipeline over a mock filesystem, with handles to inspect what it did.
pub struct Harness {
    pub fs: MockFileSystem,
    pub source: RecordingSource,
    pub backend: FakeBackend,
    pub pipeline: Pipeline<FakeBackend>,
}

pub fn harness(config: &Config, fs: MockFileSystem) -> Harness {
    let source = RecordingSource::new();
    let backend = FakeBackend::new();
    let pipeline = Pipeline::new(
        config,
        Arc::new(fs.clone()),
        Box::new(source.clone()),
        backend.clone(),
    )
    .with_stabilize_settings(fast_settle(config));

    Harness {
        fs,
        source,
        backend,
        pipeline,
    }
}

/// Poll `check` every 20ms until it holds. Panics after 5 seconds.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) {
    with_timeout(async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}
