use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use watchf::watch::EventSource;

#[derive(Debug, Default)]
struct Registrations {
    active: Vec<PathBuf>,
    unwatched: Vec<PathBuf>,
}

/// An `EventSource` that only records registrations. Events are fed to the
/// pipeline by hand.
#[derive(Debug, Clone, Default)]
pub struct RecordingSource {
    inner: Arc<Mutex<Registrations>>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories currently registered, in registration order.
    pub fn watched(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().active.clone()
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().unwatched.clone()
    }
}

impl EventSource for RecordingSource {
    fn watch(&mut self, dir: &Path) -> anyhow::Result<()> {
        self.inner.lock().unwrap().active.push(dir.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> anyhow::Result<()> {
        let mut guard = self.inner.lock().unwrap();
        guard.active.retain(|d| d != dir);
        guard.unwatched.push(dir.to_path_buf());
        Ok(())
    }
}
