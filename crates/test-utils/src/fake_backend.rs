use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use watchf::exec::{CommandBackend, CommandStatus, PreparedCommand};

/// A fake command backend that:
/// - records every command line it is asked to run
/// - reports `Failed(1)` for programs registered with [`fail_program`],
///   success for everything else.
///
/// Clones share the same record, so a test can keep one handle and give the
/// other to the pipeline.
///
/// [`fail_program`]: FakeBackend::fail_program
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    executed: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_program(&self, program: &str) {
        self.failing.lock().unwrap().insert(program.to_string());
    }

    /// Command lines run so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }
}

impl CommandBackend for FakeBackend {
    fn run<'a>(
        &'a mut self,
        command: &'a PreparedCommand,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CommandStatus>> + Send + 'a>> {
        let executed = Arc::clone(&self.executed);
        let failing = Arc::clone(&self.failing);

        Box::pin(async move {
            {
                let mut guard = executed.lock().unwrap();
                guard.push(command.to_string());
            }

            if failing.lock().unwrap().contains(&command.program) {
                Ok(CommandStatus::Failed(1))
            } else {
                Ok(CommandStatus::Success)
            }
        })
    }
}
