// src/daemon.rs

//! Run a [`Service`] under a PID file.
//!
//! A foreground daemon writes `.<name>.pid` into its PID directory when it
//! starts and removes it when it stops. Another invocation can then find the
//! running process through that file and interrupt it
//! ([`stop_background`]).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::errors::{Result, WatchfError};

/// How long [`stop_background`] waits for the interrupted process to exit.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(2);

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Anything the daemon wrapper can start and stop.
pub trait Service {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

/// `<dir>/.<name>.pid`
pub fn pid_file_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!(".{name}.pid"))
}

/// Read a PID file. The content is a decimal process id.
pub fn read_pid(path: &Path) -> Result<u32> {
    let raw = fs::read_to_string(path)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|err| WatchfError::InvalidPidFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
}

#[derive(Debug)]
pub struct Daemon<S: Service> {
    name: String,
    pid_dir: PathBuf,
    pid: Option<u32>,
    running: bool,
    foreground: bool,
    service: S,
}

impl<S: Service> Daemon<S> {
    /// Daemon with its PID file in the current directory.
    pub fn new(name: impl Into<String>, service: S) -> Self {
        Self {
            name: name.into(),
            pid_dir: PathBuf::from("."),
            pid: None,
            running: false,
            foreground: false,
            service,
        }
    }

    pub fn with_pid_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pid_dir = dir.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid_file(&self) -> PathBuf {
        pid_file_path(&self.pid_dir, &self.name)
    }

    /// PID of the running process, once known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Whether this daemon, or another process holding its PID file, is
    /// running.
    pub fn is_running(&mut self) -> bool {
        if self.running {
            return true;
        }

        match read_pid(&self.pid_file()) {
            Ok(pid) => {
                self.pid = Some(pid);
                self.running = process_alive(pid);
                self.running
            }
            Err(_) => false,
        }
    }

    /// Write the PID file and start the service in this process.
    ///
    /// Fails with [`WatchfError::AlreadyRunning`] if the PID file names a
    /// live process. A stale PID file is overwritten. If the service fails to
    /// start, the PID file is removed again.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(WatchfError::AlreadyRunning(format!(
                "{} (pid {})",
                self.name,
                self.pid.unwrap_or_default()
            )));
        }

        let pid = std::process::id();
        let pid_file = self.pid_file();
        fs::write(&pid_file, pid.to_string())?;
        debug!(?pid_file, pid, "wrote PID file");

        if let Err(err) = self.service.start() {
            self.remove_pid_file();
            return Err(err);
        }

        self.pid = Some(pid);
        self.running = true;
        self.foreground = true;
        info!(name = %self.name, pid, "started");
        Ok(())
    }

    /// Stop the daemon.
    ///
    /// In the process that started it, this stops the service and removes
    /// the PID file. Otherwise the process named by the PID file is
    /// interrupted.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(WatchfError::NotRunning(self.name.clone()));
        }

        if self.foreground {
            let stopped = self.service.stop();
            self.remove_pid_file();
            self.running = false;
            self.foreground = false;
            info!(name = %self.name, "stopped");
            return stopped;
        }

        let pid = stop_background(&self.name, &self.pid_dir)?;
        self.pid = Some(pid);
        self.running = false;
        Ok(())
    }

    fn remove_pid_file(&self) {
        let pid_file = self.pid_file();
        match fs::remove_file(&pid_file) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(?pid_file, error = %err, "failed to remove PID file"),
        }
    }
}

/// Interrupt the process recorded in `dir/.<name>.pid` and wait for it to
/// exit. Returns its PID.
pub fn stop_background(name: &str, dir: &Path) -> Result<u32> {
    let pid_file = pid_file_path(dir, name);
    let pid = match read_pid(&pid_file) {
        Ok(pid) => pid,
        Err(WatchfError::IoError(err)) if err.kind() == io::ErrorKind::NotFound => {
            return Err(WatchfError::NotRunning(name.to_string()));
        }
        Err(err) => return Err(err),
    };

    if !process_alive(pid) {
        return Err(WatchfError::NotRunning(format!(
            "{name} (stale PID file {:?})",
            pid_file
        )));
    }

    send_interrupt(pid)?;
    info!(name, pid, "sent interrupt");

    let deadline = Instant::now() + STOP_GRACE_PERIOD;
    while process_alive(pid) {
        if Instant::now() >= deadline {
            return Err(WatchfError::Signal(format!(
                "process {pid} is still running after interrupt"
            )));
        }
        thread::sleep(STOP_POLL_INTERVAL);
    }

    Ok(pid)
}

/// Null-signal liveness probe.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None::<Signal>) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        // EPERM: exists, owned by someone else.
        Err(_) => true,
    }
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn send_interrupt(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| WatchfError::Signal(format!("invalid pid {pid}")))?;
    kill(Pid::from_raw(raw), Signal::SIGINT)
        .map_err(|errno| WatchfError::Signal(format!("interrupting {pid}: {errno}")))
}

#[cfg(not(unix))]
fn send_interrupt(pid: u32) -> Result<()> {
    Err(WatchfError::Signal(format!(
        "cannot interrupt process {pid}: signals are not supported on this platform"
    )))
}
