#![allow(dead_code)]

use watchf::config::{Config, RawConfig};

/// Builder for `Config` to simplify test setup.
///
/// Starts from the file defaults: all events, any path, no throttle.
pub struct ConfigBuilder {
    config: RawConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfig::default(),
        }
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.config.recursive = val;
        self
    }

    pub fn events(mut self, events: &[&str]) -> Self {
        self.config.events = events.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.config.include_pattern = pattern.to_string();
        self
    }

    pub fn command(mut self, cmd: &str) -> Self {
        self.config.commands.push(cmd.to_string());
        self
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.config.interval = interval.to_string();
        self
    }

    pub fn continue_on_error(mut self, val: bool) -> Self {
        self.config.continue_on_error = val;
        self
    }

    pub fn stabilize_timeout(mut self, timeout: &str) -> Self {
        self.config.stabilize_timeout = Some(timeout.to_string());
        self
    }

    pub fn raw(self) -> RawConfig {
        self.config
    }

    pub fn build(self) -> Config {
        Config::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
