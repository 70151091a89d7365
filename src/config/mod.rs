// src/config/mod.rs

//! Configuration loading and validation for watchf.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load and persist a config file (`loader.rs`).
//! - Validate event lists, the include pattern and durations (`validate.rs`).
//!
//! The rest of the crate only ever sees a validated [`Config`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, write_to_path};
pub use model::{Config, RawConfig};
pub use validate::{parse_duration, parse_event_mask};
