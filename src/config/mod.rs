//! Configuration module for makemcp
//!
//! Provides XDG-compliant layered configuration loading with
//! environment variable overrides.

pub mod loader;
pub mod model;

pub use loader::{
    config_paths, config_sources, load_config, load_config_with_sources, LoadedConfig,
};
pub use model::*;
