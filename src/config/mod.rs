//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), the `StreamConfig` and
//! `TransportConfig` sub-configs, `AppPaths` for the platform config
//! directory, and TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, StreamConfig, TransportConfig};
