//! Configuration management for Pixelscribe.
//!
//! Two layers:
//! - Runtime [`Config`] from command-line arguments and environment variables
//! - Persisted [`Settings`] (project folder, window geometry) in `config.json`

mod settings;
mod store;

pub use settings::Config;
pub use store::{Settings, SettingsStore, WindowBounds};
