//! Pixelscribe Library
//!
//! Image folder browsing with change watching and batch OCR.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod error;
pub mod hub;
pub mod ocr;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
