//! Core client logic
//!
//! The bridge contract and its in-process transport, event listeners, URL
//! classification, payload parsing, configuration and the error model.

pub mod bridge;
pub mod config;
pub mod error_handling;
pub mod listener;
pub mod models;
pub mod progress;
pub mod runtime;
pub mod video_type;


// Re-export commonly used types
pub use bridge::{HostBridge, SharedBridge};
pub use config::{AppConfig, SettingsStore};
pub use models::{AppError, AppResult};
