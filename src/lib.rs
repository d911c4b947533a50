//! uwuifier - global hotkey that rewrites the selected text in place
//!
//! This library exports core modules for testing and the binary.

/// Configuration management
pub mod config;
/// Reentrancy guard for pipeline runs
pub mod guard;
/// Input handling (hotkey, clipboard, synthetic shortcuts)
pub mod input;
/// Status notifications
pub mod notification;
/// macOS permission checks
pub mod permissions;
/// Selection capture and replace
pub mod pipeline;
/// Console settings commands
pub mod settings;
/// Logging setup
pub mod telemetry;
/// Text transform
pub mod transform;
