/// macOS shortcut posting via `CGEvent`
#[cfg(target_os = "macos")]
pub mod cgevent;
/// OS clipboard bridge
pub mod clipboard;
/// Global hotkey binding and listener
pub mod hotkey;
/// Synthetic copy/paste shortcuts
pub mod keystroke;
