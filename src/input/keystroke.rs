use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Editing shortcut sent to the foreground application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Ctrl+C (Cmd+C on macOS)
    Copy,
    /// Ctrl+V (Cmd+V on macOS)
    Paste,
}

impl Shortcut {
    /// Letter key of the shortcut
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Copy => 'c',
            Self::Paste => 'v',
        }
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => f.write_str("copy"),
            Self::Paste => f.write_str("paste"),
        }
    }
}

/// Keystroke simulation errors
#[derive(Debug, Error)]
pub enum KeystrokeError {
    /// Could not connect to the input system
    #[error("failed to connect to input system: {0}")]
    Connection(String),

    /// The OS rejected a synthetic key event
    #[error("failed to send key event: {0}")]
    Input(String),
}

/// Sends synthetic shortcuts to whatever window has focus
#[cfg_attr(test, mockall::automock)]
pub trait KeySender: Send + Sync {
    /// Press and release `shortcut`
    ///
    /// Succeeding only means the events were posted; whether the target
    /// application acted on them cannot be observed.
    ///
    /// # Errors
    /// Returns error if the key events cannot be created or posted
    fn send(&self, shortcut: Shortcut) -> Result<(), KeystrokeError>;
}

/// Hotkey modifiers the user may still be holding when the shortcut is sent
///
/// Covers every modifier a binding can use besides Control, which the
/// shortcut itself presses.
pub const HELD_MODIFIERS: [Key; 3] = [Key::Shift, Key::Alt, Key::Meta];

/// Keystrokes via `enigo`
///
/// A fresh `Enigo` is created per shortcut so no handle is shared across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnigoKeySender;

impl KeySender for EnigoKeySender {
    fn send(&self, shortcut: Shortcut) -> Result<(), KeystrokeError> {
        debug!(%shortcut, "simulating shortcut via enigo");

        let mut enigo = Enigo::new(&Settings::default())
            .map_err(|e| KeystrokeError::Connection(e.to_string()))?;
        let input = |e: enigo::InputError| KeystrokeError::Input(e.to_string());

        for modifier in HELD_MODIFIERS {
            enigo.key(modifier, Direction::Release).map_err(input)?;
        }

        enigo.key(Key::Control, Direction::Press).map_err(input)?;
        let clicked = enigo
            .key(Key::Unicode(shortcut.letter()), Direction::Click)
            .map_err(input);
        enigo.key(Key::Control, Direction::Release).map_err(input)?;
        clicked
    }
}

/// Keystroke backend for the current platform
#[cfg(target_os = "macos")]
#[must_use]
pub fn system_key_sender() -> Arc<dyn KeySender> {
    Arc::new(super::cgevent::CgEventKeySender)
}

/// Keystroke backend for the current platform
#[cfg(not(target_os = "macos"))]
#[must_use]
pub fn system_key_sender() -> Arc<dyn KeySender> {
    Arc::new(EnigoKeySender)
}
