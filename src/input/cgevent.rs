use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation, CGKeyCode};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use tracing::{debug, error};

use super::keystroke::{KeySender, KeystrokeError, Shortcut};

/// `kVK_ANSI_C`
const KEYCODE_C: CGKeyCode = 0x08;
/// `kVK_ANSI_V`
const KEYCODE_V: CGKeyCode = 0x09;

/// Virtual keycode for a shortcut's letter (ANSI layout)
#[must_use]
pub const fn keycode(shortcut: Shortcut) -> CGKeyCode {
    match shortcut {
        Shortcut::Copy => KEYCODE_C,
        Shortcut::Paste => KEYCODE_V,
    }
}

/// Posts Cmd+<key> through the HID event tap
///
/// Flags are set explicitly on both events, so modifiers the user is still
/// holding from the hotkey do not leak into the shortcut.
///
/// # Known Limitations
/// - `event.post()` does not return errors; apps with secure input enabled
///   silently drop the events
/// - Requires Accessibility permission (checked at startup)
#[derive(Debug, Default, Clone, Copy)]
pub struct CgEventKeySender;

impl KeySender for CgEventKeySender {
    fn send(&self, shortcut: Shortcut) -> Result<(), KeystrokeError> {
        let keycode = keycode(shortcut);
        debug!(%shortcut, keycode, "posting shortcut via CGEvent");

        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState).map_err(|()| {
            error!(
                "CGEventSource creation failed - Accessibility permission may have been revoked"
            );
            KeystrokeError::Connection("failed to create CGEvent source".to_owned())
        })?;

        for key_down in [true, false] {
            let event = CGEvent::new_keyboard_event(source.clone(), keycode, key_down).map_err(
                |()| KeystrokeError::Input("failed to create keyboard CGEvent".to_owned()),
            )?;
            event.set_flags(CGEventFlags::CGEventFlagCommand);
            event.post(CGEventTapLocation::HID);
        }

        Ok(())
    }
}
