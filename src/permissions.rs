use anyhow::Result;

/// Check accessibility permission (for synthetic copy/paste)
///
/// # Errors
/// Returns error if accessibility permission is denied (macOS only)
#[cfg_attr(not(target_os = "macos"), allow(clippy::unnecessary_wraps))]
pub fn check_accessibility_permission() -> Result<()> {
    tracing::info!("checking accessibility permission");

    #[cfg(target_os = "macos")]
    {
        use core_graphics::event::CGEvent;
        use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState).map_err(|()| {
            anyhow::anyhow!(
                "accessibility permission denied\n\n\
                Enable in: System Settings → Privacy & Security → Accessibility\n\
                Add and enable this app, then restart.\n"
            )
        })?;

        // Verify we can actually create events (tests full permission chain)
        CGEvent::new_keyboard_event(source, 0, true).map_err(|()| {
            anyhow::anyhow!(
                "failed to create CGEvent - Accessibility may be restricted\n\n\
                Enable in: System Settings → Privacy & Security → Accessibility\n"
            )
        })?;

        tracing::info!("accessibility permission granted");
    }

    #[cfg(not(target_os = "macos"))]
    tracing::debug!("no permission gate on this platform");

    Ok(())
}

/// Check everything the app needs before arming the hotkey
///
/// # Errors
/// Returns error if any permission check fails
pub fn request_all_permissions() -> Result<()> {
    check_accessibility_permission()?;
    tracing::info!("all permissions checked");
    Ok(())
}
