//! Status notifications
//!
//! The pipeline runs on the hotkey listener thread and must never touch the
//! presentation context directly. It hands [`Notification`]s to a [`Notifier`];
//! [`ChannelNotifier`] forwards them over an unbounded channel that the main
//! loop drains and presents on its own turn.

use std::fmt;
#[cfg(any(target_os = "linux", target_os = "macos"))]
use std::process::Stdio;
use std::time::Duration;
#[cfg(any(target_os = "linux", target_os = "macos"))]
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::input::hotkey::HotkeyBinding;
use crate::transform::TransformToggle;

/// Short user-facing status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Selection was replaced
    Uwuified,
    /// Capture found no new clipboard content
    NoSelection,
    /// Replace failed; details are only logged
    Failed,
    /// Hotkey pressed while switched off
    Disabled,
    /// Master switch changed
    EnabledChanged(bool),
    /// Hotkey rebound
    HotkeyChanged(HotkeyBinding),
    /// Transform toggle changed
    ToggleChanged(TransformToggle, bool),
}

impl Notification {
    /// Emoji shown next to the message on the desktop
    #[must_use]
    pub const fn emoji(&self) -> &'static str {
        match self {
            Self::Uwuified => "✅",
            Self::NoSelection => "⚠️",
            Self::Failed => "❌",
            Self::Disabled => "😿",
            Self::EnabledChanged(true) => "😊",
            Self::EnabledChanged(false) => "🥺",
            Self::HotkeyChanged(_) | Self::ToggleChanged(..) => "✨",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uwuified => f.write_str("text uwuified"),
            Self::NoSelection => f.write_str("no text selected"),
            Self::Failed => f.write_str("error uwuifying text"),
            Self::Disabled => f.write_str("uwuifier is disabled"),
            Self::EnabledChanged(true) => f.write_str("uwuifier enabled"),
            Self::EnabledChanged(false) => f.write_str("uwuifier disabled"),
            Self::HotkeyChanged(binding) => write!(f, "hotkey set to {binding}"),
            Self::ToggleChanged(toggle, on) => {
                write!(f, "{toggle} {}", if *on { "on" } else { "off" })
            }
        }
    }
}

/// Fire-and-forget notification sink
///
/// Implementations must not block and must not fail the caller.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    fn notify(&self, notification: Notification);
}

/// Hands notifications to the presentation context over a channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the presentation context drains
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            debug!(notification = %e.0, "notification dropped, receiver closed");
        }
    }
}

/// Present a notification in the presentation context
///
/// Always logged; also forwarded to the desktop when `desktop` is set.
/// Desktop delivery is best effort.
pub async fn present(notification: &Notification, desktop: bool, duration: Duration) {
    info!(notification = %notification, "notification");
    if desktop {
        let body = format!("{} {}", notification, notification.emoji());
        send_desktop("uwuifier", &body, duration).await;
    }
}

/// Send a desktop notification with the given title and body.
async fn send_desktop(title: &str, body: &str, duration: Duration) {
    #[cfg(target_os = "linux")]
    send_linux(title, body, duration).await;

    #[cfg(target_os = "macos")]
    {
        let _ = duration;
        send_macos(title, body).await;
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        debug!("desktop notifications not supported on this platform");
        let _ = (title, body, duration);
    }
}

/// Send a notification on Linux using notify-send
#[cfg(target_os = "linux")]
async fn send_linux(title: &str, body: &str, duration: Duration) {
    let expire = format!("--expire-time={}", duration.as_millis());
    let result = Command::new("notify-send")
        .args(["--app-name=uwuifier", expire.as_str(), title, body])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Err(e) = result {
        debug!("failed to send notification: {}", e);
    }
}

/// Send a notification on macOS via osascript
#[cfg(target_os = "macos")]
async fn send_macos(title: &str, body: &str) {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        escape_applescript(body),
        escape_applescript(title)
    );
    let result = Command::new("osascript")
        .args(["-e", &script])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Err(e) = result {
        debug!("failed to send notification: {}", e);
    }
}

#[cfg(any(target_os = "macos", test))]
fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
