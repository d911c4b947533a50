//! Selection capture and replace
//!
//! There is no portable "get the current selection" API, so the pipeline uses
//! the clipboard as a side channel with the foreground application:
//!
//! 1. snapshot the clipboard, simulate copy, and wait for new content;
//! 2. transform the captured text;
//! 3. write the result, simulate paste over the selection;
//! 4. restore the snapshot a few seconds later.
//!
//! Capture fails closed: unchanged or empty clipboard content aborts without
//! touching anything. The transform fails open: an error or panic pastes the
//! original text back unchanged.
//!
//! # Known race
//! Restoration runs on its own timer. If the hotkey fires again before it
//! does, the next run snapshots this run's transformed text as its
//! "original", and that is what it restores. The OS offers no clipboard lock
//! to prevent this.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ConfigStore;
use crate::guard::{ReentrancyGuard, DEFAULT_COOLDOWN};
use crate::input::clipboard::Clipboard;
use crate::input::keystroke::{KeySender, Shortcut};
use crate::notification::{Notification, Notifier};
use crate::transform::TextTransform;

/// Fixed delays and retry budget of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTiming {
    /// Wait after the snapshot so the hotkey's own key-up settles
    pub pre_capture_delay: Duration,
    /// Wait after each simulated copy before reading the clipboard
    pub copy_settle_delay: Duration,
    /// Copy attempts before giving up
    pub capture_attempts: u32,
    /// Wait after writing the result before simulating paste
    pub paste_settle_delay: Duration,
    /// Wait after paste before restoring the original clipboard
    pub restore_delay: Duration,
    /// Guard cool-down after a run
    pub cooldown: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            pre_capture_delay: Duration::from_millis(50),
            copy_settle_delay: Duration::from_millis(150),
            capture_attempts: 3,
            paste_settle_delay: Duration::from_millis(100),
            restore_delay: Duration::from_secs(3),
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl PipelineTiming {
    /// No waiting at all (tests and simulations)
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            pre_capture_delay: Duration::ZERO,
            copy_settle_delay: Duration::ZERO,
            capture_attempts: 3,
            paste_settle_delay: Duration::ZERO,
            restore_delay: Duration::ZERO,
            cooldown: Duration::ZERO,
        }
    }
}

/// Result of a successful capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Clipboard text before the run (`""` if unreadable)
    pub original: String,
    /// Text the foreground application had selected
    pub selection: String,
}

/// Pending clipboard restoration
#[derive(Debug)]
pub struct RestoreHandle(JoinHandle<()>);

impl RestoreHandle {
    /// Block until the original clipboard has been written back
    pub fn wait(self) {
        if self.0.join().is_err() {
            warn!("clipboard restore thread panicked");
        }
    }
}

/// How a trigger ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Selection replaced; restoration pending
    Replaced(RestoreHandle),
    /// Paste could not be sent; restoration still pending
    PasteFailed(RestoreHandle),
    /// Nothing new reached the clipboard
    NoSelection,
    /// Result could not be written to the clipboard
    Failed,
    /// Another run is in flight or cooling down
    Busy,
    /// Switched off in config
    Disabled,
}

impl RunOutcome {
    /// Wait for the pending restoration, if any
    pub fn wait_for_restore(self) {
        if let Self::Replaced(handle) | Self::PasteFailed(handle) = self {
            handle.wait();
        }
    }
}

/// Generate preview of text for logging (pure, testable)
///
/// Truncates text >50 bytes with "..." suffix. Respects UTF-8 char boundaries.
#[must_use]
pub fn text_preview(text: &str) -> String {
    if text.len() > 50 {
        let mut end = 47;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_owned()
    }
}

/// The capture → transform → replace pipeline
pub struct SelectionPipeline {
    clipboard: Arc<dyn Clipboard>,
    keys: Arc<dyn KeySender>,
    transform: Arc<dyn TextTransform>,
    notifier: Arc<dyn Notifier>,
    config: Arc<ConfigStore>,
    guard: ReentrancyGuard,
    timing: PipelineTiming,
}

impl SelectionPipeline {
    /// Assemble a pipeline from its collaborators
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        keys: Arc<dyn KeySender>,
        transform: Arc<dyn TextTransform>,
        notifier: Arc<dyn Notifier>,
        config: Arc<ConfigStore>,
        timing: PipelineTiming,
    ) -> Self {
        Self {
            clipboard,
            keys,
            transform,
            notifier,
            config,
            guard: ReentrancyGuard::new(timing.cooldown),
            timing,
        }
    }

    /// Whether a run is in flight or cooling down
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Hotkey entry point
    ///
    /// Blocks the calling (listener) thread for the duration of the run. Never
    /// fails: every problem ends in a notification and a log line.
    pub fn trigger(&self) -> RunOutcome {
        if !self.config.is_enabled() {
            debug!("hotkey pressed while disabled");
            self.notifier.notify(Notification::Disabled);
            return RunOutcome::Disabled;
        }

        let Some(_permit) = self.guard.try_acquire() else {
            debug!("hotkey pressed while busy (ignored)");
            return RunOutcome::Busy;
        };

        info!("processing selected text");
        let Some(capture) = self.capture() else {
            warn!(
                attempts = self.timing.capture_attempts,
                "no text selected or clipboard unchanged"
            );
            self.notifier.notify(Notification::NoSelection);
            return RunOutcome::NoSelection;
        };

        self.replace(capture)
    }

    /// Obtain the current selection through the clipboard
    ///
    /// Returns `None` when no attempt produced non-empty content that differs
    /// from the snapshot.
    pub fn capture(&self) -> Option<Capture> {
        let original = self.clipboard.read().unwrap_or_else(|e| {
            debug!(error = %e, "clipboard snapshot unreadable, treating as empty");
            String::new()
        });

        std::thread::sleep(self.timing.pre_capture_delay);

        for attempt in 1..=self.timing.capture_attempts {
            if let Err(e) = self.keys.send(Shortcut::Copy) {
                warn!(attempt, error = %e, "failed to simulate copy");
            }
            std::thread::sleep(self.timing.copy_settle_delay);

            let candidate = self.clipboard.read().unwrap_or_default();
            if !candidate.is_empty() && candidate != original {
                debug!(
                    attempt,
                    text_len = candidate.len(),
                    text_preview = %text_preview(&candidate),
                    "captured selection"
                );
                return Some(Capture {
                    original,
                    selection: candidate,
                });
            }
            debug!(attempt, "clipboard unchanged after copy");
        }

        None
    }

    /// Transform with fresh options; any error or panic yields the input unchanged
    pub fn apply_transform(&self, text: &str) -> String {
        let options = self.config.transform_options();
        let transform = Arc::clone(&self.transform);
        match panic::catch_unwind(AssertUnwindSafe(|| transform.transform(text, &options))) {
            Ok(Ok(transformed)) => transformed,
            Ok(Err(e)) => {
                warn!(error = %e, "transform failed, keeping original text");
                text.to_owned()
            }
            Err(_) => {
                error!("transform panicked, keeping original text");
                text.to_owned()
            }
        }
    }

    /// Paste the transformed selection and schedule restoration
    pub fn replace(&self, capture: Capture) -> RunOutcome {
        let Capture {
            original,
            selection,
        } = capture;

        let transformed = self.apply_transform(&selection);
        info!(
            text_len = transformed.len(),
            text_preview = %text_preview(&transformed),
            "uwuified text"
        );

        if let Err(e) = self.clipboard.write(&transformed) {
            error!(error = %e, "failed to write uwuified text to clipboard");
            self.notifier.notify(Notification::Failed);
            return RunOutcome::Failed;
        }

        std::thread::sleep(self.timing.paste_settle_delay);

        let pasted = self.keys.send(Shortcut::Paste);
        let restore = self.schedule_restore(original);

        match (pasted, restore) {
            (Ok(()), Some(handle)) => {
                self.notifier.notify(Notification::Uwuified);
                RunOutcome::Replaced(handle)
            }
            (Err(e), Some(handle)) => {
                error!(error = %e, "failed to simulate paste");
                self.notifier.notify(Notification::Failed);
                RunOutcome::PasteFailed(handle)
            }
            (_, None) => {
                self.notifier.notify(Notification::Failed);
                RunOutcome::Failed
            }
        }
    }

    /// Write `original` back after the restore delay, on a detached thread
    fn schedule_restore(&self, original: String) -> Option<RestoreHandle> {
        let clipboard = Arc::clone(&self.clipboard);
        let delay = self.timing.restore_delay;
        let spawned = std::thread::Builder::new()
            .name("clipboard-restore".to_owned())
            .spawn(move || {
                std::thread::sleep(delay);
                match clipboard.write(&original) {
                    Ok(()) => debug!("original clipboard restored"),
                    Err(e) => debug!(error = %e, "failed to restore clipboard"),
                }
            });

        match spawned {
            Ok(handle) => Some(RestoreHandle(handle)),
            Err(e) => {
                error!(error = %e, "failed to spawn clipboard restore thread");
                None
            }
        }
    }
}
