use anyhow::{Context, Result};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Clipboard errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClipboardError {
    /// Clipboard inaccessible, not text, or an empty string
    #[error("clipboard is empty or holds no text")]
    Empty,

    /// OS refused the operation
    #[error("clipboard I/O failure: {0}")]
    Io(String),
}

/// Plain-text access to the OS clipboard
///
/// The clipboard is global state shared with every other application; nothing
/// here can lock it. Callers serialize their own access.
#[cfg_attr(test, mockall::automock)]
pub trait Clipboard: Send + Sync {
    /// Read the clipboard as text
    ///
    /// # Errors
    /// Returns [`ClipboardError::Empty`] if there is no readable text
    fn read(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard content with `text`
    ///
    /// # Errors
    /// Returns [`ClipboardError::Io`] if the OS rejects the write
    fn write(&self, text: &str) -> Result<(), ClipboardError>;
}

enum Request {
    Read(Sender<Result<String, ClipboardError>>),
    Write(String, Sender<Result<(), ClipboardError>>),
}

/// OS clipboard served by a dedicated `clipboard` thread
///
/// The thread owns the `arboard` handle for the life of the process, which
/// keeps written text available to other applications on X11.
pub struct SystemClipboard {
    requests: Mutex<Sender<Request>>,
}

impl SystemClipboard {
    /// Start the clipboard thread
    ///
    /// # Errors
    /// Returns error if the thread cannot be spawned
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Request>();

        std::thread::Builder::new()
            .name("clipboard".to_owned())
            .spawn(move || {
                let mut clipboard = match arboard::Clipboard::new() {
                    Ok(clipboard) => Some(clipboard),
                    Err(e) => {
                        warn!(error = %e, "failed to open clipboard, will retry per request");
                        None
                    }
                };

                for request in rx {
                    if clipboard.is_none() {
                        clipboard = arboard::Clipboard::new().ok();
                    }
                    match request {
                        Request::Read(reply) => {
                            let result = clipboard
                                .as_mut()
                                .map_or(Err(ClipboardError::Empty), read_text);
                            let _ = reply.send(result);
                        }
                        Request::Write(text, reply) => {
                            let result = clipboard.as_mut().map_or_else(
                                || Err(ClipboardError::Io("clipboard unavailable".to_owned())),
                                |cb| {
                                    cb.set_text(text)
                                        .map_err(|e| ClipboardError::Io(e.to_string()))
                                },
                            );
                            let _ = reply.send(result);
                        }
                    }
                }
                debug!("clipboard thread exiting");
            })
            .context("failed to spawn clipboard thread")?;

        Ok(Self {
            requests: Mutex::new(tx),
        })
    }

    fn request<T>(
        &self,
        make: impl FnOnce(Sender<Result<T, ClipboardError>>) -> Request,
    ) -> Result<T, ClipboardError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(make(reply_tx))
            .map_err(|_| ClipboardError::Io("clipboard thread stopped".to_owned()))?;
        reply_rx
            .recv()
            .map_err(|_| ClipboardError::Io("clipboard thread stopped".to_owned()))?
    }
}

fn read_text(clipboard: &mut arboard::Clipboard) -> Result<String, ClipboardError> {
    match clipboard.get_text() {
        Ok(text) if !text.is_empty() => Ok(text),
        Ok(_) => Err(ClipboardError::Empty),
        Err(e) => {
            debug!(error = %e, "clipboard read failed");
            Err(ClipboardError::Empty)
        }
    }
}

impl Clipboard for SystemClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        self.request(Request::Read)
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_owned();
        self.request(move |reply| Request::Write(text, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClipboardError::Empty.to_string(),
            "clipboard is empty or holds no text"
        );
        assert_eq!(
            ClipboardError::Io("denied".to_owned()).to_string(),
            "clipboard I/O failure: denied"
        );
    }

    #[test]
    fn test_mock_clipboard_contract() {
        let mut clipboard = MockClipboard::new();
        clipboard.expect_read().returning(|| Err(ClipboardError::Empty));
        clipboard
            .expect_write()
            .withf(|text| text == "uwu")
            .returning(|_| Ok(()));

        assert_eq!(clipboard.read(), Err(ClipboardError::Empty));
        assert_eq!(clipboard.write("uwu"), Ok(()));
    }

    #[test]
    #[ignore = "requires a desktop session with a clipboard"]
    fn test_system_clipboard_write_then_read() {
        let clipboard = SystemClipboard::spawn().unwrap();
        clipboard.write("hewwo").unwrap();
        assert_eq!(clipboard.read().unwrap(), "hewwo");
    }

    #[test]
    #[ignore = "requires a desktop session with a clipboard"]
    fn test_system_clipboard_empty_string_reads_as_empty() {
        let clipboard = SystemClipboard::spawn().unwrap();
        clipboard.write("").unwrap();
        assert_eq!(clipboard.read(), Err(ClipboardError::Empty));
    }
}
