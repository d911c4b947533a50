//! Console settings surface
//!
//! One command per line on stdin. Every change is applied to the live
//! listener or config store, persisted, and announced through the notifier.

use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, ConfigStore};
use crate::input::hotkey::{
    BindingError, BindingState, HotkeyBackend, HotkeyBinding, HotkeyListener,
};
use crate::notification::{Notification, Notifier};
use crate::transform::TransformToggle;

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsCommand {
    /// Rebind the global hotkey
    SetHotkey(HotkeyBinding),
    /// Switch on/off, or flip when `None`
    SetEnabled(Option<bool>),
    /// Set a transform toggle, or flip when `None`
    SetToggle(TransformToggle, Option<bool>),
    /// Log current binding and options
    Status,
    /// Shut down
    Quit,
}

/// Console command parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// First word is not a command
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Command needs an argument
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),

    /// Toggle argument is not on/off
    #[error("expected on or off, got {0}")]
    InvalidSwitch(String),

    /// Trailing words
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    /// Hotkey argument did not parse
    #[error("invalid hotkey: {0}")]
    InvalidBinding(#[from] BindingError),
}

/// What the caller should do after applying a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands
    Continue,
    /// Shut down
    Quit,
}

impl FromStr for SettingsCommand {
    type Err = SettingsError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Err(SettingsError::UnknownCommand(String::new()));
        };
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(SettingsError::UnexpectedArgument(extra.to_owned()));
        }

        let command = command.to_ascii_lowercase();
        let parsed = match command.as_str() {
            "hotkey" => {
                let binding = argument.ok_or(SettingsError::MissingArgument("hotkey"))?;
                return Ok(Self::SetHotkey(binding.parse()?));
            }
            "enable" => Self::SetEnabled(Some(true)),
            "disable" => Self::SetEnabled(Some(false)),
            "toggle" => Self::SetEnabled(None),
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            other => {
                let toggle: TransformToggle = other
                    .parse()
                    .map_err(|_| SettingsError::UnknownCommand(other.to_owned()))?;
                return Ok(Self::SetToggle(toggle, argument.map(parse_switch).transpose()?));
            }
        };

        match argument {
            Some(extra) => Err(SettingsError::UnexpectedArgument(extra.to_owned())),
            None => Ok(parsed),
        }
    }
}

fn parse_switch(word: &str) -> Result<bool, SettingsError> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(SettingsError::InvalidSwitch(word.to_owned())),
    }
}

/// Parse a console line; blank lines yield `None`
///
/// # Errors
/// Returns error for unknown commands and malformed arguments
pub fn parse_command(line: &str) -> Result<Option<SettingsCommand>, SettingsError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    line.parse().map(Some)
}

/// Apply a command to the running app
///
/// Persistence failures are logged; the live change still takes effect.
pub fn apply<B: HotkeyBackend>(
    command: SettingsCommand,
    config: &ConfigStore,
    listener: &mut HotkeyListener<B>,
    notifier: &dyn Notifier,
) -> Flow {
    match command {
        SettingsCommand::SetHotkey(binding) => {
            listener.set_hotkey(binding.clone());
            let canonical = binding.to_string();
            persist(config, |c| c.hotkey = canonical);
            notifier.notify(Notification::HotkeyChanged(binding));
        }
        SettingsCommand::SetEnabled(value) => {
            let mut enabled = false;
            persist(config, |c| {
                c.enabled = value.unwrap_or(!c.enabled);
                enabled = c.enabled;
            });
            notifier.notify(Notification::EnabledChanged(enabled));
        }
        SettingsCommand::SetToggle(toggle, value) => {
            let mut current = false;
            persist(config, |c| {
                let mut options = c.transform_options();
                current = value.unwrap_or(!options.get(toggle));
                options.set(toggle, current);
                c.smiley = options.smiley;
                c.yu = options.yu;
                c.stutter = options.stutter;
                c.nouwu = options.nouwu;
            });
            notifier.notify(Notification::ToggleChanged(toggle, current));
        }
        SettingsCommand::Status => {
            let snapshot = config.snapshot();
            let binding = match listener.state() {
                BindingState::Bound(binding) => binding.to_string(),
                BindingState::Unbound => "none".to_owned(),
            };
            info!(
                hotkey = %binding,
                armed = listener.is_armed(),
                enabled = snapshot.enabled,
                smiley = snapshot.smiley,
                yu = snapshot.yu,
                stutter = snapshot.stutter,
                nouwu = snapshot.nouwu,
                "status"
            );
        }
        SettingsCommand::Quit => return Flow::Quit,
    }

    Flow::Continue
}

fn persist<F: FnOnce(&mut Config)>(config: &ConfigStore, change: F) {
    if let Err(e) = config.update(change) {
        warn!(error = %e, "failed to save config");
    }
}
