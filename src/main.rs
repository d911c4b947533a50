use anyhow::{Context, Result};
use global_hotkey::GlobalHotKeyManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use uwuifier::config::{ConfigStore, DEFAULT_HOTKEY};
use uwuifier::input::clipboard::SystemClipboard;
use uwuifier::input::hotkey::{HotkeyBinding, HotkeyListener};
use uwuifier::input::keystroke::system_key_sender;
use uwuifier::notification::{self, ChannelNotifier, Notifier};
use uwuifier::pipeline::{PipelineTiming, SelectionPipeline};
use uwuifier::settings::{self, Flow};
use uwuifier::transform::UwuTransform;
use uwuifier::{permissions, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(ConfigStore::load_default()?);
    let snapshot = config.snapshot();

    // Initialize telemetry
    telemetry::init(snapshot.telemetry_enabled, &snapshot.log_path)?;
    info!("uwuifier starting");
    if let Some(path) = config.path() {
        info!(path = %path.display(), "config loaded");
    }
    if let Some(log_file) = telemetry::log_file_path(&snapshot)? {
        println!("Logging to {}", log_file.display());
    }

    // Request permissions
    permissions::request_all_permissions()?;

    // Pipeline collaborators
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let notifier = Arc::new(notifier);
    let pipeline = Arc::new(SelectionPipeline::new(
        Arc::new(SystemClipboard::spawn()?),
        system_key_sender(),
        Arc::new(UwuTransform::new()),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&config),
        PipelineTiming::default(),
    ));

    // Global hotkey
    let manager = GlobalHotKeyManager::new().context("failed to create hotkey manager")?;
    let trigger = Arc::clone(&pipeline);
    let mut listener = HotkeyListener::new(manager, move || {
        let outcome = trigger.trigger();
        debug!(?outcome, "pipeline run finished");
    });
    listener.spawn_dispatcher()?;

    let binding = match snapshot.hotkey.parse::<HotkeyBinding>() {
        Ok(binding) => binding,
        Err(e) => {
            warn!(hotkey = %snapshot.hotkey, error = %e, "invalid hotkey in config, using default");
            DEFAULT_HOTKEY.parse().context("default hotkey must parse")?
        }
    };
    listener.start(binding.clone());

    // Main event loop
    info!("event loop starting (press Ctrl+C to exit)");
    println!("\nuwuifier is running. Select text and press {binding}.");
    println!(
        "Commands: hotkey <keys>, enable, disable, toggle, \
         smiley|yu|stutter|nouwu [on|off], status, quit\n"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            Some(notification) = notifications.recv() => {
                let current = config.snapshot();
                let duration = Duration::from_millis(current.notification_duration_ms);
                tokio::spawn(async move {
                    let desktop = current.desktop_notifications;
                    notification::present(&notification, desktop, duration).await;
                });
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match settings::parse_command(&line) {
                    Ok(Some(command)) => {
                        let flow =
                            settings::apply(command, &config, &mut listener, notifier.as_ref());
                        if flow == Flow::Quit {
                            info!("quit requested");
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "ignoring settings command"),
                },
                Ok(None) => {
                    debug!("stdin closed, settings commands disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "failed to read stdin, settings commands disabled");
                    stdin_open = false;
                }
            },
        }
    }

    listener.stop();
    info!("uwuifier stopped");
    Ok(())
}
