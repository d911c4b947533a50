use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cool-down after a run before the next trigger is accepted
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

/// Busy/idle gate allowing one pipeline run at a time
///
/// Idle becomes busy on [`try_acquire`](Self::try_acquire). Busy returns to idle
/// only after the cool-down that follows the permit being dropped, which
/// absorbs key-repeat and accidental double presses.
#[derive(Debug, Clone)]
pub struct ReentrancyGuard {
    busy: Arc<AtomicBool>,
    cooldown: Duration,
}

impl ReentrancyGuard {
    /// Create an idle guard
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            cooldown,
        }
    }

    /// Enter busy state, or `None` if a run is already in flight or cooling down
    #[must_use]
    pub fn try_acquire(&self) -> Option<BusyPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyPermit {
                busy: Arc::clone(&self.busy),
                cooldown: self.cooldown,
            })
    }

    /// Whether a run holds (or just released) the guard
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

/// Proof of exclusive execution; releases the guard after the cool-down when dropped
#[derive(Debug)]
pub struct BusyPermit {
    busy: Arc<AtomicBool>,
    cooldown: Duration,
}

impl Drop for BusyPermit {
    fn drop(&mut self) {
        if self.cooldown.is_zero() {
            self.busy.store(false, Ordering::Release);
            return;
        }

        let busy = Arc::clone(&self.busy);
        let cooldown = self.cooldown;
        let spawned = std::thread::Builder::new()
            .name("guard-cooldown".to_owned())
            .spawn(move || {
                std::thread::sleep(cooldown);
                busy.store(false, Ordering::Release);
                debug!("reentrancy guard idle");
            });

        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn cool-down thread, releasing guard now");
            self.busy.store(false, Ordering::Release);
        }
    }
}
