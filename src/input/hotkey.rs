use anyhow::{Context, Result};
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// How often the dispatcher thread checks for shutdown
const DISPATCH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Armed value meaning "no binding armed"; outside the `u32` id range
const DISARMED: u64 = u64::MAX;

/// Hotkey parse errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    /// Empty binding or empty `+`-separated token
    #[error("hotkey is empty or has an empty part: {0:?}")]
    Empty(String),

    /// Modifier given twice
    #[error("duplicate modifier: {0}")]
    DuplicateModifier(String),

    /// Unknown key name
    #[error("unsupported key: {0}")]
    UnsupportedKey(String),

    /// More than one non-modifier key
    #[error("hotkey has more than one key: {0:?}")]
    MultipleKeys(String),

    /// Only modifiers, no key
    #[error("hotkey has no key: {0:?}")]
    MissingKey(String),
}

/// Normalized global key combination, e.g. `ctrl+shift+u`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    modifiers: Modifiers,
    code: Code,
    canonical: String,
}

/// Canonical modifier order
const MODIFIER_ORDER: [(Modifiers, &str); 4] = [
    (Modifiers::CONTROL, "ctrl"),
    (Modifiers::ALT, "alt"),
    (Modifiers::SHIFT, "shift"),
    (Modifiers::SUPER, "super"),
];

impl HotkeyBinding {
    /// Modifier keys of this binding
    #[must_use]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Base key of this binding
    #[must_use]
    pub const fn code(&self) -> Code {
        self.code
    }

    /// The `global_hotkey` registration for this binding
    #[must_use]
    pub fn hotkey(&self) -> HotKey {
        HotKey::new(Some(self.modifiers), self.code)
    }

    fn parse_modifier(token: &str) -> Option<Modifiers> {
        match token {
            "ctrl" | "control" => Some(Modifiers::CONTROL),
            "alt" | "option" => Some(Modifiers::ALT),
            "shift" => Some(Modifiers::SHIFT),
            "super" | "cmd" | "command" | "win" | "meta" => Some(Modifiers::SUPER),
            _ => None,
        }
    }

    fn parse_key(key: &str) -> Result<(Code, &'static str), BindingError> {
        let parsed = match key {
            "a" => (Code::KeyA, "a"),
            "b" => (Code::KeyB, "b"),
            "c" => (Code::KeyC, "c"),
            "d" => (Code::KeyD, "d"),
            "e" => (Code::KeyE, "e"),
            "f" => (Code::KeyF, "f"),
            "g" => (Code::KeyG, "g"),
            "h" => (Code::KeyH, "h"),
            "i" => (Code::KeyI, "i"),
            "j" => (Code::KeyJ, "j"),
            "k" => (Code::KeyK, "k"),
            "l" => (Code::KeyL, "l"),
            "m" => (Code::KeyM, "m"),
            "n" => (Code::KeyN, "n"),
            "o" => (Code::KeyO, "o"),
            "p" => (Code::KeyP, "p"),
            "q" => (Code::KeyQ, "q"),
            "r" => (Code::KeyR, "r"),
            "s" => (Code::KeyS, "s"),
            "t" => (Code::KeyT, "t"),
            "u" => (Code::KeyU, "u"),
            "v" => (Code::KeyV, "v"),
            "w" => (Code::KeyW, "w"),
            "x" => (Code::KeyX, "x"),
            "y" => (Code::KeyY, "y"),
            "z" => (Code::KeyZ, "z"),
            "0" => (Code::Digit0, "0"),
            "1" => (Code::Digit1, "1"),
            "2" => (Code::Digit2, "2"),
            "3" => (Code::Digit3, "3"),
            "4" => (Code::Digit4, "4"),
            "5" => (Code::Digit5, "5"),
            "6" => (Code::Digit6, "6"),
            "7" => (Code::Digit7, "7"),
            "8" => (Code::Digit8, "8"),
            "9" => (Code::Digit9, "9"),
            "f1" => (Code::F1, "f1"),
            "f2" => (Code::F2, "f2"),
            "f3" => (Code::F3, "f3"),
            "f4" => (Code::F4, "f4"),
            "f5" => (Code::F5, "f5"),
            "f6" => (Code::F6, "f6"),
            "f7" => (Code::F7, "f7"),
            "f8" => (Code::F8, "f8"),
            "f9" => (Code::F9, "f9"),
            "f10" => (Code::F10, "f10"),
            "f11" => (Code::F11, "f11"),
            "f12" => (Code::F12, "f12"),
            "space" => (Code::Space, "space"),
            _ => return Err(BindingError::UnsupportedKey(key.to_owned())),
        };
        Ok(parsed)
    }
}

impl FromStr for HotkeyBinding {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let mut modifiers = Modifiers::empty();
        let mut key: Option<(Code, &'static str)> = None;

        for token in lowered.split('+').map(str::trim) {
            if token.is_empty() {
                return Err(BindingError::Empty(s.to_owned()));
            }
            if let Some(modifier) = Self::parse_modifier(token) {
                if modifiers.contains(modifier) {
                    return Err(BindingError::DuplicateModifier(token.to_owned()));
                }
                modifiers |= modifier;
            } else if key.is_some() {
                return Err(BindingError::MultipleKeys(s.to_owned()));
            } else {
                key = Some(Self::parse_key(token)?);
            }
        }

        let (code, key_name) = key.ok_or_else(|| BindingError::MissingKey(s.to_owned()))?;
        let mut parts: Vec<&str> = MODIFIER_ORDER
            .iter()
            .filter(|(modifier, _)| modifiers.contains(*modifier))
            .map(|(_, name)| *name)
            .collect();
        parts.push(key_name);

        Ok(Self {
            modifiers,
            code,
            canonical: parts.join("+"),
        })
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// OS-level hotkey registration (mocked in tests)
#[cfg_attr(test, mockall::automock)]
pub trait HotkeyBackend {
    /// Arm a system-wide hotkey
    ///
    /// # Errors
    /// Returns error if the OS rejects the hotkey (e.g. already claimed)
    fn register_hotkey(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error>;

    /// Disarm a previously registered hotkey
    ///
    /// # Errors
    /// Returns error if the OS refuses to unregister it
    fn unregister_hotkey(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error>;
}

impl HotkeyBackend for GlobalHotKeyManager {
    fn register_hotkey(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error> {
        self.register(hotkey)
    }

    fn unregister_hotkey(&self, hotkey: HotKey) -> Result<(), global_hotkey::Error> {
        self.unregister(hotkey)
    }
}

/// Binding lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingState {
    /// No binding requested
    Unbound,
    /// Binding requested (armed unless the OS rejected it)
    Bound(HotkeyBinding),
}

/// Callback invoked on the listener thread when the binding is pressed
pub type TriggerCallback = Arc<dyn Fn() + Send + Sync>;

/// Routes hotkey events to the callback
///
/// Only `Pressed` events whose id matches the armed binding fire, so presses
/// of a superseded binding are ignored.
#[derive(Clone)]
pub struct HotkeyDispatch {
    armed_id: Arc<AtomicU64>,
    callback: TriggerCallback,
}

impl HotkeyDispatch {
    /// Handle one event; returns true if the callback ran
    pub fn handle_event(&self, id: u32, state: HotKeyState) -> bool {
        let armed = self.armed_id.load(Ordering::Acquire);
        if armed != u64::from(id) {
            debug!(id, armed, "ignoring event for inactive hotkey");
            return false;
        }

        match state {
            HotKeyState::Pressed => {
                debug!(id, "hotkey pressed");
                (self.callback)();
                true
            }
            HotKeyState::Released => false,
        }
    }
}

/// Global hotkey listener with runtime-replaceable binding
pub struct HotkeyListener<B: HotkeyBackend> {
    backend: B,
    state: BindingState,
    registered: Vec<HotKey>,
    dispatch: HotkeyDispatch,
    /// Shutdown flag of the running dispatcher thread, fresh per spawn
    dispatcher: Option<Arc<AtomicBool>>,
}

impl<B: HotkeyBackend> HotkeyListener<B> {
    /// Create an unbound listener that will run `callback` on each press
    pub fn new<F>(backend: B, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            backend,
            state: BindingState::Unbound,
            registered: Vec::new(),
            dispatch: HotkeyDispatch {
                armed_id: Arc::new(AtomicU64::new(DISARMED)),
                callback: Arc::new(callback),
            },
            dispatcher: None,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> &BindingState {
        &self.state
    }

    /// Whether the OS accepted the current binding
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.dispatch.armed_id.load(Ordering::Acquire) != DISARMED
    }

    /// Event router shared with the dispatcher thread
    #[must_use]
    pub fn dispatch(&self) -> &HotkeyDispatch {
        &self.dispatch
    }

    /// Handle a hotkey event (same routing as the dispatcher thread)
    pub fn handle_event(&self, event: &GlobalHotKeyEvent) -> bool {
        self.dispatch.handle_event(event.id, event.state)
    }

    /// Start the `hotkey-listener` thread that receives OS hotkey events
    ///
    /// The callback runs on that thread, never on the caller's.
    ///
    /// # Errors
    /// Returns error if the thread cannot be spawned
    pub fn spawn_dispatcher(&mut self) -> Result<()> {
        let receiver = GlobalHotKeyEvent::receiver();
        self.spawn_dispatcher_with(move |timeout| {
            receiver
                .recv_timeout(timeout)
                .ok()
                .map(|event| (event.id, event.state))
        })
    }

    /// Start the `hotkey-listener` thread on an arbitrary event source
    ///
    /// `next_event` waits up to the given timeout and returns `None` when
    /// nothing arrived. A no-op while a dispatcher is already running.
    ///
    /// # Errors
    /// Returns error if the thread cannot be spawned
    pub fn spawn_dispatcher_with<R>(&mut self, mut next_event: R) -> Result<()>
    where
        R: FnMut(Duration) -> Option<(u32, HotKeyState)> + Send + 'static,
    {
        if self.dispatcher.is_some() {
            return Ok(());
        }

        let dispatch = self.dispatch.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let stopped = Arc::clone(&shutdown);
        std::thread::Builder::new()
            .name("hotkey-listener".to_owned())
            .spawn(move || {
                while !stopped.load(Ordering::Acquire) {
                    if let Some((id, state)) = next_event(DISPATCH_POLL_INTERVAL) {
                        dispatch.handle_event(id, state);
                    }
                }
                debug!("hotkey listener thread exiting");
            })
            .context("failed to spawn hotkey listener thread")?;

        self.dispatcher = Some(shutdown);
        Ok(())
    }

    /// Bind the initial hotkey (Unbound → Bound)
    ///
    /// Registration is best effort: an OS rejection is logged and the
    /// listener stays bound but unarmed.
    pub fn start(&mut self, binding: HotkeyBinding) {
        if matches!(self.state, BindingState::Bound(_)) {
            debug!("listener already bound, replacing binding");
        }
        self.set_hotkey(binding);
    }

    /// Replace the active binding (Bound(old) → Bound(new))
    ///
    /// The old binding is unregistered before the new one is registered, so
    /// both are never armed together.
    pub fn set_hotkey(&mut self, binding: HotkeyBinding) {
        self.unregister_all();

        let hotkey = binding.hotkey();
        match self.backend.register_hotkey(hotkey) {
            Ok(()) => {
                self.registered.push(hotkey);
                self.dispatch
                    .armed_id
                    .store(u64::from(hotkey.id()), Ordering::Release);
                info!(hotkey = %binding, "registered hotkey");
            }
            Err(e) => {
                error!(hotkey = %binding, error = %e, "failed to register hotkey");
            }
        }

        self.state = BindingState::Bound(binding);
    }

    /// Disarm every registered hotkey; safe to call repeatedly
    pub fn unregister_all(&mut self) {
        self.dispatch.armed_id.store(DISARMED, Ordering::Release);
        for hotkey in self.registered.drain(..) {
            if let Err(e) = self.backend.unregister_hotkey(hotkey) {
                warn!(error = %e, "failed to unregister hotkey");
            }
        }
    }

    /// Stop listening (Bound → Unbound); idempotent
    ///
    /// A pipeline run already in progress on the listener thread completes.
    pub fn stop(&mut self) {
        self.unregister_all();
        if matches!(self.state, BindingState::Bound(_)) {
            info!("hotkey listener stopped");
        }
        self.state = BindingState::Unbound;
        // Not joined: the thread may be busy running the pipeline
        if let Some(shutdown) = self.dispatcher.take() {
            shutdown.store(true, Ordering::Release);
        }
    }
}

impl<B: HotkeyBackend> Drop for HotkeyListener<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{predicate::eq, Sequence};
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Instant;

    fn binding(s: &str) -> HotkeyBinding {
        s.parse().unwrap()
    }

    fn os_error(message: &str) -> global_hotkey::Error {
        global_hotkey::Error::OsError(std::io::Error::other(message.to_owned()))
    }

    fn counting_listener(
        backend: MockHotkeyBackend,
    ) -> (HotkeyListener<MockHotkeyBackend>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let listener = HotkeyListener::new(backend, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (listener, count)
    }

    #[test]
    fn test_parse_canonical_order() {
        assert_eq!(binding("Shift+CTRL+u").to_string(), "ctrl+shift+u");
        assert_eq!(binding(" alt + shift + U ").to_string(), "alt+shift+u");
        assert_eq!(binding("cmd+option+v").to_string(), "alt+super+v");
        assert_eq!(binding("F12").to_string(), "f12");
        assert_eq!(binding("control+space").to_string(), "ctrl+space");
    }

    #[test]
    fn test_parse_modifiers_and_code() {
        let parsed = binding("ctrl+shift+u");
        assert_eq!(parsed.modifiers(), Modifiers::CONTROL | Modifiers::SHIFT);
        assert_eq!(parsed.code(), Code::KeyU);
    }

    #[test]
    fn test_equal_bindings_share_hotkey_id() {
        assert_eq!(
            binding("ctrl+shift+u").hotkey().id(),
            binding("Shift+Ctrl+U").hotkey().id()
        );
        assert_ne!(
            binding("ctrl+shift+u").hotkey().id(),
            binding("ctrl+shift+w").hotkey().id()
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "".parse::<HotkeyBinding>(),
            Err(BindingError::Empty(String::new()))
        );
        assert!(matches!(
            "ctrl++u".parse::<HotkeyBinding>(),
            Err(BindingError::Empty(_))
        ));
        assert!(matches!(
            "ctrl+ctrl+u".parse::<HotkeyBinding>(),
            Err(BindingError::DuplicateModifier(_))
        ));
        assert!(matches!(
            "ctrl+u+v".parse::<HotkeyBinding>(),
            Err(BindingError::MultipleKeys(_))
        ));
        assert!(matches!(
            "ctrl+shift".parse::<HotkeyBinding>(),
            Err(BindingError::MissingKey(_))
        ));
        assert!(matches!(
            "ctrl+escape".parse::<HotkeyBinding>(),
            Err(BindingError::UnsupportedKey(_))
        ));
    }

    #[test]
    fn test_start_registers_and_arms() {
        let mut backend = MockHotkeyBackend::new();
        backend
            .expect_register_hotkey()
            .with(eq(binding("ctrl+shift+u").hotkey()))
            .times(1)
            .returning(|_| Ok(()));
        backend.expect_unregister_hotkey().returning(|_| Ok(()));

        let (mut listener, count) = counting_listener(backend);
        assert_eq!(listener.state(), &BindingState::Unbound);

        listener.start(binding("ctrl+shift+u"));

        assert_eq!(
            listener.state(),
            &BindingState::Bound(binding("ctrl+shift+u"))
        );
        assert!(listener.is_armed());
        let id = binding("ctrl+shift+u").hotkey().id();
        assert!(listener.dispatch().handle_event(id, HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_released_events_ignored() {
        let mut backend = MockHotkeyBackend::new();
        backend.expect_register_hotkey().returning(|_| Ok(()));
        backend.expect_unregister_hotkey().returning(|_| Ok(()));

        let (mut listener, count) = counting_listener(backend);
        listener.start(binding("f9"));

        let id = binding("f9").hotkey().id();
        assert!(!listener.dispatch().handle_event(id, HotKeyState::Released));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_replace_binding_a_to_b() {
        let a = binding("ctrl+shift+a");
        let b = binding("ctrl+shift+b");

        let mut backend = MockHotkeyBackend::new();
        let mut seq = Sequence::new();
        backend
            .expect_register_hotkey()
            .with(eq(a.hotkey()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_unregister_hotkey()
            .with(eq(a.hotkey()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_register_hotkey()
            .with(eq(b.hotkey()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        backend
            .expect_unregister_hotkey()
            .with(eq(b.hotkey()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let (mut listener, count) = counting_listener(backend);
        listener.start(a.clone());
        listener.set_hotkey(b.clone());

        assert!(!listener.dispatch().handle_event(a.hotkey().id(), HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        assert!(listener.dispatch().handle_event(b.hotkey().id(), HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        listener.stop();
        assert_eq!(listener.state(), &BindingState::Unbound);
    }

    #[test]
    fn test_registration_failure_is_not_fatal() {
        let mut backend = MockHotkeyBackend::new();
        backend
            .expect_register_hotkey()
            .returning(|_| Err(os_error("hotkey already claimed")));
        backend.expect_unregister_hotkey().times(0);

        let (mut listener, count) = counting_listener(backend);
        listener.start(binding("f10"));

        assert_eq!(listener.state(), &BindingState::Bound(binding("f10")));
        assert!(!listener.is_armed());
        assert!(!listener
            .dispatch()
            .handle_event(binding("f10").hotkey().id(), HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut backend = MockHotkeyBackend::new();
        backend.expect_register_hotkey().times(1).returning(|_| Ok(()));
        backend.expect_unregister_hotkey().times(1).returning(|_| Ok(()));

        let (mut listener, _count) = counting_listener(backend);
        listener.stop();
        listener.start(binding("alt+u"));
        listener.stop();
        listener.stop();
        listener.unregister_all();

        assert_eq!(listener.state(), &BindingState::Unbound);
        assert!(!listener.is_armed());
    }

    #[test]
    fn test_unregister_failure_still_disarms() {
        let mut backend = MockHotkeyBackend::new();
        backend.expect_register_hotkey().returning(|_| Ok(()));
        backend
            .expect_unregister_hotkey()
            .returning(|_| Err(os_error("unregister refused")));

        let (mut listener, count) = counting_listener(backend);
        listener.start(binding("alt+u"));
        listener.unregister_all();

        assert!(!listener
            .dispatch()
            .handle_event(binding("alt+u").hotkey().id(), HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    fn accepting_backend() -> MockHotkeyBackend {
        let mut backend = MockHotkeyBackend::new();
        backend.expect_register_hotkey().returning(|_| Ok(()));
        backend.expect_unregister_hotkey().returning(|_| Ok(()));
        backend
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            if Instant::now() > deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        true
    }

    #[test]
    fn test_dispatcher_runs_callback_on_listener_thread() {
        let threads = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&threads);
        let mut listener = HotkeyListener::new(accepting_backend(), move || {
            let name = std::thread::current().name().map(str::to_owned);
            seen.lock().unwrap().push(name);
        });
        let armed = binding("ctrl+shift+u");
        let stale = binding("ctrl+shift+w");
        listener.start(armed.clone());

        let (tx, rx) = mpsc::channel();
        listener
            .spawn_dispatcher_with(move |timeout| rx.recv_timeout(timeout).ok())
            .unwrap();

        // Delivered in order, so once the last press lands the others were dropped
        tx.send((armed.hotkey().id(), HotKeyState::Released)).unwrap();
        tx.send((stale.hotkey().id(), HotKeyState::Pressed)).unwrap();
        tx.send((armed.hotkey().id(), HotKeyState::Pressed)).unwrap();

        assert!(wait_until(|| !threads.lock().unwrap().is_empty()));
        listener.stop();

        assert_eq!(
            *threads.lock().unwrap(),
            vec![Some("hotkey-listener".to_owned())]
        );
        assert_ne!(
            std::thread::current().name(),
            Some("hotkey-listener"),
            "callback must not run on the caller"
        );
    }

    #[test]
    fn test_restarted_dispatcher_stops_previous_thread() {
        let mut listener = HotkeyListener::new(accepting_backend(), || {});
        // Each event source holds a clone; it is dropped when its thread exits
        let alive = Arc::new(());

        for _ in 0..3 {
            let token = Arc::clone(&alive);
            listener
                .spawn_dispatcher_with(move |timeout| {
                    let _held = &token;
                    std::thread::sleep(timeout);
                    None
                })
                .unwrap();
            listener.stop();
        }
        let token = Arc::clone(&alive);
        listener
            .spawn_dispatcher_with(move |timeout| {
                let _held = &token;
                std::thread::sleep(timeout);
                None
            })
            .unwrap();

        assert!(
            wait_until(|| Arc::strong_count(&alive) == 2),
            "only the latest dispatcher should still be running"
        );

        listener.stop();
        assert!(wait_until(|| Arc::strong_count(&alive) == 1));
    }

    #[test]
    fn test_spawn_dispatcher_twice_keeps_one_thread() {
        let mut listener = HotkeyListener::new(accepting_backend(), || {});
        let alive = Arc::new(());

        for _ in 0..2 {
            let token = Arc::clone(&alive);
            listener
                .spawn_dispatcher_with(move |timeout| {
                    let _held = &token;
                    std::thread::sleep(timeout);
                    None
                })
                .unwrap();
        }

        // The second closure was never moved into a thread
        assert!(wait_until(|| Arc::strong_count(&alive) == 2));
        listener.stop();
        assert!(wait_until(|| Arc::strong_count(&alive) == 1));
    }

    #[test]
    fn test_hotkey_id_zero_can_be_armed() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let dispatch = HotkeyDispatch {
            armed_id: Arc::new(AtomicU64::new(0)),
            callback: Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        };

        assert!(dispatch.handle_event(0, HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        dispatch.armed_id.store(DISARMED, Ordering::Release);
        assert!(!dispatch.handle_event(0, HotKeyState::Pressed));
        assert!(!dispatch.handle_event(u32::MAX, HotKeyState::Pressed));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[ignore = "requires a desktop session for global hotkeys"]
    fn test_real_manager_registration() {
        let manager = GlobalHotKeyManager::new().unwrap();
        let mut listener = HotkeyListener::new(manager, || {});
        listener.start(binding("ctrl+shift+f12"));
        assert!(listener.is_armed());
        listener.stop();
    }
}
