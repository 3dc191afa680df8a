//! Reactive signal layer over the permission manager.
//!
//! Outcome callbacks are bridged onto `nami` signal containers through an
//! unbounded channel, so views can observe permission cycles without wiring
//! a listener by hand. A forward listener can still be installed for
//! imperative callers.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_channel::{Receiver, Sender, unbounded};
use executor_core::{DefaultExecutor, LocalExecutor};
use log::warn;
use nami::Signal;
use nami::CustomBinding;
use nami::binding::Container;

use crate::types::{DenialOutcome, PermissionEvent};
use crate::{
    DialogPresenter, GrantOutcome, HostContext, ManagerConfig, PermissionBackend,
    PermissionListener, PermissionManager, PermissionResult, PermissionStatus,
};

const MAX_EVENT_HISTORY: usize = 64;

/// Observable views of completed permission cycles.
#[derive(Debug, Clone, Default)]
pub struct PermissionSignals {
    history: Container<Vec<PermissionEvent>>,
    latest_event: Container<Option<PermissionEvent>>,
    last_denial: Container<Option<DenialOutcome>>,
}

impl PermissionSignals {
    /// Bounded history of completed cycles, oldest first.
    #[must_use]
    pub fn history(&self) -> impl Signal<Output = Vec<PermissionEvent>> {
        self.history.clone()
    }

    /// The most recently completed cycle.
    #[must_use]
    pub fn latest_event(&self) -> impl Signal<Output = Option<PermissionEvent>> {
        self.latest_event.clone()
    }

    /// The most recent denial outcome, if any cycle was denied.
    #[must_use]
    pub fn last_denial(&self) -> impl Signal<Output = Option<DenialOutcome>> {
        self.last_denial.clone()
    }

    /// Resets every signal to its initial state.
    pub fn clear(&self) {
        self.history.set(Vec::new());
        self.latest_event.set(None);
        self.last_denial.set(None);
    }

    fn record_event(&self, event: &PermissionEvent) {
        self.latest_event.set(Some(event.clone()));
        if let PermissionEvent::Denied { outcome } = event {
            self.last_denial.set(Some(outcome.clone()));
        }

        let mut history = self.history.get();
        history.push(event.clone());
        if history.len() > MAX_EVENT_HISTORY {
            let overflow = history.len() - MAX_EVENT_HISTORY;
            history.drain(0..overflow);
        }
        self.history.set(history);
    }
}

struct ChannelPermissionListener {
    sender: Sender<PermissionEvent>,
    forward: Mutex<Option<Arc<dyn PermissionListener>>>,
}

impl ChannelPermissionListener {
    fn new(sender: Sender<PermissionEvent>) -> Self {
        Self {
            sender,
            forward: Mutex::new(None),
        }
    }

    fn set_forward_listener(&self, listener: Option<Arc<dyn PermissionListener>>) {
        let mut guard = self
            .forward
            .lock()
            .expect("forward listener mutex poisoned");
        *guard = listener;
    }

    fn forward_listener(&self) -> Option<Arc<dyn PermissionListener>> {
        let guard = self
            .forward
            .lock()
            .expect("forward listener mutex poisoned");
        guard.clone()
    }

    fn send(&self, event: PermissionEvent) {
        if let Err(err) = self.sender.try_send(event) {
            warn!("dropping permission event: {err}");
        }
    }
}

impl fmt::Debug for ChannelPermissionListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelPermissionListener").finish()
    }
}

impl PermissionListener for ChannelPermissionListener {
    fn on_granted(&self) {
        self.send(PermissionEvent::Granted);
        if let Some(listener) = self.forward_listener() {
            listener.on_granted();
        }
    }

    fn on_denied(&self, denied: Vec<String>, granted: Vec<String>) {
        self.send(PermissionEvent::Denied {
            outcome: DenialOutcome {
                denied: denied.clone(),
                granted: granted.clone(),
            },
        });
        if let Some(listener) = self.forward_listener() {
            listener.on_denied(denied, granted);
        }
    }
}

/// A [`PermissionManager`] whose outcomes feed [`PermissionSignals`].
#[derive(Debug, Clone)]
pub struct ReactivePermissionManager {
    inner: Arc<Mutex<PermissionManager>>,
    listener: Arc<ChannelPermissionListener>,
    signals: PermissionSignals,
}

impl ReactivePermissionManager {
    /// Creates a manager over the given collaborators and starts pumping
    /// outcome events into the signals.
    #[must_use]
    pub fn new(backend: Arc<dyn PermissionBackend>, presenter: Arc<dyn DialogPresenter>) -> Self {
        let (sender, receiver) = unbounded();
        let listener = Arc::new(ChannelPermissionListener::new(sender));
        let manager = PermissionManager::new(ManagerConfig {
            backend,
            presenter,
            listener: listener.clone(),
        });

        let signals = PermissionSignals::default();
        spawn_signal_pump(receiver, signals.clone());

        Self {
            inner: Arc::new(Mutex::new(manager)),
            listener,
            signals,
        }
    }

    fn manager(&self) -> MutexGuard<'_, PermissionManager> {
        self.inner.lock().expect("permission manager mutex poisoned")
    }

    /// The signal handles observed by views.
    #[must_use]
    pub fn signals(&self) -> PermissionSignals {
        self.signals.clone()
    }

    /// Resets the signals to their initial state.
    pub fn clear_signals(&self) {
        self.signals.clear();
    }

    /// Installs a listener that receives outcomes in addition to the signals.
    pub fn set_listener(&self, listener: Arc<dyn PermissionListener>) {
        self.listener.set_forward_listener(Some(listener));
    }

    /// Removes the forward listener.
    pub fn clear_listener(&self) {
        self.listener.set_forward_listener(None);
    }

    /// See [`PermissionManager::bind_context`].
    pub fn bind_context(&self, context: HostContext) {
        self.manager().bind_context(context);
    }

    /// See [`PermissionManager::request`].
    ///
    /// # Errors
    ///
    /// Propagates the precondition failures of [`PermissionManager::request`].
    pub fn request(&self, request_code: i32, permissions: &[String]) -> PermissionResult<()> {
        self.manager().request(request_code, permissions)
    }

    /// See [`PermissionManager::request_with_tips`].
    ///
    /// # Errors
    ///
    /// Propagates the precondition failures of
    /// [`PermissionManager::request_with_tips`].
    pub fn request_with_tips(
        &self,
        request_code: i32,
        permissions: &[String],
        tips: &[String],
    ) -> PermissionResult<()> {
        self.manager().request_with_tips(request_code, permissions, tips)
    }

    /// See [`PermissionManager::handle_result`].
    pub fn handle_result(
        &self,
        request_code: i32,
        permissions: &[String],
        outcomes: &[GrantOutcome],
    ) {
        self.manager().handle_result(request_code, permissions, outcomes);
    }

    /// See [`PermissionManager::is_requesting`].
    #[must_use]
    pub fn is_requesting(&self) -> bool {
        self.manager().is_requesting()
    }

    /// See [`PermissionManager::pending_request_code`].
    #[must_use]
    pub fn pending_request_code(&self) -> Option<i32> {
        self.manager().pending_request_code()
    }

    /// See [`PermissionManager::status`].
    #[must_use]
    pub fn status(&self, permission: &str) -> PermissionStatus {
        self.manager().status(permission)
    }
}

fn spawn_signal_pump(receiver: Receiver<PermissionEvent>, signals: PermissionSignals) {
    DefaultExecutor
        .spawn_local(async move {
            while let Ok(event) = receiver.recv().await {
                signals.record_event(&event);
            }
        })
        .detach();
}
