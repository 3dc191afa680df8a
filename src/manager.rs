//! The permission request/response state machine.

use std::fmt;
use std::mem;
use std::sync::Arc;

use log::{debug, info};

use crate::backend::{DialogActions, DialogPresenter, PermissionBackend, PermissionListener};
use crate::dialog::denial_text;
use crate::error::{PermissionError, PermissionResult};
use crate::types::{GrantOutcome, HostContext, PermissionStatus};

/// Collaborators handed to [`PermissionManager::new`].
pub struct ManagerConfig {
    /// Platform permission facilities.
    pub backend: Arc<dyn PermissionBackend>,
    /// Presenter for the denial dialog.
    pub presenter: Arc<dyn DialogPresenter>,
    /// Outcome callback.
    pub listener: Arc<dyn PermissionListener>,
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig").finish()
    }
}

/// State the manager keeps while a platform round trip is outstanding.
#[derive(Debug)]
struct PendingCycle {
    code: i32,
    needed: Vec<String>,
    /// Tips aligned with `needed`; `Some` iff the caller supplied tips.
    tips: Option<Vec<String>>,
}

/// The two phases of a request cycle. `Awaiting` is the only suspending
/// state; it ends on a result callback carrying the matching code.
#[derive(Debug)]
enum Phase {
    Idle,
    Awaiting(PendingCycle),
}

/// Coordinates runtime permission request cycles against the platform.
///
/// One manager owns one cycle at a time: [`PermissionManager::request`]
/// checks which permissions are still missing, dispatches a platform request
/// for exactly that subset, and suspends until the environment feeds the
/// asynchronous result back through [`PermissionManager::handle_result`].
/// Results are correlated by request code; a result carrying any other code
/// is dropped without touching the cycle.
///
/// All methods are meant to run on the UI-owning thread.
pub struct PermissionManager {
    backend: Arc<dyn PermissionBackend>,
    presenter: Arc<dyn DialogPresenter>,
    listener: Arc<dyn PermissionListener>,
    context: Option<HostContext>,
    phase: Phase,
}

impl fmt::Debug for PermissionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionManager")
            .field("context", &self.context)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl PermissionManager {
    /// Creates a manager from its collaborators. No context is bound yet.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            backend: config.backend,
            presenter: config.presenter,
            listener: config.listener,
            context: None,
            phase: Phase::Idle,
        }
    }

    /// Binds the UI context requests are issued against.
    ///
    /// Must be called before the first request. Rebinding is allowed while
    /// idle or awaiting; the settings deep link uses whatever context is
    /// bound when the dialog is presented.
    pub fn bind_context(&mut self, context: HostContext) {
        self.context = Some(context);
    }

    /// Whether a dispatched request is still waiting for its result.
    #[must_use]
    pub const fn is_requesting(&self) -> bool {
        matches!(self.phase, Phase::Awaiting(_))
    }

    /// The request code of the outstanding cycle, if any.
    #[must_use]
    pub const fn pending_request_code(&self) -> Option<i32> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Awaiting(cycle) => Some(cycle.code),
        }
    }

    /// The permissions actually dispatched by the outstanding cycle.
    #[must_use]
    pub fn pending_permissions(&self) -> Option<&[String]> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Awaiting(cycle) => Some(&cycle.needed),
        }
    }

    /// Current grant status of a single permission.
    #[must_use]
    pub fn status(&self, permission: &str) -> PermissionStatus {
        let Some(context) = self.context.as_ref() else {
            return PermissionStatus::NotDetermined;
        };
        if !self.backend.runtime_permissions_supported()
            || self.backend.is_granted(context, permission)
        {
            PermissionStatus::Authorized
        } else {
            PermissionStatus::Denied
        }
    }

    /// Starts a request cycle without denial tips.
    ///
    /// On denial the listener is invoked but no dialog is shown.
    ///
    /// # Errors
    ///
    /// [`PermissionError::NoTargetContext`] if no context is bound, and
    /// [`PermissionError::RequestAlreadyInProgress`] if a cycle is already
    /// awaiting its result. Neither reaches the platform.
    pub fn request(&mut self, request_code: i32, permissions: &[String]) -> PermissionResult<()> {
        self.begin_request(request_code, permissions, None)
    }

    /// Starts a request cycle with one explanatory tip per permission.
    ///
    /// `tips[i]` explains `permissions[i]`. If any permission ends up
    /// denied, a dialog listing the denied permissions with their tips is
    /// presented before the listener's denial callback.
    ///
    /// # Errors
    ///
    /// As [`PermissionManager::request`], plus
    /// [`PermissionError::MismatchedTipsLength`] when the two slices differ
    /// in length — checked before any grant query.
    pub fn request_with_tips(
        &mut self,
        request_code: i32,
        permissions: &[String],
        tips: &[String],
    ) -> PermissionResult<()> {
        self.begin_request(request_code, permissions, Some(tips))
    }

    fn begin_request(
        &mut self,
        request_code: i32,
        permissions: &[String],
        tips: Option<&[String]>,
    ) -> PermissionResult<()> {
        let Some(context) = self.context.as_ref() else {
            return Err(PermissionError::NoTargetContext);
        };
        if matches!(self.phase, Phase::Awaiting(_)) {
            return Err(PermissionError::RequestAlreadyInProgress);
        }
        if let Some(tips) = tips {
            if tips.len() != permissions.len() {
                return Err(PermissionError::MismatchedTipsLength {
                    tips: tips.len(),
                    permissions: permissions.len(),
                });
            }
        }

        if !self.backend.runtime_permissions_supported() {
            debug!("runtime permissions unsupported, treating all as granted");
            self.listener.on_granted();
            return Ok(());
        }

        let mut needed = Vec::new();
        let mut needed_tips = tips.map(|_| Vec::new());
        for (index, permission) in permissions.iter().enumerate() {
            if self.backend.is_granted(context, permission) {
                continue;
            }
            needed.push(permission.clone());
            if let (Some(collected), Some(tips)) = (needed_tips.as_mut(), tips) {
                collected.push(tips[index].clone());
            }
        }

        if needed.is_empty() {
            self.listener.on_granted();
            return Ok(());
        }

        for permission in &needed {
            info!("requesting permission: {permission}");
        }
        self.backend.dispatch_request(context, request_code, &needed);
        self.phase = Phase::Awaiting(PendingCycle {
            code: request_code,
            needed,
            tips: needed_tips,
        });
        Ok(())
    }

    /// Feeds the platform's asynchronous result back into the cycle.
    ///
    /// `permissions` and `outcomes` are positionally aligned, per the
    /// platform contract. A result whose code does not match the outstanding
    /// cycle is stale or foreign and is ignored entirely: no state changes
    /// and no callback fires. A matching result always returns the manager
    /// to idle, on both the grant and the denial branch.
    pub fn handle_result(
        &mut self,
        request_code: i32,
        permissions: &[String],
        outcomes: &[GrantOutcome],
    ) {
        let cycle = match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Awaiting(cycle) if cycle.code == request_code => cycle,
            phase => {
                debug!("ignoring permission result with code {request_code}: no matching request");
                self.phase = phase;
                return;
            }
        };

        let mut denied = Vec::new();
        let mut granted = Vec::new();
        let mut denied_tips = Vec::new();
        for (index, (permission, outcome)) in permissions.iter().zip(outcomes).enumerate() {
            info!("returned permission: {permission} ({outcome})");
            match outcome {
                GrantOutcome::Denied => {
                    denied.push(permission.clone());
                    if let Some(tip) = cycle.tips.as_ref().and_then(|tips| tips.get(index)) {
                        denied_tips.push(tip.clone());
                    }
                }
                GrantOutcome::Granted => granted.push(permission.clone()),
            }
        }

        if denied.is_empty() {
            self.listener.on_granted();
        } else {
            if cycle.tips.is_some() {
                self.present_denial(&denied, &denied_tips);
            }
            self.listener.on_denied(denied, granted);
        }
    }

    fn present_denial(&self, denied: &[String], denied_tips: &[String]) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let text = denial_text(denied, denied_tips);
        let backend = Arc::clone(&self.backend);
        let application_id = context.application_id().to_owned();
        let actions = DialogActions {
            affirm: Box::new(move || backend.open_application_settings(&application_id)),
            dismiss: Box::new(|| {}),
        };
        self.presenter.present(&text, actions);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;

    use super::*;
    use crate::StyledText;

    struct FakeBackend {
        supported: bool,
        granted: RefCell<HashSet<String>>,
        dispatched: RefCell<Vec<(i32, Vec<String>)>>,
        checked: RefCell<Vec<String>>,
        opened_settings: RefCell<Vec<String>>,
    }

    impl FakeBackend {
        fn new(supported: bool, granted: &[&str]) -> Self {
            Self {
                supported,
                granted: RefCell::new(granted.iter().map(ToString::to_string).collect()),
                dispatched: RefCell::new(Vec::new()),
                checked: RefCell::new(Vec::new()),
                opened_settings: RefCell::new(Vec::new()),
            }
        }
    }

    impl PermissionBackend for FakeBackend {
        fn runtime_permissions_supported(&self) -> bool {
            self.supported
        }

        fn is_granted(&self, _context: &HostContext, permission: &str) -> bool {
            self.checked.borrow_mut().push(permission.to_string());
            self.granted.borrow().contains(permission)
        }

        fn dispatch_request(
            &self,
            _context: &HostContext,
            request_code: i32,
            permissions: &[String],
        ) {
            self.dispatched
                .borrow_mut()
                .push((request_code, permissions.to_vec()));
        }

        fn open_application_settings(&self, application_id: &str) {
            self.opened_settings
                .borrow_mut()
                .push(application_id.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        presented: RefCell<Vec<String>>,
        last_actions: RefCell<Option<DialogActions>>,
    }

    impl DialogPresenter for RecordingPresenter {
        fn present(&self, text: &StyledText, actions: DialogActions) {
            self.presented.borrow_mut().push(text.to_string());
            *self.last_actions.borrow_mut() = Some(actions);
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Callback {
        Granted,
        Denied(Vec<String>, Vec<String>),
    }

    #[derive(Default)]
    struct RecordingListener {
        callbacks: RefCell<Vec<Callback>>,
    }

    impl PermissionListener for RecordingListener {
        fn on_granted(&self) {
            self.callbacks.borrow_mut().push(Callback::Granted);
        }

        fn on_denied(&self, denied: Vec<String>, granted: Vec<String>) {
            self.callbacks
                .borrow_mut()
                .push(Callback::Denied(denied, granted));
        }
    }

    struct Fixture {
        backend: Arc<FakeBackend>,
        presenter: Arc<RecordingPresenter>,
        listener: Arc<RecordingListener>,
        manager: PermissionManager,
    }

    fn fixture(supported: bool, granted: &[&str]) -> Fixture {
        let backend = Arc::new(FakeBackend::new(supported, granted));
        let presenter = Arc::new(RecordingPresenter::default());
        let listener = Arc::new(RecordingListener::default());
        let mut manager = PermissionManager::new(ManagerConfig {
            backend: backend.clone(),
            presenter: presenter.clone(),
            listener: listener.clone(),
        });
        manager.bind_context(HostContext::new("dev.waterui.demo"));
        Fixture {
            backend,
            presenter,
            listener,
            manager,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn already_granted_completes_synchronously() {
        let mut f = fixture(true, &["a.b.CAMERA", "a.b.LOCATION"]);
        f.manager
            .request(7, &strings(&["a.b.CAMERA", "a.b.LOCATION"]))
            .unwrap();
        assert_eq!(f.listener.callbacks.borrow().as_slice(), [Callback::Granted]);
        assert!(f.backend.dispatched.borrow().is_empty());
        assert!(f.presenter.presented.borrow().is_empty());
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn dispatches_only_the_ungranted_subset() {
        let mut f = fixture(true, &["a.b.CAMERA"]);
        f.manager
            .request(7, &strings(&["a.b.CAMERA", "a.b.LOCATION", "a.b.AUDIO"]))
            .unwrap();
        assert_eq!(
            f.backend.dispatched.borrow().as_slice(),
            [(7, strings(&["a.b.LOCATION", "a.b.AUDIO"]))]
        );
        assert!(f.manager.is_requesting());
        assert_eq!(f.manager.pending_request_code(), Some(7));
        assert_eq!(
            f.manager.pending_permissions(),
            Some(strings(&["a.b.LOCATION", "a.b.AUDIO"]).as_slice())
        );
        assert!(f.listener.callbacks.borrow().is_empty());
    }

    #[test]
    fn pre_runtime_platform_grants_without_any_check() {
        let mut f = fixture(false, &[]);
        f.manager.request(7, &strings(&["a.b.CAMERA"])).unwrap();
        assert_eq!(f.listener.callbacks.borrow().as_slice(), [Callback::Granted]);
        assert!(f.backend.checked.borrow().is_empty());
        assert!(f.backend.dispatched.borrow().is_empty());
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn request_without_context_fails() {
        let backend = Arc::new(FakeBackend::new(true, &[]));
        let mut manager = PermissionManager::new(ManagerConfig {
            backend: backend.clone(),
            presenter: Arc::new(RecordingPresenter::default()),
            listener: Arc::new(RecordingListener::default()),
        });
        assert_eq!(
            manager.request(7, &strings(&["a.b.CAMERA"])),
            Err(PermissionError::NoTargetContext)
        );
        assert!(backend.dispatched.borrow().is_empty());
    }

    #[test]
    fn second_request_while_awaiting_fails() {
        let mut f = fixture(true, &[]);
        f.manager.request(7, &strings(&["a.b.CAMERA"])).unwrap();
        assert_eq!(
            f.manager.request(8, &strings(&["a.b.LOCATION"])),
            Err(PermissionError::RequestAlreadyInProgress)
        );
        assert_eq!(f.backend.dispatched.borrow().len(), 1);
        assert_eq!(f.manager.pending_request_code(), Some(7));
    }

    #[test]
    fn mismatched_tips_fail_before_any_grant_check() {
        let mut f = fixture(true, &[]);
        assert_eq!(
            f.manager.request_with_tips(
                7,
                &strings(&["a.b.CAMERA", "a.b.LOCATION"]),
                &strings(&["needs camera"]),
            ),
            Err(PermissionError::MismatchedTipsLength {
                tips: 1,
                permissions: 2,
            })
        );
        assert!(f.backend.checked.borrow().is_empty());
        assert!(f.backend.dispatched.borrow().is_empty());
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn stale_result_is_ignored_entirely() {
        let mut f = fixture(true, &[]);
        f.manager.request(7, &strings(&["a.b.CAMERA"])).unwrap();
        f.manager
            .handle_result(99, &strings(&["a.b.CAMERA"]), &[GrantOutcome::Granted]);
        assert!(f.listener.callbacks.borrow().is_empty());
        assert!(f.manager.is_requesting());
        assert_eq!(f.manager.pending_request_code(), Some(7));
    }

    #[test]
    fn result_without_a_request_is_ignored() {
        let mut f = fixture(true, &[]);
        f.manager
            .handle_result(7, &strings(&["a.b.CAMERA"]), &[GrantOutcome::Granted]);
        assert!(f.listener.callbacks.borrow().is_empty());
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn denial_with_tips_presents_the_dialog() {
        let mut f = fixture(true, &[]);
        let permissions = strings(&["a.b.CAMERA", "a.b.LOCATION"]);
        f.manager
            .request_with_tips(7, &permissions, &strings(&["needs camera", "needs location"]))
            .unwrap();
        assert_eq!(f.backend.dispatched.borrow().as_slice(), [(7, permissions.clone())]);

        f.manager.handle_result(
            7,
            &permissions,
            &[GrantOutcome::Denied, GrantOutcome::Granted],
        );
        assert_eq!(
            f.presenter.presented.borrow().as_slice(),
            ["CAMERA: needs camera".to_string()]
        );
        assert_eq!(
            f.listener.callbacks.borrow().as_slice(),
            [Callback::Denied(
                strings(&["a.b.CAMERA"]),
                strings(&["a.b.LOCATION"]),
            )]
        );
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn dialog_affirm_opens_application_settings() {
        let mut f = fixture(true, &[]);
        let permissions = strings(&["a.b.CAMERA"]);
        f.manager
            .request_with_tips(7, &permissions, &strings(&["needs camera"]))
            .unwrap();
        f.manager
            .handle_result(7, &permissions, &[GrantOutcome::Denied]);

        let actions = f.presenter.last_actions.borrow_mut().take().unwrap();
        (actions.affirm)();
        assert_eq!(
            f.backend.opened_settings.borrow().as_slice(),
            ["dev.waterui.demo".to_string()]
        );
    }

    #[test]
    fn denial_without_tips_shows_no_dialog() {
        let mut f = fixture(true, &[]);
        let permissions = strings(&["a.b.CAMERA"]);
        f.manager.request(7, &permissions).unwrap();
        f.manager
            .handle_result(7, &permissions, &[GrantOutcome::Denied]);
        assert!(f.presenter.presented.borrow().is_empty());
        assert_eq!(
            f.listener.callbacks.borrow().as_slice(),
            [Callback::Denied(strings(&["a.b.CAMERA"]), Vec::new())]
        );
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn full_grant_after_round_trip() {
        let mut f = fixture(true, &[]);
        let permissions = strings(&["a.b.CAMERA"]);
        f.manager
            .request_with_tips(7, &permissions, &strings(&["needs camera"]))
            .unwrap();
        f.manager
            .handle_result(7, &permissions, &[GrantOutcome::Granted]);
        assert_eq!(f.listener.callbacks.borrow().as_slice(), [Callback::Granted]);
        assert!(f.presenter.presented.borrow().is_empty());
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn cycle_state_resets_between_cycles() {
        let mut f = fixture(true, &[]);
        let permissions = strings(&["a.b.CAMERA"]);
        f.manager
            .request_with_tips(1, &permissions, &strings(&["needs camera"]))
            .unwrap();
        f.manager
            .handle_result(1, &permissions, &[GrantOutcome::Denied]);

        // A tip-less second cycle must not inherit the first cycle's tips.
        f.manager.request(2, &permissions).unwrap();
        f.manager
            .handle_result(2, &permissions, &[GrantOutcome::Denied]);
        assert_eq!(f.presenter.presented.borrow().len(), 1);
        assert_eq!(f.listener.callbacks.borrow().len(), 2);
        assert!(!f.manager.is_requesting());
    }

    #[test]
    fn status_reflects_context_and_grant_state() {
        let backend = Arc::new(FakeBackend::new(true, &["a.b.CAMERA"]));
        let mut manager = PermissionManager::new(ManagerConfig {
            backend,
            presenter: Arc::new(RecordingPresenter::default()),
            listener: Arc::new(RecordingListener::default()),
        });
        assert_eq!(manager.status("a.b.CAMERA"), PermissionStatus::NotDetermined);

        manager.bind_context(HostContext::new("dev.waterui.demo"));
        assert_eq!(manager.status("a.b.CAMERA"), PermissionStatus::Authorized);
        assert_eq!(manager.status("a.b.LOCATION"), PermissionStatus::Denied);
    }

    #[test]
    fn pre_runtime_platform_reports_authorized() {
        let f = fixture(false, &[]);
        assert_eq!(f.manager.status("a.b.CAMERA"), PermissionStatus::Authorized);
        assert!(f.backend.checked.borrow().is_empty());
    }
}
