//! Collaborator contracts the permission manager drives.
//!
//! The platform and the dialog machinery are black boxes to this crate:
//! concrete backends (JNI, Swift bridge, test doubles) live with the
//! embedder and implement these traits.

use std::fmt;

use crate::StyledText;
use crate::types::HostContext;

/// Platform permission facilities, as one abstract capability.
pub trait PermissionBackend {
    /// Whether the platform has a runtime-permission model at all.
    ///
    /// When this returns `false` the manager treats every permission as
    /// granted without consulting [`PermissionBackend::is_granted`].
    fn runtime_permissions_supported(&self) -> bool;

    /// Current grant status of a single permission.
    fn is_granted(&self, context: &HostContext, permission: &str) -> bool;

    /// Issues the platform permission request. Fire-and-forget: the result
    /// arrives later through
    /// [`PermissionManager::handle_result`](crate::PermissionManager::handle_result).
    fn dispatch_request(&self, context: &HostContext, request_code: i32, permissions: &[String]);

    /// Opens the OS settings page scoped to the given application.
    ///
    /// No return value or callback is expected.
    fn open_application_settings(&self, application_id: &str);
}

/// Presents the denial dialog.
pub trait DialogPresenter {
    /// Shows a dialog with the styled text and the two actions.
    fn present(&self, text: &StyledText, actions: DialogActions);
}

/// The two single-shot actions of the denial dialog.
pub struct DialogActions {
    /// Affirmative action; the manager wires this to open the application's
    /// settings page.
    pub affirm: Box<dyn FnOnce()>,
    /// Dismiss action; a no-op.
    pub dismiss: Box<dyn FnOnce()>,
}

impl fmt::Debug for DialogActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogActions").finish()
    }
}

/// Caller-supplied outcome callback for one request cycle.
pub trait PermissionListener {
    /// All requested permissions are granted, either immediately or after
    /// the platform round trip.
    fn on_granted(&self);

    /// At least one permission was denied. The lists are disjoint and follow
    /// the platform's result-callback order.
    fn on_denied(&self, denied: Vec<String>, granted: Vec<String>);
}
