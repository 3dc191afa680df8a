//! Payload types shared by the permission manager and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to the host UI surface on whose behalf permissions are requested.
///
/// On mobile targets this stands in for the foreground activity or window;
/// the manager only needs the application identifier it carries, which is
/// what the settings deep link is scoped to. Bind one with
/// [`PermissionManager::bind_context`](crate::PermissionManager::bind_context)
/// before issuing a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostContext {
    application_id: String,
}

impl HostContext {
    /// Creates a context for the application with the given identifier.
    #[must_use]
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
        }
    }

    /// The application identifier the settings page is scoped to.
    #[must_use]
    pub fn application_id(&self) -> &str {
        &self.application_id
    }
}

/// Per-permission verdict reported by the platform result callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantOutcome {
    /// The user granted the permission.
    Granted,
    /// The user denied the permission.
    Denied,
}

impl GrantOutcome {
    /// Whether this outcome is [`GrantOutcome::Granted`].
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for GrantOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => f.write_str("granted"),
            Self::Denied => f.write_str("denied"),
        }
    }
}

/// Tri-state grant status of a single permission.
///
/// Platforms without the runtime-permission model report everything as
/// [`PermissionStatus::Authorized`]; before a context is bound there is
/// nothing to query and the status is [`PermissionStatus::NotDetermined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionStatus {
    /// The status cannot be determined yet.
    NotDetermined,
    /// The permission is currently denied.
    Denied,
    /// The permission is currently granted.
    Authorized,
}

/// Lists produced by one denial callback, in platform result order.
///
/// The two lists are disjoint: a permission appears in exactly one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialOutcome {
    /// Permissions the user denied.
    pub denied: Vec<String>,
    /// Permissions the user granted in the same callback.
    pub granted: Vec<String>,
}

/// One completed request cycle, as observed by the reactive layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionEvent {
    /// Every requested permission ended up granted, either immediately or
    /// after the platform round trip.
    Granted,
    /// At least one permission was denied.
    Denied {
        /// The denied and granted lists of the cycle.
        outcome: DenialOutcome,
    },
}
