//! Error taxonomy for the permission manager.

use thiserror::Error;

/// Precondition violations surfaced synchronously by a request.
///
/// All of these are detected before any platform interaction, so a failed
/// request never leaves a cycle in flight. A stale platform result is not an
/// error: it is silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// No [`HostContext`](crate::HostContext) has been bound yet.
    #[error("no target context bound for the permission request")]
    NoTargetContext,
    /// Another permission request is ongoing.
    #[error("another permission request is ongoing")]
    RequestAlreadyInProgress,
    /// A tip list was supplied whose length differs from the permission list.
    #[error("tips length ({tips}) does not match permissions length ({permissions})")]
    MismatchedTipsLength {
        /// Number of tips supplied.
        tips: usize,
        /// Number of permissions requested.
        permissions: usize,
    },
}

/// Convenience alias for results produced by this crate.
pub type PermissionResult<T> = Result<T, PermissionError>;
