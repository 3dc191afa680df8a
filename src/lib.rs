//! # `WaterKit` Permissions
//!
//! Cross-platform runtime permission coordination for `WaterKit`.
//!
//! Mobile platforms gate sensitive capabilities (camera, storage, location)
//! behind explicit user consent. This crate owns the request/response cycle
//! around that consent: it works out which permissions are still missing,
//! dispatches one platform request for exactly that subset, reconciles the
//! asynchronous result by request code, and reports the outcome once per
//! cycle — optionally presenting a dialog that explains each denied
//! permission and deep-links into the application's settings page.
//!
//! The platform itself is a black box behind [`PermissionBackend`], and the
//! dialog machinery behind [`DialogPresenter`]; concrete bindings live with
//! the embedder. Outcomes are delivered through a [`PermissionListener`],
//! or observed reactively via [`ReactivePermissionManager`].
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::sync::Arc;
//!
//! use waterkit_permissions::{
//!     DialogActions, DialogPresenter, GrantOutcome, HostContext, ManagerConfig,
//!     PermissionBackend, PermissionListener, PermissionManager, StyledText,
//! };
//!
//! struct Backend;
//!
//! impl PermissionBackend for Backend {
//!     fn runtime_permissions_supported(&self) -> bool {
//!         true
//!     }
//!     fn is_granted(&self, _context: &HostContext, _permission: &str) -> bool {
//!         false
//!     }
//!     fn dispatch_request(
//!         &self,
//!         _context: &HostContext,
//!         _request_code: i32,
//!         _permissions: &[String],
//!     ) {
//!     }
//!     fn open_application_settings(&self, _application_id: &str) {}
//! }
//!
//! struct Presenter;
//!
//! impl DialogPresenter for Presenter {
//!     fn present(&self, _text: &StyledText, _actions: DialogActions) {}
//! }
//!
//! #[derive(Default)]
//! struct Outcome(RefCell<Option<(Vec<String>, Vec<String>)>>);
//!
//! impl PermissionListener for Outcome {
//!     fn on_granted(&self) {}
//!     fn on_denied(&self, denied: Vec<String>, granted: Vec<String>) {
//!         *self.0.borrow_mut() = Some((denied, granted));
//!     }
//! }
//!
//! let outcome = Arc::new(Outcome::default());
//! let mut manager = PermissionManager::new(ManagerConfig {
//!     backend: Arc::new(Backend),
//!     presenter: Arc::new(Presenter),
//!     listener: outcome.clone(),
//! });
//! manager.bind_context(HostContext::new("dev.waterui.demo"));
//!
//! let permissions = vec!["android.permission.CAMERA".to_string()];
//! let tips = vec!["The picker needs camera access".to_string()];
//! manager.request_with_tips(1, &permissions, &tips)?;
//! assert!(manager.is_requesting());
//!
//! // Later, the host environment feeds the platform result back in.
//! manager.handle_result(1, &permissions, &[GrantOutcome::Denied]);
//! assert!(!manager.is_requesting());
//! assert!(outcome.0.borrow().is_some());
//! # Ok::<(), waterkit_permissions::PermissionError>(())
//! ```

mod backend;
mod dialog;
mod error;
mod manager;
mod reactive;
mod types;

pub use backend::{DialogActions, DialogPresenter, PermissionBackend, PermissionListener};
pub use dialog::{HIGHLIGHT_COLOR, StyledText, TextChunk, denial_text};
pub use error::{PermissionError, PermissionResult};
pub use manager::{ManagerConfig, PermissionManager};
pub use reactive::{PermissionSignals, ReactivePermissionManager};
pub use types::{DenialOutcome, GrantOutcome, HostContext, PermissionEvent, PermissionStatus};
