// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access control client SDK for the Atrium admin console.
//!
//! This crate owns the stateful side of access gating: the session store,
//! the feature toggle cache, the typed REST client, and the route guard
//! adapter that UI shells embed around protected regions. The decision
//! logic itself lives in `atrium-access-core` and is pure.
//!
//! # Lifecycle
//!
//! ```text
//! App start → restore_session() → SessionStore populated → toggle fetch
//!     │
//!     ├── Navigation → RouteGuard::resolve → Render | Loading | Redirect
//!     │
//!     └── Logout → session cleared synchronously → cache reset → token gone
//! ```
//!
//! # Example
//!
//! ```ignore
//! use atrium_access::{AccessClient, AccessRule, GuardOutcome, RouteGuard};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AccessClient::builder()
//!         .base_url("https://atrium.example.com/api")
//!         .build()?;
//!
//!     client.login("ops@example.com", "hunter2").await?;
//!
//!     let guard = RouteGuard::new(
//!         AccessRule::new()
//!             .with_permissions(["payment_view"])
//!             .with_feature("payment_integration"),
//!     );
//!
//!     match guard.resolve_live(client.session(), client.toggles()) {
//!         GuardOutcome::Render => { /* show the payment settings page */ }
//!         GuardOutcome::Loading => { /* show a placeholder */ }
//!         GuardOutcome::Redirect { target, reason } => { /* navigate away */ }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod client;
mod error;
mod guard;
mod hook;
mod session;

pub use cache::ToggleCache;
pub use client::{AccessClient, AccessClientBuilder, ToggleWrite, UserProfile};
pub use error::{ClientError, Result};
pub use guard::{GuardOutcome, RedirectTarget, RouteGuard};
pub use hook::{
	AccessDecision, DecisionHook, NoOpDecisionHook, SharedDecisionHook, TracingDecisionHook,
};
pub use session::{
	FileTokenStore, InMemoryTokenStore, SessionStore, SessionView, TokenStore,
};

// Re-export core types for convenience
pub use atrium_access_core::{
	evaluate, AccessError, AccessReason, AccessRule, AccessVerdict, FeatureToggle,
	PermissionCode, Principal, RoleName, ToggleCacheStatus, ToggleDefaults, ToggleSnapshot,
	UserId, ADMIN_ROLE,
};
