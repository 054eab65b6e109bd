// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access control core types and decision engine for Atrium.
//!
//! This crate provides the pure heart of the Atrium admin console's access
//! gating: principal and claims types, declarative access rules, feature
//! toggle snapshots, and the [`evaluate`] function that combines them into a
//! single reason-coded verdict. It performs no I/O and holds no state; the
//! client SDK (`atrium-access`) owns sessions, caching, and the REST
//! contract.
//!
//! # Overview
//!
//! The decision chain for a protected resource:
//!
//! 1. Authentication: no principal denies immediately
//! 2. Admin override: the `admin` role (any case) bypasses everything
//! 3. Role match: any required role matching allows on its own
//! 4. Permission match: any-of over required permission codes
//! 5. Feature toggle: consulted last, deny-by-default on unknown names
//!
//! # Example
//!
//! ```
//! use atrium_access_core::{
//!     evaluate, AccessReason, AccessRule, Principal, PermissionCode,
//!     ToggleDefaults, ToggleSnapshot, UserId,
//! };
//!
//! let principal = Principal {
//!     id: UserId::generate(),
//!     email: "ops@example.com".into(),
//!     display_name: "Ops".into(),
//!     roles: vec![],
//!     permissions: vec![PermissionCode::from("payment_view")],
//!     token_expiry: chrono::Utc::now() + chrono::Duration::hours(1),
//! };
//!
//! let rule = AccessRule::new()
//!     .with_permissions(["payment_view"])
//!     .with_feature("payment_integration");
//!
//! let toggles = ToggleSnapshot::ready(
//!     [("payment_integration".to_string(), true)],
//!     ToggleDefaults::deny_by_default(),
//! );
//!
//! let verdict = evaluate(Some(&principal), &rule, &toggles);
//! assert!(verdict.is_allowed());
//! assert_eq!(verdict.reason, AccessReason::Ok);
//! ```

pub mod engine;
pub mod error;
pub mod principal;
pub mod rule;
pub mod toggle;
pub mod token;
pub mod verdict;

pub use engine::evaluate;
pub use error::{AccessError, Result};
pub use principal::{PermissionCode, Principal, RoleName, UserId, ADMIN_ROLE};
pub use rule::AccessRule;
pub use toggle::{
	FeatureToggle, ToggleCacheStatus, ToggleDecision, ToggleDefaults, ToggleSnapshot,
};
pub use token::{decode_claims, decode_principal, TokenClaims};
pub use verdict::{AccessReason, AccessVerdict};
