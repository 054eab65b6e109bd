// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The access decision engine.
//!
//! This module contains the core [`evaluate`] function that produces one
//! [`AccessVerdict`] for a (principal, rule, toggle snapshot) triple. The
//! precedence chain is:
//!
//! 1. **Authentication**: no principal denies immediately
//! 2. **Admin override**: the administrative role bypasses every other check
//! 3. **Role match**: any required role matching allows on its own
//! 4. **Permission match**: any-of over required permissions
//! 5. **Feature toggle**: consulted last so a disabled feature never leaks
//!    whether the user would have had permission
//!
//! The admin override comes before everything else so operators can never be
//! locked out by a toggle misconfiguration. All decisions are pure functions
//! over immutable inputs with no side effects, making them easy to test and
//! reason about.

use tracing::instrument;

use crate::principal::Principal;
use crate::rule::AccessRule;
use crate::toggle::{ToggleCacheStatus, ToggleDecision, ToggleSnapshot};
use crate::verdict::{AccessReason, AccessVerdict};

/// Evaluates whether a principal may access the resource the rule protects.
///
/// Pass `None` for an unauthenticated visitor. The verdict is computed fresh
/// from the inputs on every call; calling twice with identical inputs yields
/// identical verdicts.
///
/// # Tracing
///
/// The decision and its reason are logged at debug level for audit purposes.
#[instrument(
    level = "debug",
    skip(principal, rule, toggles),
    fields(
        authenticated = principal.is_some(),
        feature = rule.required_feature.as_deref().unwrap_or("-"),
    )
)]
pub fn evaluate(
	principal: Option<&Principal>,
	rule: &AccessRule,
	toggles: &ToggleSnapshot,
) -> AccessVerdict {
	let Some(principal) = principal else {
		return AccessVerdict::deny(AccessReason::NotAuthenticated);
	};

	if principal.is_admin() {
		return AccessVerdict::allow(AccessReason::AdminOverride);
	}

	let roles_required = !rule.required_roles.is_empty();
	if roles_required && principal.has_any_role(&rule.required_roles) {
		return AccessVerdict::allow(AccessReason::RoleMatched);
	}

	if !rule.required_permissions.is_empty() {
		if !principal.has_any_permission(&rule.required_permissions) {
			return AccessVerdict::deny(AccessReason::MissingPermission);
		}
	} else if roles_required {
		// Roles were the only principal-based requirement and none matched.
		return AccessVerdict::deny(AccessReason::MissingRole);
	}

	if let Some(feature) = rule.required_feature.as_deref() {
		match toggles.decide(feature) {
			ToggleDecision::Enabled => {}
			ToggleDecision::Disabled | ToggleDecision::DefaultDeny => {
				return AccessVerdict::deny(AccessReason::FeatureDisabled);
			}
			ToggleDecision::DefaultAllow => {
				if toggles.status() == ToggleCacheStatus::FetchFailed {
					return AccessVerdict::allow(AccessReason::FeatureCheckFailedDefaultAllow);
				}
				// Name absent from a healthy cache but exempted by the
				// allow-list: an ordinary allow.
			}
		}
	}

	AccessVerdict::allow(AccessReason::Ok)
}
