// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an evaluation allowed or denied access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
	/// No principal present.
	NotAuthenticated,
	/// Roles were required and none matched (and no permission path applied).
	MissingRole,
	/// Permissions were required and none matched.
	MissingPermission,
	/// The required feature toggle is disabled (or unknown and denied by
	/// default).
	FeatureDisabled,
	/// The toggle fetch had failed and the configured default allowed the
	/// feature.
	FeatureCheckFailedDefaultAllow,
	/// The principal holds the administrative role; all checks bypassed.
	AdminOverride,
	/// A required role matched; permission and feature checks skipped.
	RoleMatched,
	/// Every applicable check passed.
	Ok,
}

impl fmt::Display for AccessReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AccessReason::NotAuthenticated => write!(f, "not_authenticated"),
			AccessReason::MissingRole => write!(f, "missing_role"),
			AccessReason::MissingPermission => write!(f, "missing_permission"),
			AccessReason::FeatureDisabled => write!(f, "feature_disabled"),
			AccessReason::FeatureCheckFailedDefaultAllow => {
				write!(f, "feature_check_failed_default_allow")
			}
			AccessReason::AdminOverride => write!(f, "admin_override"),
			AccessReason::RoleMatched => write!(f, "role_matched"),
			AccessReason::Ok => write!(f, "ok"),
		}
	}
}

/// The allow/deny outcome plus reason code for one evaluation.
///
/// Computed fresh on every navigation; never cached beyond the current
/// render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessVerdict {
	pub allowed: bool,
	pub reason: AccessReason,
}

impl AccessVerdict {
	/// An allowing verdict with the given reason.
	pub fn allow(reason: AccessReason) -> Self {
		Self {
			allowed: true,
			reason,
		}
	}

	/// A denying verdict with the given reason.
	pub fn deny(reason: AccessReason) -> Self {
		Self {
			allowed: false,
			reason,
		}
	}

	pub fn is_allowed(&self) -> bool {
		self.allowed
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn constructors_set_allowed() {
		assert!(AccessVerdict::allow(AccessReason::Ok).is_allowed());
		assert!(!AccessVerdict::deny(AccessReason::MissingRole).is_allowed());
	}

	#[test]
	fn reason_serializes_snake_case() {
		let json = serde_json::to_string(&AccessReason::AdminOverride).unwrap();
		assert_eq!(json, "\"admin_override\"");
		let json = serde_json::to_string(&AccessReason::FeatureCheckFailedDefaultAllow).unwrap();
		assert_eq!(json, "\"feature_check_failed_default_allow\"");
	}

	#[test]
	fn display_matches_wire_form() {
		for reason in [
			AccessReason::NotAuthenticated,
			AccessReason::MissingRole,
			AccessReason::MissingPermission,
			AccessReason::FeatureDisabled,
			AccessReason::FeatureCheckFailedDefaultAllow,
			AccessReason::AdminOverride,
			AccessReason::RoleMatched,
			AccessReason::Ok,
		] {
			let wire = serde_json::to_string(&reason).unwrap();
			assert_eq!(wire, format!("\"{reason}\""));
		}
	}
}
