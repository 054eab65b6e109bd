// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative access requirements for protected resources.

use serde::{Deserialize, Serialize};

use crate::principal::{PermissionCode, RoleName};

/// The declarative requirement set attached to a protected resource (a route
/// or an action).
///
/// Role and permission lists carry any-of semantics. A rule with no
/// requirements at all always evaluates to "allowed" for an authenticated
/// principal. Rules are defined statically per protected resource and never
/// mutated at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
	#[serde(default)]
	pub required_roles: Vec<RoleName>,
	#[serde(default)]
	pub required_permissions: Vec<PermissionCode>,
	#[serde(default)]
	pub required_feature: Option<String>,
}

impl AccessRule {
	/// A rule with no requirements: any authenticated principal is allowed.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: require any of the given roles.
	pub fn with_roles<I, R>(mut self, roles: I) -> Self
	where
		I: IntoIterator<Item = R>,
		R: Into<RoleName>,
	{
		self.required_roles = roles.into_iter().map(Into::into).collect();
		self
	}

	/// Builder: require any of the given permissions.
	pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PermissionCode>,
	{
		self.required_permissions = permissions.into_iter().map(Into::into).collect();
		self
	}

	/// Builder: require the named feature toggle to be enabled.
	pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
		self.required_feature = Some(feature.into());
		self
	}

	/// Returns true if the rule carries no requirements at all.
	pub fn is_empty(&self) -> bool {
		self.required_roles.is_empty()
			&& self.required_permissions.is_empty()
			&& self.required_feature.is_none()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_rule_is_empty() {
		assert!(AccessRule::new().is_empty());
	}

	#[test]
	fn builder_populates_requirements() {
		let rule = AccessRule::new()
			.with_roles(["full_access"])
			.with_permissions(["payment_view"])
			.with_feature("payment_integration");

		assert!(!rule.is_empty());
		assert_eq!(rule.required_roles, vec![RoleName::from("full_access")]);
		assert_eq!(
			rule.required_permissions,
			vec![PermissionCode::from("payment_view")]
		);
		assert_eq!(rule.required_feature.as_deref(), Some("payment_integration"));
	}

	#[test]
	fn any_single_requirement_makes_rule_non_empty() {
		assert!(!AccessRule::new().with_roles(["viewer"]).is_empty());
		assert!(!AccessRule::new().with_permissions(["user_view"]).is_empty());
		assert!(!AccessRule::new().with_feature("attendance").is_empty());
	}

	#[test]
	fn deserializes_with_missing_fields() {
		let rule: AccessRule = serde_json::from_str("{}").unwrap();
		assert!(rule.is_empty());
	}
}
