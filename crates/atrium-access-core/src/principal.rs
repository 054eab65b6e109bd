// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated actor and its pure membership checks.
//!
//! A [`Principal`] is built atomically from one token decode (see
//! [`crate::token`]) and is never partially updated: roles and permissions
//! always come from the same decode. The membership helpers here are pure
//! and deterministic; they read nothing but the principal itself, so the
//! decision engine can be tested without any session plumbing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The distinguished administrative role. Matched case-insensitively.
pub const ADMIN_ROLE: &str = "admin";

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
	/// Create a new ID from a UUID.
	pub fn new(id: Uuid) -> Self {
		Self(id)
	}

	/// Generate a new random ID.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}

	/// Get the inner UUID value.
	pub fn into_inner(self) -> Uuid {
		self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<Uuid> for UserId {
	fn from(id: Uuid) -> Self {
		Self(id)
	}
}

/// A named role held by a principal or required by an access rule.
///
/// Role names are compared exactly, except for [`ADMIN_ROLE`] which is
/// recognised in any case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true if this is the distinguished administrative role.
	pub fn is_admin(&self) -> bool {
		self.0.eq_ignore_ascii_case(ADMIN_ROLE)
	}
}

impl fmt::Display for RoleName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for RoleName {
	fn from(name: &str) -> Self {
		Self(name.to_string())
	}
}

impl From<String> for RoleName {
	fn from(name: String) -> Self {
		Self(name)
	}
}

/// A permission code held by a principal or required by an access rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(String);

impl PermissionCode {
	pub fn new(code: impl Into<String>) -> Self {
		Self(code.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PermissionCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for PermissionCode {
	fn from(code: &str) -> Self {
		Self(code.to_string())
	}
}

impl From<String> for PermissionCode {
	fn from(code: String) -> Self {
		Self(code)
	}
}

/// The authenticated actor whose access is being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
	pub id: UserId,
	pub email: String,
	pub display_name: String,
	pub roles: Vec<RoleName>,
	pub permissions: Vec<PermissionCode>,
	pub token_expiry: DateTime<Utc>,
}

impl Principal {
	/// Returns true if the principal holds the distinguished administrative
	/// role, in any case.
	pub fn is_admin(&self) -> bool {
		self.roles.iter().any(|r| r.is_admin())
	}

	/// Returns true if the principal holds the given role.
	pub fn has_role(&self, role: &RoleName) -> bool {
		self.roles.contains(role)
	}

	/// Any-of check over roles.
	///
	/// An empty requirement list is vacuously satisfied.
	pub fn has_any_role(&self, required: &[RoleName]) -> bool {
		required.is_empty() || required.iter().any(|r| self.has_role(r))
	}

	/// Returns true if the principal holds the given permission.
	pub fn has_permission(&self, permission: &PermissionCode) -> bool {
		self.permissions.contains(permission)
	}

	/// Any-of check over permissions.
	///
	/// An empty requirement list is vacuously satisfied.
	pub fn has_any_permission(&self, required: &[PermissionCode]) -> bool {
		required.is_empty() || required.iter().any(|p| self.has_permission(p))
	}

	/// Returns true if the principal's token has expired as of `now`.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
		self.token_expiry <= now
	}
}
