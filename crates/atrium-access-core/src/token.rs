// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity token decoding.
//!
//! The backend issues a signed JWT-shaped bearer token whose payload segment
//! carries the user's identity, role set, and permission set. The client
//! decodes that payload for UI gating only and never verifies the signature:
//! the token is opaque credential material, and the backend independently
//! re-validates every permission-sensitive operation. Claims decoded here are
//! advisory.
//!
//! Decoding is a single atomic operation: a [`Principal`] is either built
//! from the whole payload or not at all, so roles and permissions can never
//! be observed partially updated.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AccessError, Result};
use crate::principal::{PermissionCode, Principal, RoleName, UserId};

/// The decoded payload of an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
	pub user_id: UserId,
	pub email: String,
	#[serde(default)]
	pub first_name: String,
	#[serde(default)]
	pub last_name: String,
	#[serde(default)]
	pub roles: Vec<String>,
	#[serde(default)]
	pub permissions: Vec<String>,
	/// Expiry as seconds since the Unix epoch.
	pub exp: i64,
}

impl TokenClaims {
	/// The expiry instant carried by the token.
	pub fn expires_at(&self) -> Result<DateTime<Utc>> {
		Utc.timestamp_opt(self.exp, 0)
			.single()
			.ok_or_else(|| AccessError::InvalidToken(format!("exp out of range: {}", self.exp)))
	}

	/// Returns true if the claims have expired as of `now`.
	pub fn is_expired_at(&self, now: DateTime<Utc>) -> Result<bool> {
		Ok(self.expires_at()? <= now)
	}

	/// Builds the principal these claims describe.
	///
	/// Roles and permissions are taken wholesale from the claims; the display
	/// name is the given names joined, falling back to the email address when
	/// the token carries no name.
	pub fn into_principal(self) -> Result<Principal> {
		let expires_at = self.expires_at()?;
		let display_name = match format!("{} {}", self.first_name, self.last_name)
			.trim()
			.to_string()
		{
			name if name.is_empty() => self.email.clone(),
			name => name,
		};

		Ok(Principal {
			id: self.user_id,
			email: self.email,
			display_name,
			roles: self.roles.into_iter().map(RoleName::from).collect(),
			permissions: self
				.permissions
				.into_iter()
				.map(PermissionCode::from)
				.collect(),
			token_expiry: expires_at,
		})
	}
}

/// Decodes the payload segment of a bearer token into [`TokenClaims`].
///
/// Accepts the standard three-segment `header.payload.signature` form. The
/// signature segment is not inspected.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
	let mut segments = token.split('.');
	let payload = match (segments.next(), segments.next()) {
		(Some(_header), Some(payload)) if !payload.is_empty() => payload,
		_ => {
			return Err(AccessError::InvalidToken(
				"token has no payload segment".to_string(),
			));
		}
	};

	let bytes = URL_SAFE_NO_PAD
		.decode(payload)
		.map_err(|e| AccessError::InvalidToken(format!("payload is not base64url: {e}")))?;

	serde_json::from_slice(&bytes)
		.map_err(|e| AccessError::InvalidToken(format!("payload is not valid claims JSON: {e}")))
}

/// Decodes a token and builds its principal in one step, rejecting tokens
/// already expired as of `now`.
pub fn decode_principal(token: &str, now: DateTime<Utc>) -> Result<Principal> {
	let claims = decode_claims(token)?;
	if claims.is_expired_at(now)? {
		return Err(AccessError::TokenExpired);
	}
	claims.into_principal()
}
