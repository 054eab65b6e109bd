// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the access client SDK.

use thiserror::Error;

/// Errors surfaced by the session store, toggle cache, and REST client.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The bearer credential is absent, expired, or was rejected with `401`.
	/// Recovered locally by forcing logout and redirecting to login.
	#[error("authentication expired")]
	AuthExpired,

	/// Login was rejected by the backend.
	#[error("invalid credentials")]
	InvalidCredentials,

	/// The backend answered `403`. Surfaced as an insufficient-permission
	/// notice; the session is retained.
	#[error("insufficient permission")]
	PermissionDenied,

	/// The bulk feature-toggle fetch failed. Non-fatal: the cache falls back
	/// to its configured defaults for the rest of the session.
	#[error("feature toggle fetch failed: {0}")]
	ToggleFetchFailed(String),

	/// The backend answered 5xx on an authenticated call.
	#[error("backend unavailable: status {0}")]
	BackendUnavailable(u16),

	/// The backend answered a status the contract does not cover.
	#[error("unexpected response status: {0}")]
	UnexpectedStatus(u16),

	/// Identity token could not be decoded or had expired.
	#[error(transparent)]
	Token(#[from] atrium_access_core::AccessError),

	/// Transport-level failure.
	#[error("transport error: {0}")]
	Transport(#[from] reqwest::Error),

	/// The persisted-token store failed.
	#[error("token store error: {0}")]
	TokenStore(String),

	/// The client was built with an unusable configuration.
	#[error("invalid client configuration: {0}")]
	Config(String),
}

/// Convenience alias for SDK results.
pub type Result<T> = std::result::Result<T, ClientError>;
