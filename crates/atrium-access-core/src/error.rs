// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the access control core.

use thiserror::Error;

/// Errors that can occur while decoding identity material.
#[derive(Debug, Error)]
pub enum AccessError {
	/// Token is malformed or its payload cannot be decoded.
	#[error("invalid token: {0}")]
	InvalidToken(String),

	/// Token expiry has already passed.
	#[error("token expired")]
	TokenExpired,
}

/// Convenience alias for core results.
pub type Result<T> = std::result::Result<T, AccessError>;
