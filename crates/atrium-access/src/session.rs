// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The session store: exclusive owner of the decoded principal.
//!
//! The store holds the principal and its raw bearer token behind one lock so
//! installs and clears are atomic, so readers can never observe a principal
//! whose roles and permissions come from different tokens. Every install and
//! clear bumps an *epoch*; callers that started a request under an older
//! epoch must discard the response when it arrives, so privileged data is
//! never rendered after logout.
//!
//! Token persistence is pluggable behind [`TokenStore`]. The in-memory store
//! backs tests and ephemeral sessions; the file store persists the token
//! across restarts the way a browser tab persists its session.

use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use atrium_access_core::{decode_principal, AccessError, Principal};

use crate::error::{ClientError, Result};

/// Persistence for the raw bearer token.
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
	async fn load(&self) -> Result<Option<String>>;
	async fn save(&self, token: &str) -> Result<()>;
	async fn clear(&self) -> Result<()>;
}

/// Token store that keeps the token in process memory only.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
	token: Mutex<Option<String>>,
}

impl InMemoryTokenStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
	async fn load(&self) -> Result<Option<String>> {
		Ok(self.token.lock().expect("token lock poisoned").clone())
	}

	async fn save(&self, token: &str) -> Result<()> {
		*self.token.lock().expect("token lock poisoned") = Some(token.to_string());
		Ok(())
	}

	async fn clear(&self) -> Result<()> {
		*self.token.lock().expect("token lock poisoned") = None;
		Ok(())
	}
}

/// Token store backed by a single file.
#[derive(Debug)]
pub struct FileTokenStore {
	path: PathBuf,
}

impl FileTokenStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

#[async_trait]
impl TokenStore for FileTokenStore {
	async fn load(&self) -> Result<Option<String>> {
		match tokio::fs::read_to_string(&self.path).await {
			Ok(contents) => {
				let token = contents.trim();
				if token.is_empty() {
					Ok(None)
				} else {
					Ok(Some(token.to_string()))
				}
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(ClientError::TokenStore(e.to_string())),
		}
	}

	async fn save(&self, token: &str) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| ClientError::TokenStore(e.to_string()))?;
		}
		tokio::fs::write(&self.path, token)
			.await
			.map_err(|e| ClientError::TokenStore(e.to_string()))
	}

	async fn clear(&self) -> Result<()> {
		match tokio::fs::remove_file(&self.path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(ClientError::TokenStore(e.to_string())),
		}
	}
}

/// What a guard sees when it asks for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
	/// A persisted-token restore is still in flight.
	Loading,
	/// No live principal.
	Anonymous,
	/// A live, unexpired principal.
	Authenticated(Principal),
}

#[derive(Debug)]
struct Inner {
	restoring: bool,
	principal: Option<Principal>,
	token: Option<String>,
	epoch: u64,
}

/// Exclusive owner of the decoded principal and its bearer token.
#[derive(Debug)]
pub struct SessionStore {
	inner: RwLock<Inner>,
}

impl SessionStore {
	/// A ready, anonymous store.
	pub fn new() -> Self {
		Self {
			inner: RwLock::new(Inner {
				restoring: false,
				principal: None,
				token: None,
				epoch: 0,
			}),
		}
	}

	/// A store that reports [`SessionView::Loading`] until
	/// [`SessionStore::restore`] completes.
	pub fn new_restoring() -> Self {
		let store = Self::new();
		store.inner.write().expect("session lock poisoned").restoring = true;
		store
	}

	/// The current session generation. Bumped on every install and clear.
	pub fn epoch(&self) -> u64 {
		self.inner.read().expect("session lock poisoned").epoch
	}

	/// The current view, with expiry applied: an installed principal whose
	/// token has expired reads as [`SessionView::Anonymous`].
	pub fn view(&self) -> SessionView {
		let inner = self.inner.read().expect("session lock poisoned");
		if inner.restoring {
			return SessionView::Loading;
		}
		match &inner.principal {
			Some(p) if !p.is_expired_at(Utc::now()) => SessionView::Authenticated(p.clone()),
			_ => SessionView::Anonymous,
		}
	}

	/// The live principal, if any.
	pub fn principal(&self) -> Option<Principal> {
		match self.view() {
			SessionView::Authenticated(p) => Some(p),
			_ => None,
		}
	}

	/// The bearer token to attach to outbound calls, absent once the
	/// principal is gone or expired.
	pub fn bearer_token(&self) -> Option<String> {
		let inner = self.inner.read().expect("session lock poisoned");
		match &inner.principal {
			Some(p) if !p.is_expired_at(Utc::now()) => inner.token.clone(),
			_ => None,
		}
	}

	/// Atomically replaces the whole principal and token from one decode.
	/// Returns the new epoch.
	pub fn install(&self, principal: Principal, token: String) -> u64 {
		let mut inner = self.inner.write().expect("session lock poisoned");
		inner.principal = Some(principal);
		inner.token = Some(token);
		inner.restoring = false;
		inner.epoch += 1;
		inner.epoch
	}

	/// Synchronously clears the principal and token. Returns the new epoch.
	pub fn clear(&self) -> u64 {
		let mut inner = self.inner.write().expect("session lock poisoned");
		inner.principal = None;
		inner.token = None;
		inner.restoring = false;
		inner.epoch += 1;
		inner.epoch
	}

	/// Attempts to restore a session from a persisted token.
	///
	/// An expired or undecodable persisted token is treated as absent: the
	/// stale record is cleared and re-login is required. Returns true if a
	/// live principal was installed.
	pub async fn restore(&self, store: &dyn TokenStore) -> Result<bool> {
		let loaded = store.load().await;

		let outcome = match loaded {
			Ok(Some(token)) => match decode_principal(&token, Utc::now()) {
				Ok(principal) => {
					self.install(principal, token);
					Ok(true)
				}
				Err(AccessError::TokenExpired) => {
					debug!("persisted token has expired; requiring re-login");
					let _ = store.clear().await;
					Ok(false)
				}
				Err(e) => {
					warn!(error = %e, "persisted token is not decodable; requiring re-login");
					let _ = store.clear().await;
					Ok(false)
				}
			},
			Ok(None) => Ok(false),
			Err(e) => Err(e),
		};

		// Leave the loading state regardless of how the restore went.
		self.inner.write().expect("session lock poisoned").restoring = false;
		outcome
	}

	/// Clears the in-memory session first, then the persisted token.
	pub async fn logout(&self, store: &dyn TokenStore) -> Result<()> {
		self.clear();
		store.clear().await
	}
}

impl Default for SessionStore {
	fn default() -> Self {
		Self::new()
	}
}
