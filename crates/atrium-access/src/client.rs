// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The typed REST client for the Atrium backend.
//!
//! Every call carries the session's bearer token. Status mapping follows the
//! backend contract: `401` clears the session (forced logout), `403`
//! surfaces an insufficient-permission notice without clearing it, and 5xx
//! surfaces as a transient backend failure. Responses that arrive after the
//! session epoch has advanced are discarded, never applied.
//!
//! Toggle reads use only the bulk form; point reads derive from the cache.
//! Toggle writes are followed by a full re-fetch so the mirror never drifts
//! from the server.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use atrium_access_core::{decode_principal, FeatureToggle, Principal, ToggleDefaults, UserId};

use crate::cache::ToggleCache;
use crate::error::{ClientError, Result};
use crate::session::{InMemoryTokenStore, SessionStore, TokenStore};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
	email: &'a str,
	password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
	token: String,
	user: UserProfile,
}

/// The user payload returned by the backend.
///
/// Authorization data (roles, permissions) comes from the decoded token, not
/// from this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
	pub id: UserId,
	pub email: String,
	#[serde(default)]
	pub first_name: String,
	#[serde(default)]
	pub last_name: String,
}

/// Wire form of one toggle. Accepts both `enabled` and `is_enabled`
/// spellings; older backend builds emit the latter.
#[derive(Debug, Deserialize)]
struct TogglePayload {
	#[serde(alias = "name")]
	feature_name: String,
	#[serde(alias = "is_enabled")]
	enabled: bool,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	category: Option<String>,
}

impl From<TogglePayload> for FeatureToggle {
	fn from(payload: TogglePayload) -> Self {
		FeatureToggle {
			name: payload.feature_name,
			enabled: payload.enabled,
			description: payload.description,
			category: payload.category,
		}
	}
}

/// Body for toggle create/update calls.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleWrite {
	pub feature_name: String,
	pub enabled: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
}

/// Builder for [`AccessClient`].
pub struct AccessClientBuilder {
	base_url: Option<String>,
	timeout: Option<Duration>,
	session: Option<Arc<SessionStore>>,
	toggles: Option<Arc<ToggleCache>>,
	token_store: Option<Arc<dyn TokenStore>>,
	toggle_defaults: ToggleDefaults,
}

impl AccessClientBuilder {
	fn new() -> Self {
		Self {
			base_url: None,
			timeout: None,
			session: None,
			toggles: None,
			token_store: None,
			toggle_defaults: ToggleDefaults::deny_by_default(),
		}
	}

	/// Base URL of the backend, e.g. `https://atrium.example.com/api`.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = Some(base_url.into());
		self
	}

	/// Request timeout for every call.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Share an existing session store instead of creating one.
	pub fn session(mut self, session: Arc<SessionStore>) -> Self {
		self.session = Some(session);
		self
	}

	/// Share an existing toggle cache instead of creating one.
	pub fn toggles(mut self, toggles: Arc<ToggleCache>) -> Self {
		self.toggles = Some(toggles);
		self
	}

	/// Fallback policy for the toggle cache the builder creates. Ignored
	/// when a cache is shared via [`AccessClientBuilder::toggles`].
	pub fn toggle_defaults(mut self, defaults: ToggleDefaults) -> Self {
		self.toggle_defaults = defaults;
		self
	}

	/// Persist the bearer token through the given store.
	pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
		self.token_store = Some(store);
		self
	}

	pub fn build(self) -> Result<AccessClient> {
		let base_url = self
			.base_url
			.ok_or_else(|| ClientError::Config("base_url is required".to_string()))?
			.trim_end_matches('/')
			.to_string();

		let http = match self.timeout {
			Some(timeout) => atrium_common_http::new_client_with_timeout(timeout),
			None => atrium_common_http::new_client(),
		};

		Ok(AccessClient {
			http,
			base_url,
			session: self.session.unwrap_or_default(),
			toggles: self
				.toggles
				.unwrap_or_else(|| Arc::new(ToggleCache::new(self.toggle_defaults))),
			token_store: self
				.token_store
				.unwrap_or_else(|| Arc::new(InMemoryTokenStore::new())),
		})
	}
}

/// Typed client over the Atrium backend contract.
pub struct AccessClient {
	http: reqwest::Client,
	base_url: String,
	session: Arc<SessionStore>,
	toggles: Arc<ToggleCache>,
	token_store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for AccessClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccessClient")
			.field("http", &self.http)
			.field("base_url", &self.base_url)
			.field("session", &self.session)
			.field("toggles", &self.toggles)
			.finish_non_exhaustive()
	}
}

impl AccessClient {
	pub fn builder() -> AccessClientBuilder {
		AccessClientBuilder::new()
	}

	pub fn session(&self) -> &Arc<SessionStore> {
		&self.session
	}

	pub fn toggles(&self) -> &Arc<ToggleCache> {
		&self.toggles
	}

	/// Authenticates and installs the decoded principal atomically, then
	/// populates the toggle cache. A failed toggle fetch degrades to the
	/// configured defaults and does not fail the login.
	pub async fn login(&self, email: &str, password: &str) -> Result<Principal> {
		let url = format!("{}/authentication/login", self.base_url);
		let response = self
			.http
			.post(&url)
			.json(&LoginRequest { email, password })
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			return Err(match status {
				StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::InvalidCredentials,
				s if s.is_server_error() => ClientError::BackendUnavailable(s.as_u16()),
				s => ClientError::UnexpectedStatus(s.as_u16()),
			});
		}

		let body: LoginResponse = response.json().await?;
		let principal = decode_principal(&body.token, Utc::now())?;
		debug!(user = %body.user.email, "login accepted");
		self.session.install(principal.clone(), body.token.clone());
		self.token_store.save(&body.token).await?;

		match self.refresh_toggles().await {
			Ok(()) => {}
			Err(ClientError::ToggleFetchFailed(e)) => {
				warn!(error = %e, "feature toggles unavailable after login; defaults apply");
			}
			Err(e) => return Err(e),
		}

		Ok(principal)
	}

	/// Restores a persisted session at application start, then populates the
	/// toggle cache. Returns true if a live principal was installed.
	pub async fn restore_session(&self) -> Result<bool> {
		let restored = self.session.restore(self.token_store.as_ref()).await?;
		if restored {
			match self.refresh_toggles().await {
				Ok(()) => {}
				Err(ClientError::ToggleFetchFailed(e)) => {
					warn!(error = %e, "feature toggles unavailable after restore; defaults apply");
				}
				Err(e) => return Err(e),
			}
		}
		Ok(restored)
	}

	/// Clears the session synchronously, then the toggle cache and the
	/// persisted token. No redirect happens until this returns.
	pub async fn logout(&self) -> Result<()> {
		self.session.clear();
		self.toggles.reset();
		self.token_store.clear().await
	}

	/// Bulk-fetches all toggles and swaps the cache wholesale.
	///
	/// Failures leave the cache in the fetch-failed state: non-fatal,
	/// answered by defaults until the next login or restore.
	pub async fn refresh_toggles(&self) -> Result<()> {
		let token = self.bearer()?;
		let epoch = self.session.epoch();
		self.toggles.mark_loading();

		let url = format!("{}/feature-toggles", self.base_url);
		let response = match self.http.get(&url).bearer_auth(&token).send().await {
			Ok(response) => response,
			Err(e) => {
				if self.session.epoch() == epoch {
					self.toggles.mark_fetch_failed();
				}
				return Err(ClientError::ToggleFetchFailed(e.to_string()));
			}
		};

		if self.session.epoch() != epoch {
			debug!("discarding toggle response from a previous session");
			return Ok(());
		}

		let status = response.status();
		if status == StatusCode::UNAUTHORIZED {
			self.force_logout().await;
			return Err(ClientError::AuthExpired);
		}
		if !status.is_success() {
			self.toggles.mark_fetch_failed();
			return Err(ClientError::ToggleFetchFailed(format!("status {status}")));
		}

		let payload: Vec<TogglePayload> = match response.json().await {
			Ok(payload) => payload,
			Err(e) => {
				if self.session.epoch() == epoch {
					self.toggles.mark_fetch_failed();
				}
				return Err(ClientError::ToggleFetchFailed(e.to_string()));
			}
		};

		if self.session.epoch() != epoch {
			debug!("discarding toggle response from a previous session");
			return Ok(());
		}

		self.toggles
			.install(payload.into_iter().map(FeatureToggle::from));
		Ok(())
	}

	/// Fetches the current user's profile.
	pub async fn fetch_profile(&self) -> Result<UserProfile> {
		let token = self.bearer()?;
		let epoch = self.session.epoch();

		let url = format!("{}/profile", self.base_url);
		let response = self.http.get(&url).bearer_auth(&token).send().await?;
		let response = self.ensure_success(response).await?;
		let profile: UserProfile = response.json().await?;

		if self.session.epoch() != epoch {
			return Err(ClientError::AuthExpired);
		}
		Ok(profile)
	}

	/// Creates a toggle, then re-fetches the whole cache.
	pub async fn create_toggle(&self, toggle: &ToggleWrite) -> Result<()> {
		let token = self.bearer()?;
		let url = format!("{}/feature-toggles", self.base_url);
		let response = self
			.http
			.post(&url)
			.bearer_auth(&token)
			.json(toggle)
			.send()
			.await?;
		self.ensure_success(response).await?;
		self.refresh_toggles().await
	}

	/// Updates a toggle, then re-fetches the whole cache.
	pub async fn update_toggle(&self, name: &str, toggle: &ToggleWrite) -> Result<()> {
		let token = self.bearer()?;
		let url = format!("{}/feature-toggles/{name}", self.base_url);
		let response = self
			.http
			.put(&url)
			.bearer_auth(&token)
			.json(toggle)
			.send()
			.await?;
		self.ensure_success(response).await?;
		self.refresh_toggles().await
	}

	/// Deletes a toggle, then re-fetches the whole cache.
	pub async fn delete_toggle(&self, name: &str) -> Result<()> {
		let token = self.bearer()?;
		let url = format!("{}/feature-toggles/{name}", self.base_url);
		let response = self.http.delete(&url).bearer_auth(&token).send().await?;
		self.ensure_success(response).await?;
		self.refresh_toggles().await
	}

	fn bearer(&self) -> Result<String> {
		self.session.bearer_token().ok_or(ClientError::AuthExpired)
	}

	/// Maps the contract's status codes to the error taxonomy. `401` forces
	/// a local logout before surfacing.
	async fn ensure_success(&self, response: reqwest::Response) -> Result<reqwest::Response> {
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		if status == StatusCode::UNAUTHORIZED {
			self.force_logout().await;
			return Err(ClientError::AuthExpired);
		}
		if status == StatusCode::FORBIDDEN {
			return Err(ClientError::PermissionDenied);
		}
		if status.is_server_error() {
			return Err(ClientError::BackendUnavailable(status.as_u16()));
		}
		Err(ClientError::UnexpectedStatus(status.as_u16()))
	}

	async fn force_logout(&self) {
		self.session.clear();
		self.toggles.reset();
		if let Err(e) = self.token_store.clear().await {
			warn!(error = %e, "failed to clear persisted token during forced logout");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::SessionView;
	use atrium_access_core::{PermissionCode, RoleName, ToggleCacheStatus};
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use base64::Engine;
	use chrono::Duration as ChronoDuration;
	use serde_json::json;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn token(exp_offset_secs: i64) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(
			serde_json::to_vec(&json!({
				"user_id": "550e8400-e29b-41d4-a716-446655440000",
				"email": "ops@example.com",
				"first_name": "Amara",
				"last_name": "Okafor",
				"roles": ["full_access"],
				"permissions": ["payment_view"],
				"exp": (Utc::now() + ChronoDuration::seconds(exp_offset_secs)).timestamp(),
			}))
			.unwrap(),
		);
		format!("{header}.{payload}.sig")
	}

	fn live_principal() -> Principal {
		Principal {
			id: UserId::generate(),
			email: "ops@example.com".to_string(),
			display_name: "Ops User".to_string(),
			roles: vec![RoleName::from("full_access")],
			permissions: vec![PermissionCode::from("payment_view")],
			token_expiry: Utc::now() + ChronoDuration::hours(1),
		}
	}

	fn client_for(server: &MockServer) -> AccessClient {
		AccessClient::builder()
			.base_url(server.uri())
			.build()
			.unwrap()
	}

	fn toggles_body() -> serde_json::Value {
		json!([
			{"feature_name": "payment_integration", "enabled": true, "description": "Payment QR codes"},
			{"feature_name": "attendance", "is_enabled": false},
		])
	}

	#[tokio::test]
	async fn login_installs_principal_and_populates_toggles() {
		let server = MockServer::start().await;
		let session_token = token(3600);

		Mock::given(method("POST"))
			.and(path("/authentication/login"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": session_token,
				"user": {
					"id": "550e8400-e29b-41d4-a716-446655440000",
					"email": "ops@example.com",
					"first_name": "Amara",
					"last_name": "Okafor",
				},
			})))
			.expect(1)
			.mount(&server)
			.await;

		Mock::given(method("GET"))
			.and(path("/feature-toggles"))
			.and(header("authorization", format!("Bearer {session_token}").as_str()))
			.respond_with(ResponseTemplate::new(200).set_body_json(toggles_body()))
			.expect(1)
			.mount(&server)
			.await;

		let client = client_for(&server);
		let principal = client.login("ops@example.com", "hunter2").await.unwrap();

		assert_eq!(principal.email, "ops@example.com");
		assert!(principal.has_permission(&PermissionCode::from("payment_view")));
		assert!(matches!(
			client.session().view(),
			SessionView::Authenticated(_)
		));

		// Both spellings landed in the cache.
		assert_eq!(client.toggles().status(), ToggleCacheStatus::Ready);
		assert!(client.toggles().is_enabled("payment_integration"));
		assert!(!client.toggles().is_enabled("attendance"));
	}

	#[tokio::test]
	async fn rejected_login_is_invalid_credentials() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/authentication/login"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let client = client_for(&server);
		let err = client.login("ops@example.com", "wrong").await.unwrap_err();

		assert!(matches!(err, ClientError::InvalidCredentials));
		assert_eq!(client.session().view(), SessionView::Anonymous);
	}

	#[tokio::test]
	async fn failed_toggle_fetch_does_not_fail_login() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/authentication/login"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"token": token(3600),
				"user": {"id": "550e8400-e29b-41d4-a716-446655440000", "email": "ops@example.com"},
			})))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/feature-toggles"))
			.respond_with(ResponseTemplate::new(500))
			.mount(&server)
			.await;

		let client = client_for(&server);
		client.login("ops@example.com", "hunter2").await.unwrap();

		// Logged in, but the cache degrades to defaults.
		assert!(matches!(
			client.session().view(),
			SessionView::Authenticated(_)
		));
		assert_eq!(client.toggles().status(), ToggleCacheStatus::FetchFailed);
		assert!(!client.toggles().is_enabled("payment_integration"));
	}

	#[tokio::test]
	async fn unauthorized_response_forces_logout() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/profile"))
			.respond_with(ResponseTemplate::new(401))
			.mount(&server)
			.await;

		let client = client_for(&server);
		client
			.session()
			.install(live_principal(), "stale-token".to_string());

		let err = client.fetch_profile().await.unwrap_err();
		assert!(matches!(err, ClientError::AuthExpired));
		assert_eq!(client.session().view(), SessionView::Anonymous);
		assert_eq!(client.toggles().status(), ToggleCacheStatus::Unloaded);
	}

	#[tokio::test]
	async fn forbidden_response_keeps_the_session() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path("/feature-toggles/payment_integration"))
			.respond_with(ResponseTemplate::new(403))
			.mount(&server)
			.await;

		let client = client_for(&server);
		client
			.session()
			.install(live_principal(), "tok".to_string());

		let write = ToggleWrite {
			feature_name: "payment_integration".to_string(),
			enabled: false,
			description: None,
			category: None,
		};
		let err = client
			.update_toggle("payment_integration", &write)
			.await
			.unwrap_err();

		assert!(matches!(err, ClientError::PermissionDenied));
		// 403 surfaces a notice; the session survives.
		assert!(matches!(
			client.session().view(),
			SessionView::Authenticated(_)
		));
	}

	#[tokio::test]
	async fn toggle_write_triggers_a_full_refetch() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path("/feature-toggles/attendance"))
			.respond_with(ResponseTemplate::new(204))
			.expect(1)
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/feature-toggles"))
			.respond_with(
				ResponseTemplate::new(200)
					.set_body_json(json!([{"feature_name": "attendance", "enabled": true}])),
			)
			.expect(1)
			.mount(&server)
			.await;

		let client = client_for(&server);
		client
			.session()
			.install(live_principal(), "tok".to_string());

		let write = ToggleWrite {
			feature_name: "attendance".to_string(),
			enabled: true,
			description: None,
			category: None,
		};
		client.update_toggle("attendance", &write).await.unwrap();

		// The cache was replaced from the re-fetch, not patched locally.
		assert_eq!(client.toggles().status(), ToggleCacheStatus::Ready);
		assert!(client.toggles().is_enabled("attendance"));
	}

	#[tokio::test]
	async fn backend_errors_surface_as_unavailable() {
		let server = MockServer::start().await;
		Mock::given(method("DELETE"))
			.and(path("/feature-toggles/attendance"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		let client = client_for(&server);
		client
			.session()
			.install(live_principal(), "tok".to_string());

		let err = client.delete_toggle("attendance").await.unwrap_err();
		assert!(matches!(err, ClientError::BackendUnavailable(503)));
	}

	#[tokio::test]
	async fn calls_without_a_session_are_auth_expired() {
		let server = MockServer::start().await;
		let client = client_for(&server);

		let err = client.fetch_profile().await.unwrap_err();
		assert!(matches!(err, ClientError::AuthExpired));

		let err = client.refresh_toggles().await.unwrap_err();
		assert!(matches!(err, ClientError::AuthExpired));
	}

	#[tokio::test]
	async fn restore_session_populates_toggles() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/feature-toggles"))
			.respond_with(ResponseTemplate::new(200).set_body_json(toggles_body()))
			.expect(1)
			.mount(&server)
			.await;

		let token_store: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
		token_store.save(&token(3600)).await.unwrap();

		let client = AccessClient::builder()
			.base_url(server.uri())
			.token_store(token_store)
			.build()
			.unwrap();

		assert!(client.restore_session().await.unwrap());
		assert!(matches!(
			client.session().view(),
			SessionView::Authenticated(_)
		));
		assert_eq!(client.toggles().status(), ToggleCacheStatus::Ready);
	}

	#[tokio::test]
	async fn logout_clears_session_cache_and_persisted_token() {
		let server = MockServer::start().await;
		let token_store: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
		token_store.save("tok").await.unwrap();

		let client = AccessClient::builder()
			.base_url(server.uri())
			.token_store(Arc::clone(&token_store))
			.build()
			.unwrap();
		client
			.session()
			.install(live_principal(), "tok".to_string());

		client.logout().await.unwrap();
		assert_eq!(client.session().view(), SessionView::Anonymous);
		assert_eq!(client.toggles().status(), ToggleCacheStatus::Unloaded);
		assert!(token_store.load().await.unwrap().is_none());
	}

	#[test]
	fn builder_requires_a_base_url() {
		let err = AccessClient::builder().build().unwrap_err();
		assert!(matches!(err, ClientError::Config(_)));
	}
}
