// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The route guard adapter.
//!
//! One guard consumes one declarative [`AccessRule`] and resolves the
//! current session and toggle state into a [`GuardOutcome`] the UI shell
//! maps to widgets: render the protected content, show a loading
//! placeholder, or redirect to the login/unauthorized surface with the
//! denial reason attached.
//!
//! Resolution is a pure function of its inputs, so re-invoking a guard with
//! the same session and cache state always produces the same outcome. The
//! guard never decides a feature gate before the toggle cache has settled: a
//! principal whose rule names a feature sees the loading placeholder, not a
//! premature deny, unless the verdict never consulted the toggle at all
//! (admin override, role match, or a principal-side deny), in which case it
//! is final regardless of cache state.

use tracing::instrument;

use atrium_access_core::{evaluate, AccessReason, AccessRule, ToggleSnapshot};

use crate::cache::ToggleCache;
use crate::hook::{AccessDecision, DecisionHook};
use crate::session::{SessionStore, SessionView};

/// Where a denied navigation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
	/// The login surface, for unauthenticated visitors.
	Login,
	/// The dedicated unauthorized view. Never a silent blank screen.
	Unauthorized,
}

/// What the UI shell should do with a protected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
	/// Session restore or toggle fetch still in flight; show a placeholder.
	Loading,
	/// Verdict allow: render the protected content.
	Render,
	/// Verdict deny: redirect, carrying the reason for display and logging.
	Redirect {
		target: RedirectTarget,
		reason: AccessReason,
	},
}

impl GuardOutcome {
	fn redirect_for(reason: AccessReason) -> Self {
		let target = if reason == AccessReason::NotAuthenticated {
			RedirectTarget::Login
		} else {
			RedirectTarget::Unauthorized
		};
		GuardOutcome::Redirect { target, reason }
	}
}

/// Guards one protected UI region with one declarative rule.
#[derive(Debug, Clone)]
pub struct RouteGuard {
	rule: AccessRule,
}

impl RouteGuard {
	pub fn new(rule: AccessRule) -> Self {
		Self { rule }
	}

	pub fn rule(&self) -> &AccessRule {
		&self.rule
	}

	/// Resolves the guard against explicit snapshots.
	#[instrument(level = "debug", skip(self, session, toggles))]
	pub fn resolve(&self, session: &SessionView, toggles: &ToggleSnapshot) -> GuardOutcome {
		let principal = match session {
			SessionView::Loading => return GuardOutcome::Loading,
			SessionView::Anonymous => {
				return GuardOutcome::redirect_for(AccessReason::NotAuthenticated);
			}
			SessionView::Authenticated(principal) => principal,
		};

		let verdict = evaluate(Some(principal), &self.rule, toggles);

		if self.rule.required_feature.is_some() && !toggles.status().is_settled() {
			// Verdicts that never reached the toggle step are final; anything
			// the feature step decided read an unsettled cache, so hold the
			// region until the fetch resolves.
			return match verdict.reason {
				AccessReason::AdminOverride | AccessReason::RoleMatched => GuardOutcome::Render,
				AccessReason::MissingRole | AccessReason::MissingPermission => {
					GuardOutcome::redirect_for(verdict.reason)
				}
				_ => GuardOutcome::Loading,
			};
		}

		if verdict.is_allowed() {
			GuardOutcome::Render
		} else {
			GuardOutcome::redirect_for(verdict.reason)
		}
	}

	/// Resolves against the live stores by taking fresh snapshots.
	pub fn resolve_live(&self, session: &SessionStore, cache: &ToggleCache) -> GuardOutcome {
		self.resolve(&session.view(), &cache.snapshot())
	}

	/// Resolves against the live stores and reports the settled decision to
	/// the hook. Loading outcomes are not reported: nothing was decided.
	pub async fn resolve_reporting(
		&self,
		session: &SessionStore,
		cache: &ToggleCache,
		hook: &dyn DecisionHook,
	) -> GuardOutcome {
		let view = session.view();
		let toggles = cache.snapshot();
		let outcome = self.resolve(&view, &toggles);

		if outcome != GuardOutcome::Loading {
			let principal = match &view {
				SessionView::Authenticated(p) => Some(p),
				_ => None,
			};
			let verdict = match outcome {
				// Re-derive the verdict for the record against the same
				// snapshot resolve() read.
				GuardOutcome::Render => evaluate(principal, &self.rule, &toggles),
				GuardOutcome::Redirect { reason, .. } => {
					atrium_access_core::AccessVerdict::deny(reason)
				}
				GuardOutcome::Loading => unreachable!(),
			};
			let principal_id = principal.map(|p| p.id);
			hook.on_decision(AccessDecision::new(principal_id, self.rule.clone(), verdict))
				.await;
		}

		outcome
	}
}
