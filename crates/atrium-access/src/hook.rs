// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision observation for activity logging.
//!
//! This module provides the [`DecisionHook`] trait for capturing access
//! decisions as they are made at guard boundaries. The admin console's
//! activity log subscribes here to record who was denied what and why.
//!
//! The hook is called after each settled guard resolution. Implementations
//! should be fast and non-blocking; use background queuing for expensive
//! operations like HTTP requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use atrium_access_core::{AccessRule, AccessVerdict, UserId};

/// Data captured when a guard resolves an access decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
	/// The principal the decision was made for, absent for anonymous
	/// visitors.
	pub principal_id: Option<UserId>,

	/// The rule that was evaluated.
	pub rule: AccessRule,

	/// The outcome, including the reason code.
	pub verdict: AccessVerdict,

	/// Timestamp of the evaluation.
	pub timestamp: DateTime<Utc>,
}

impl AccessDecision {
	/// Creates a new decision record.
	pub fn new(principal_id: Option<UserId>, rule: AccessRule, verdict: AccessVerdict) -> Self {
		Self {
			principal_id,
			rule,
			verdict,
			timestamp: Utc::now(),
		}
	}
}

/// Trait for receiving access decision events.
///
/// Implement this to feed the activity log or any other audit sink.
/// Failures inside a hook must never affect the decision itself.
#[async_trait]
pub trait DecisionHook: Send + Sync + 'static {
	/// Called after a guard resolves to a settled outcome.
	async fn on_decision(&self, decision: AccessDecision);
}

/// Type alias for a shared decision hook.
pub type SharedDecisionHook = Arc<dyn DecisionHook>;

/// A no-op hook that discards all decisions.
///
/// This is used when no activity-log integration is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDecisionHook;

#[async_trait]
impl DecisionHook for NoOpDecisionHook {
	async fn on_decision(&self, _decision: AccessDecision) {
		// No-op: discard the event
	}
}

/// A hook that writes decisions to the tracing subscriber: denials at warn
/// level, allows at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDecisionHook;

#[async_trait]
impl DecisionHook for TracingDecisionHook {
	async fn on_decision(&self, decision: AccessDecision) {
		let principal = decision
			.principal_id
			.map(|id| id.to_string())
			.unwrap_or_else(|| "anonymous".to_string());

		if decision.verdict.is_allowed() {
			tracing::debug!(
				principal = %principal,
				reason = %decision.verdict.reason,
				"access allowed"
			);
		} else {
			tracing::warn!(
				principal = %principal,
				reason = %decision.verdict.reason,
				feature = decision.rule.required_feature.as_deref().unwrap_or("-"),
				"access denied"
			);
		}
	}
}
