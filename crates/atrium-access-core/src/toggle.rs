// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Feature toggle records and the immutable snapshot evaluations read.
//!
//! Toggle state is authoritative only on the server; the client cache is a
//! best-effort mirror. Evaluations never read the live cache directly; they
//! read a [`ToggleSnapshot`], so one navigation's decision cannot observe a
//! mid-flight swap.
//!
//! When a toggle name is absent (or the bulk fetch failed), the fallback is
//! **deny-by-default**: a gate that controls a sensitive capability must not
//! open because the network was down. Purely cosmetic affordances can be
//! exempted through the [`ToggleDefaults`] allow-list.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A named boolean switch gating an optional capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggle {
	pub name: String,
	pub enabled: bool,
	#[serde(default)]
	pub description: Option<String>,
	/// Optional grouping tag.
	#[serde(default)]
	pub category: Option<String>,
}

/// The fallback policy for toggle names the snapshot cannot answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleDefaults {
	allow: HashSet<String>,
}

impl ToggleDefaults {
	/// Deny-by-default with no exemptions.
	pub fn deny_by_default() -> Self {
		Self::default()
	}

	/// Exempts the named cosmetic toggles, defaulting them to allow.
	pub fn with_allowed<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.allow.extend(names.into_iter().map(Into::into));
		self
	}

	/// The fallback value for the given toggle name.
	pub fn default_for(&self, name: &str) -> bool {
		self.allow.contains(name)
	}
}

/// Where the snapshot's answers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleCacheStatus {
	/// No fetch attempted yet (no principal, or just logged out).
	Unloaded,
	/// Bulk fetch in flight.
	Loading,
	/// Bulk fetch succeeded; entries are authoritative as of the fetch.
	Ready,
	/// Bulk fetch failed; entries are empty and defaults apply for the rest
	/// of the session.
	FetchFailed,
}

impl ToggleCacheStatus {
	/// Returns true once the cache has reached a decidable state.
	pub fn is_settled(&self) -> bool {
		matches!(self, ToggleCacheStatus::Ready | ToggleCacheStatus::FetchFailed)
	}
}

/// How a single toggle lookup resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDecision {
	/// Present in the snapshot and enabled.
	Enabled,
	/// Present in the snapshot and disabled.
	Disabled,
	/// Absent; the configured default allowed it.
	DefaultAllow,
	/// Absent; the configured default denied it.
	DefaultDeny,
}

/// The immutable view of the toggle cache one evaluation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSnapshot {
	entries: HashMap<String, bool>,
	status: ToggleCacheStatus,
	defaults: ToggleDefaults,
}

impl ToggleSnapshot {
	pub fn new(
		entries: HashMap<String, bool>,
		status: ToggleCacheStatus,
		defaults: ToggleDefaults,
	) -> Self {
		Self {
			entries,
			status,
			defaults,
		}
	}

	/// A snapshot of a cache that has not attempted a fetch.
	pub fn unloaded(defaults: ToggleDefaults) -> Self {
		Self::new(HashMap::new(), ToggleCacheStatus::Unloaded, defaults)
	}

	/// A snapshot of a successfully populated cache.
	pub fn ready<I>(toggles: I, defaults: ToggleDefaults) -> Self
	where
		I: IntoIterator<Item = (String, bool)>,
	{
		Self::new(
			toggles.into_iter().collect(),
			ToggleCacheStatus::Ready,
			defaults,
		)
	}

	/// A snapshot of a cache whose bulk fetch failed.
	pub fn fetch_failed(defaults: ToggleDefaults) -> Self {
		Self::new(HashMap::new(), ToggleCacheStatus::FetchFailed, defaults)
	}

	pub fn status(&self) -> ToggleCacheStatus {
		self.status
	}

	/// Resolves one toggle name against the snapshot.
	pub fn decide(&self, name: &str) -> ToggleDecision {
		match self.entries.get(name) {
			Some(true) => ToggleDecision::Enabled,
			Some(false) => ToggleDecision::Disabled,
			None => {
				if self.defaults.default_for(name) {
					ToggleDecision::DefaultAllow
				} else {
					ToggleDecision::DefaultDeny
				}
			}
		}
	}

	/// Boolean convenience over [`ToggleSnapshot::decide`].
	pub fn is_enabled(&self, name: &str) -> bool {
		matches!(
			self.decide(name),
			ToggleDecision::Enabled | ToggleDecision::DefaultAllow
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn defaults() -> ToggleDefaults {
		ToggleDefaults::deny_by_default().with_allowed(["theme_picker"])
	}

	#[test]
	fn present_entries_are_authoritative() {
		let snapshot = ToggleSnapshot::ready(
			[
				("payment_integration".to_string(), true),
				("attendance".to_string(), false),
			],
			defaults(),
		);

		assert_eq!(snapshot.decide("payment_integration"), ToggleDecision::Enabled);
		assert_eq!(snapshot.decide("attendance"), ToggleDecision::Disabled);
		assert!(snapshot.is_enabled("payment_integration"));
		assert!(!snapshot.is_enabled("attendance"));
	}

	#[test]
	fn absent_names_deny_by_default() {
		let snapshot = ToggleSnapshot::ready([], defaults());
		assert_eq!(snapshot.decide("payment_integration"), ToggleDecision::DefaultDeny);
		assert!(!snapshot.is_enabled("payment_integration"));
	}

	#[test]
	fn allow_list_exempts_cosmetic_toggles() {
		let snapshot = ToggleSnapshot::ready([], defaults());
		assert_eq!(snapshot.decide("theme_picker"), ToggleDecision::DefaultAllow);
		assert!(snapshot.is_enabled("theme_picker"));
	}

	#[test]
	fn cache_entry_beats_allow_list() {
		let snapshot = ToggleSnapshot::ready([("theme_picker".to_string(), false)], defaults());
		assert_eq!(snapshot.decide("theme_picker"), ToggleDecision::Disabled);
	}

	#[test]
	fn failed_fetch_answers_from_defaults_consistently() {
		let snapshot = ToggleSnapshot::fetch_failed(defaults());
		for _ in 0..3 {
			assert!(!snapshot.is_enabled("payment_integration"));
			assert!(snapshot.is_enabled("theme_picker"));
		}
		assert_eq!(snapshot.status(), ToggleCacheStatus::FetchFailed);
	}

	#[test]
	fn settled_states() {
		assert!(ToggleCacheStatus::Ready.is_settled());
		assert!(ToggleCacheStatus::FetchFailed.is_settled());
		assert!(!ToggleCacheStatus::Unloaded.is_settled());
		assert!(!ToggleCacheStatus::Loading.is_settled());
	}

	#[test]
	fn toggle_deserializes_without_optional_fields() {
		let toggle: FeatureToggle =
			serde_json::from_str(r#"{"name":"attendance","enabled":true}"#).unwrap();
		assert_eq!(toggle.name, "attendance");
		assert!(toggle.enabled);
		assert!(toggle.description.is_none());
		assert!(toggle.category.is_none());
	}
}
