// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The feature toggle cache.
//!
//! An explicit, injectable object whose lifecycle is tied to the session:
//! `Unloaded` until a principal exists, `Loading` while the bulk fetch is in
//! flight, then `Ready` or `FetchFailed` for the rest of the session, and
//! back to `Unloaded` on logout. Population is one atomic swap; the cache
//! is never partially updated, and individual toggle reads never write to
//! it. A privileged toggle write is followed by a full re-fetch rather than
//! a local patch, so the mirror cannot drift from the server.
//!
//! Readers take a [`ToggleSnapshot`]; a navigation that has started
//! evaluating cannot observe a swap that lands mid-decision.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, warn};

use atrium_access_core::{FeatureToggle, ToggleCacheStatus, ToggleDefaults, ToggleSnapshot};

#[derive(Debug)]
struct Inner {
	status: ToggleCacheStatus,
	entries: HashMap<String, bool>,
}

/// Process-wide mirror of the server's feature toggles.
#[derive(Debug)]
pub struct ToggleCache {
	inner: RwLock<Inner>,
	defaults: ToggleDefaults,
}

impl ToggleCache {
	/// An unloaded cache with the given fallback policy.
	pub fn new(defaults: ToggleDefaults) -> Self {
		Self {
			inner: RwLock::new(Inner {
				status: ToggleCacheStatus::Unloaded,
				entries: HashMap::new(),
			}),
			defaults,
		}
	}

	pub fn status(&self) -> ToggleCacheStatus {
		self.inner.read().expect("toggle lock poisoned").status
	}

	/// Marks the bulk fetch as in flight.
	pub fn mark_loading(&self) {
		self.inner.write().expect("toggle lock poisoned").status = ToggleCacheStatus::Loading;
	}

	/// Replaces the whole cache from one bulk fetch.
	pub fn install<I>(&self, toggles: I)
	where
		I: IntoIterator<Item = FeatureToggle>,
	{
		let entries: HashMap<String, bool> = toggles
			.into_iter()
			.map(|t| (t.name, t.enabled))
			.collect();
		debug!(count = entries.len(), "feature toggle cache populated");

		let mut inner = self.inner.write().expect("toggle lock poisoned");
		inner.entries = entries;
		inner.status = ToggleCacheStatus::Ready;
	}

	/// Records a failed bulk fetch. The failure is terminal for this session:
	/// defaults answer every lookup until the next login populates the cache.
	pub fn mark_fetch_failed(&self) {
		warn!("feature toggle fetch failed; falling back to configured defaults");
		let mut inner = self.inner.write().expect("toggle lock poisoned");
		inner.entries.clear();
		inner.status = ToggleCacheStatus::FetchFailed;
	}

	/// Empties the cache on logout.
	pub fn reset(&self) {
		let mut inner = self.inner.write().expect("toggle lock poisoned");
		inner.entries.clear();
		inner.status = ToggleCacheStatus::Unloaded;
	}

	/// The immutable view evaluations read.
	pub fn snapshot(&self) -> ToggleSnapshot {
		let inner = self.inner.read().expect("toggle lock poisoned");
		ToggleSnapshot::new(inner.entries.clone(), inner.status, self.defaults.clone())
	}

	/// Point read derived from the cache (never a network call).
	pub fn is_enabled(&self, name: &str) -> bool {
		self.snapshot().is_enabled(name)
	}
}
