// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Accumulated state merged into every captured event.

use std::collections::{HashMap, VecDeque};

use crate::breadcrumb::Breadcrumb;
use crate::context::{ContextMap, UserContext};

/// Maximum number of breadcrumbs kept by default.
pub const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// Tags, contexts, extras, user identity and breadcrumbs accumulated until overwritten.
///
/// Every setter is last-write-wins per key. A scope is a plain value: callers
/// needing per-request isolation clone it.
#[derive(Debug, Clone)]
pub struct Scope {
	tags: HashMap<String, String>,
	contexts: HashMap<String, ContextMap>,
	extra: ContextMap,
	user: Option<UserContext>,
	breadcrumbs: VecDeque<Breadcrumb>,
	max_breadcrumbs: usize,
}

impl Default for Scope {
	fn default() -> Self {
		Self::with_max_breadcrumbs(DEFAULT_MAX_BREADCRUMBS)
	}
}

impl Scope {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_breadcrumbs(max_breadcrumbs: usize) -> Self {
		Self {
			tags: HashMap::new(),
			contexts: HashMap::new(),
			extra: ContextMap::new(),
			user: None,
			breadcrumbs: VecDeque::new(),
			max_breadcrumbs,
		}
	}

	pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.tags.insert(key.into(), value.into());
	}

	pub fn remove_tag(&mut self, key: &str) {
		self.tags.remove(key);
	}

	pub fn set_context(&mut self, key: impl Into<String>, value: ContextMap) {
		self.contexts.insert(key.into(), value);
	}

	pub fn remove_context(&mut self, key: &str) {
		self.contexts.remove(key);
	}

	pub fn set_extra(&mut self, key: impl Into<String>, value: serde_json::Value) {
		self.extra.insert(key.into(), value);
	}

	pub fn set_user(&mut self, user: UserContext) {
		self.user = Some(user);
	}

	pub fn clear_user(&mut self) {
		self.user = None;
	}

	/// Appends a breadcrumb, evicting the oldest once the limit is exceeded.
	pub fn add_breadcrumb(&mut self, breadcrumb: Breadcrumb) {
		if self.max_breadcrumbs == 0 {
			return;
		}
		self.breadcrumbs.push_back(breadcrumb);
		while self.breadcrumbs.len() > self.max_breadcrumbs {
			self.breadcrumbs.pop_front();
		}
	}

	pub fn clear_breadcrumbs(&mut self) {
		self.breadcrumbs.clear();
	}

	/// Changes the breadcrumb limit, trimming the trail if it is now too long.
	pub fn set_max_breadcrumbs(&mut self, max_breadcrumbs: usize) {
		self.max_breadcrumbs = max_breadcrumbs;
		while self.breadcrumbs.len() > self.max_breadcrumbs {
			self.breadcrumbs.pop_front();
		}
	}

	pub fn tags(&self) -> &HashMap<String, String> {
		&self.tags
	}

	pub fn tag(&self, key: &str) -> Option<&str> {
		self.tags.get(key).map(String::as_str)
	}

	pub fn contexts(&self) -> &HashMap<String, ContextMap> {
		&self.contexts
	}

	pub fn extra(&self) -> &ContextMap {
		&self.extra
	}

	pub fn user(&self) -> Option<&UserContext> {
		self.user.as_ref()
	}

	pub fn breadcrumbs(&self) -> impl Iterator<Item = &Breadcrumb> {
		self.breadcrumbs.iter()
	}

	pub fn breadcrumb_count(&self) -> usize {
		self.breadcrumbs.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn set_and_remove_tag() {
		let mut scope = Scope::new();
		scope.set_tag("env", "test");
		assert_eq!(scope.tag("env"), Some("test"));

		scope.remove_tag("env");
		assert!(scope.tag("env").is_none());
	}

	#[test]
	fn user_can_be_cleared() {
		let mut scope = Scope::new();
		scope.set_user(UserContext::new("u1"));
		assert_eq!(scope.user().map(|u| u.id.as_str()), Some("u1"));

		scope.clear_user();
		assert!(scope.user().is_none());
	}

	#[test]
	fn context_is_replaced_per_key() {
		let mut scope = Scope::new();
		let mut first = ContextMap::new();
		first.insert("a".into(), 1.into());
		let mut second = ContextMap::new();
		second.insert("b".into(), 2.into());

		scope.set_context("order", first);
		scope.set_context("order", second.clone());
		assert_eq!(scope.contexts().get("order"), Some(&second));
	}

	#[test]
	fn breadcrumb_limit_keeps_most_recent() {
		let mut scope = Scope::with_max_breadcrumbs(5);
		for i in 0..10 {
			scope.add_breadcrumb(Breadcrumb::new(format!("test_{i}"), "crumb"));
		}

		assert_eq!(scope.breadcrumb_count(), 5);
		assert_eq!(scope.breadcrumbs().next().unwrap().category, "test_5");
	}

	#[test]
	fn zero_limit_disables_breadcrumbs() {
		let mut scope = Scope::with_max_breadcrumbs(0);
		scope.add_breadcrumb(Breadcrumb::new("ui", "click"));
		assert_eq!(scope.breadcrumb_count(), 0);
	}

	#[test]
	fn lowering_limit_trims_trail() {
		let mut scope = Scope::new();
		for i in 0..4 {
			scope.add_breadcrumb(Breadcrumb::new(format!("c{i}"), "crumb"));
		}
		scope.set_max_breadcrumbs(2);
		let categories: Vec<_> = scope.breadcrumbs().map(|b| b.category.clone()).collect();
		assert_eq!(categories, vec!["c2", "c3"]);
	}

	#[test]
	fn clone_is_independent() {
		let mut scope = Scope::new();
		scope.set_tag("request", "a");
		let mut forked = scope.clone();
		forked.set_tag("request", "b");

		assert_eq!(scope.tag("request"), Some("a"));
		assert_eq!(forked.tag("request"), Some("b"));
	}

	proptest! {
		#[test]
		fn last_write_wins(key in "[a-z]{1,8}", v1 in ".*", v2 in ".*") {
			let mut scope = Scope::new();
			scope.set_tag(key.clone(), v1);
			scope.set_tag(key.clone(), v2.clone());
			prop_assert_eq!(scope.tag(&key), Some(v2.as_str()));
		}
	}
}
