// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Context types attached to captured events.

use serde::{Deserialize, Serialize};

/// A named context block: arbitrary JSON keyed by field name.
pub type ContextMap = serde_json::Map<String, serde_json::Value>;

/// Identity of the user on whose behalf the application was running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	/// IP address (sensitive - never filled in automatically)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ip_address: Option<String>,
}

impl UserContext {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());
		self
	}

	pub fn with_username(mut self, username: impl Into<String>) -> Self {
		self.username = Some(username.into());
		self
	}

	pub fn with_role(mut self, role: impl Into<String>) -> Self {
		self.role = Some(role.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn id_only_user_serializes_without_optional_fields() {
		let user = UserContext::new("u1");
		let json = serde_json::to_value(&user).unwrap();
		assert_eq!(json, serde_json::json!({ "id": "u1" }));
	}

	#[test]
	fn builder_methods_fill_fields() {
		let user = UserContext::new("u2")
			.with_email("u2@example.com")
			.with_username("second")
			.with_role("admin");
		assert_eq!(user.email.as_deref(), Some("u2@example.com"));
		assert_eq!(user.username.as_deref(), Some("second"));
		assert_eq!(user.role.as_deref(), Some("admin"));
	}
}
