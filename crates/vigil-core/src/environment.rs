// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Coarse browser and operating system labels derived from a user-agent string.

use serde::{Deserialize, Serialize};

/// Label used when no rule matches or no user agent is available.
pub const UNKNOWN: &str = "unknown";

/// Ordered browser rules; the first substring found wins.
const BROWSER_RULES: &[(&str, &str)] = &[
	("Chrome", "Chrome"),
	("Safari", "Safari"),
	("Firefox", "Firefox"),
	("MSIE", "IE"),
	("Trident", "IE"),
	("Edge", "Edge"),
];

/// Ordered operating system rules; the first substring found wins.
const OS_RULES: &[(&str, &str)] = &[
	("Windows", "Windows"),
	("Mac", "MacOS"),
	("Linux", "Linux"),
	("Android", "Android"),
	("iOS", "iOS"),
	("iPhone", "iOS"),
	("iPad", "iOS"),
];

/// Browser and OS labels seeded into the scope as the `browser` and `os` tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
	pub browser: String,
	pub os: String,
}

impl Default for EnvironmentInfo {
	fn default() -> Self {
		Self {
			browser: UNKNOWN.to_string(),
			os: UNKNOWN.to_string(),
		}
	}
}

/// Classifies a user agent. `None` means a non-browser execution context.
///
/// Matching is case-sensitive substring containment and never fails.
pub fn classify_environment(user_agent: Option<&str>) -> EnvironmentInfo {
	let Some(user_agent) = user_agent else {
		return EnvironmentInfo::default();
	};

	EnvironmentInfo {
		browser: first_match(BROWSER_RULES, user_agent).to_string(),
		os: first_match(OS_RULES, user_agent).to_string(),
	}
}

fn first_match(rules: &[(&str, &'static str)], user_agent: &str) -> &'static str {
	rules
		.iter()
		.find(|(needle, _)| user_agent.contains(needle))
		.map(|(_, label)| *label)
		.unwrap_or(UNKNOWN)
}
