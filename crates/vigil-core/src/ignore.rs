// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ignore-list entries matched against an event's description.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// One entry of `ignore_errors`.
///
/// A literal matches on exact equality with the description; a pattern
/// matches when the regex finds a match anywhere in it.
#[derive(Clone)]
pub enum IgnorePattern {
	Literal(String),
	Pattern(Regex),
}

impl IgnorePattern {
	pub fn literal(text: impl Into<String>) -> Self {
		Self::Literal(text.into())
	}

	pub fn regex(pattern: &str) -> Result<Self> {
		Regex::new(pattern)
			.map(Self::Pattern)
			.map_err(|source| CoreError::InvalidPattern {
				pattern: pattern.to_string(),
				source,
			})
	}

	/// Parses the compact form used in environment variables: `/regex/` or a literal.
	pub fn parse_compact(entry: &str) -> Result<Self> {
		match entry
			.strip_prefix('/')
			.and_then(|rest| rest.strip_suffix('/'))
		{
			Some(pattern) if !pattern.is_empty() => Self::regex(pattern),
			_ => Ok(Self::literal(entry)),
		}
	}

	pub fn matches(&self, description: &str) -> bool {
		match self {
			Self::Literal(text) => text == description,
			Self::Pattern(regex) => regex.is_match(description),
		}
	}
}

impl fmt::Debug for IgnorePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
			Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
		}
	}
}

/// The compact form accepted by [`IgnorePattern::parse_compact`].
impl fmt::Display for IgnorePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Literal(text) => f.write_str(text),
			Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
		}
	}
}

impl PartialEq for IgnorePattern {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Literal(a), Self::Literal(b)) => a == b,
			(Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
			_ => false,
		}
	}
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawIgnorePattern {
	Literal(String),
	Pattern { pattern: String },
}

impl Serialize for IgnorePattern {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let raw = match self {
			Self::Literal(text) => RawIgnorePattern::Literal(text.clone()),
			Self::Pattern(regex) => RawIgnorePattern::Pattern {
				pattern: regex.as_str().to_string(),
			},
		};
		raw.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for IgnorePattern {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		match RawIgnorePattern::deserialize(deserializer)? {
			RawIgnorePattern::Literal(text) => Ok(Self::Literal(text)),
			RawIgnorePattern::Pattern { pattern } => {
				Self::regex(&pattern).map_err(serde::de::Error::custom)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn literal_requires_exact_equality() {
		let entry = IgnorePattern::literal("Network request failed");
		assert!(entry.matches("Network request failed"));
		assert!(!entry.matches("Network request failed: timeout"));
		assert!(!entry.matches("network request failed"));
	}

	#[test]
	fn pattern_matches_by_regex() {
		let entry = IgnorePattern::regex(r"^Script error\.?$").unwrap();
		assert!(entry.matches("Script error."));
		assert!(entry.matches("Script error"));
		assert!(!entry.matches("Script errors"));
	}

	#[test]
	fn invalid_regex_is_reported() {
		assert!(matches!(
			IgnorePattern::regex("(unclosed"),
			Err(CoreError::InvalidPattern { .. })
		));
	}

	#[test]
	fn compact_form_distinguishes_regex() {
		assert_eq!(
			IgnorePattern::parse_compact("/^.*i18n is not defined.*$/").unwrap(),
			IgnorePattern::regex("^.*i18n is not defined.*$").unwrap()
		);
		assert_eq!(
			IgnorePattern::parse_compact("top.GLOBALS").unwrap(),
			IgnorePattern::literal("top.GLOBALS")
		);
		assert_eq!(
			IgnorePattern::parse_compact("/").unwrap(),
			IgnorePattern::literal("/")
		);
	}

	#[test]
	fn displays_compact_form() {
		assert_eq!(IgnorePattern::literal("top.GLOBALS").to_string(), "top.GLOBALS");
		let pattern = IgnorePattern::regex("^Script error").unwrap();
		assert_eq!(pattern.to_string(), "/^Script error/");
		assert_eq!(IgnorePattern::parse_compact(&pattern.to_string()).unwrap(), pattern);
	}

	#[test]
	fn deserializes_strings_and_pattern_tables() {
		let entries: Vec<IgnorePattern> = serde_json::from_str(
			r#"["ResizeObserver loop limit exceeded", {"pattern": "^Script error"}]"#,
		)
		.unwrap();
		assert_eq!(entries[0], IgnorePattern::literal("ResizeObserver loop limit exceeded"));
		assert!(entries[1].matches("Script error."));
	}

	#[test]
	fn deserializing_bad_pattern_fails() {
		let result: std::result::Result<IgnorePattern, _> =
			serde_json::from_str(r#"{"pattern": "["}"#);
		assert!(result.is_err());
	}

	proptest! {
		#[test]
		fn literal_matches_itself(message in ".*") {
			prop_assert!(IgnorePattern::literal(message.clone()).matches(&message));
		}

		#[test]
		fn escaped_pattern_matches_itself(message in "[a-zA-Z0-9 .()*+?]{0,40}") {
			let entry = IgnorePattern::regex(&format!("^{}$", regex::escape(&message))).unwrap();
			prop_assert!(entry.matches(&message));
		}
	}
}
