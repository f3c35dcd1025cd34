// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging configuration section.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Console output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	/// One JSON-shaped line per record with a timestamp, coloured by level.
	#[default]
	Line,
	/// The default human-readable `tracing-subscriber` format.
	Pretty,
	/// Structured JSON from `tracing-subscriber`.
	Json,
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Line => write!(f, "line"),
			Self::Pretty => write!(f, "pretty"),
			Self::Json => write!(f, "json"),
		}
	}
}

impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"line" => Ok(Self::Line),
			"pretty" => Ok(Self::Pretty),
			"json" => Ok(Self::Json),
			other => Err(format!("unknown log format '{other}' (expected line, pretty or json)")),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	pub level: Option<String>,
	pub format: Option<LogFormat>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
		if other.format.is_some() {
			self.format = other.format;
		}
	}

	pub fn finalize(self) -> LoggingConfig {
		LoggingConfig {
			level: self.level.unwrap_or_else(|| "info".to_string()),
			format: self.format.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
	/// An `EnvFilter` directive such as `info` or `warn,vigil=debug`.
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Line,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = LoggingConfigLayer::default().finalize();
		assert_eq!(config, LoggingConfig::default());
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = LoggingConfigLayer {
			level: Some("info".to_string()),
			format: Some(LogFormat::Json),
		};
		base.merge(LoggingConfigLayer {
			level: Some("debug".to_string()),
			format: None,
		});
		assert_eq!(base.level.as_deref(), Some("debug"));
		assert_eq!(base.format, Some(LogFormat::Json));
	}

	#[test]
	fn test_format_parsing() {
		assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
		assert_eq!("line".parse::<LogFormat>().unwrap(), LogFormat::Line);
		assert!("xml".parse::<LogFormat>().is_err());
	}

	#[test]
	fn test_serde_roundtrip() {
		let config = LoggingConfig {
			level: "warn,vigil=debug".to_string(),
			format: LogFormat::Pretty,
		};
		let toml_str = toml::to_string(&config).unwrap();
		let parsed: LoggingConfig = toml::from_str(&toml_str).unwrap();
		assert_eq!(config, parsed);
	}
}
