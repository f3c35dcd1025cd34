// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Severity levels shared by events and breadcrumbs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Severity of a captured event or breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
	Debug,
	Info,
	Warning,
	Error,
	Fatal,
}

impl Default for Level {
	fn default() -> Self {
		Self::Info
	}
}

impl Level {
	/// Maps a `tracing` level onto the nearest event level.
	pub fn from_tracing(level: &tracing::Level) -> Self {
		match *level {
			tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
			tracing::Level::INFO => Self::Info,
			tracing::Level::WARN => Self::Warning,
			tracing::Level::ERROR => Self::Error,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Debug => "debug",
			Self::Info => "info",
			Self::Warning => "warning",
			Self::Error => "error",
			Self::Fatal => "fatal",
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Level {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warning" | "warn" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			"fatal" => Ok(Self::Fatal),
			_ => Err(CoreError::InvalidLevel(s.to_string())),
		}
	}
}
