// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for core monitoring types.

use thiserror::Error;

/// Errors produced while parsing or validating core types.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid level: {0}")]
	InvalidLevel(String),

	#[error("invalid event kind: {0}")]
	InvalidEventKind(String),

	#[error("invalid DSN: {0}")]
	InvalidDsn(String),

	#[error("invalid ignore pattern {pattern:?}: {source}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("sample rate {0} is outside [0, 1]")]
	InvalidSampleRate(f64),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
