// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the monitoring SDK.
//!
//! None of these escape the capture path: capture calls swallow them and log.
//! They surface only from initialisation and from transport internals.

use std::time::Duration;

use thiserror::Error;
use vigil_common_http::RetryableError;
use vigil_core::CoreError;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur in the monitoring SDK.
#[derive(Debug, Error)]
pub enum MonitorError {
	/// The configuration passed to `init` is invalid.
	#[error("invalid configuration: {0}")]
	InvalidConfig(#[from] CoreError),

	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Ingestion endpoint returned an error.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Error message from server.
		message: String,
	},

	/// Rate limited by the ingestion endpoint.
	#[error("rate limited, retry after {retry_after_secs:?} seconds")]
	RateLimited {
		/// Optional retry-after header value.
		retry_after_secs: Option<u64>,
	},

	/// The transport worker could not be started.
	#[error("failed to start transport worker: {0}")]
	WorkerStart(#[source] std::io::Error),
}

impl RetryableError for MonitorError {
	fn is_retryable(&self) -> bool {
		match self {
			Self::RequestFailed(e) => e.is_retryable(),
			Self::ServerError { status, .. } => {
				matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
			}
			Self::RateLimited { .. } => true,
			_ => false,
		}
	}

	fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RateLimited {
				retry_after_secs: Some(secs),
			} => Some(Duration::from_secs(*secs)),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn server_error_retryable_statuses() {
		for status in [408, 429, 500, 502, 503, 504] {
			let err = MonitorError::ServerError {
				status,
				message: "test".to_string(),
			};
			assert!(err.is_retryable(), "status {status} should be retryable");
		}
	}

	#[test]
	fn client_errors_are_not_retried() {
		for status in [400, 401, 403, 404, 413] {
			let err = MonitorError::ServerError {
				status,
				message: "test".to_string(),
			};
			assert!(!err.is_retryable(), "status {status} should not be retryable");
		}
	}

	#[test]
	fn rate_limited_is_retryable() {
		let err = MonitorError::RateLimited {
			retry_after_secs: Some(30),
		};
		assert!(err.is_retryable());
	}

	#[test]
	fn rate_limit_exposes_retry_after() {
		let err = MonitorError::RateLimited {
			retry_after_secs: Some(2),
		};
		assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));

		let err = MonitorError::RateLimited {
			retry_after_secs: None,
		};
		assert_eq!(err.retry_after(), None);

		let err = MonitorError::ServerError {
			status: 503,
			message: String::new(),
		};
		assert_eq!(err.retry_after(), None);
	}

	#[test]
	fn config_errors_are_not_retryable() {
		let err = MonitorError::InvalidConfig(CoreError::InvalidSampleRate(2.0));
		assert!(!err.is_retryable());
	}
}
