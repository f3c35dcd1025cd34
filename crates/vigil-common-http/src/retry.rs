// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for event delivery.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, warn};

/// Statuses worth another attempt: throttling, timeouts and upstream failures.
const RETRYABLE_STATUSES: &[StatusCode] = &[
	StatusCode::TOO_MANY_REQUESTS,
	StatusCode::REQUEST_TIMEOUT,
	StatusCode::INTERNAL_SERVER_ERROR,
	StatusCode::BAD_GATEWAY,
	StatusCode::SERVICE_UNAVAILABLE,
	StatusCode::GATEWAY_TIMEOUT,
];

#[derive(Debug, Clone)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A single attempt, no retries.
	pub fn none() -> Self {
		Self {
			max_attempts: 1,
			..Default::default()
		}
	}

	fn delay_for(&self, attempt: u32) -> Duration {
		let exponential = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
		let capped = exponential.min(self.max_delay.as_secs_f64());

		let delay = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};

		Duration::from_secs_f64(delay)
	}
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;

	/// Minimum wait requested by the server, such as a `Retry-After` header.
	fn retry_after(&self) -> Option<Duration> {
		None
	}
}

/// Whether a response status should be retried.
pub fn is_retryable_status(status: StatusCode) -> bool {
	RETRYABLE_STATUSES.contains(&status)
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}
		self.status().map(is_retryable_status).unwrap_or(false)
	}
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or attempts run out.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Display,
{
	let mut attempt = 0;

	loop {
		let err = match f().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		attempt += 1;

		if !err.is_retryable() {
			debug!(error = %err, attempt, "giving up on non-retryable error");
			return Err(err);
		}

		if attempt >= cfg.max_attempts {
			warn!(
				error = %err,
				attempt,
				max_attempts = cfg.max_attempts,
				"delivery attempts exhausted"
			);
			return Err(err);
		}

		let delay = match err.retry_after() {
			Some(requested) => requested.max(cfg.delay_for(attempt - 1)),
			None => cfg.delay_for(attempt - 1),
		};
		debug!(
			error = %err,
			attempt,
			delay_ms = delay.as_millis() as u64,
			"retrying delivery"
		);
		tokio::time::sleep(delay).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fmt;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[derive(Debug)]
	struct FakeError {
		retryable: bool,
	}

	#[derive(Debug)]
	struct Throttled(Duration);

	impl fmt::Display for Throttled {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "throttled for {:?}", self.0)
		}
	}

	impl RetryableError for Throttled {
		fn is_retryable(&self) -> bool {
			true
		}

		fn retry_after(&self) -> Option<Duration> {
			Some(self.0)
		}
	}

	impl fmt::Display for FakeError {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			write!(f, "fake error (retryable: {})", self.retryable)
		}
	}

	impl RetryableError for FakeError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	fn fast_config(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(5),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	#[tokio::test]
	async fn non_retryable_error_stops_after_one_attempt() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let result: Result<(), FakeError> = retry(&fast_config(5), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(FakeError { retryable: false })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(attempts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retryable_error_uses_every_attempt() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let result: Result<(), FakeError> = retry(&fast_config(3), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(FakeError { retryable: true })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(attempts.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn recovers_after_transient_failures() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let result: Result<&str, FakeError> = retry(&fast_config(5), || {
			let counter = Arc::clone(&counter);
			async move {
				if counter.fetch_add(1, Ordering::SeqCst) < 2 {
					Err(FakeError { retryable: true })
				} else {
					Ok("delivered")
				}
			}
		})
		.await;

		assert_eq!(result.unwrap(), "delivered");
		assert_eq!(attempts.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn none_config_never_retries() {
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let _: Result<(), FakeError> = retry(&RetryConfig::none(), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(FakeError { retryable: true })
			}
		})
		.await;

		assert_eq!(attempts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn retry_after_sets_minimum_delay() {
		let started = std::time::Instant::now();
		let attempts = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&attempts);

		let result: Result<(), Throttled> = retry(&fast_config(2), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(Throttled(Duration::from_millis(150)))
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(attempts.load(Ordering::SeqCst), 2);
		assert!(started.elapsed() >= Duration::from_millis(150));
	}

	#[test]
	fn delay_is_capped() {
		let cfg = RetryConfig {
			max_attempts: 10,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(5),
			backoff_factor: 10.0,
			jitter: false,
		};

		for attempt in 0..10 {
			assert!(cfg.delay_for(attempt) <= Duration::from_secs(5));
		}
	}

	#[test]
	fn jitter_stays_within_half_to_one_and_a_half() {
		let cfg = RetryConfig {
			jitter: true,
			..fast_config(3)
		};
		let base = fast_config(3).delay_for(1).as_secs_f64();

		for _ in 0..20 {
			let delay = cfg.delay_for(1).as_secs_f64();
			assert!(delay >= base * 0.5 - f64::EPSILON);
			assert!(delay <= base * 1.5 + f64::EPSILON);
		}
	}

	#[test]
	fn retryable_statuses() {
		assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
		assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
		assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
		assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
	}
}
