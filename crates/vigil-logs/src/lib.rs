// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Console logging for Vigil binaries.
//!
//! - [`LineFormat`]: one JSON-shaped line per record, coloured by level
//! - [`init`]: installs a global subscriber from a [`LoggingConfig`]
//!
//! # Usage
//!
//! ```ignore
//! use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
//!
//! tracing_subscriber::registry()
//!     .with(vigil_logs::env_filter(&config.logging)?)
//!     .with(vigil_logs::fmt_layer(&config.logging))
//!     .with(vigil::MonitorLayer::new(vigil::global().clone()))
//!     .init();
//! ```

mod format;

pub use format::{level_color, render_line, LineFormat, TIMESTAMP_FORMAT};

use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};
use vigil_config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum LogsError {
	#[error("invalid log filter '{directive}': {message}")]
	InvalidFilter { directive: String, message: String },

	#[error("failed to install subscriber: {0}")]
	Init(String),
}

/// `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, LogsError> {
	if let Ok(filter) = EnvFilter::try_from_default_env() {
		return Ok(filter);
	}

	EnvFilter::try_new(&config.level).map_err(|e| LogsError::InvalidFilter {
		directive: config.level.clone(),
		message: e.to_string(),
	})
}

/// The console layer for the configured format, writing to stderr.
pub fn fmt_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
	match config.format {
		LogFormat::Line => layer.event_format(LineFormat).boxed(),
		LogFormat::Pretty => layer.boxed(),
		LogFormat::Json => layer.json().boxed(),
	}
}

/// Installs the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<(), LogsError> {
	tracing_subscriber::registry()
		.with(env_filter(config)?)
		.with(fmt_layer(config))
		.try_init()
		.map_err(|e| LogsError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_level_is_reported() {
		let config = LoggingConfig {
			level: "vigil=loud".to_string(),
			..Default::default()
		};
		if std::env::var("RUST_LOG").is_err() {
			assert!(matches!(
				env_filter(&config),
				Err(LogsError::InvalidFilter { .. })
			));
		}
	}

	#[test]
	fn configured_level_is_used() {
		let config = LoggingConfig {
			level: "warn,vigil=debug".to_string(),
			..Default::default()
		};
		assert!(env_filter(&config).is_ok());
	}

	#[test]
	fn every_format_builds_a_layer() {
		for format in [LogFormat::Line, LogFormat::Pretty, LogFormat::Json] {
			let config = LoggingConfig {
				format,
				..Default::default()
			};
			let _layer = fmt_layer::<tracing_subscriber::Registry>(&config);
		}
	}
}
