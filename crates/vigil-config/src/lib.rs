// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the Vigil monitoring SDK.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Validation of DSN, sample rate and ignore patterns
//! - Consistent environment variable naming (`VIGIL_*`)
//!
//! # Usage
//!
//! ```ignore
//! use vigil_config::load_config;
//!
//! let config = load_config()?;
//! vigil::init(config.monitoring)?;
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::VigilConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use std::path::PathBuf;

use tracing::{debug, info};
use vigil_core::MonitoringConfig;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct VigilConfig {
	pub monitoring: MonitoringConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`VIGIL_*`)
/// 2. Config file (`/etc/vigil/vigil.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<VigilConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<VigilConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<VigilConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<VigilConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = VigilConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved config.
pub fn finalize(layer: VigilConfigLayer) -> Result<VigilConfig, ConfigError> {
	let monitoring = layer.monitoring.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&monitoring)?;

	info!(
		environment = %monitoring.environment,
		dsn_configured = monitoring.dsn.is_some(),
		sample_rate = monitoring.sample_rate,
		ignore_entries = monitoring.ignore_errors.len(),
		log_format = %logging.format,
		"Monitoring configuration loaded"
	);

	Ok(VigilConfig {
		monitoring,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(monitoring: &MonitoringConfig) -> Result<(), ConfigError> {
	if monitoring.environment.trim().is_empty() {
		return Err(ConfigError::Validation(
			"environment must not be empty".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	struct FixedSource {
		precedence: Precedence,
		layer: VigilConfigLayer,
	}

	impl ConfigSource for FixedSource {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.precedence
		}

		fn load(&self) -> Result<VigilConfigLayer, ConfigError> {
			Ok(self.layer.clone())
		}
	}

	fn environment_layer(environment: &str) -> VigilConfigLayer {
		VigilConfigLayer {
			monitoring: Some(MonitoringConfigLayer {
				environment: Some(environment.to_string()),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(FixedSource {
				precedence: Precedence::Environment,
				layer: environment_layer("from-env"),
			}),
			Box::new(FixedSource {
				precedence: Precedence::ConfigFile,
				layer: environment_layer("from-file"),
			}),
		])
		.unwrap();

		assert_eq!(config.monitoring.environment, "from-env");
	}

	#[test]
	fn test_defaults_only() {
		let config = load_from_sources(vec![Box::new(DefaultsSource)]).unwrap();
		assert_eq!(config.monitoring.environment, "production");
		assert_eq!(config.logging, LoggingConfig::default());
	}

	#[test]
	fn test_empty_environment_is_rejected() {
		let result = finalize(environment_layer("  "));
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_file_layer_resolves() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[monitoring]
environment = "staging"
release = "3.2.1"
sample_rate = 0.5
"#
		)
		.unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();

		assert_eq!(config.monitoring.environment, "staging");
		assert_eq!(config.monitoring.release.as_deref(), Some("3.2.1"));
		assert_eq!(config.monitoring.sample_rate, 0.5);
	}

	#[test]
	fn test_out_of_range_sample_rate_from_file_fails() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[monitoring]\nsample_rate = 1.5").unwrap();

		let result = load_from_sources(vec![Box::new(TomlSource::new(file.path()))]);
		assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
	}
}
