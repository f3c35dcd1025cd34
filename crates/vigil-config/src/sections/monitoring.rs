// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Monitoring configuration section.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vigil_core::{Dsn, IgnorePattern, MonitoringConfig, DEFAULT_MAX_BREADCRUMBS, DEFAULT_SAMPLE_RATE};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonitoringConfigLayer {
	pub dsn: Option<String>,
	pub environment: Option<String>,
	pub release: Option<String>,
	pub sample_rate: Option<f64>,
	pub enable_performance: Option<bool>,
	pub debug: Option<bool>,
	/// Plain strings are literals; `{ pattern = "..." }` tables are regexes.
	pub ignore_errors: Option<Vec<IgnorePattern>>,
	pub tags: Option<HashMap<String, String>>,
	pub user_agent: Option<String>,
	pub max_breadcrumbs: Option<usize>,
}

impl MonitoringConfigLayer {
	/// Overlays `other`. Tags merge per key; every other field is replaced.
	pub fn merge(&mut self, other: Self) {
		if other.dsn.is_some() {
			self.dsn = other.dsn;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.release.is_some() {
			self.release = other.release;
		}
		if other.sample_rate.is_some() {
			self.sample_rate = other.sample_rate;
		}
		if other.enable_performance.is_some() {
			self.enable_performance = other.enable_performance;
		}
		if other.debug.is_some() {
			self.debug = other.debug;
		}
		if other.ignore_errors.is_some() {
			self.ignore_errors = other.ignore_errors;
		}
		if let Some(tags) = other.tags {
			self.tags.get_or_insert_with(HashMap::new).extend(tags);
		}
		if other.user_agent.is_some() {
			self.user_agent = other.user_agent;
		}
		if other.max_breadcrumbs.is_some() {
			self.max_breadcrumbs = other.max_breadcrumbs;
		}
	}

	pub fn finalize(self) -> Result<MonitoringConfig, ConfigError> {
		let dsn = match self.dsn.as_deref().map(str::trim) {
			Some(raw) if !raw.is_empty() => {
				Some(raw.parse::<Dsn>().map_err(|e| ConfigError::InvalidValue {
					key: "dsn".to_string(),
					message: e.to_string(),
				})?)
			}
			_ => None,
		};

		let sample_rate = self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
		if !(0.0..=1.0).contains(&sample_rate) {
			return Err(ConfigError::InvalidValue {
				key: "sample_rate".to_string(),
				message: format!("{sample_rate} is outside [0, 1]"),
			});
		}

		Ok(MonitoringConfig {
			dsn,
			environment: self.environment.unwrap_or_else(|| "production".to_string()),
			release: self.release,
			sample_rate,
			enable_performance: self.enable_performance.unwrap_or(true),
			debug: self.debug.unwrap_or(false),
			ignore_errors: self.ignore_errors.unwrap_or_default(),
			tags: self.tags.unwrap_or_default(),
			before_send: None,
			user_agent: self.user_agent,
			max_breadcrumbs: self.max_breadcrumbs.unwrap_or(DEFAULT_MAX_BREADCRUMBS),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_layer_finalize_defaults() {
		let config = MonitoringConfigLayer::default().finalize().unwrap();
		assert!(config.dsn.is_none());
		assert_eq!(config.environment, "production");
		assert_eq!(config.sample_rate, 0.1);
		assert!(config.enable_performance);
		assert!(!config.debug);
		assert!(config.ignore_errors.is_empty());
		assert_eq!(config.max_breadcrumbs, 100);
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = MonitoringConfigLayer {
			dsn: Some("https://key@o1.ingest.example.io/42".to_string()),
			environment: Some("staging".to_string()),
			release: Some("1.4.0".to_string()),
			sample_rate: Some(0.5),
			ignore_errors: Some(vec![IgnorePattern::literal("Network request failed")]),
			..Default::default()
		};
		let config = layer.finalize().unwrap();
		assert_eq!(config.dsn.unwrap().project_id(), "42");
		assert_eq!(config.environment, "staging");
		assert_eq!(config.release.as_deref(), Some("1.4.0"));
		assert_eq!(config.sample_rate, 0.5);
		assert_eq!(config.ignore_errors.len(), 1);
	}

	#[test]
	fn test_empty_dsn_disables_transport() {
		let layer = MonitoringConfigLayer {
			dsn: Some("  ".to_string()),
			..Default::default()
		};
		assert!(layer.finalize().unwrap().dsn.is_none());
	}

	#[test]
	fn test_invalid_dsn_is_rejected() {
		let layer = MonitoringConfigLayer {
			dsn: Some("not a dsn".to_string()),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidValue { key, .. }) if key == "dsn"
		));
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = MonitoringConfigLayer {
			environment: Some("production".to_string()),
			release: Some("1.0.0".to_string()),
			..Default::default()
		};
		base.merge(MonitoringConfigLayer {
			environment: Some("staging".to_string()),
			..Default::default()
		});
		assert_eq!(base.environment.as_deref(), Some("staging"));
		assert_eq!(base.release.as_deref(), Some("1.0.0"));
	}

	#[test]
	fn test_tags_merge_per_key() {
		let mut base = MonitoringConfigLayer {
			tags: Some(HashMap::from([
				("app".to_string(), "example-app".to_string()),
				("team".to_string(), "core".to_string()),
			])),
			..Default::default()
		};
		base.merge(MonitoringConfigLayer {
			tags: Some(HashMap::from([("team".to_string(), "payments".to_string())])),
			..Default::default()
		});

		let tags = base.tags.unwrap();
		assert_eq!(tags["app"], "example-app");
		assert_eq!(tags["team"], "payments");
	}

	#[test]
	fn test_toml_ignore_entries() {
		let layer: MonitoringConfigLayer = toml::from_str(
			r#"
			environment = "development"
			ignore_errors = ["ResizeObserver loop limit exceeded", { pattern = "^Script error" }]
			"#,
		)
		.unwrap();

		let config = layer.finalize().unwrap();
		assert!(config.ignore_errors[0].matches("ResizeObserver loop limit exceeded"));
		assert!(config.ignore_errors[1].matches("Script error."));
	}

	proptest! {
		#[test]
		fn sample_rate_outside_unit_interval_is_rejected(rate in prop_oneof![-100.0..-0.0001f64, 1.0001..100.0f64]) {
			let layer = MonitoringConfigLayer { sample_rate: Some(rate), ..Default::default() };
			prop_assert!(layer.finalize().is_err());
		}

		#[test]
		fn sample_rate_inside_unit_interval_is_kept(rate in 0.0..=1.0f64) {
			let layer = MonitoringConfigLayer { sample_rate: Some(rate), ..Default::default() };
			prop_assert_eq!(layer.finalize().unwrap().sample_rate, rate);
		}
	}
}
