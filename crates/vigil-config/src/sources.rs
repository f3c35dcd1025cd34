// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};
use vigil_core::IgnorePattern;

use crate::error::ConfigError;
use crate::layer::VigilConfigLayer;
use crate::sections::{LogFormat, LoggingConfigLayer, MonitoringConfigLayer};

/// Default location of the system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/vigil/vigil.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<VigilConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<VigilConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(VigilConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<VigilConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(VigilConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: VigilConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `VIGIL_<FIELD>`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<VigilConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from(&|name: &str| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn load_from(lookup: Lookup<'_>) -> Result<VigilConfigLayer, ConfigError> {
	Ok(VigilConfigLayer {
		monitoring: Some(load_monitoring(lookup)?),
		logging: Some(load_logging(lookup)?),
	})
}

fn load_monitoring(lookup: Lookup<'_>) -> Result<MonitoringConfigLayer, ConfigError> {
	Ok(MonitoringConfigLayer {
		dsn: env_var(lookup, "VIGIL_DSN"),
		environment: env_var(lookup, "VIGIL_ENVIRONMENT"),
		release: env_var(lookup, "VIGIL_RELEASE"),
		sample_rate: env_parse(lookup, "VIGIL_SAMPLE_RATE")?,
		enable_performance: env_bool(lookup, "VIGIL_ENABLE_PERFORMANCE"),
		debug: env_bool(lookup, "VIGIL_DEBUG"),
		ignore_errors: env_ignore_list(lookup, "VIGIL_IGNORE_ERRORS")?,
		tags: env_tags(lookup, "VIGIL_TAGS")?,
		user_agent: env_var(lookup, "VIGIL_USER_AGENT"),
		max_breadcrumbs: env_parse(lookup, "VIGIL_MAX_BREADCRUMBS")?,
	})
}

fn load_logging(lookup: Lookup<'_>) -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var(lookup, "VIGIL_LOG_FORMAT") {
		Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
			key: "VIGIL_LOG_FORMAT".to_string(),
			message,
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var(lookup, "VIGIL_LOG_LEVEL"),
		format,
	})
}

fn env_var(lookup: Lookup<'_>, name: &str) -> Option<String> {
	lookup(name).filter(|s| !s.is_empty())
}

fn env_bool(lookup: Lookup<'_>, name: &str) -> Option<bool> {
	env_var(lookup, name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: std::str::FromStr>(lookup: Lookup<'_>, name: &str) -> Result<Option<T>, ConfigError> {
	match env_var(lookup, name) {
		Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("cannot parse '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Comma-separated entries; `/.../` marks a regex, which may itself contain commas.
fn env_ignore_list(
	lookup: Lookup<'_>,
	name: &str,
) -> Result<Option<Vec<IgnorePattern>>, ConfigError> {
	let Some(raw) = env_var(lookup, name) else {
		return Ok(None);
	};

	split_ignore_entries(&raw)
		.into_iter()
		.filter(|entry| !entry.is_empty())
		.map(|entry| {
			IgnorePattern::parse_compact(&entry).map_err(|e| ConfigError::InvalidValue {
				key: name.to_string(),
				message: e.to_string(),
			})
		})
		.collect::<Result<Vec<_>, _>>()
		.map(Some)
}

/// Splits on commas outside `/.../`. An unterminated `/` falls back to plain splitting.
fn split_ignore_entries(raw: &str) -> Vec<String> {
	let mut entries = Vec::new();
	let mut open: Vec<&str> = Vec::new();

	for part in raw.split(',') {
		open.push(part);
		let joined = open.join(",");
		let entry = joined.trim();
		if entry.starts_with('/') && (entry.len() == 1 || !entry.ends_with('/')) {
			continue;
		}
		entries.push(entry.to_string());
		open.clear();
	}

	entries.extend(open.into_iter().map(|part| part.trim().to_string()));
	entries
}

/// `key=value` pairs separated by commas.
fn env_tags(
	lookup: Lookup<'_>,
	name: &str,
) -> Result<Option<HashMap<String, String>>, ConfigError> {
	let Some(raw) = env_var(lookup, name) else {
		return Ok(None);
	};

	let mut tags = HashMap::new();
	for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
		let Some((key, value)) = pair.split_once('=') else {
			return Err(ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("expected key=value, got '{pair}'"),
			});
		};
		tags.insert(key.trim().to_string(), value.trim().to_string());
	}
	Ok(Some(tags))
}
