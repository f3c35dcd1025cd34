// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Options passed to monitor initialisation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dsn::Dsn;
use crate::error::{CoreError, Result};
use crate::event::Event;
use crate::ignore::IgnorePattern;
use crate::scope::DEFAULT_MAX_BREADCRUMBS;

/// Default probability that a performance transaction is sampled.
pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;

/// Caller-supplied transform run after the ignore list; `None` drops the event.
pub type BeforeSend = Arc<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// Monitoring options. Immutable once handed to `init`; re-initialising replaces them.
#[derive(Clone)]
pub struct MonitoringConfig {
	/// `None` disables network delivery.
	pub dsn: Option<Dsn>,
	pub environment: String,
	pub release: Option<String>,
	/// Probability in [0, 1] that a transaction is sampled.
	pub sample_rate: f64,
	pub enable_performance: bool,
	pub debug: bool,
	pub ignore_errors: Vec<IgnorePattern>,
	/// Default tags, lowest precedence during enrichment.
	pub tags: HashMap<String, String>,
	pub before_send: Option<BeforeSend>,
	/// Consulted once at init to seed the `browser` and `os` tags.
	pub user_agent: Option<String>,
	pub max_breadcrumbs: usize,
}

impl Default for MonitoringConfig {
	fn default() -> Self {
		Self {
			dsn: None,
			environment: "production".to_string(),
			release: None,
			sample_rate: DEFAULT_SAMPLE_RATE,
			enable_performance: true,
			debug: false,
			ignore_errors: Vec::new(),
			tags: HashMap::new(),
			before_send: None,
			user_agent: None,
			max_breadcrumbs: DEFAULT_MAX_BREADCRUMBS,
		}
	}
}

impl MonitoringConfig {
	pub fn new(environment: impl Into<String>) -> Self {
		Self {
			environment: environment.into(),
			..Default::default()
		}
	}

	pub fn with_dsn(mut self, dsn: Dsn) -> Self {
		self.dsn = Some(dsn);
		self
	}

	pub fn with_release(mut self, release: impl Into<String>) -> Self {
		self.release = Some(release.into());
		self
	}

	pub fn with_ignore(mut self, pattern: IgnorePattern) -> Self {
		self.ignore_errors.push(pattern);
		self
	}

	pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	pub fn with_before_send<F>(mut self, f: F) -> Self
	where
		F: Fn(Event) -> Option<Event> + Send + Sync + 'static,
	{
		self.before_send = Some(Arc::new(f));
		self
	}

	/// Checks field ranges that the type system cannot express.
	pub fn validate(&self) -> Result<()> {
		if !(0.0..=1.0).contains(&self.sample_rate) {
			return Err(CoreError::InvalidSampleRate(self.sample_rate));
		}
		Ok(())
	}
}

impl fmt::Debug for MonitoringConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MonitoringConfig")
			.field("dsn", &self.dsn.as_ref().map(Dsn::redacted))
			.field("environment", &self.environment)
			.field("release", &self.release)
			.field("sample_rate", &self.sample_rate)
			.field("enable_performance", &self.enable_performance)
			.field("debug", &self.debug)
			.field("ignore_errors", &self.ignore_errors)
			.field("tags", &self.tags)
			.field("before_send", &self.before_send.is_some())
			.field("user_agent", &self.user_agent)
			.field("max_breadcrumbs", &self.max_breadcrumbs)
			.finish()
	}
}
