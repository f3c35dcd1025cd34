// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Top-level configuration layer.

use serde::{Deserialize, Serialize};

use crate::sections::{LoggingConfigLayer, MonitoringConfigLayer};

/// One source's view of the configuration. `None` sections leave lower layers untouched.
///
/// TOML layout:
///
/// ```toml
/// [monitoring]
/// dsn = "https://key@o0.ingest.example.io/42"
/// environment = "staging"
///
/// [logging]
/// level = "info"
/// format = "line"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VigilConfigLayer {
	pub monitoring: Option<MonitoringConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl VigilConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if let Some(monitoring) = other.monitoring {
			self.monitoring
				.get_or_insert_with(Default::default)
				.merge(monitoring);
		}
		if let Some(logging) = other.logging {
			self.logging.get_or_insert_with(Default::default).merge(logging);
		}
	}
}
