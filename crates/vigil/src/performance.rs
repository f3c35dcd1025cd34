// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named monotonic marks and the durations between them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Prefix of the scope tag written by a successful measure.
pub const MEASURE_TAG_PREFIX: &str = "performance.";

/// Registry of the latest instant recorded under each mark name.
#[derive(Debug, Default)]
pub struct PerformanceMarker {
	marks: Mutex<HashMap<String, Instant>>,
}

impl PerformanceMarker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records `name` at the current instant, replacing any earlier mark.
	pub fn mark(&self, name: impl Into<String>) -> Instant {
		let now = Instant::now();
		self.marks.lock().insert(name.into(), now);
		now
	}

	pub fn get(&self, name: &str) -> Option<Instant> {
		self.marks.lock().get(name).copied()
	}

	/// Duration from `start` to `end`, or `None` if either mark is missing.
	///
	/// Saturates to zero if `end` was recorded before `start`.
	pub fn between(&self, start: &str, end: &str) -> Option<Duration> {
		let marks = self.marks.lock();
		let start = marks.get(start)?;
		let end = marks.get(end)?;
		Some(end.saturating_duration_since(*start))
	}

	pub fn clear(&self) {
		self.marks.lock().clear();
	}

	pub fn len(&self) -> usize {
		self.marks.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.marks.lock().is_empty()
	}
}

/// Tag key for measurement `name`.
pub fn measure_tag(name: &str) -> String {
	format!("{MEASURE_TAG_PREFIX}{name}")
}

/// Milliseconds with microsecond precision, e.g. `"12.345"`.
pub fn format_duration(duration: Duration) -> String {
	format!("{:.3}", duration.as_secs_f64() * 1000.0)
}
