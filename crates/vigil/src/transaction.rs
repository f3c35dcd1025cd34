// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Timed units of work reported as `transaction` events.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;
use vigil_core::{ContextMap, Event, EventId};

use crate::monitor::Monitor;

/// Context key holding transaction timing.
pub const TRACE_CONTEXT: &str = "trace";

/// An in-flight transaction. Nothing is reported unless [`Transaction::finish`] is called.
#[must_use = "a transaction is only reported when finished"]
pub struct Transaction {
	monitor: Monitor,
	name: String,
	started: Instant,
	sampled: bool,
	tags: HashMap<String, String>,
}

impl Transaction {
	pub(crate) fn start(monitor: Monitor, name: String, sampled: bool) -> Self {
		trace!(transaction = %name, sampled, "Transaction started");
		Self {
			monitor,
			name,
			started: Instant::now(),
			sampled,
			tags: HashMap::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether this transaction will be reported when finished.
	pub fn is_sampled(&self) -> bool {
		self.sampled
	}

	pub fn elapsed(&self) -> Duration {
		self.started.elapsed()
	}

	pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.tags.insert(key.into(), value.into());
	}

	/// Reports the transaction with its duration, if it was sampled.
	pub fn finish(self) -> Option<EventId> {
		if !self.sampled {
			return None;
		}

		let duration = self.started.elapsed();
		let mut trace = ContextMap::new();
		trace.insert(
			"duration_ms".to_string(),
			serde_json::Value::from(duration.as_secs_f64() * 1000.0),
		);

		let mut event = Event::transaction(self.name).with_context(TRACE_CONTEXT, trace);
		event.tags.extend(self.tags);
		self.monitor.capture_event(event)
	}
}
