// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing layer feeding log records into a [`Monitor`].
//!
//! `ERROR` records become captured messages; records at or above the
//! breadcrumb threshold become `log` breadcrumbs. Records emitted by the
//! SDK's own crates are skipped.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;
use vigil_core::{Breadcrumb, ContextMap, Level};

use crate::monitor::{CaptureOptions, Monitor};

const SDK_TARGET_PREFIX: &str = "vigil";

#[derive(Clone)]
pub struct MonitorLayer {
	monitor: Monitor,
	breadcrumb_level: tracing::Level,
}

impl MonitorLayer {
	/// Records `INFO` and `WARN` as breadcrumbs and captures `ERROR`.
	pub fn new(monitor: Monitor) -> Self {
		Self {
			monitor,
			breadcrumb_level: tracing::Level::INFO,
		}
	}

	/// Least severe level recorded as a breadcrumb.
	pub fn with_breadcrumb_level(mut self, level: tracing::Level) -> Self {
		self.breadcrumb_level = level;
		self
	}
}

impl<S> Layer<S> for MonitorLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if metadata.target().starts_with(SDK_TARGET_PREFIX) {
			return;
		}

		let mut visitor = FieldVisitor::default();
		event.record(&mut visitor);
		let message = visitor.message.unwrap_or_default();
		let level = metadata.level();

		if *level == tracing::Level::ERROR {
			let mut log = visitor.fields;
			log.insert("target".to_string(), metadata.target().into());
			self.monitor.capture_message(
				message,
				CaptureOptions::new().level(Level::Error).context("log", log),
			);
		} else if *level <= self.breadcrumb_level {
			let mut breadcrumb = Breadcrumb::new("log", message).with_level(Level::from_tracing(level));
			breadcrumb.data = serde_json::Value::Object(visitor.fields);
			self.monitor.add_breadcrumb(breadcrumb);
		}
	}
}

#[derive(Default)]
struct FieldVisitor {
	message: Option<String>,
	fields: ContextMap,
}

impl FieldVisitor {
	fn insert(&mut self, field: &Field, value: serde_json::Value) {
		self.fields.insert(field.name().to_string(), value);
	}
}

impl Visit for FieldVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let value = format!("{value:?}");
		if field.name() == "message" {
			self.message = Some(value);
		} else {
			self.insert(field, value.into());
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = Some(value.to_string());
		} else {
			self.insert(field, value.into());
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.insert(field, value.into());
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.insert(field, value.into());
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.insert(field, value.into());
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.insert(field, value.into());
	}

	fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
		self.insert(field, value.to_string().into());
	}
}
