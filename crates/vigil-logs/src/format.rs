// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-line log format coloured by level.
//!
//! Each record renders as
//! `{"level":"info","message":"...","timestamp":"2025-01-31 12:00:00"}`
//! with any structured fields added as further keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RESET: &str = "\x1b[0m";

/// ANSI colour for each level. `debug` plays the part of "verbose".
pub fn level_color(level: &Level) -> &'static str {
	match *level {
		Level::ERROR => "\x1b[31m",
		Level::WARN => "\x1b[33m",
		Level::INFO => "\x1b[32m",
		Level::DEBUG => "\x1b[34m",
		Level::TRACE => "\x1b[35m",
	}
}

/// Renders one record without colour.
pub fn render_line(
	level: &Level,
	message: &str,
	fields: Map<String, Value>,
	timestamp: DateTime<Utc>,
) -> String {
	let mut line = fields;
	line.insert(
		"level".to_string(),
		Value::String(level.as_str().to_ascii_lowercase()),
	);
	line.insert("message".to_string(), Value::String(message.to_string()));
	line.insert(
		"timestamp".to_string(),
		Value::String(timestamp.format(TIMESTAMP_FORMAT).to_string()),
	);
	Value::Object(line).to_string()
}

/// `FormatEvent` producing the single-line format.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
	S: Subscriber + for<'a> LookupSpan<'a>,
	N: for<'a> FormatFields<'a> + 'static,
{
	fn format_event(
		&self,
		_ctx: &FmtContext<'_, S, N>,
		mut writer: Writer<'_>,
		event: &Event<'_>,
	) -> fmt::Result {
		let level = event.metadata().level();

		let mut visitor = JsonVisitor::default();
		event.record(&mut visitor);
		let line = render_line(
			level,
			visitor.message.as_deref().unwrap_or_default(),
			visitor.fields,
			Utc::now(),
		);

		if writer.has_ansi_escapes() {
			writeln!(writer, "{}{line}{RESET}", level_color(level))
		} else {
			writeln!(writer, "{line}")
		}
	}
}

#[derive(Default)]
struct JsonVisitor {
	message: Option<String>,
	fields: Map<String, Value>,
}

impl Visit for JsonVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let value = format!("{value:?}");
		if field.name() == "message" {
			self.message = Some(value);
		} else {
			self.fields.insert(field.name().to_string(), Value::String(value));
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = Some(value.to_string());
		} else {
			self.fields
				.insert(field.name().to_string(), Value::String(value.to_string()));
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.fields.insert(field.name().to_string(), value.into());
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.fields.insert(field.name().to_string(), value.into());
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.fields.insert(field.name().to_string(), value.into());
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.fields.insert(field.name().to_string(), value.into());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use parking_lot::Mutex;
	use std::io;
	use std::sync::Arc;
	use tracing_subscriber::fmt::MakeWriter;
	use tracing_subscriber::layer::SubscriberExt;

	#[derive(Clone, Default)]
	struct Capture(Arc<Mutex<Vec<u8>>>);

	impl Capture {
		fn contents(&self) -> String {
			String::from_utf8(self.0.lock().clone()).unwrap()
		}
	}

	impl io::Write for Capture {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	impl<'a> MakeWriter<'a> for Capture {
		type Writer = Capture;

		fn make_writer(&'a self) -> Self::Writer {
			self.clone()
		}
	}

	fn capture_with(ansi: bool, f: impl FnOnce()) -> String {
		let capture = Capture::default();
		let layer = tracing_subscriber::fmt::layer()
			.event_format(LineFormat)
			.with_ansi(ansi)
			.with_writer(capture.clone());
		let subscriber = tracing_subscriber::registry().with(layer);
		tracing::subscriber::with_default(subscriber, f);
		capture.contents()
	}

	#[test]
	fn render_line_has_level_message_and_timestamp() {
		let timestamp = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 5).unwrap();
		let line = render_line(&Level::INFO, "server started", Map::new(), timestamp);
		assert_eq!(
			line,
			r#"{"level":"info","message":"server started","timestamp":"2025-01-31 12:00:05"}"#
		);
	}

	#[test]
	fn render_line_escapes_message() {
		let timestamp = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 5).unwrap();
		let line = render_line(&Level::WARN, "quote \" here", Map::new(), timestamp);
		let parsed: Value = serde_json::from_str(&line).unwrap();
		assert_eq!(parsed["message"], "quote \" here");
		assert_eq!(parsed["level"], "warn");
	}

	#[test]
	fn colours_by_level() {
		assert_eq!(level_color(&Level::ERROR), "\x1b[31m");
		assert_eq!(level_color(&Level::WARN), "\x1b[33m");
		assert_eq!(level_color(&Level::INFO), "\x1b[32m");
		assert_eq!(level_color(&Level::DEBUG), "\x1b[34m");
		assert_eq!(level_color(&Level::TRACE), "\x1b[35m");
	}

	#[test]
	fn formats_events_with_fields() {
		let output = capture_with(false, || {
			tracing::warn!(attempt = 2, "retrying delivery");
		});

		let parsed: Value = serde_json::from_str(output.trim_end()).unwrap();
		assert_eq!(parsed["level"], "warn");
		assert_eq!(parsed["message"], "retrying delivery");
		assert_eq!(parsed["attempt"], 2);
		assert_eq!(parsed["timestamp"].as_str().unwrap().len(), 19);
	}

	#[test]
	fn ansi_output_wraps_line_in_colour() {
		let output = capture_with(true, || {
			tracing::error!("delivery failed");
		});

		assert!(output.starts_with("\x1b[31m{"));
		assert!(output.trim_end().ends_with("}\x1b[0m"));
	}
}
