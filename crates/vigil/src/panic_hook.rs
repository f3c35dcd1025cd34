// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Global panic handler reporting panics as fatal exceptions.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, PanicHookInfo};
use std::thread;
use std::time::Duration;

use tracing::info;
use vigil_core::{ContextMap, ExceptionInfo};

use crate::monitor::{CaptureOptions, Monitor};

/// How long a panicking thread waits for the report to be delivered.
pub const PANIC_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Installs a panic hook that captures each panic through `monitor`,
/// then runs the previously installed hook.
pub fn install_panic_hook(monitor: Monitor) {
	let previous = panic::take_hook();

	panic::set_hook(Box::new(move |info| {
		report_panic(&monitor, info);
		previous(info);
	}));

	info!("Panic hook installed");
}

fn report_panic(monitor: &Monitor, info: &PanicHookInfo<'_>) {
	let mut context = ContextMap::new();
	if let Some(location) = info.location() {
		context.insert(
			"location".to_string(),
			format!("{}:{}:{}", location.file(), location.line(), location.column()).into(),
		);
	}
	context.insert(
		"thread".to_string(),
		thread::current().name().unwrap_or("<unnamed>").into(),
	);

	let mut exception = ExceptionInfo::new("panic", panic_message(info.payload()));
	let backtrace = Backtrace::capture();
	if backtrace.status() == BacktraceStatus::Captured {
		exception = exception.with_stack(backtrace.to_string());
	}

	let options = CaptureOptions::new()
		.fatal()
		.tag("mechanism", "panic")
		.context("panic", context);

	if monitor.capture_exception(exception, options).is_some() {
		monitor.flush(PANIC_FLUSH_TIMEOUT);
	}
}

/// The message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::InMemoryTransport;
	use std::sync::Arc;
	use vigil_core::{Level, MonitoringConfig, Payload};

	#[test]
	fn payload_messages() {
		let s: Box<dyn Any + Send> = Box::new("static");
		assert_eq!(panic_message(s.as_ref()), "static");

		let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
		assert_eq!(panic_message(owned.as_ref()), "owned");

		let other: Box<dyn Any + Send> = Box::new(42_u8);
		assert_eq!(panic_message(other.as_ref()), "Box<dyn Any>");
	}

	#[test]
	fn panics_are_reported_as_fatal() {
		let transport = Arc::new(InMemoryTransport::new());
		let monitor = Monitor::new();
		monitor
			.init(MonitoringConfig::default(), transport.clone())
			.unwrap();
		install_panic_hook(monitor.clone());

		let result = thread::Builder::new()
			.name("doomed".to_string())
			.spawn(|| panic!("panic hook test"))
			.unwrap()
			.join();
		assert!(result.is_err());

		let scoped = monitor.clone();
		let result = thread::spawn(move || {
			panic::catch_unwind(panic::AssertUnwindSafe(|| {
				scoped.configure_scope(|_| panic!("panic inside configure_scope"))
			}))
			.is_err()
		})
		.join();
		let _ = panic::take_hook();
		assert!(matches!(result, Ok(true)));
		assert!(transport
			.events()
			.iter()
			.any(|e| e.description() == "panic inside configure_scope"));

		let event = transport
			.events()
			.into_iter()
			.find(|e| e.description() == "panic hook test")
			.expect("panic should be captured");

		assert_eq!(event.level, Level::Fatal);
		assert_eq!(event.tags["mechanism"], "panic");
		assert_eq!(event.contexts["panic"]["thread"], "doomed");
		assert!(event.contexts["panic"]["location"]
			.as_str()
			.unwrap()
			.contains("panic_hook.rs"));
		assert!(matches!(event.payload, Payload::Exception(ref info) if info.ty == "panic"));
	}
}
