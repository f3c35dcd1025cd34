// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound delivery of enriched events.
//!
//! Transports are fire-and-forget: [`Transport::send`] never blocks on I/O
//! and never reports failure to the capture site.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};
use vigil_core::Event;

/// Accepts enriched events for delivery.
pub trait Transport: Send + Sync {
	/// Hands an event to the transport. Must not block on delivery.
	fn send(&self, event: Event);

	/// Waits up to `timeout` for queued events to be delivered.
	///
	/// Returns `false` if the deadline passed first.
	fn flush(&self, _timeout: Duration) -> bool {
		true
	}

	/// Flushes and stops accepting events.
	fn shutdown(&self, timeout: Duration) -> bool {
		self.flush(timeout)
	}
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
	fn send(&self, event: Event) {
		(**self).send(event)
	}

	fn flush(&self, timeout: Duration) -> bool {
		(**self).flush(timeout)
	}

	fn shutdown(&self, timeout: Duration) -> bool {
		(**self).shutdown(timeout)
	}
}

/// Keeps every event in memory. Intended for tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
	events: Mutex<Vec<Event>>,
}

impl InMemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy of everything sent so far.
	pub fn events(&self) -> Vec<Event> {
		self.events.lock().clone()
	}

	/// Removes and returns everything sent so far.
	pub fn take(&self) -> Vec<Event> {
		std::mem::take(&mut *self.events.lock())
	}

	pub fn len(&self) -> usize {
		self.events.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.lock().is_empty()
	}

	pub fn last(&self) -> Option<Event> {
		self.events.lock().last().cloned()
	}
}

impl Transport for InMemoryTransport {
	fn send(&self, event: Event) {
		self.events.lock().push(event);
	}
}

/// Writes each event as a structured log line instead of delivering it.
///
/// Used when no DSN is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

impl Transport for LogTransport {
	fn send(&self, event: Event) {
		match serde_json::to_string(&event) {
			Ok(json) => info!(
				event_id = %event.event_id,
				kind = %event.kind(),
				level = %event.level,
				event = %json,
				"Event captured"
			),
			Err(e) => debug!(event_id = %event.event_id, error = %e, "Failed to serialize event"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn in_memory_keeps_order() {
		let transport = InMemoryTransport::new();
		transport.send(Event::message("first"));
		transport.send(Event::message("second"));

		let descriptions: Vec<_> = transport
			.events()
			.iter()
			.map(|e| e.description().to_string())
			.collect();
		assert_eq!(descriptions, vec!["first", "second"]);
	}

	#[test]
	fn take_drains_events() {
		let transport = InMemoryTransport::new();
		transport.send(Event::message("m"));
		assert_eq!(transport.take().len(), 1);
		assert!(transport.is_empty());
	}

	#[test]
	fn arc_forwards_to_inner() {
		let inner = Arc::new(InMemoryTransport::new());
		let shared: Arc<dyn Transport> = inner.clone();
		shared.send(Event::message("m"));
		assert!(shared.flush(Duration::from_millis(10)));
		assert_eq!(inner.len(), 1);
	}

	#[test]
	fn log_transport_accepts_every_kind() {
		let transport = LogTransport;
		transport.send(Event::message("m"));
		transport.send(Event::transaction("checkout"));
		assert!(transport.shutdown(Duration::from_millis(10)));
	}
}
