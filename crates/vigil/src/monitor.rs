// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The capture facade.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, info, trace};
use vigil_core::{
	classify_environment, process, Breadcrumb, ContextMap, DropReason, DroppedEvent, Enriched,
	Event, EventId, ExceptionInfo, Level, MonitoringConfig, Scope, UserContext,
};

use crate::error::Result;
use crate::http::{HttpTransport, HttpTransportConfig};
use crate::performance::{format_duration, measure_tag, PerformanceMarker};
use crate::transaction::Transaction;
use crate::transport::{LogTransport, Transport};

/// Called with a summary of every event that does not reach the transport.
pub type DropObserver = Arc<dyn Fn(&DroppedEvent) + Send + Sync>;

/// Per-call additions to a captured event. Call-site values win over scope values.
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
	pub level: Option<Level>,
	pub tags: HashMap<String, String>,
	pub contexts: HashMap<String, ContextMap>,
	pub extra: ContextMap,
	pub user: Option<UserContext>,
}

impl CaptureOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn level(mut self, level: Level) -> Self {
		self.level = Some(level);
		self
	}

	/// Marks an exception as fatal rather than error.
	pub fn fatal(self) -> Self {
		self.level(Level::Fatal)
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn context(mut self, key: impl Into<String>, value: ContextMap) -> Self {
		self.contexts.insert(key.into(), value);
		self
	}

	pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.extra.insert(key.into(), value);
		self
	}

	pub fn user(mut self, user: UserContext) -> Self {
		self.user = Some(user);
		self
	}

	fn apply(self, mut event: Event) -> Event {
		if let Some(level) = self.level {
			event.level = level;
		}
		event.tags.extend(self.tags);
		event.contexts.extend(self.contexts);
		event.extra.extend(self.extra);
		if self.user.is_some() {
			event.user = self.user;
		}
		event
	}
}

struct Binding {
	config: MonitoringConfig,
	transport: Arc<dyn Transport>,
}

/// State shared by a monitor and every fork of it.
#[derive(Default)]
struct Shared {
	binding: RwLock<Option<Arc<Binding>>>,
	marks: PerformanceMarker,
	drop_observer: RwLock<Option<DropObserver>>,
}

/// Capture facade: enriches events with its scope and hands them to the bound transport.
///
/// Cloning a `Monitor` shares everything, scope included. Use [`Monitor::fork`]
/// for a copy with its own scope.
///
/// Before [`Monitor::init`] every capture is a no-op returning `None`.
///
/// # Example
///
/// ```ignore
/// use vigil::{CaptureOptions, InMemoryTransport, Monitor};
/// use vigil_core::MonitoringConfig;
///
/// let monitor = Monitor::new();
/// monitor.init(MonitoringConfig::new("staging"), Arc::new(InMemoryTransport::new()))?;
///
/// monitor.set_tag("feature", "checkout");
/// monitor.capture_message("payment retried", CaptureOptions::new().tag("attempt", "2"));
/// ```
#[derive(Clone, Default)]
pub struct Monitor {
	shared: Arc<Shared>,
	scope: Arc<RwLock<Scope>>,
}

impl Monitor {
	/// Creates an uninitialised monitor with an empty scope.
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds `config` and `transport`, replacing any earlier binding.
	///
	/// Seeds the scope with `browser`, `os` and `app.version` tags.
	pub fn init(&self, config: MonitoringConfig, transport: Arc<dyn Transport>) -> Result<()> {
		config.validate()?;

		let env = classify_environment(config.user_agent.as_deref());
		{
			let mut scope = self.scope.write();
			scope.set_max_breadcrumbs(config.max_breadcrumbs);
			scope.set_tag("app.version", config.release.as_deref().unwrap_or("unknown"));
			scope.set_tag("browser", env.browser);
			scope.set_tag("os", env.os);
		}

		info!(
			environment = %config.environment,
			release = config.release.as_deref().unwrap_or("unknown"),
			dsn = %config.dsn.as_ref().map(|d| d.redacted()).unwrap_or_default(),
			debug = config.debug,
			"Monitor initialised"
		);

		let previous = self
			.shared
			.binding
			.write()
			.replace(Arc::new(Binding { config, transport }));
		if previous.is_some() {
			debug!("Previous monitor configuration replaced");
		}

		Ok(())
	}

	/// Like [`Monitor::init`], choosing the transport from the config:
	/// HTTP when a DSN is set, logging otherwise.
	pub fn init_with_default_transport(&self, config: MonitoringConfig) -> Result<()> {
		let transport = default_transport(&config)?;
		self.init(config, transport)
	}

	pub fn is_initialized(&self) -> bool {
		self.shared.binding.read().is_some()
	}

	/// The bound configuration, if initialised.
	pub fn config(&self) -> Option<MonitoringConfig> {
		self.binding().map(|b| b.config.clone())
	}

	/// Captures an exception at level `error` unless the options say otherwise.
	pub fn capture_exception(
		&self,
		exception: ExceptionInfo,
		options: CaptureOptions,
	) -> Option<EventId> {
		self.capture_event(options.apply(Event::exception(exception)))
	}

	/// Captures any error value, using its type name and source chain.
	pub fn capture_error<E>(&self, error: &E) -> Option<EventId>
	where
		E: std::error::Error + ?Sized,
	{
		self.capture_exception(ExceptionInfo::from_error(error), CaptureOptions::default())
	}

	/// Captures a message at level `info` unless the options say otherwise.
	pub fn capture_message(
		&self,
		message: impl Into<String>,
		options: CaptureOptions,
	) -> Option<EventId> {
		self.capture_event(options.apply(Event::message(message)))
	}

	/// Runs `event` through enrichment and filtering, then hands it to the transport.
	///
	/// Returns the event id if the event was accepted.
	pub fn capture_event(&self, event: Event) -> Option<EventId> {
		let Some(binding) = self.binding() else {
			trace!(event_id = %event.event_id, "Capture before init ignored");
			self.notify_dropped(&DroppedEvent::new(&event, DropReason::NotInitialized));
			return None;
		};

		// Snapshot so before_send may touch the scope without deadlocking.
		let scope = self.scope.read().clone();

		match process(event, &scope, &binding.config) {
			Enriched::Accepted(event) => {
				let event_id = event.event_id;
				if binding.config.debug {
					debug!(
						event_id = %event_id,
						kind = %event.kind(),
						level = %event.level,
						"Event accepted"
					);
				}
				binding.transport.send(event);
				Some(event_id)
			}
			Enriched::Dropped(dropped) => {
				self.notify_dropped(&dropped);
				None
			}
		}
	}

	pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
		self.scope.write().set_tag(key, value);
	}

	pub fn remove_tag(&self, key: &str) {
		self.scope.write().remove_tag(key);
	}

	pub fn set_context(&self, key: impl Into<String>, value: ContextMap) {
		self.scope.write().set_context(key, value);
	}

	pub fn remove_context(&self, key: &str) {
		self.scope.write().remove_context(key);
	}

	pub fn set_extra(&self, key: impl Into<String>, value: serde_json::Value) {
		self.scope.write().set_extra(key, value);
	}

	pub fn set_user(&self, user: UserContext) {
		self.scope.write().set_user(user);
	}

	pub fn clear_user(&self) {
		self.scope.write().clear_user();
	}

	pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
		self.scope.write().add_breadcrumb(breadcrumb);
	}

	pub fn clear_breadcrumbs(&self) {
		self.scope.write().clear_breadcrumbs();
	}

	/// Applies several scope changes at once.
	///
	/// `f` runs against a copy with no lock held, so it may log, capture or
	/// panic. The copy replaces the scope when `f` returns; changes made
	/// through other handles while `f` runs are overwritten. A panic in `f`
	/// leaves the scope untouched.
	pub fn configure_scope<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&mut Scope) -> R,
	{
		let mut scope = self.scope();
		let result = f(&mut scope);
		*self.scope.write() = scope;
		result
	}

	/// A copy of the current scope.
	pub fn scope(&self) -> Scope {
		self.scope.read().clone()
	}

	/// A monitor sharing this one's binding and marks, with its own copy of the scope.
	pub fn fork(&self) -> Monitor {
		Monitor {
			shared: Arc::clone(&self.shared),
			scope: Arc::new(RwLock::new(self.scope())),
		}
	}

	/// Runs `f` against a temporary fork; scope changes made inside are discarded.
	pub fn with_scope<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&Monitor) -> R,
	{
		f(&self.fork())
	}

	/// Records a performance mark and a `performance` breadcrumb.
	pub fn mark(&self, name: &str) -> Instant {
		let instant = self.shared.marks.mark(name);
		self.add_breadcrumb(Breadcrumb::new(
			"performance",
			format!("Performance mark: {name}"),
		));
		instant
	}

	/// Sets tag `performance.<name>` to the milliseconds between two marks.
	///
	/// A missing mark is logged and otherwise ignored.
	pub fn measure(&self, name: &str, start_mark: &str, end_mark: &str) -> Option<Duration> {
		let Some(duration) = self.shared.marks.between(start_mark, end_mark) else {
			debug!(
				measurement = name,
				start_mark,
				end_mark,
				"Failed to measure performance: mark not found"
			);
			return None;
		};

		self.set_tag(measure_tag(name), format_duration(duration));
		Some(duration)
	}

	/// Starts a performance transaction; sampling is decided now.
	pub fn start_transaction(&self, name: impl Into<String>) -> Transaction {
		Transaction::start(self.clone(), name.into(), self.sample_transaction())
	}

	/// Runs `f` inside a transaction named `name`.
	pub fn time<F, R>(&self, name: impl Into<String>, f: F) -> R
	where
		F: FnOnce() -> R,
	{
		let transaction = self.start_transaction(name);
		let result = f();
		transaction.finish();
		result
	}

	/// Installs an observer for dropped events, replacing any earlier one.
	pub fn set_drop_observer<F>(&self, observer: F)
	where
		F: Fn(&DroppedEvent) + Send + Sync + 'static,
	{
		*self.shared.drop_observer.write() = Some(Arc::new(observer));
	}

	pub fn clear_drop_observer(&self) {
		*self.shared.drop_observer.write() = None;
	}

	/// Waits up to `timeout` for the transport to drain. `true` when not initialised.
	pub fn flush(&self, timeout: Duration) -> bool {
		match self.binding() {
			Some(binding) => binding.transport.flush(timeout),
			None => true,
		}
	}

	/// Flushes and unbinds the transport. Later captures behave as before init.
	pub fn shutdown(&self, timeout: Duration) -> bool {
		let Some(binding) = self.shared.binding.write().take() else {
			return true;
		};

		let flushed = binding.transport.shutdown(timeout);
		info!(flushed, "Monitor shut down");
		flushed
	}

	fn binding(&self) -> Option<Arc<Binding>> {
		self.shared.binding.read().clone()
	}

	fn sample_transaction(&self) -> bool {
		match self.binding() {
			Some(binding) => {
				binding.config.enable_performance && fastrand::f64() < binding.config.sample_rate
			}
			None => false,
		}
	}

	fn notify_dropped(&self, dropped: &DroppedEvent) {
		let observer = self.shared.drop_observer.read().clone();
		if let Some(observer) = observer {
			observer(dropped);
		}
	}
}

/// HTTP transport when `config` carries a DSN, logging transport otherwise.
pub fn default_transport(config: &MonitoringConfig) -> Result<Arc<dyn Transport>> {
	let transport: Arc<dyn Transport> = match &config.dsn {
		Some(dsn) => Arc::new(HttpTransport::new(dsn, HttpTransportConfig::default())?),
		None => Arc::new(LogTransport),
	};
	Ok(transport)
}
