// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error monitoring SDK.
//!
//! [`Monitor`] is the capture facade: it enriches exceptions and messages with
//! its scope, filters them through the ignore list and `before_send`, and hands
//! the survivors to a [`Transport`]. Around it sit:
//!
//! - [`ErrorBoundary`]: converts an error from a wrapped unit of work into a
//!   capture plus a fallback value
//! - performance marks, measures and [`Transaction`]s
//! - [`install_panic_hook`]: reports panics as fatal exceptions
//! - [`MonitorLayer`]: forwards `tracing` records as events and breadcrumbs
//! - [`HttpTransport`]: delivers [`StorePayload`] bodies to a store endpoint
//!
//! The free functions in this module operate on a process-wide monitor and
//! are no-ops until [`init`] is called.
//!
//! # Example
//!
//! ```ignore
//! use vigil_core::MonitoringConfig;
//!
//! vigil::init(MonitoringConfig::new("production").with_release(env!("CARGO_PKG_VERSION")))?;
//! vigil::set_tag("service", "billing");
//!
//! if let Err(e) = charge(&order) {
//!     vigil::capture_error(&e);
//! }
//!
//! vigil::shutdown(std::time::Duration::from_secs(2));
//! ```

pub mod boundary;
pub mod error;
pub mod http;
pub mod layer;
pub mod monitor;
pub mod panic_hook;
pub mod performance;
pub mod store;
pub mod transaction;
pub mod transport;

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use vigil_core::{Breadcrumb, ContextMap, EventId, ExceptionInfo, MonitoringConfig, UserContext};

pub use boundary::{BoundaryState, CaughtError, ErrorBoundary, ErrorHook, Fallback, ResetHandle};
pub use error::{MonitorError, Result};
pub use http::{EventSender, HttpTransport, HttpTransportConfig, StoreSender};
pub use layer::MonitorLayer;
pub use monitor::{default_transport, CaptureOptions, DropObserver, Monitor};
pub use panic_hook::install_panic_hook;
pub use performance::PerformanceMarker;
pub use store::StorePayload;
pub use transaction::Transaction;
pub use transport::{InMemoryTransport, LogTransport, Transport};

static GLOBAL: OnceLock<Monitor> = OnceLock::new();

/// The process-wide monitor, created uninitialised on first use.
pub fn global() -> &'static Monitor {
	GLOBAL.get_or_init(Monitor::new)
}

/// Initialises the process-wide monitor, choosing the transport from `config`.
pub fn init(config: MonitoringConfig) -> Result<()> {
	global().init_with_default_transport(config)
}

/// Initialises the process-wide monitor with an explicit transport.
pub fn init_with_transport(config: MonitoringConfig, transport: Arc<dyn Transport>) -> Result<()> {
	global().init(config, transport)
}

pub fn capture_exception(exception: ExceptionInfo, options: CaptureOptions) -> Option<EventId> {
	global().capture_exception(exception, options)
}

pub fn capture_error<E>(error: &E) -> Option<EventId>
where
	E: std::error::Error + ?Sized,
{
	global().capture_error(error)
}

pub fn capture_message(message: impl Into<String>, options: CaptureOptions) -> Option<EventId> {
	global().capture_message(message, options)
}

pub fn set_tag(key: impl Into<String>, value: impl Into<String>) {
	global().set_tag(key, value);
}

pub fn set_user(user: UserContext) {
	global().set_user(user);
}

pub fn set_context(key: impl Into<String>, value: ContextMap) {
	global().set_context(key, value);
}

pub fn set_extra(key: impl Into<String>, value: serde_json::Value) {
	global().set_extra(key, value);
}

pub fn add_breadcrumb(breadcrumb: Breadcrumb) {
	global().add_breadcrumb(breadcrumb);
}

pub fn mark(name: &str) -> Instant {
	global().mark(name)
}

pub fn measure(name: &str, start_mark: &str, end_mark: &str) -> Option<Duration> {
	global().measure(name, start_mark, end_mark)
}

pub fn flush(timeout: Duration) -> bool {
	global().flush(timeout)
}

pub fn shutdown(timeout: Duration) -> bool {
	global().shutdown(timeout)
}
