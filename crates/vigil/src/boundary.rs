// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error boundaries: turn an error raised by a wrapped unit of work into a
//! captured exception plus a fallback value.
//!
//! A boundary is `Healthy` until the wrapped work fails, then `Faulted` until
//! [`ErrorBoundary::reset`]. While faulted the wrapped work is not run and the
//! fallback is returned instead. Resetting does not guard against the same
//! defect faulting the boundary again.
//!
//! Host frameworks that catch errors themselves drive the boundary through
//! [`ErrorHook`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};
use vigil_core::{ContextMap, ExceptionInfo};

use crate::monitor::{CaptureOptions, Monitor};
use crate::panic_hook::panic_message;

/// Context key carrying the trace of where the error surfaced.
pub const BOUNDARY_CONTEXT: &str = "boundary";
/// Context key carrying the scalar props of the failed component.
pub const PROPS_CONTEXT: &str = "boundary.props";
/// Tag naming the failed component.
pub const COMPONENT_TAG: &str = "boundary.component";

/// An error caught by a boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CaughtError {
	pub error: ExceptionInfo,
	/// Where in the component or call tree the error surfaced.
	pub trace: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoundaryState {
	#[default]
	Healthy,
	Faulted(CaughtError),
}

/// Entry point for hosts that intercept errors themselves.
pub trait ErrorHook<T> {
	/// Records `error` raised at `trace` and returns what to render instead.
	fn on_error(&self, error: ExceptionInfo, trace: &str) -> T;
}

/// Returns a faulted boundary to `Healthy`.
#[derive(Clone)]
pub struct ResetHandle {
	state: Arc<Mutex<BoundaryState>>,
}

impl ResetHandle {
	pub fn reset(&self) {
		*self.state.lock() = BoundaryState::Healthy;
	}
}

type RenderFn<T> = dyn Fn(&CaughtError, &ResetHandle) -> T + Send + Sync;

/// What a faulted boundary yields.
pub enum Fallback<T> {
	Static(T),
	Render(Arc<RenderFn<T>>),
}

impl<T> Fallback<T> {
	pub fn render<F>(f: F) -> Self
	where
		F: Fn(&CaughtError, &ResetHandle) -> T + Send + Sync + 'static,
	{
		Self::Render(Arc::new(f))
	}
}

type OnErrorFn = dyn Fn(&ExceptionInfo, &str) + Send + Sync;

pub struct ErrorBoundary<T> {
	monitor: Monitor,
	state: Arc<Mutex<BoundaryState>>,
	fallback: Fallback<T>,
	on_error: Option<Arc<OnErrorFn>>,
	component_name: Option<String>,
	props: ContextMap,
	log_errors: bool,
}

impl<T: Clone> ErrorBoundary<T> {
	pub fn new(monitor: Monitor, fallback: Fallback<T>) -> Self {
		Self {
			monitor,
			state: Arc::new(Mutex::new(BoundaryState::Healthy)),
			fallback,
			on_error: None,
			component_name: None,
			props: ContextMap::new(),
			log_errors: false,
		}
	}

	/// Called with each caught error before it is captured.
	pub fn with_on_error<F>(mut self, f: F) -> Self
	where
		F: Fn(&ExceptionInfo, &str) + Send + Sync + 'static,
	{
		self.on_error = Some(Arc::new(f));
		self
	}

	pub fn component_name(mut self, name: impl Into<String>) -> Self {
		self.component_name = Some(name.into());
		self
	}

	/// Attaches a prop to captured events. Arrays and objects are skipped.
	pub fn prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		let key = key.into();
		if value.is_array() || value.is_object() {
			debug!(prop = %key, "Skipping non-scalar boundary prop");
		} else {
			self.props.insert(key, value);
		}
		self
	}

	/// Also emit an `error!` log for each caught error.
	pub fn log_errors(mut self, enabled: bool) -> Self {
		self.log_errors = enabled;
		self
	}

	pub fn state(&self) -> BoundaryState {
		self.state.lock().clone()
	}

	pub fn is_faulted(&self) -> bool {
		matches!(*self.state.lock(), BoundaryState::Faulted(_))
	}

	/// Unconditionally returns to `Healthy`, discarding the stored error.
	pub fn reset(&self) {
		self.reset_handle().reset();
	}

	pub fn reset_handle(&self) -> ResetHandle {
		ResetHandle {
			state: Arc::clone(&self.state),
		}
	}

	/// Runs `child` unless faulted; an `Err` faults the boundary.
	pub fn render<F, E>(&self, trace: &str, child: F) -> T
	where
		F: FnOnce() -> Result<T, E>,
		E: std::error::Error,
	{
		if let Some(caught) = self.caught() {
			return self.fallback_for(&caught);
		}

		match child() {
			Ok(value) => value,
			Err(e) => self.handle_error(ExceptionInfo::from_error(&e), trace),
		}
	}

	/// Runs `child` unless faulted; a panic faults the boundary.
	///
	/// An installed panic hook still sees the panic.
	pub fn render_catching<F>(&self, trace: &str, child: F) -> T
	where
		F: FnOnce() -> T,
	{
		if let Some(caught) = self.caught() {
			return self.fallback_for(&caught);
		}

		match panic::catch_unwind(AssertUnwindSafe(child)) {
			Ok(value) => value,
			Err(payload) => {
				let message = panic_message(payload.as_ref());
				self.handle_error(ExceptionInfo::new("panic", message), trace)
			}
		}
	}

	/// Faults the boundary with `error`, reports it and returns the fallback.
	pub fn handle_error(&self, error: ExceptionInfo, trace: &str) -> T {
		let caught = CaughtError {
			error,
			trace: trace.to_string(),
		};
		*self.state.lock() = BoundaryState::Faulted(caught.clone());

		if let Some(on_error) = &self.on_error {
			on_error(&caught.error, &caught.trace);
		}

		if self.log_errors {
			error!(
				component = self.component_name.as_deref().unwrap_or("anonymous"),
				error_type = %caught.error.ty,
				error = %caught.error.value,
				"Error caught by boundary"
			);
		}

		self.monitor
			.capture_exception(caught.error.clone(), self.capture_options(&caught));

		self.fallback_for(&caught)
	}

	fn capture_options(&self, caught: &CaughtError) -> CaptureOptions {
		let mut boundary = ContextMap::new();
		boundary.insert(
			"component_stack".to_string(),
			serde_json::Value::String(caught.trace.clone()),
		);

		let mut options = CaptureOptions::new().context(BOUNDARY_CONTEXT, boundary);
		if let Some(name) = &self.component_name {
			options = options.tag(COMPONENT_TAG, name.clone());
		}
		if !self.props.is_empty() {
			options = options.context(PROPS_CONTEXT, self.props.clone());
		}
		options
	}

	fn caught(&self) -> Option<CaughtError> {
		match &*self.state.lock() {
			BoundaryState::Faulted(caught) => Some(caught.clone()),
			BoundaryState::Healthy => None,
		}
	}

	fn fallback_for(&self, caught: &CaughtError) -> T {
		match &self.fallback {
			Fallback::Static(value) => value.clone(),
			Fallback::Render(render) => render(caught, &self.reset_handle()),
		}
	}
}

impl<T: Clone> ErrorHook<T> for ErrorBoundary<T> {
	fn on_error(&self, error: ExceptionInfo, trace: &str) -> T {
		self.handle_error(error, trace)
	}
}
