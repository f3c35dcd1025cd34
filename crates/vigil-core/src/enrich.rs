// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event enrichment and filtering.
//!
//! Order matters:
//! 1. default config tags, then scope tags, then call-site tags (later wins)
//! 2. scope contexts and extras, then call-site ones (call site wins)
//! 3. scope user, unless the event already carries one
//! 4. scope breadcrumbs ahead of any the event already holds
//! 5. ignore list against the enriched description
//! 6. `before_send`, whose result is final
//!
//! Enrichment reads the scope and never mutates it.

use std::fmt;

use tracing::debug;

use crate::config::MonitoringConfig;
use crate::event::{Event, EventId, EventKind};
use crate::scope::Scope;

/// Why an event did not reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
	/// The description matched an `ignore_errors` entry.
	IgnoreList,
	/// `before_send` returned `None`.
	BeforeSend,
	/// Capture was called before the monitor was initialised.
	NotInitialized,
}

impl fmt::Display for DropReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::IgnoreList => write!(f, "ignore_list"),
			Self::BeforeSend => write!(f, "before_send"),
			Self::NotInitialized => write!(f, "not_initialized"),
		}
	}
}

/// Summary of a dropped event, kept after the event itself is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEvent {
	pub event_id: EventId,
	pub kind: EventKind,
	pub description: String,
	pub reason: DropReason,
}

impl DroppedEvent {
	pub fn new(event: &Event, reason: DropReason) -> Self {
		Self {
			event_id: event.event_id,
			kind: event.kind(),
			description: event.description().to_string(),
			reason,
		}
	}
}

/// Outcome of running an event through the pipeline.
#[derive(Debug)]
pub enum Enriched {
	Accepted(Event),
	Dropped(DroppedEvent),
}

impl Enriched {
	pub fn accepted(self) -> Option<Event> {
		match self {
			Self::Accepted(event) => Some(event),
			Self::Dropped(_) => None,
		}
	}
}

/// Enriches `event` with `scope` and `config`; `None` means the event was dropped.
pub fn enrich(event: Event, scope: &Scope, config: &MonitoringConfig) -> Option<Event> {
	process(event, scope, config).accepted()
}

/// Like [`enrich`], but reports why an event was dropped.
pub fn process(mut event: Event, scope: &Scope, config: &MonitoringConfig) -> Enriched {
	let mut tags = config.tags.clone();
	tags.extend(scope.tags().iter().map(|(k, v)| (k.clone(), v.clone())));
	tags.extend(std::mem::take(&mut event.tags));
	event.tags = tags;

	let mut contexts = scope.contexts().clone();
	contexts.extend(std::mem::take(&mut event.contexts));
	event.contexts = contexts;

	let mut extra = scope.extra().clone();
	extra.extend(std::mem::take(&mut event.extra));
	event.extra = extra;

	if event.user.is_none() {
		event.user = scope.user().cloned();
	}

	if scope.breadcrumb_count() > 0 {
		let mut breadcrumbs: Vec<_> = scope.breadcrumbs().cloned().collect();
		breadcrumbs.append(&mut event.breadcrumbs);
		event.breadcrumbs = breadcrumbs;
	}

	if event.environment.is_none() {
		event.environment = Some(config.environment.clone());
	}
	if event.release.is_none() {
		event.release = config.release.clone();
	}

	if let Some(entry) = config
		.ignore_errors
		.iter()
		.find(|entry| entry.matches(event.description()))
	{
		debug!(
			event_id = %event.event_id,
			entry = ?entry,
			"Event dropped by ignore list"
		);
		return Enriched::Dropped(DroppedEvent::new(&event, DropReason::IgnoreList));
	}

	if let Some(before_send) = &config.before_send {
		let dropped = DroppedEvent::new(&event, DropReason::BeforeSend);
		return match before_send(event) {
			Some(event) => Enriched::Accepted(event),
			None => {
				debug!(event_id = %dropped.event_id, "Event dropped by before_send");
				Enriched::Dropped(dropped)
			}
		};
	}

	Enriched::Accepted(event)
}
