// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Store-endpoint wire format.
//!
//! Messages go out as a top-level `message`, exceptions as
//! `exception.values[]` with the stack split into frames, and transactions
//! as `type: "transaction"` with a start timestamp derived from
//! `trace.duration_ms`.

use std::collections::HashMap;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use vigil_common_http::SDK_NAME;
use vigil_core::{Breadcrumb, ContextMap, Event, ExceptionInfo, Level, Payload, UserContext};

use crate::transaction::TRACE_CONTEXT;

#[derive(Debug, Serialize)]
pub struct StorePayload<'a> {
	event_id: String,
	timestamp: DateTime<Utc>,
	platform: &'a str,
	level: Level,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	ty: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	exception: Option<ExceptionList<'a>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	transaction: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	start_timestamp: Option<DateTime<Utc>>,
	tags: &'a HashMap<String, String>,
	contexts: &'a HashMap<String, ContextMap>,
	extra: &'a ContextMap,
	#[serde(skip_serializing_if = "Option::is_none")]
	user: Option<&'a UserContext>,
	#[serde(skip_serializing_if = "Option::is_none")]
	breadcrumbs: Option<Values<&'a Breadcrumb>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	environment: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	release: Option<&'a str>,
	sdk: Sdk,
}

#[derive(Debug, Serialize)]
struct Values<T> {
	values: Vec<T>,
}

type ExceptionList<'a> = Values<StoreException<'a>>;

#[derive(Debug, Serialize)]
struct StoreException<'a> {
	#[serde(rename = "type")]
	ty: &'a str,
	value: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	stacktrace: Option<Stacktrace<'a>>,
}

#[derive(Debug, Serialize)]
struct Stacktrace<'a> {
	frames: Vec<Frame<'a>>,
}

#[derive(Debug, Serialize)]
struct Frame<'a> {
	function: &'a str,
}

#[derive(Debug, Serialize)]
struct Sdk {
	name: &'static str,
	version: &'static str,
}

impl<'a> From<&'a Event> for StorePayload<'a> {
	fn from(event: &'a Event) -> Self {
		let mut payload = Self {
			event_id: event.event_id.to_string(),
			timestamp: event.timestamp,
			platform: &event.platform,
			level: event.level,
			ty: None,
			message: None,
			exception: None,
			transaction: None,
			start_timestamp: None,
			tags: &event.tags,
			contexts: &event.contexts,
			extra: &event.extra,
			user: event.user.as_ref(),
			breadcrumbs: (!event.breadcrumbs.is_empty()).then(|| Values {
				values: event.breadcrumbs.iter().collect(),
			}),
			environment: event.environment.as_deref(),
			release: event.release.as_deref(),
			sdk: Sdk {
				name: SDK_NAME,
				version: env!("CARGO_PKG_VERSION"),
			},
		};

		match &event.payload {
			Payload::Message(message) => payload.message = Some(message),
			Payload::Exception(info) => {
				payload.exception = Some(Values {
					values: vec![StoreException::from(info)],
				})
			}
			Payload::Transaction { name } => {
				payload.ty = Some("transaction");
				payload.transaction = Some(name);
				payload.start_timestamp = Some(transaction_start(event));
			}
		}

		payload
	}
}

impl<'a> From<&'a ExceptionInfo> for StoreException<'a> {
	fn from(info: &'a ExceptionInfo) -> Self {
		// Frames are listed oldest first; a captured stack reads innermost first.
		let stacktrace = info.stack.as_deref().map(|stack| Stacktrace {
			frames: stack
				.lines()
				.map(str::trim)
				.filter(|line| !line.is_empty())
				.rev()
				.map(|function| Frame { function })
				.collect(),
		});

		Self {
			ty: &info.ty,
			value: &info.value,
			stacktrace,
		}
	}
}

fn transaction_start(event: &Event) -> DateTime<Utc> {
	let duration_ms = event
		.contexts
		.get(TRACE_CONTEXT)
		.and_then(|trace| trace.get("duration_ms"))
		.and_then(serde_json::Value::as_f64)
		.unwrap_or(0.0);
	event.timestamp - ChronoDuration::microseconds((duration_ms * 1000.0) as i64)
}
