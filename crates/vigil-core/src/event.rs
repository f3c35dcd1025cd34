// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Captured event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::context::{ContextMap, UserContext};
use crate::error::CoreError;
use crate::level::Level;

/// Unique identifier for a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.simple())
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// What produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
	Exception,
	Message,
	Transaction,
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exception => write!(f, "exception"),
			Self::Message => write!(f, "message"),
			Self::Transaction => write!(f, "transaction"),
		}
	}
}

impl FromStr for EventKind {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"exception" => Ok(Self::Exception),
			"message" => Ok(Self::Message),
			"transaction" => Ok(Self::Transaction),
			_ => Err(CoreError::InvalidEventKind(s.to_string())),
		}
	}
}

/// An error-like value: a type name, a message and an optional stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
	#[serde(rename = "type")]
	pub ty: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl ExceptionInfo {
	pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			ty: ty.into(),
			value: value.into(),
			stack: None,
		}
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	/// Builds exception info from a Rust error, recording its source chain as the stack.
	pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
		let mut chain = Vec::new();
		let mut source = error.source();
		while let Some(cause) = source {
			chain.push(format!("caused by: {cause}"));
			source = cause.source();
		}

		Self {
			ty: short_type_name(std::any::type_name::<E>()),
			value: error.to_string(),
			stack: (!chain.is_empty()).then(|| chain.join("\n")),
		}
	}
}

/// `my_crate::module::MyError` -> `MyError`
fn short_type_name(full: &str) -> String {
	let base = full.split('<').next().unwrap_or(full);
	let last = base.rsplit("::").next().unwrap_or(base);
	last.split_whitespace().next().unwrap_or(last).to_string()
}

/// The body of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
	Exception(ExceptionInfo),
	Message(String),
	Transaction { name: String },
}

/// A single event flowing from a capture site to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub event_id: EventId,
	pub payload: Payload,
	pub level: Level,

	/// Tags: filled with call-site tags at capture, scope tags merged under them
	pub tags: HashMap<String, String>,
	pub contexts: HashMap<String, ContextMap>,
	pub extra: ContextMap,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user: Option<UserContext>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub breadcrumbs: Vec<Breadcrumb>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub environment: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub release: Option<String>,
	pub platform: String,

	pub timestamp: DateTime<Utc>,
}

impl Event {
	fn with_payload(payload: Payload, level: Level) -> Self {
		Self {
			event_id: EventId::new(),
			payload,
			level,
			tags: HashMap::new(),
			contexts: HashMap::new(),
			extra: ContextMap::new(),
			user: None,
			breadcrumbs: Vec::new(),
			environment: None,
			release: None,
			platform: "rust".to_string(),
			timestamp: Utc::now(),
		}
	}

	/// An exception event at level `error`.
	pub fn exception(info: ExceptionInfo) -> Self {
		Self::with_payload(Payload::Exception(info), Level::Error)
	}

	/// A message event at level `info`.
	pub fn message(message: impl Into<String>) -> Self {
		Self::with_payload(Payload::Message(message.into()), Level::Info)
	}

	/// A completed performance transaction.
	pub fn transaction(name: impl Into<String>) -> Self {
		Self::with_payload(
			Payload::Transaction { name: name.into() },
			Level::Info,
		)
	}

	pub fn kind(&self) -> EventKind {
		match self.payload {
			Payload::Exception(_) => EventKind::Exception,
			Payload::Message(_) => EventKind::Message,
			Payload::Transaction { .. } => EventKind::Transaction,
		}
	}

	/// The human-readable description the ignore list is tested against.
	pub fn description(&self) -> &str {
		match &self.payload {
			Payload::Exception(info) => &info.value,
			Payload::Message(message) => message,
			Payload::Transaction { name } => name,
		}
	}

	pub fn with_level(mut self, level: Level) -> Self {
		self.level = level;
		self
	}

	pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn with_context(mut self, key: impl Into<String>, value: ContextMap) -> Self {
		self.contexts.insert(key.into(), value);
		self
	}

	pub fn with_user(mut self, user: UserContext) -> Self {
		self.user = Some(user);
		self
	}
}
