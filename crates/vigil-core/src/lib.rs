// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Vigil error monitoring pipeline.
//!
//! This crate holds everything that sits between an application's error and
//! log sites and the outbound transport, without doing any I/O itself:
//!
//! - [`Event`]: an exception, message or transaction record ready for transport
//! - [`Scope`]: accumulated tags, contexts, extras, user and breadcrumbs merged
//!   into every captured event
//! - [`MonitoringConfig`]: immutable options passed to initialisation
//! - [`enrich`]: the enrichment and filtering step (scope merge, ignore list,
//!   `before_send`)
//! - [`classify_environment`]: coarse browser/OS labels from a user-agent string
//!
//! The SDK in the `vigil` crate drives these types; they are kept separate so
//! that tooling and tests can exercise the pipeline without a transport.

pub mod breadcrumb;
pub mod config;
pub mod context;
pub mod dsn;
pub mod enrich;
pub mod environment;
pub mod error;
pub mod event;
pub mod ignore;
pub mod level;
pub mod scope;

pub use breadcrumb::Breadcrumb;
pub use config::{BeforeSend, MonitoringConfig, DEFAULT_SAMPLE_RATE};
pub use context::{ContextMap, UserContext};
pub use dsn::Dsn;
pub use enrich::{enrich, process, DropReason, DroppedEvent, Enriched};
pub use environment::{classify_environment, EnvironmentInfo, UNKNOWN};
pub use error::{CoreError, Result};
pub use event::{Event, EventId, EventKind, ExceptionInfo, Payload};
pub use ignore::IgnorePattern;
pub use level::Level;
pub use scope::{Scope, DEFAULT_MAX_BREADCRUMBS};
