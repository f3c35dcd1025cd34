// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod logging;
mod monitoring;

pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use monitoring::MonitoringConfigLayer;
