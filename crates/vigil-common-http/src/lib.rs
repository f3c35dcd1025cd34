// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Vigil.
//!
//! This crate provides:
//! - A pre-configured HTTP client with a consistent User-Agent header
//! - Retry logic with exponential backoff for transient delivery failures

mod client;
mod retry;

pub use client::{builder, user_agent, SDK_NAME};
pub use retry::{is_retryable_status, retry, RetryConfig, RetryableError};
