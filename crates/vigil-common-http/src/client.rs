// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::ClientBuilder;

/// SDK name reported to the ingestion endpoint.
pub const SDK_NAME: &str = "vigil-rust";

/// Creates a new HTTP client builder with the standard Vigil User-Agent header.
///
/// # Example
/// ```ignore
/// let client = vigil_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	reqwest::Client::builder().user_agent(user_agent())
}

/// Returns the standard User-Agent string.
///
/// Format: `vigil-rust/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"{SDK_NAME}/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
