// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Data Source Name: where the transport delivers events and with which key.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::CoreError;

/// Protocol version advertised in the auth header.
const PROTOCOL_VERSION: u32 = 7;

/// A parsed DSN of the form `scheme://public_key@host[:port][/prefix]/project_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
	scheme: String,
	public_key: String,
	host: String,
	port: Option<u16>,
	path_prefix: String,
	project_id: String,
}

impl Dsn {
	pub fn public_key(&self) -> &str {
		&self.public_key
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn project_id(&self) -> &str {
		&self.project_id
	}

	/// Returns the event ingestion endpoint for this DSN.
	pub fn store_url(&self) -> String {
		format!(
			"{}/api/{}/store/",
			self.base_url(),
			self.project_id
		)
	}

	/// Returns the value of the `X-Sentry-Auth` header for the given client name.
	pub fn auth_header(&self, client: &str) -> String {
		format!(
			"Sentry sentry_version={PROTOCOL_VERSION}, sentry_client={client}, sentry_key={}",
			self.public_key
		)
	}

	/// Host and project only, safe to print.
	pub fn redacted(&self) -> String {
		format!("{}/{}", self.base_url(), self.project_id)
	}

	fn base_url(&self) -> String {
		match self.port {
			Some(port) => format!(
				"{}://{}:{}{}",
				self.scheme, self.host, port, self.path_prefix
			),
			None => format!("{}://{}{}", self.scheme, self.host, self.path_prefix),
		}
	}
}

impl FromStr for Dsn {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let url = Url::parse(s).map_err(|e| CoreError::InvalidDsn(e.to_string()))?;

		let scheme = url.scheme().to_string();
		if scheme != "http" && scheme != "https" {
			return Err(CoreError::InvalidDsn(format!(
				"unsupported scheme: {scheme}"
			)));
		}

		let public_key = url.username().to_string();
		if public_key.is_empty() {
			return Err(CoreError::InvalidDsn("missing public key".to_string()));
		}

		let host = url
			.host_str()
			.ok_or_else(|| CoreError::InvalidDsn("missing host".to_string()))?
			.to_string();

		let path = url.path().trim_end_matches('/');
		let (prefix, project_id) = match path.rfind('/') {
			Some(idx) => (&path[..idx], &path[idx + 1..]),
			None => ("", path),
		};
		if project_id.is_empty() {
			return Err(CoreError::InvalidDsn("missing project id".to_string()));
		}

		Ok(Self {
			scheme,
			public_key,
			host,
			port: url.port(),
			path_prefix: prefix.to_string(),
			project_id: project_id.to_string(),
		})
	}
}

impl fmt::Display for Dsn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.port {
			Some(port) => write!(
				f,
				"{}://{}@{}:{}{}/{}",
				self.scheme, self.public_key, self.host, port, self.path_prefix, self.project_id
			),
			None => write!(
				f,
				"{}://{}@{}{}/{}",
				self.scheme, self.public_key, self.host, self.path_prefix, self.project_id
			),
		}
	}
}
