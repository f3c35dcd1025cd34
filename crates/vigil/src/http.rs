// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport posting events to a Sentry-compatible store endpoint.
//!
//! Events go through a bounded queue to a dedicated worker thread that owns a
//! single-threaded Tokio runtime, so capture sites never need an async
//! context. When the queue is full new events are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use vigil_common_http::{retry, RetryConfig, SDK_NAME};
use vigil_core::{Dsn, Event};

use crate::error::{MonitorError, Result};
use crate::store::StorePayload;
use crate::transport::Transport;

/// Events waiting for delivery before new ones are dropped.
pub const DEFAULT_QUEUE_SIZE: usize = 100;

const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
	/// Timeout for a single HTTP request.
	pub request_timeout: Duration,
	/// Retry policy for each event.
	pub retry_config: RetryConfig,
	/// Capacity of the delivery queue.
	pub queue_size: usize,
}

impl Default for HttpTransportConfig {
	fn default() -> Self {
		Self {
			request_timeout: Duration::from_secs(30),
			retry_config: RetryConfig::default(),
			queue_size: DEFAULT_QUEUE_SIZE,
		}
	}
}

/// Delivers a single event. The worker awaits each delivery in turn.
#[async_trait]
pub trait EventSender: Send + Sync {
	async fn send_event(&self, event: &Event) -> Result<()>;
}

/// Posts events as JSON to the DSN's store endpoint.
pub struct StoreSender {
	client: reqwest::Client,
	url: String,
	auth_header: String,
	retry_config: RetryConfig,
}

impl StoreSender {
	pub fn new(dsn: &Dsn, config: &HttpTransportConfig) -> Result<Self> {
		let client = vigil_common_http::builder()
			.timeout(config.request_timeout)
			.build()?;

		Ok(Self {
			client,
			url: dsn.store_url(),
			auth_header: dsn.auth_header(&format!("{SDK_NAME}/{}", env!("CARGO_PKG_VERSION"))),
			retry_config: config.retry_config.clone(),
		})
	}

	async fn post(&self, event: &Event) -> Result<()> {
		let response = self
			.client
			.post(&self.url)
			.header("X-Sentry-Auth", &self.auth_header)
			.json(&StorePayload::from(event))
			.send()
			.await?;

		let status = response.status();
		if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
			let retry_after = response
				.headers()
				.get("Retry-After")
				.and_then(|v| v.to_str().ok())
				.and_then(|s| s.parse().ok());
			return Err(MonitorError::RateLimited {
				retry_after_secs: retry_after,
			});
		}

		if !status.is_success() {
			let message = response.text().await.unwrap_or_default();
			return Err(MonitorError::ServerError {
				status: status.as_u16(),
				message,
			});
		}

		Ok(())
	}
}

#[async_trait]
impl EventSender for StoreSender {
	async fn send_event(&self, event: &Event) -> Result<()> {
		debug!(url = %self.url, event_id = %event.event_id, "Sending event");
		retry(&self.retry_config, || self.post(event)).await
	}
}

enum Command {
	Send(Box<Event>),
	Flush(std_mpsc::SyncSender<()>),
	Shutdown,
}

/// Queue-backed transport delivering through an [`EventSender`] on a worker thread.
pub struct HttpTransport {
	tx: mpsc::Sender<Command>,
	closed: AtomicBool,
}

impl HttpTransport {
	/// Creates a transport posting to `dsn`'s store endpoint.
	pub fn new(dsn: &Dsn, config: HttpTransportConfig) -> Result<Self> {
		let sender = StoreSender::new(dsn, &config)?;
		info!(dsn = %dsn.redacted(), "HTTP transport started");
		Self::with_sender(Arc::new(sender), config.queue_size)
	}

	/// Creates a transport around a custom sender.
	pub fn with_sender(sender: Arc<dyn EventSender>, queue_size: usize) -> Result<Self> {
		let (tx, rx) = mpsc::channel(queue_size.max(1));

		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_all()
			.build()
			.map_err(MonitorError::WorkerStart)?;

		thread::Builder::new()
			.name("vigil-transport".to_string())
			.spawn(move || runtime.block_on(run_worker(rx, sender)))
			.map_err(MonitorError::WorkerStart)?;

		Ok(Self {
			tx,
			closed: AtomicBool::new(false),
		})
	}

	/// Pushes `command`, waiting for queue space until `deadline`.
	fn push_until(&self, mut command: Command, deadline: Instant) -> bool {
		loop {
			match self.tx.try_send(command) {
				Ok(()) => return true,
				Err(TrySendError::Closed(_)) => return false,
				Err(TrySendError::Full(returned)) => {
					if Instant::now() >= deadline {
						return false;
					}
					command = returned;
					thread::sleep(FLUSH_POLL_INTERVAL);
				}
			}
		}
	}
}

impl Transport for HttpTransport {
	fn send(&self, event: Event) {
		if self.closed.load(Ordering::SeqCst) {
			debug!(event_id = %event.event_id, "Transport closed, dropping event");
			return;
		}

		match self.tx.try_send(Command::Send(Box::new(event))) {
			Ok(()) => {}
			Err(TrySendError::Full(Command::Send(event))) => {
				debug!(event_id = %event.event_id, "Transport queue full, dropping event");
			}
			Err(_) => debug!("Transport worker gone, dropping event"),
		}
	}

	/// Blocks the calling thread; call from outside async contexts.
	fn flush(&self, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let (ack_tx, ack_rx) = std_mpsc::sync_channel(1);

		if !self.push_until(Command::Flush(ack_tx), deadline) {
			return false;
		}

		let remaining = deadline.saturating_duration_since(Instant::now());
		ack_rx.recv_timeout(remaining).is_ok()
	}

	fn shutdown(&self, timeout: Duration) -> bool {
		if self.closed.swap(true, Ordering::SeqCst) {
			return true;
		}
		let flushed = self.flush(timeout);
		let _ = self.tx.try_send(Command::Shutdown);
		flushed
	}
}

async fn run_worker(mut rx: mpsc::Receiver<Command>, sender: Arc<dyn EventSender>) {
	debug!("Transport worker started");

	while let Some(command) = rx.recv().await {
		match command {
			Command::Send(event) => {
				if let Err(e) = sender.send_event(&event).await {
					warn!(event_id = %event.event_id, error = %e, "Failed to deliver event");
				}
			}
			Command::Flush(ack) => {
				let _ = ack.send(());
			}
			Command::Shutdown => break,
		}
	}

	debug!("Transport worker stopped");
}
