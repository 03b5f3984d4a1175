// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP delivery of encoded reports and mapping of delivery results.

use std::fmt;
use std::time::Duration;

use loom_report_core::ReportOutcome;

use crate::error::{ReportSdkError, Result};
use crate::payload::NOTIFIER_VERSION;

/// Headers sent with every report.
pub const FIXED_HEADERS: &[(&str, &str)] = &[("Content-Type", "application/json")];

/// Reason used when a failure carries none.
pub const UNKNOWN_REASON: &str = "unknown";

/// Reason reported for requests that exceeded the timeout.
pub const TIMEOUT_REASON: &str = "timeout";

/// A request that never produced an HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportFailure {
	pub reason: Option<String>,
}

impl TransportFailure {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			reason: Some(reason.into()),
		}
	}

	pub fn unknown() -> Self {
		Self::default()
	}

	pub fn timeout() -> Self {
		Self::new(TIMEOUT_REASON)
	}
}

impl fmt::Display for TransportFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.reason.as_deref().unwrap_or(UNKNOWN_REASON))
	}
}

impl From<reqwest::Error> for TransportFailure {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Self::timeout()
		} else if err.is_connect() {
			Self::new(format!("connect: {err}"))
		} else {
			Self::new(err.to_string())
		}
	}
}

/// Sends an encoded report to the collector.
///
/// Implementations return the HTTP status for any response, successful or
/// not, and a [`TransportFailure`] only when no response was received.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	async fn post(
		&self,
		url: &str,
		body: Vec<u8>,
		headers: &[(&str, &str)],
	) -> std::result::Result<u16, TransportFailure>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	http_client: reqwest::Client,
}

impl HttpTransport {
	/// Creates a transport whose requests time out after `timeout`.
	pub fn new(timeout: Duration) -> Result<Self> {
		let http_client = reqwest::Client::builder()
			.user_agent(user_agent())
			.timeout(timeout)
			.build()
			.map_err(ReportSdkError::RequestFailed)?;

		Ok(Self { http_client })
	}

	/// Wraps a preconfigured client.
	pub fn with_client(http_client: reqwest::Client) -> Self {
		Self { http_client }
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn post(
		&self,
		url: &str,
		body: Vec<u8>,
		headers: &[(&str, &str)],
	) -> std::result::Result<u16, TransportFailure> {
		let mut request = self.http_client.post(url);
		for (name, value) in headers {
			request = request.header(*name, *value);
		}

		let response = request.body(body).send().await?;
		Ok(response.status().as_u16())
	}
}

/// User agent sent by [`HttpTransport`].
pub fn user_agent() -> String {
	format!("loom-report-rust/{NOTIFIER_VERSION}")
}

/// Maps a delivery result onto a [`ReportOutcome`].
///
/// Only HTTP 200 counts as delivered; every other status is a rejection.
pub fn map_response(result: std::result::Result<u16, TransportFailure>) -> ReportOutcome {
	match result {
		Ok(200) => ReportOutcome::Sent,
		Ok(status) => ReportOutcome::RemoteRejected(status),
		Err(failure) => ReportOutcome::TransportError(
			failure
				.reason
				.unwrap_or_else(|| UNKNOWN_REASON.to_string()),
		),
	}
}
