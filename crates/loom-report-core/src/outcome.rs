// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Result of a synchronous report.

use std::fmt;

/// What happened to a single report.
///
/// Synchronous reporting never fails with an `Err`; every failure mode is one
/// of these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
	/// The collector accepted the report (HTTP 200).
	Sent,
	/// The notification policy declined the report.
	Skipped,
	/// No API key is configured; nothing was sent.
	ConfigError,
	/// The payload could not be encoded; nothing was sent.
	EncodeFailed(String),
	/// The request never produced an HTTP status.
	TransportError(String),
	/// The collector answered with a status other than 200.
	RemoteRejected(u16),
}

impl ReportOutcome {
	pub fn is_sent(&self) -> bool {
		matches!(self, Self::Sent)
	}

	/// True for outcomes that indicate a failure rather than a decision.
	pub fn is_error(&self) -> bool {
		!matches!(self, Self::Sent | Self::Skipped)
	}
}

impl fmt::Display for ReportOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Sent => write!(f, "sent"),
			Self::Skipped => write!(f, "skipped"),
			Self::ConfigError => write!(f, "config error: api key missing"),
			Self::EncodeFailed(reason) => write!(f, "encode failed: {reason}"),
			Self::TransportError(reason) => write!(f, "transport error: {reason}"),
			Self::RemoteRejected(status) => write!(f, "rejected with status {status}"),
		}
	}
}
