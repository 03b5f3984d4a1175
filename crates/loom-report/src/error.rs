// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the report SDK.

use loom_report_config::ConfigError;
use thiserror::Error;

/// Result type alias for report SDK operations.
pub type Result<T> = std::result::Result<T, ReportSdkError>;

/// Errors raised while building a [`Reporter`](crate::Reporter).
///
/// Reporting itself never returns these; delivery failures surface as
/// [`ReportOutcome`](loom_report_core::ReportOutcome) variants.
#[derive(Debug, Error)]
pub enum ReportSdkError {
	/// Configuration could not be resolved.
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// No tokio runtime handle was supplied or available.
	#[error("no tokio runtime available; build the reporter inside a runtime or pass a handle")]
	NoRuntime,

	/// The HTTP client could not be constructed.
	#[error("HTTP client error: {0}")]
	RequestFailed(#[from] reqwest::Error),
}

/// Errors raised by a [`PayloadBuilder`](crate::PayloadBuilder).
#[derive(Debug, Error)]
pub enum PayloadError {
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// The builder refused the input.
	#[error("invalid payload: {0}")]
	Invalid(String),
}
