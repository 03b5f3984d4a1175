// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-report options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::stacktrace::Stacktrace;

/// Severity attached to a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	#[default]
	Error,
	Warning,
	Info,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Error => write!(f, "error"),
			Self::Warning => write!(f, "warning"),
			Self::Info => write!(f, "info"),
		}
	}
}

impl FromStr for Severity {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"error" => Ok(Self::Error),
			"warning" => Ok(Self::Warning),
			"info" => Ok(Self::Info),
			_ => Err(CoreError::InvalidSeverity(s.to_string())),
		}
	}
}

/// The user affected by the exception.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: Option<String>,
	pub name: Option<String>,
	pub email: Option<String>,
}

/// Options supplied with a single report.
///
/// Everything except `stacktrace` is passed through to the payload. A
/// pre-captured `stacktrace` replaces the one the reporter would otherwise
/// capture at the call site.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
	pub stacktrace: Option<Stacktrace>,
	pub severity: Severity,
	/// Where the exception happened, e.g. a route or job name.
	pub context: Option<String>,
	pub user: Option<User>,
	pub metadata: serde_json::Map<String, serde_json::Value>,
	/// Overrides the exception class in the payload.
	pub error_class: Option<String>,
}

impl ReportOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_stacktrace(mut self, stacktrace: Stacktrace) -> Self {
		self.stacktrace = Some(stacktrace);
		self
	}

	pub fn with_severity(mut self, severity: Severity) -> Self {
		self.severity = severity;
		self
	}

	pub fn with_context(mut self, context: impl Into<String>) -> Self {
		self.context = Some(context.into());
		self
	}

	pub fn with_user(mut self, user: User) -> Self {
		self.user = Some(user);
		self
	}

	/// Adds a metadata entry, replacing any previous value under `key`.
	pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.metadata.insert(key.into(), value);
		self
	}

	pub fn with_error_class(mut self, class: impl Into<String>) -> Self {
		self.error_class = Some(class.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn severity_defaults_to_error() {
		assert_eq!(ReportOptions::default().severity, Severity::Error);
	}

	#[test]
	fn severity_rejects_unknown_level() {
		let result: Result<Severity, _> = "fatal".parse();
		assert!(matches!(result, Err(CoreError::InvalidSeverity(s)) if s == "fatal"));
	}

	#[test]
	fn builder_methods_set_fields() {
		let options = ReportOptions::new()
			.with_severity(Severity::Warning)
			.with_context("GET /api/users")
			.with_metadata("request_id", serde_json::json!("req_1"))
			.with_metadata("request_id", serde_json::json!("req_2"))
			.with_error_class("HttpError");

		assert_eq!(options.severity, Severity::Warning);
		assert_eq!(options.context.as_deref(), Some("GET /api/users"));
		assert_eq!(options.metadata.len(), 1);
		assert_eq!(options.metadata["request_id"], "req_2");
		assert_eq!(options.error_class.as_deref(), Some("HttpError"));
		assert!(options.stacktrace.is_none());
	}
}
