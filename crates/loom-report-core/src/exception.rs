// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The exception being reported.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

/// An application exception captured for reporting.
///
/// The pipeline never interprets these fields; they are handed to the
/// exception filter and copied into the payload as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
	/// Error class, e.g. `std::io::Error` or `panic`.
	pub class: String,
	pub message: String,
	/// Messages of the `source()` chain, outermost first.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub causes: Vec<String>,
}

impl Exception {
	pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			message: message.into(),
			causes: Vec::new(),
		}
	}

	/// Builds an exception from an error value, walking its source chain.
	///
	/// The class is the static type name of `E`; pass the concrete error type
	/// rather than `dyn Error` to get a useful class.
	pub fn from_error<E>(error: &E) -> Self
	where
		E: StdError + ?Sized,
	{
		let mut causes = Vec::new();
		let mut source = error.source();
		while let Some(cause) = source {
			causes.push(cause.to_string());
			source = cause.source();
		}

		Self {
			class: std::any::type_name::<E>().to_string(),
			message: error.to_string(),
			causes,
		}
	}
}

impl fmt::Display for Exception {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.class, self.message)
	}
}
