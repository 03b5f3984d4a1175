// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stacktrace types attached to reports.

use serde::{Deserialize, Serialize};

/// A single stack frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	/// Demangled function name.
	pub function: Option<String>,
	/// Module path, e.g. `my_app::handlers`.
	pub module: Option<String>,
	pub filename: Option<String>,
	pub lineno: Option<u32>,
	pub colno: Option<u32>,
	/// Whether the frame belongs to the application rather than std or a runtime.
	pub in_app: bool,
}

/// Call stack at the time of the exception, innermost frame first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	pub fn new(frames: Vec<Frame>) -> Self {
		Self { frames }
	}

	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}

	pub fn len(&self) -> usize {
		self.frames.len()
	}

	/// Frames that belong to application code.
	pub fn in_app_frames(&self) -> impl Iterator<Item = &Frame> {
		self.frames.iter().filter(|f| f.in_app)
	}
}
