// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for core report values.

use thiserror::Error;

/// Errors raised while parsing core report values.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid severity: {0}")]
	InvalidSeverity(String),
}

/// Result type for core report operations.
pub type Result<T> = std::result::Result<T, CoreError>;
