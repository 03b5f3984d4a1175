// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embedder-supplied exception filter.

use crate::exception::Exception;
use crate::stacktrace::Stacktrace;

/// Decides whether an exception should be reported.
///
/// Only consulted when the current release stage is a notify stage. A panic
/// raised by an implementation is caught by the reporter and treated as
/// `true`, so a faulty filter can never suppress reporting.
///
/// Any `Fn(&Exception, &Stacktrace) -> bool` closure is a filter:
///
/// ```
/// use loom_report_core::{Exception, ExceptionFilter, Stacktrace};
///
/// let filter = |exception: &Exception, _: &Stacktrace| exception.class != "Cancelled";
/// assert!(!filter.should_notify(&Exception::new("Cancelled", ""), &Stacktrace::default()));
/// ```
pub trait ExceptionFilter: Send + Sync {
	fn should_notify(&self, exception: &Exception, stacktrace: &Stacktrace) -> bool;
}

impl<F> ExceptionFilter for F
where
	F: Fn(&Exception, &Stacktrace) -> bool + Send + Sync,
{
	fn should_notify(&self, exception: &Exception, stacktrace: &Stacktrace) -> bool {
		self(exception, stacktrace)
	}
}
