// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration for automatic exception reporting.

use std::any::Any;
use std::panic::PanicHookInfo;

use loom_report_core::{Exception, ReportOptions};

use crate::backtrace::capture_backtrace;
use crate::reporter::Reporter;
use crate::scope;

/// Error class used for panics.
pub const PANIC_CLASS: &str = "panic";

/// Wrap the current panic hook so panics are reported before it runs.
///
/// Panics raised by the reporting pipeline itself are passed straight to the
/// previous hook.
pub(crate) fn install_panic_hook(reporter: Reporter) {
	let previous_hook = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		if !scope::is_suppressed() {
			report_panic(&reporter, info);
		}
		previous_hook(info);
	}));
}

fn report_panic(reporter: &Reporter, info: &PanicHookInfo<'_>) {
	// The config may have been reloaded with the logger integration off.
	if !reporter.config().use_logger {
		return;
	}

	let message = panic_message(info.payload());
	let mut options = ReportOptions::new().with_stacktrace(capture_backtrace());
	if let Some(location) = info.location() {
		options = options.with_context(format!(
			"{}:{}:{}",
			location.file(),
			location.line(),
			location.column()
		));
	}
	if let Some(name) = std::thread::current().name() {
		options = options.with_metadata("thread", serde_json::json!({ "name": name }));
	}

	reporter.report(Exception::new(PANIC_CLASS, message), options);
}

/// Extract the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
