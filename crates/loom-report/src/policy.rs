// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decides whether an exception is worth sending.

use std::panic::{catch_unwind, AssertUnwindSafe};

use loom_report_config::ReportConfig;
use loom_report_core::{Exception, ExceptionFilter, Stacktrace};
use tracing::{debug, warn};

use crate::panic_hook::panic_message;
use crate::scope;

/// Whether `exception` should be reported under `config`.
///
/// Returns false when the release stage is not one of the notify stages,
/// without consulting the filter. Otherwise returns the filter's answer, or
/// true when no filter is configured. A filter that panics is treated as
/// having answered true.
pub fn should_notify(config: &ReportConfig, exception: &Exception, stacktrace: &Stacktrace) -> bool {
	if !config.is_notify_stage() {
		debug!(
			release_stage = %config.release_stage,
			notify_release_stages = %config.notify_release_stages,
			"Release stage not notified"
		);
		return false;
	}

	match &config.exception_filter {
		Some(filter) => run_filter(filter, exception, stacktrace),
		None => true,
	}
}

fn run_filter(filter: &dyn ExceptionFilter, exception: &Exception, stacktrace: &Stacktrace) -> bool {
	let result = scope::suppressing(|| {
		catch_unwind(AssertUnwindSafe(|| {
			filter.should_notify(exception, stacktrace)
		}))
	});

	match result {
		Ok(decision) => {
			if !decision {
				debug!(exception_class = %exception.class, "Exception filter declined report");
			}
			decision
		}
		Err(payload) => {
			warn!(
				exception_class = %exception.class,
				panic = %panic_message(&*payload),
				"Exception filter panicked; reporting anyway"
			);
			true
		}
	}
}
