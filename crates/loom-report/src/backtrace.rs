// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stacktrace capture from the calling thread.

use loom_report_core::{Frame, Stacktrace};
use rustc_demangle::demangle;
use std::backtrace::{Backtrace, BacktraceStatus};

/// Capture the current call stack.
///
/// Frames belonging to the capture machinery itself are dropped, so the first
/// frame is the caller of the reporting API. Returns an empty stacktrace on
/// platforms without backtrace support.
pub fn capture_backtrace() -> Stacktrace {
	let backtrace = Backtrace::force_capture();
	parse_backtrace(&backtrace)
}

/// Convert a captured [`Backtrace`] into a [`Stacktrace`].
pub fn parse_backtrace(backtrace: &Backtrace) -> Stacktrace {
	if backtrace.status() != BacktraceStatus::Captured {
		return Stacktrace::default();
	}

	let mut frames = parse_backtrace_string(&format!("{backtrace:#}"));
	if let Some(last_internal) = frames.iter().rposition(is_capture_frame) {
		frames.drain(..=last_internal);
	}
	Stacktrace::new(frames)
}

/// Parse the alternate `Display` form of a std backtrace:
///
/// ```text
///    0: my_app::handlers::run
///              at ./src/handlers.rs:42:9
///    1: my_app::main
/// ```
fn parse_backtrace_string(bt_string: &str) -> Vec<Frame> {
	let mut frames: Vec<Frame> = Vec::new();

	for line in bt_string.lines() {
		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		if let Some(location) = line.strip_prefix("at ") {
			if let Some(frame) = frames.last_mut() {
				apply_location(frame, location);
			}
			continue;
		}

		if let Some(frame) = parse_frame_line(line) {
			frames.push(frame);
		}
	}

	frames
}

fn parse_frame_line(line: &str) -> Option<Frame> {
	let (index, function_part) = line.split_once(':')?;
	index.trim().parse::<u32>().ok()?;

	let function_part = function_part.trim();
	if function_part.is_empty() {
		return None;
	}

	let demangled = demangle(function_part).to_string();
	let module = demangled.rfind("::").map(|idx| demangled[..idx].to_string());
	let in_app = is_in_app_frame(&demangled);

	Some(Frame {
		function: Some(demangled),
		module,
		in_app,
		..Default::default()
	})
}

/// `path/to/file.rs:42:9`; line and column are optional.
fn apply_location(frame: &mut Frame, location: &str) {
	let mut parts = location.rsplitn(3, ':');
	let last = parts.next();
	let middle = parts.next();
	let rest = parts.next();

	match (rest, middle, last) {
		(Some(file), Some(line), Some(col)) if line.parse::<u32>().is_ok() => {
			frame.filename = Some(file.to_string());
			frame.lineno = line.parse().ok();
			frame.colno = col.parse().ok();
		}
		(_, Some(file), Some(line)) if line.parse::<u32>().is_ok() => {
			let file = match rest {
				Some(prefix) => format!("{prefix}:{file}"),
				None => file.to_string(),
			};
			frame.filename = Some(file);
			frame.lineno = line.parse().ok();
		}
		_ => frame.filename = Some(location.to_string()),
	}
}

fn is_capture_frame(frame: &Frame) -> bool {
	frame.function.as_deref().is_some_and(|function| {
		function.starts_with("std::backtrace::")
			|| function.starts_with("std::backtrace_rs::")
			|| function.starts_with("loom_report::backtrace::")
	})
}

/// Whether a frame is application code rather than std, a runtime, or this SDK.
fn is_in_app_frame(function: &str) -> bool {
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tokio::",
		"<tokio::",
		"futures::",
		"<futures::",
		"futures_util::",
		"<futures_util::",
		"async_trait::",
		"tracing::",
		"<tracing::",
		"tracing_core::",
		"tracing_subscriber::",
		"<tracing_subscriber::",
		"loom_report::",
		"<loom_report::",
		"panic_unwind::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
		"<unknown>",
	];

	const SYSTEM_CONTAINS: &[&str] = &["::panicking::", "::rt::", "::sys_common::"];

	!SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p))
		&& !SYSTEM_CONTAINS.iter().any(|c| function.contains(c))
}
