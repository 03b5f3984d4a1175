// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Report exceptions using the loom-report SDK.
//!
//! Run with:
//!   LOOM_REPORT_API_KEY=... cargo run --example capture -p loom-report

use std::time::Duration;

use loom_report::{Exception, ReportOptions, Reporter, Severity, User};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let reporter = Reporter::builder()
		.release_stage("development")
		.notify_release_stages(["development", "production"])
		.app_type("example")
		.app_version("0.1.0-example")
		.exception_filter(|exception: &Exception, _: &loom_report::Stacktrace| {
			exception.class != "Ignored"
		})
		.build()?;

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer())
		.with(reporter.logger())
		.init();

	reporter.install_panic_hook();

	println!("Sending synchronous report...");
	let outcome = reporter
		.sync_report(
			Exception::new("ExampleError", "example error from loom-report"),
			ReportOptions::new()
				.with_severity(Severity::Warning)
				.with_context("examples/capture")
				.with_user(User {
					id: Some("user_example_123".to_string()),
					..Default::default()
				}),
		)
		.await;
	println!("  Outcome: {outcome}");

	let skipped = reporter
		.sync_report(Exception::new("Ignored", "filtered out"), ReportOptions::new())
		.await;
	println!("  Filtered: {skipped}");

	println!("Sending background reports...");
	if let Err(e) = std::fs::read("/nonexistent/loom-report-example") {
		reporter.report_error(&e, ReportOptions::new());
	}
	tracing::error!(attempt = 3, "example error event");

	let _ = std::thread::spawn(|| panic!("example panic")).join();

	let drained = reporter.flush(Duration::from_secs(10)).await;
	println!("  Flushed: {drained}");

	Ok(())
}
