// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exception reporting SDK for Rust applications.
//!
//! Sends application exceptions to a Bugsnag-compatible collector, either in
//! the background or synchronously with a typed [`ReportOutcome`].
//!
//! # Quick Start
//!
//! ```ignore
//! use loom_report::{Exception, ReportOptions, Reporter, Severity};
//! use tracing_subscriber::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Unset values fall back to LOOM_REPORT_* environment variables,
//!     // then to the defaults.
//!     let reporter = Reporter::builder()
//!         .app_version(env!("CARGO_PKG_VERSION"))
//!         .exception_filter(|e: &Exception, _: &_| e.class != "Cancelled")
//!         .build()?;
//!
//!     // Report panics and ERROR-level tracing events.
//!     reporter.install_panic_hook();
//!     tracing_subscriber::registry()
//!         .with(tracing_subscriber::fmt::layer())
//!         .with(reporter.logger())
//!         .init();
//!
//!     // Fire and forget.
//!     if let Err(e) = std::fs::read("/etc/app.toml") {
//!         reporter.report_error(&e, ReportOptions::new().with_context("startup"));
//!     }
//!
//!     // Or wait for the outcome.
//!     let outcome = reporter
//!         .sync_report(
//!             Exception::new("QuotaExceeded", "tenant 42 over quota"),
//!             ReportOptions::new().with_severity(Severity::Warning),
//!         )
//!         .await;
//!     println!("{outcome}");
//!
//!     reporter.flush(std::time::Duration::from_secs(5)).await;
//!     Ok(())
//! }
//! ```
//!
//! # Notification policy
//!
//! A report is sent only when the release stage is one of the notify stages
//! and the exception filter, if any, returns true. A filter that panics
//! counts as true.

mod backtrace;
mod error;
mod logger;
mod panic_hook;
mod payload;
mod policy;
mod reporter;
mod scope;
mod transport;

pub use backtrace::{capture_backtrace, parse_backtrace};
pub use error::{PayloadError, ReportSdkError, Result};
pub use logger::{ReportLayer, LOG_METADATA_KEY};
pub use panic_hook::PANIC_CLASS;
pub use payload::{JsonPayloadBuilder, PayloadBuilder, NOTIFIER_NAME, NOTIFIER_VERSION};
pub use policy::should_notify;
pub use reporter::{Reporter, ReporterBuilder};
pub use transport::{
	map_response, user_agent, HttpTransport, Transport, TransportFailure, FIXED_HEADERS,
	TIMEOUT_REASON, UNKNOWN_REASON,
};

// Re-export core and config types for convenience
pub use loom_report_config::{ApiKey, ConfigError, ReportConfig, ReportConfigLayer, SharedFilter};
pub use loom_report_core::{
	Exception, ExceptionFilter, Frame, ReleaseStages, ReportOptions, ReportOutcome, Severity,
	Stacktrace, User,
};
