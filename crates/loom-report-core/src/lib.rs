// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom exception reporting client.
//!
//! This crate holds the values that flow through the reporting pipeline and
//! are shared by `loom-report-config` (configuration resolution) and
//! `loom-report` (policy, dispatch and delivery):
//!
//! - [`Exception`] and [`Stacktrace`]: what happened and where
//! - [`ReportOptions`]: per-call options such as severity, user and metadata
//! - [`ReleaseStages`]: the set of stages for which reporting is active
//! - [`ExceptionFilter`]: embedder-supplied predicate consulted before sending
//! - [`ReportOutcome`]: the typed result of a synchronous report

pub mod error;
pub mod exception;
pub mod filter;
pub mod options;
pub mod outcome;
pub mod stages;
pub mod stacktrace;

pub use error::{CoreError, Result};
pub use exception::Exception;
pub use filter::ExceptionFilter;
pub use options::{ReportOptions, Severity, User};
pub use outcome::ReportOutcome;
pub use stages::ReleaseStages;
pub use stacktrace::{Frame, Stacktrace};
