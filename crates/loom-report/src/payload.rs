// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encoding reports into the collector's wire format.

use loom_report_config::ReportConfig;
use loom_report_core::{Exception, Frame, ReportOptions, Severity, Stacktrace, User};
use serde::Serialize;

use crate::error::PayloadError;

/// Notifier name sent with every payload.
pub const NOTIFIER_NAME: &str = "loom-report-rust";
/// SDK version sent with every payload.
pub const NOTIFIER_VERSION: &str = env!("CARGO_PKG_VERSION");
const NOTIFIER_URL: &str = env!("CARGO_PKG_REPOSITORY");
const PAYLOAD_VERSION: &str = "2";
const CAUSE_CLASS: &str = "cause";

/// Turns a report into the request body sent to the collector.
pub trait PayloadBuilder: Send + Sync {
	fn build(
		&self,
		config: &ReportConfig,
		exception: &Exception,
		stacktrace: &Stacktrace,
		options: &ReportOptions,
	) -> Result<Vec<u8>, PayloadError>;
}

/// Builds Bugsnag-style JSON notices (payload version 2).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadBuilder;

impl PayloadBuilder for JsonPayloadBuilder {
	fn build(
		&self,
		config: &ReportConfig,
		exception: &Exception,
		stacktrace: &Stacktrace,
		options: &ReportOptions,
	) -> Result<Vec<u8>, PayloadError> {
		let in_project = config.in_project.as_deref();

		let mut exceptions = vec![ExceptionEntry {
			error_class: options.error_class.as_deref().unwrap_or(&exception.class),
			message: &exception.message,
			stacktrace: stacktrace
				.frames
				.iter()
				.map(|frame| FrameEntry::new(frame, in_project))
				.collect(),
		}];
		exceptions.extend(exception.causes.iter().map(|cause| ExceptionEntry {
			error_class: CAUSE_CLASS,
			message: cause,
			stacktrace: Vec::new(),
		}));

		let notice = Notice {
			api_key: config.api_key.as_ref().map(|key| key.expose()),
			notifier: Notifier {
				name: NOTIFIER_NAME,
				version: NOTIFIER_VERSION,
				url: NOTIFIER_URL,
			},
			events: vec![Event {
				payload_version: PAYLOAD_VERSION,
				exceptions,
				severity: options.severity,
				context: options.context.as_deref(),
				user: options.user.as_ref(),
				meta_data: &options.metadata,
				app: App {
					release_stage: &config.release_stage,
					app_type: config.app_type.as_deref(),
					version: config.app_version.as_deref(),
				},
				device: Device {
					hostname: config.hostname.as_deref(),
				},
			}],
		};

		Ok(serde_json::to_vec(&notice)?)
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Notice<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	api_key: Option<&'a str>,
	notifier: Notifier,
	events: Vec<Event<'a>>,
}

#[derive(Serialize)]
struct Notifier {
	name: &'static str,
	version: &'static str,
	url: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Event<'a> {
	payload_version: &'static str,
	exceptions: Vec<ExceptionEntry<'a>>,
	severity: Severity,
	#[serde(skip_serializing_if = "Option::is_none")]
	context: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	user: Option<&'a User>,
	meta_data: &'a serde_json::Map<String, serde_json::Value>,
	app: App<'a>,
	device: Device<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionEntry<'a> {
	error_class: &'a str,
	message: &'a str,
	stacktrace: Vec<FrameEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FrameEntry<'a> {
	file: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	line_number: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	column_number: Option<u32>,
	method: &'a str,
	in_project: bool,
}

impl<'a> FrameEntry<'a> {
	fn new(frame: &'a Frame, in_project: Option<&str>) -> Self {
		let file = frame.filename.as_deref().unwrap_or("<unknown>");
		let method = frame.function.as_deref().unwrap_or("<unknown>");
		let in_project = match in_project {
			Some(marker) => {
				file.contains(marker) || frame.module.as_deref().is_some_and(|m| m.contains(marker))
			}
			None => frame.in_app,
		};

		Self {
			file,
			line_number: frame.lineno,
			column_number: frame.colno,
			method,
			in_project,
		}
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct App<'a> {
	release_stage: &'a str,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	app_type: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	version: Option<&'a str>,
}

#[derive(Serialize)]
struct Device<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	hostname: Option<&'a str>,
}
