// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing layer that turns ERROR events into exception reports.

use std::fmt;

use loom_report_core::{Exception, ReportOptions};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::reporter::Reporter;
use crate::scope;

/// Metadata tab holding the event's fields.
pub const LOG_METADATA_KEY: &str = "log";

/// A tracing [`Layer`] that reports ERROR events through a [`Reporter`].
///
/// Compose it with `fmt::layer()` so errors are both printed and reported.
/// Events are ignored while `use_logger` is off, and events emitted by this
/// crate are never reported.
#[derive(Clone)]
pub struct ReportLayer {
	reporter: Reporter,
}

impl ReportLayer {
	pub fn new(reporter: Reporter) -> Self {
		Self { reporter }
	}
}

impl<S> Layer<S> for ReportLayer
where
	S: Subscriber + for<'a> LookupSpan<'a>,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let metadata = event.metadata();
		if *metadata.level() != Level::ERROR
			|| is_own_target(metadata.target())
			|| scope::is_suppressed()
			|| !self.reporter.config().use_logger
		{
			return;
		}

		let mut visitor = FieldVisitor::new();
		event.record(&mut visitor);

		let mut log = visitor.fields;
		log.insert("target".to_string(), Value::from(metadata.target()));
		if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
			log.insert("location".to_string(), Value::from(format!("{file}:{line}")));
		}

		let mut options = ReportOptions::new().with_metadata(LOG_METADATA_KEY, Value::Object(log));
		if let Some(module) = metadata.module_path() {
			options = options.with_context(module);
		}

		let message = visitor.message.unwrap_or_default();
		self.reporter
			.report(Exception::new(metadata.target(), message), options);
	}
}

fn is_own_target(target: &str) -> bool {
	target.starts_with("loom_report")
}

/// Visitor that collects an event's message and fields.
struct FieldVisitor {
	message: Option<String>,
	fields: Map<String, Value>,
}

impl FieldVisitor {
	fn new() -> Self {
		Self {
			message: None,
			fields: Map::new(),
		}
	}

	fn insert(&mut self, field: &Field, value: Value) {
		self.fields.insert(field.name().to_string(), value);
	}
}

impl Visit for FieldVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
		let value_str = format!("{value:?}");
		if field.name() == "message" {
			self.message = Some(value_str);
		} else {
			self.insert(field, Value::String(value_str));
		}
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		if field.name() == "message" {
			self.message = Some(value.to_string());
		} else {
			self.insert(field, Value::from(value));
		}
	}

	fn record_i64(&mut self, field: &Field, value: i64) {
		self.insert(field, Value::from(value));
	}

	fn record_u64(&mut self, field: &Field, value: u64) {
		self.insert(field, Value::from(value));
	}

	fn record_bool(&mut self, field: &Field, value: bool) {
		self.insert(field, Value::from(value));
	}

	fn record_f64(&mut self, field: &Field, value: f64) {
		self.insert(field, Value::from(value));
	}

	fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
		self.insert(field, Value::String(value.to_string()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::{Transport, TransportFailure};
	use loom_report_config::{ApiKey, ReportConfig};
	use std::sync::{Arc, Mutex};
	use std::time::Duration;
	use tracing_subscriber::layer::SubscriberExt;

	#[derive(Default)]
	struct CapturingTransport {
		bodies: Mutex<Vec<Value>>,
	}

	#[async_trait::async_trait]
	impl Transport for CapturingTransport {
		async fn post(
			&self,
			_url: &str,
			body: Vec<u8>,
			_headers: &[(&str, &str)],
		) -> Result<u16, TransportFailure> {
			let value = serde_json::from_slice(&body).map_err(|e| TransportFailure::new(e.to_string()))?;
			self.bodies.lock().unwrap().push(value);
			Ok(200)
		}
	}

	fn reporter(use_logger: bool, transport: Arc<CapturingTransport>) -> Reporter {
		Reporter::builder()
			.config(ReportConfig {
				api_key: Some(ApiKey::new("abc123")),
				use_logger,
				..Default::default()
			})
			.transport_arc(transport)
			.build()
			.unwrap()
	}

	#[tokio::test]
	async fn error_events_are_reported() {
		let transport = Arc::new(CapturingTransport::default());
		let reporter = reporter(true, transport.clone());
		let subscriber = tracing_subscriber::registry().with(reporter.logger());

		tracing::subscriber::with_default(subscriber, || {
			tracing::error!(target: "billing", order_id = 42, retry = false, "charge failed");
			tracing::warn!(target: "billing", "only a warning");
		});

		assert!(reporter.flush(Duration::from_secs(5)).await);
		let bodies = transport.bodies.lock().unwrap();
		assert_eq!(bodies.len(), 1);

		let event = &bodies[0]["events"][0];
		assert_eq!(event["exceptions"][0]["errorClass"], "billing");
		assert_eq!(event["exceptions"][0]["message"], "charge failed");
		assert_eq!(event["metaData"]["log"]["order_id"], 42);
		assert_eq!(event["metaData"]["log"]["retry"], false);
		assert_eq!(event["metaData"]["log"]["target"], "billing");
	}

	#[tokio::test]
	async fn disabled_logger_reports_nothing() {
		let transport = Arc::new(CapturingTransport::default());
		let reporter = reporter(false, transport.clone());
		let subscriber = tracing_subscriber::registry().with(reporter.logger());

		tracing::subscriber::with_default(subscriber, || {
			tracing::error!(target: "billing", "charge failed");
		});

		assert!(reporter.flush(Duration::from_secs(5)).await);
		assert!(transport.bodies.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn own_events_are_ignored() {
		let transport = Arc::new(CapturingTransport::default());
		let reporter = reporter(true, transport.clone());
		let subscriber = tracing_subscriber::registry().with(reporter.logger());

		tracing::subscriber::with_default(subscriber, || {
			tracing::error!(target: "loom_report::reporter", "transport panicked");
		});

		assert!(reporter.flush(Duration::from_secs(5)).await);
		assert!(transport.bodies.lock().unwrap().is_empty());
	}

	#[test]
	fn own_target_prefix() {
		assert!(is_own_target("loom_report"));
		assert!(is_own_target("loom_report_config::sources"));
		assert!(!is_own_target("loom_server"));
	}
}
