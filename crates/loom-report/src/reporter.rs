// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The reporter: entry point for reporting exceptions.

use std::error::Error as StdError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures::FutureExt;
use loom_report_config::{
	resolve, resolve_with_file, warn_if_missing_api_key, ApiKey, ReportConfig, ReportConfigLayer,
	SharedFilter,
};
use loom_report_core::{
	Exception, ExceptionFilter, ReleaseStages, ReportOptions, ReportOutcome, Stacktrace,
};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::backtrace::capture_backtrace;
use crate::error::{ReportSdkError, Result};
use crate::logger::ReportLayer;
use crate::panic_hook::{install_panic_hook, panic_message};
use crate::payload::{JsonPayloadBuilder, PayloadBuilder};
use crate::policy;
use crate::scope;
use crate::transport::{map_response, HttpTransport, Transport, FIXED_HEADERS, UNKNOWN_REASON};

/// Builder for constructing a [`Reporter`].
///
/// Values set here are explicit overrides: they win over `LOOM_REPORT_*`
/// environment variables, which win over the config file and defaults.
pub struct ReporterBuilder {
	overrides: ReportConfigLayer,
	request_timeout: Option<Duration>,
	config: Option<ReportConfig>,
	config_file: Option<PathBuf>,
	transport: Option<Arc<dyn Transport>>,
	payload_builder: Option<Arc<dyn PayloadBuilder>>,
	runtime: Option<Handle>,
}

impl ReporterBuilder {
	/// Creates a new builder with no overrides.
	pub fn new() -> Self {
		Self {
			overrides: ReportConfigLayer::default(),
			request_timeout: None,
			config: None,
			config_file: None,
			transport: None,
			payload_builder: None,
			runtime: None,
		}
	}

	pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
		self.overrides.api_key = Some(ApiKey::new(api_key));
		self
	}

	/// Sets the collector URL.
	///
	/// Example: `https://notify.bugsnag.com`
	pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
		self.overrides.endpoint_url = Some(url.into());
		self
	}

	/// Enables or disables the panic hook and tracing integration.
	pub fn use_logger(mut self, enabled: bool) -> Self {
		self.overrides.use_logger = Some(enabled);
		self
	}

	/// Example: `production`, `staging`, `development`
	pub fn release_stage(mut self, stage: impl Into<String>) -> Self {
		self.overrides.release_stage = Some(stage.into());
		self
	}

	/// Sets the stages for which reports are sent.
	pub fn notify_release_stages<I, S>(mut self, stages: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.overrides.notify_release_stages = Some(stages.into_iter().collect::<ReleaseStages>());
		self
	}

	pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
		self.overrides.hostname = Some(hostname.into());
		self
	}

	pub fn app_type(mut self, app_type: impl Into<String>) -> Self {
		self.overrides.app_type = Some(app_type.into());
		self
	}

	pub fn app_version(mut self, version: impl Into<String>) -> Self {
		self.overrides.app_version = Some(version.into());
		self
	}

	/// Frames whose file or module contains `marker` are flagged in-project.
	pub fn in_project(mut self, marker: impl Into<String>) -> Self {
		self.overrides.in_project = Some(marker.into());
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}

	/// Sets the filter consulted before each report in a notify stage.
	pub fn exception_filter(mut self, filter: impl ExceptionFilter + 'static) -> Self {
		self.overrides.exception_filter = Some(SharedFilter::new(filter));
		self
	}

	/// Reads a TOML file between the defaults and the environment.
	pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.config_file = Some(path.into());
		self
	}

	/// Uses an already resolved config; overrides, the environment and any
	/// config file are ignored.
	pub fn config(mut self, config: ReportConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// Replaces the HTTP transport.
	pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
		self.transport = Some(Arc::new(transport));
		self
	}

	pub fn transport_arc(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Replaces the JSON payload encoder.
	pub fn payload_builder(mut self, builder: impl PayloadBuilder + 'static) -> Self {
		self.payload_builder = Some(Arc::new(builder));
		self
	}

	/// Runtime used for fire-and-forget reports. Defaults to the runtime the
	/// builder is called from.
	pub fn runtime(mut self, handle: Handle) -> Self {
		self.runtime = Some(handle);
		self
	}

	/// Resolves configuration and builds the reporter.
	pub fn build(self) -> Result<Reporter> {
		let mut config = match self.config {
			Some(config) => config,
			None => match self.config_file {
				Some(path) => resolve_with_file(path, self.overrides)?,
				None => resolve(self.overrides)?,
			},
		};
		if let Some(timeout) = self.request_timeout {
			config.request_timeout = timeout;
		}

		let runtime = match self.runtime {
			Some(handle) => handle,
			None => Handle::try_current().map_err(|_| ReportSdkError::NoRuntime)?,
		};

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(HttpTransport::new(config.request_timeout)?),
		};
		let payload_builder = self
			.payload_builder
			.unwrap_or_else(|| Arc::new(JsonPayloadBuilder));

		info!(
			endpoint_url = %config.endpoint_url,
			release_stage = %config.release_stage,
			"Exception reporter initialized"
		);

		Ok(Reporter {
			inner: Arc::new(ReporterInner {
				config: ArcSwap::from_pointee(config),
				transport,
				payload_builder,
				runtime,
				in_flight: AtomicUsize::new(0),
				idle: Notify::new(),
			}),
		})
	}
}

impl Default for ReporterBuilder {
	fn default() -> Self {
		Self::new()
	}
}

pub(crate) struct ReporterInner {
	config: ArcSwap<ReportConfig>,
	transport: Arc<dyn Transport>,
	payload_builder: Arc<dyn PayloadBuilder>,
	runtime: Handle,
	in_flight: AtomicUsize,
	idle: Notify,
}

impl ReporterInner {
	/// Runs one report through the pipeline. Never panics.
	async fn deliver(
		&self,
		exception: &Exception,
		stacktrace: &Stacktrace,
		options: &ReportOptions,
	) -> ReportOutcome {
		let config = self.config.load_full();

		if !config.has_api_key() {
			warn_if_missing_api_key(&config);
			return ReportOutcome::ConfigError;
		}

		if !policy::should_notify(&config, exception, stacktrace) {
			debug!(exception_class = %exception.class, "Report skipped");
			return ReportOutcome::Skipped;
		}

		let encoded = catch_unwind(AssertUnwindSafe(|| {
			self.payload_builder
				.build(&config, exception, stacktrace, options)
		}));
		let body = match encoded {
			Ok(Ok(body)) => body,
			Ok(Err(e)) => {
				warn!(exception_class = %exception.class, error = %e, "Failed to encode report");
				return ReportOutcome::EncodeFailed(e.to_string());
			}
			Err(payload) => {
				let reason = panic_message(&*payload);
				error!(exception_class = %exception.class, panic = %reason, "Payload builder panicked");
				return ReportOutcome::EncodeFailed(reason);
			}
		};

		debug!(
			url = %config.endpoint_url,
			exception_class = %exception.class,
			bytes = body.len(),
			"Sending exception report"
		);

		let response = AssertUnwindSafe(self.transport.post(&config.endpoint_url, body, FIXED_HEADERS))
			.catch_unwind()
			.await;
		let outcome = match response {
			Ok(result) => map_response(result),
			Err(payload) => {
				error!(panic = %panic_message(&*payload), "Transport panicked");
				ReportOutcome::TransportError(UNKNOWN_REASON.to_string())
			}
		};

		match &outcome {
			ReportOutcome::Sent => debug!(exception_class = %exception.class, "Exception report sent"),
			other => warn!(
				exception_class = %exception.class,
				outcome = %other,
				"Exception report not delivered"
			),
		}

		outcome
	}
}

/// Keeps the in-flight count accurate even if the task is dropped unpolled.
struct InFlight(Arc<ReporterInner>);

impl InFlight {
	fn start(inner: Arc<ReporterInner>) -> Self {
		inner.in_flight.fetch_add(1, Ordering::SeqCst);
		Self(inner)
	}
}

impl Drop for InFlight {
	fn drop(&mut self) {
		if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.0.idle.notify_waiters();
		}
	}
}

/// Reports exceptions to the collector.
///
/// Cheap to clone; clones share configuration, transport and in-flight
/// tracking.
///
/// # Example
///
/// ```ignore
/// use loom_report::{Exception, ReportOptions, Reporter};
///
/// let reporter = Reporter::builder()
///     .api_key("c9d60ae4c7e70c4b6c4ebd3e8056d2b8")
///     .release_stage("staging")
///     .notify_release_stages(["production", "staging"])
///     .build()?;
///
/// let outcome = reporter
///     .sync_report(Exception::new("PaymentError", "card declined"), ReportOptions::new())
///     .await;
/// ```
#[derive(Clone)]
pub struct Reporter {
	inner: Arc<ReporterInner>,
}

impl Reporter {
	pub fn builder() -> ReporterBuilder {
		ReporterBuilder::new()
	}

	/// Snapshot of the current configuration.
	pub fn config(&self) -> Arc<ReportConfig> {
		self.inner.config.load_full()
	}

	/// Replaces the configuration for all subsequent reports.
	///
	/// The HTTP client keeps the timeout it was built with.
	pub fn reload(&self, config: ReportConfig) {
		info!(
			release_stage = %config.release_stage,
			api_key_configured = config.has_api_key(),
			"Report configuration reloaded"
		);
		self.inner.config.store(Arc::new(config));
	}

	/// Whether `exception` would pass the notification policy right now.
	pub fn should_notify(&self, exception: &Exception, stacktrace: &Stacktrace) -> bool {
		policy::should_notify(&self.config(), exception, stacktrace)
	}

	/// Reports an exception and waits for the delivery result.
	///
	/// The stacktrace is captured at the call site unless `options` carries
	/// one.
	pub async fn sync_report(&self, exception: Exception, mut options: ReportOptions) -> ReportOutcome {
		let stacktrace = options.stacktrace.take().unwrap_or_else(capture_backtrace);
		scope::suppressing_async(self.inner.deliver(&exception, &stacktrace, &options)).await
	}

	/// Reports an exception in the background and returns immediately.
	///
	/// The stacktrace is captured before returning. A failure or panic in the
	/// background task is logged and the report dropped.
	pub fn report(&self, exception: Exception, mut options: ReportOptions) {
		if options.stacktrace.is_none() {
			options.stacktrace = Some(capture_backtrace());
		}

		let guard = InFlight::start(Arc::clone(&self.inner));
		self.inner.runtime.spawn(async move {
			let inner = Arc::clone(&guard.0);
			let exception_class = exception.class.clone();
			let stacktrace = options.stacktrace.take().unwrap_or_default();

			let delivery = AssertUnwindSafe(scope::suppressing_async(inner.deliver(
				&exception,
				&stacktrace,
				&options,
			)))
			.catch_unwind()
			.await;

			match delivery {
				Ok(outcome) => debug!(exception_class = %exception_class, outcome = %outcome, "Background report finished"),
				Err(payload) => error!(
					exception_class = %exception_class,
					panic = %panic_message(&*payload),
					"Background report panicked; report dropped"
				),
			}
			drop(guard);
		});
	}

	/// [`Reporter::report`] for an error value, walking its source chain.
	pub fn report_error<E>(&self, error: &E, options: ReportOptions)
	where
		E: StdError + ?Sized,
	{
		self.report(Exception::from_error(error), options);
	}

	/// [`Reporter::sync_report`] for an error value, walking its source chain.
	pub async fn sync_report_error<E>(&self, error: &E, options: ReportOptions) -> ReportOutcome
	where
		E: StdError + ?Sized,
	{
		let exception = Exception::from_error(error);
		self.sync_report(exception, options).await
	}

	/// Number of background reports not yet finished.
	pub fn in_flight(&self) -> usize {
		self.inner.in_flight.load(Ordering::SeqCst)
	}

	/// Waits until all background reports finish or `timeout` elapses.
	///
	/// Returns true if nothing is left in flight.
	pub async fn flush(&self, timeout: Duration) -> bool {
		let drained = async {
			loop {
				let notified = self.inner.idle.notified();
				tokio::pin!(notified);
				notified.as_mut().enable();
				if self.in_flight() == 0 {
					return;
				}
				notified.await;
			}
		};

		match tokio::time::timeout(timeout, drained).await {
			Ok(()) => true,
			Err(_) => {
				warn!(in_flight = self.in_flight(), "Timed out flushing exception reports");
				false
			}
		}
	}

	/// Reports panics before the previously installed hook runs.
	///
	/// Does nothing and returns false when `use_logger` is off.
	pub fn install_panic_hook(&self) -> bool {
		if !self.config().use_logger {
			debug!("Logger integration disabled; panic hook not installed");
			return false;
		}
		install_panic_hook(self.clone());
		true
	}

	/// A `tracing` layer that reports ERROR events through this reporter.
	pub fn logger(&self) -> ReportLayer {
		ReportLayer::new(self.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::PayloadError;
	use crate::transport::TransportFailure;
	use std::sync::Mutex;

	struct SpyTransport {
		calls: AtomicUsize,
		response: std::result::Result<u16, TransportFailure>,
		urls: Mutex<Vec<String>>,
	}

	impl SpyTransport {
		fn responding(response: std::result::Result<u16, TransportFailure>) -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				response,
				urls: Mutex::new(Vec::new()),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait::async_trait]
	impl Transport for SpyTransport {
		async fn post(
			&self,
			url: &str,
			_body: Vec<u8>,
			_headers: &[(&str, &str)],
		) -> std::result::Result<u16, TransportFailure> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.urls.lock().unwrap().push(url.to_string());
			self.response.clone()
		}
	}

	struct PanickingTransport;

	#[async_trait::async_trait]
	impl Transport for PanickingTransport {
		async fn post(
			&self,
			_url: &str,
			_body: Vec<u8>,
			_headers: &[(&str, &str)],
		) -> std::result::Result<u16, TransportFailure> {
			panic!("transport bug")
		}
	}

	struct FailingPayload;

	impl PayloadBuilder for FailingPayload {
		fn build(
			&self,
			_config: &ReportConfig,
			_exception: &Exception,
			_stacktrace: &Stacktrace,
			_options: &ReportOptions,
		) -> std::result::Result<Vec<u8>, PayloadError> {
			Err(PayloadError::Invalid("unencodable".to_string()))
		}
	}

	fn config() -> ReportConfig {
		ReportConfig {
			api_key: Some(ApiKey::new("abc123")),
			endpoint_url: "http://collector.test".to_string(),
			..Default::default()
		}
	}

	fn reporter(config: ReportConfig, transport: Arc<dyn Transport>) -> Reporter {
		Reporter::builder()
			.config(config)
			.transport_arc(transport)
			.build()
			.unwrap()
	}

	fn options() -> ReportOptions {
		ReportOptions::new().with_stacktrace(Stacktrace::default())
	}

	fn exception() -> Exception {
		Exception::new("RuntimeError", "boom")
	}

	#[tokio::test]
	async fn accepted_report_is_sent() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(config(), transport.clone());

		let outcome = reporter.sync_report(exception(), options()).await;

		assert_eq!(outcome, ReportOutcome::Sent);
		assert_eq!(transport.calls(), 1);
		assert_eq!(transport.urls.lock().unwrap()[0], "http://collector.test");
	}

	#[tokio::test]
	async fn non_200_is_rejected() {
		let transport = SpyTransport::responding(Ok(503));
		let reporter = reporter(config(), transport);

		let outcome = reporter.sync_report(exception(), options()).await;
		assert_eq!(outcome, ReportOutcome::RemoteRejected(503));
	}

	#[tokio::test]
	async fn transport_failure_keeps_reason() {
		let transport = SpyTransport::responding(Err(TransportFailure::timeout()));
		let reporter = reporter(config(), transport);

		let outcome = reporter.sync_report(exception(), options()).await;
		assert_eq!(outcome, ReportOutcome::TransportError("timeout".to_string()));
	}

	#[tokio::test]
	async fn missing_api_key_is_config_error_without_network() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(
			ReportConfig {
				api_key: None,
				..config()
			},
			transport.clone(),
		);

		let outcome = reporter.sync_report(exception(), options()).await;

		assert_eq!(outcome, ReportOutcome::ConfigError);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn other_stage_is_skipped_without_network() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(
			ReportConfig {
				release_stage: "development".to_string(),
				..config()
			},
			transport.clone(),
		);

		let outcome = reporter.sync_report(exception(), options()).await;

		assert_eq!(outcome, ReportOutcome::Skipped);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn declining_filter_skips() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(
			ReportConfig {
				exception_filter: Some(SharedFilter::new(|_: &Exception, _: &Stacktrace| false)),
				..config()
			},
			transport.clone(),
		);

		assert_eq!(
			reporter.sync_report(exception(), options()).await,
			ReportOutcome::Skipped
		);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn encode_failure_is_reported() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = Reporter::builder()
			.config(config())
			.transport_arc(transport.clone())
			.payload_builder(FailingPayload)
			.build()
			.unwrap();

		let outcome = reporter.sync_report(exception(), options()).await;

		assert_eq!(outcome, ReportOutcome::EncodeFailed("invalid payload: unencodable".to_string()));
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn panicking_transport_is_unknown_error() {
		let reporter = reporter(config(), Arc::new(PanickingTransport));

		let outcome = reporter.sync_report(exception(), options()).await;
		assert_eq!(outcome, ReportOutcome::TransportError("unknown".to_string()));
	}

	#[tokio::test]
	async fn background_report_is_flushed() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(config(), transport.clone());

		reporter.report(exception(), options());
		reporter.report_error(&std::io::Error::other("disk full"), options());

		assert!(reporter.flush(Duration::from_secs(5)).await);
		assert_eq!(transport.calls(), 2);
		assert_eq!(reporter.in_flight(), 0);
	}

	#[tokio::test]
	async fn background_panic_is_contained() {
		let reporter = reporter(config(), Arc::new(PanickingTransport));

		reporter.report(exception(), options());

		assert!(reporter.flush(Duration::from_secs(5)).await);
	}

	#[tokio::test]
	async fn flush_with_nothing_in_flight() {
		let reporter = reporter(config(), SpyTransport::responding(Ok(200)));
		assert!(reporter.flush(Duration::from_millis(10)).await);
	}

	#[tokio::test]
	async fn reload_applies_to_next_report() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(config(), transport.clone());

		reporter.reload(ReportConfig {
			release_stage: "development".to_string(),
			..config()
		});

		assert_eq!(reporter.config().release_stage, "development");
		assert_eq!(
			reporter.sync_report(exception(), options()).await,
			ReportOutcome::Skipped
		);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn sync_report_error_uses_type_name() {
		let transport = SpyTransport::responding(Ok(200));
		let reporter = reporter(config(), transport);

		let outcome = reporter
			.sync_report_error(&std::io::Error::other("disk full"), options())
			.await;
		assert!(outcome.is_sent());
	}

	#[tokio::test]
	async fn builder_overrides_win() {
		let reporter = Reporter::builder()
			.api_key("explicit")
			.release_stage("staging")
			.notify_release_stages(["staging"])
			.request_timeout(Duration::from_millis(250))
			.transport_arc(SpyTransport::responding(Ok(200)))
			.build()
			.unwrap();

		let config = reporter.config();
		assert_eq!(config.api_key.as_ref().unwrap().expose(), "explicit");
		assert_eq!(config.release_stage, "staging");
		assert!(config.is_notify_stage());
		assert_eq!(config.request_timeout, Duration::from_millis(250));
	}

	#[test]
	fn build_outside_runtime_without_handle_fails() {
		let result = Reporter::builder()
			.config(config())
			.transport_arc(SpyTransport::responding(Ok(200)))
			.build();
		assert!(matches!(result, Err(ReportSdkError::NoRuntime)));
	}

	#[tokio::test]
	async fn panic_hook_not_installed_without_logger() {
		let reporter = reporter(
			ReportConfig {
				use_logger: false,
				..config()
			},
			SpyTransport::responding(Ok(200)),
		);
		assert!(!reporter.install_panic_hook());
	}
}
