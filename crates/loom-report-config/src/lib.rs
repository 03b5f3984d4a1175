// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration resolution for the Loom exception reporting client.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, optional TOML file,
//!   environment, explicit overrides)
//! - A fully resolved, immutable [`ReportConfig`] that is built once and then
//!   shared by reference
//! - Consistent environment variable naming (`LOOM_REPORT_*`)
//!
//! # Precedence
//!
//! Highest to lowest:
//! 1. Values set explicitly by the embedding application
//! 2. Environment variables (`LOOM_REPORT_*`)
//! 3. Config file, when one is given
//! 4. Built-in defaults
//!
//! # Usage
//!
//! ```ignore
//! use loom_report_config::{resolve, ReportConfigLayer};
//!
//! let config = resolve(ReportConfigLayer {
//!     app_version: Some(env!("CARGO_PKG_VERSION").to_string()),
//!     ..Default::default()
//! })?;
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sources;

pub use error::ConfigError;
pub use layer::{ReportConfigLayer, SharedFilter};
pub use secret::{ApiKey, REDACTED};
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, OverridesSource, Precedence, TomlSource,
};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use loom_report_core::ReleaseStages;
use tracing::{debug, info, warn};

/// Collector endpoint used when none is configured.
pub const DEFAULT_ENDPOINT_URL: &str = "https://notify.bugsnag.com";
/// Release stage used when none is configured.
pub const DEFAULT_RELEASE_STAGE: &str = "production";
/// Request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static MISSING_KEY_WARNED: AtomicBool = AtomicBool::new(false);

/// Fully resolved reporting configuration.
#[derive(Debug, Clone)]
pub struct ReportConfig {
	/// Absent means delivery is disabled.
	pub api_key: Option<ApiKey>,
	pub endpoint_url: String,
	pub use_logger: bool,
	pub release_stage: String,
	pub notify_release_stages: ReleaseStages,
	pub hostname: Option<String>,
	pub app_type: Option<String>,
	pub app_version: Option<String>,
	/// Marker for in-project stack frames (matched against file and module).
	pub in_project: Option<String>,
	pub exception_filter: Option<SharedFilter>,
	pub request_timeout: Duration,
}

impl ReportConfig {
	/// Whether the current release stage is one that reports.
	pub fn is_notify_stage(&self) -> bool {
		self.notify_release_stages.contains(&self.release_stage)
	}

	pub fn has_api_key(&self) -> bool {
		self.api_key.is_some()
	}
}

impl Default for ReportConfig {
	fn default() -> Self {
		from_layer(ReportConfigLayer::default())
	}
}

/// Resolve configuration from the process environment and explicit overrides.
pub fn resolve(overrides: ReportConfigLayer) -> Result<ReportConfig, ConfigError> {
	resolve_from(vec![
		Box::new(DefaultsSource),
		Box::new(EnvSource::process()),
		Box::new(OverridesSource::new(overrides)),
	])
}

/// Resolve configuration with a TOML file between defaults and the environment.
pub fn resolve_with_file(
	config_path: impl Into<PathBuf>,
	overrides: ReportConfigLayer,
) -> Result<ReportConfig, ConfigError> {
	resolve_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::process()),
		Box::new(OverridesSource::new(overrides)),
	])
}

/// Resolve configuration from an arbitrary set of sources, applied in
/// precedence order regardless of the order given.
pub fn resolve_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ReportConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ReportConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize a merged layer into a resolved config.
fn finalize(layer: ReportConfigLayer) -> Result<ReportConfig, ConfigError> {
	let config = from_layer(layer);

	validate_config(&config)?;

	warn_if_missing_api_key(&config);

	info!(
		endpoint_url = %config.endpoint_url,
		release_stage = %config.release_stage,
		notify_release_stages = %config.notify_release_stages,
		api_key_configured = config.has_api_key(),
		use_logger = config.use_logger,
		filter_configured = config.exception_filter.is_some(),
		"Report configuration loaded"
	);

	Ok(config)
}

/// Logs that no API key is configured, at most once per process.
///
/// Silent when a key is present or when the release stage does not report.
/// Returns true if the warning was logged by this call.
pub fn warn_if_missing_api_key(config: &ReportConfig) -> bool {
	if config.has_api_key() || !config.is_notify_stage() {
		return false;
	}
	if MISSING_KEY_WARNED.swap(true, Ordering::SeqCst) {
		return false;
	}

	warn!(
		release_stage = %config.release_stage,
		"No API key configured; exception reports will not be sent"
	);
	true
}

fn from_layer(layer: ReportConfigLayer) -> ReportConfig {
	ReportConfig {
		api_key: layer.api_key,
		endpoint_url: layer
			.endpoint_url
			.unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_string()),
		use_logger: layer.use_logger.unwrap_or(true),
		release_stage: layer
			.release_stage
			.unwrap_or_else(|| DEFAULT_RELEASE_STAGE.to_string()),
		notify_release_stages: layer
			.notify_release_stages
			.unwrap_or_else(ReleaseStages::production),
		hostname: layer.hostname,
		app_type: layer.app_type,
		app_version: layer.app_version,
		in_project: layer.in_project,
		exception_filter: layer.exception_filter,
		request_timeout: layer
			.request_timeout_secs
			.map(Duration::from_secs)
			.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
	}
}

fn validate_config(config: &ReportConfig) -> Result<(), ConfigError> {
	if !(config.endpoint_url.starts_with("http://") || config.endpoint_url.starts_with("https://"))
	{
		return Err(ConfigError::Validation(format!(
			"endpoint URL must be http(s), got '{}'",
			config.endpoint_url
		)));
	}

	if config.request_timeout.is_zero() {
		return Err(ConfigError::Validation(
			"request timeout must be greater than zero".to_string(),
		));
	}

	Ok(())
}
