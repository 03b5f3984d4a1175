// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use std::fmt;
use std::sync::Arc;

use loom_report_core::{Exception, ExceptionFilter, ReleaseStages, Stacktrace};
use serde::{Deserialize, Serialize};

use crate::secret::ApiKey;

/// Shared handle to an embedder-supplied [`ExceptionFilter`].
#[derive(Clone)]
pub struct SharedFilter(Arc<dyn ExceptionFilter>);

impl SharedFilter {
	pub fn new(filter: impl ExceptionFilter + 'static) -> Self {
		Self(Arc::new(filter))
	}

	pub fn from_arc(filter: Arc<dyn ExceptionFilter>) -> Self {
		Self(filter)
	}
}

impl ExceptionFilter for SharedFilter {
	fn should_notify(&self, exception: &Exception, stacktrace: &Stacktrace) -> bool {
		self.0.should_notify(exception, stacktrace)
	}
}

impl fmt::Debug for SharedFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SharedFilter(..)")
	}
}

/// One layer of configuration. Unset fields defer to lower-precedence layers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfigLayer {
	pub api_key: Option<ApiKey>,
	pub endpoint_url: Option<String>,
	pub use_logger: Option<bool>,
	pub release_stage: Option<String>,
	pub notify_release_stages: Option<ReleaseStages>,
	pub hostname: Option<String>,
	pub app_type: Option<String>,
	pub app_version: Option<String>,
	pub in_project: Option<String>,
	pub request_timeout_secs: Option<u64>,
	#[serde(skip)]
	pub exception_filter: Option<SharedFilter>,
}

impl ReportConfigLayer {
	/// Overlays `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		if other.api_key.is_some() {
			self.api_key = other.api_key;
		}
		if other.endpoint_url.is_some() {
			self.endpoint_url = other.endpoint_url;
		}
		if other.use_logger.is_some() {
			self.use_logger = other.use_logger;
		}
		if other.release_stage.is_some() {
			self.release_stage = other.release_stage;
		}
		if other.notify_release_stages.is_some() {
			self.notify_release_stages = other.notify_release_stages;
		}
		if other.hostname.is_some() {
			self.hostname = other.hostname;
		}
		if other.app_type.is_some() {
			self.app_type = other.app_type;
		}
		if other.app_version.is_some() {
			self.app_version = other.app_version;
		}
		if other.in_project.is_some() {
			self.in_project = other.in_project;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.exception_filter.is_some() {
			self.exception_filter = other.exception_filter;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_overwrites_set_fields() {
		let mut base = ReportConfigLayer {
			release_stage: Some("staging".to_string()),
			hostname: Some("web-01".to_string()),
			..Default::default()
		};
		base.merge(ReportConfigLayer {
			release_stage: Some("production".to_string()),
			..Default::default()
		});

		assert_eq!(base.release_stage.as_deref(), Some("production"));
		assert_eq!(base.hostname.as_deref(), Some("web-01"));
	}

	#[test]
	fn merge_keeps_filter_when_overlay_has_none() {
		let mut base = ReportConfigLayer {
			exception_filter: Some(SharedFilter::new(|_: &Exception, _: &Stacktrace| false)),
			..Default::default()
		};
		base.merge(ReportConfigLayer::default());
		assert!(base.exception_filter.is_some());
	}

	#[test]
	fn deserializes_csv_stages_from_toml() {
		let layer: ReportConfigLayer = toml::from_str(
			r#"
			api_key = "abc123"
			release_stage = "staging"
			notify_release_stages = "production,staging"
			"#,
		)
		.unwrap();

		assert_eq!(layer.api_key.unwrap().expose(), "abc123");
		assert_eq!(
			layer.notify_release_stages,
			Some(ReleaseStages::from_iter(["production", "staging"]))
		);
	}

	#[test]
	fn deserialize_empty() {
		let layer: ReportConfigLayer = toml::from_str("").unwrap();
		assert!(layer.api_key.is_none());
		assert!(layer.notify_release_stages.is_none());
	}
}
