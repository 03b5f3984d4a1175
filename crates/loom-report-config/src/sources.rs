// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML file, environment and explicit overrides.

use std::collections::HashMap;
use std::path::PathBuf;

use loom_report_core::ReleaseStages;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ReportConfigLayer;
use crate::secret::ApiKey;

pub const ENV_API_KEY: &str = "LOOM_REPORT_API_KEY";
pub const ENV_ENDPOINT_URL: &str = "LOOM_REPORT_ENDPOINT_URL";
pub const ENV_USE_LOGGER: &str = "LOOM_REPORT_USE_LOGGER";
pub const ENV_RELEASE_STAGE: &str = "LOOM_REPORT_RELEASE_STAGE";
pub const ENV_NOTIFY_RELEASE_STAGES: &str = "LOOM_REPORT_NOTIFY_RELEASE_STAGES";
pub const ENV_HOSTNAME: &str = "LOOM_REPORT_HOSTNAME";
pub const ENV_APP_TYPE: &str = "LOOM_REPORT_APP_TYPE";
pub const ENV_APP_VERSION: &str = "LOOM_REPORT_APP_VERSION";
pub const ENV_IN_PROJECT: &str = "LOOM_REPORT_IN_PROJECT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "LOOM_REPORT_REQUEST_TIMEOUT_SECS";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
	Explicit = 90,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ReportConfigLayer, ConfigError>;
}

/// Built-in defaults source. Defaults themselves are applied when the merged
/// layer is finalized, so this layer is empty.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ReportConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ReportConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ReportConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ReportConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ReportConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `LOOM_REPORT_<FIELD>`. Empty values count as unset. The API
/// key may also be provided as a file path via `LOOM_REPORT_API_KEY_FILE`,
/// which takes precedence over `LOOM_REPORT_API_KEY`.
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn process() -> Self {
		Self { vars: None }
	}

	/// Reads from the given variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn var_bool(&self, name: &str) -> Option<bool> {
		self
			.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn var_u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u64 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn api_key(&self) -> Result<Option<ApiKey>, ConfigError> {
		let file_var = format!("{ENV_API_KEY}_FILE");

		let file_path = match &self.vars {
			Some(vars) => vars.get(&file_var).cloned(),
			None => std::env::var(&file_var).ok(),
		};

		if let Some(path_str) = file_path {
			if path_str.is_empty() {
				return Err(ConfigError::EmptySecretPath { var: file_var });
			}

			let path = PathBuf::from(&path_str);
			let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::SecretFile {
				path: path.clone(),
				source: e,
			})?;

			let key = content.strip_suffix('\n').unwrap_or(&content);
			return Ok(Some(ApiKey::new(key)));
		}

		Ok(self.var(ENV_API_KEY).map(ApiKey::new))
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ReportConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ReportConfigLayer {
			api_key: self.api_key()?,
			endpoint_url: self.var(ENV_ENDPOINT_URL),
			use_logger: self.var_bool(ENV_USE_LOGGER),
			release_stage: self.var(ENV_RELEASE_STAGE),
			notify_release_stages: self
				.var(ENV_NOTIFY_RELEASE_STAGES)
				.map(|s| ReleaseStages::parse_csv(&s)),
			hostname: self.var(ENV_HOSTNAME),
			app_type: self.var(ENV_APP_TYPE),
			app_version: self.var(ENV_APP_VERSION),
			in_project: self.var(ENV_IN_PROJECT),
			request_timeout_secs: self.var_u64(ENV_REQUEST_TIMEOUT_SECS)?,
			exception_filter: None,
		})
	}
}

/// Values supplied explicitly by the embedding application.
pub struct OverridesSource {
	layer: ReportConfigLayer,
}

impl OverridesSource {
	pub fn new(layer: ReportConfigLayer) -> Self {
		Self { layer }
	}
}

impl ConfigSource for OverridesSource {
	fn name(&self) -> &'static str {
		"overrides"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Explicit
	}

	fn load(&self) -> Result<ReportConfigLayer, ConfigError> {
		debug!("loading explicit overrides");
		Ok(self.layer.clone())
	}
}
