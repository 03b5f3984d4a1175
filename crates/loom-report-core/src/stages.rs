// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Release stage sets.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The set of release stages for which reporting is active.
///
/// Accepts either a list or a comma-separated string (`"production,staging"`)
/// wherever it is deserialized or parsed. Entries are trimmed and empty
/// entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseStages(BTreeSet<String>);

impl ReleaseStages {
	/// The built-in default: only `production` reports.
	pub fn production() -> Self {
		Self::from_iter(["production"])
	}

	/// Parses a comma-separated list.
	pub fn parse_csv(s: &str) -> Self {
		Self::from_iter(s.split(','))
	}

	pub fn contains(&self, stage: &str) -> bool {
		self.0.contains(stage)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl<S: AsRef<str>> FromIterator<S> for ReleaseStages {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(
			iter
				.into_iter()
				.map(|s| s.as_ref().trim().to_string())
				.filter(|s| !s.is_empty())
				.collect(),
		)
	}
}

impl FromStr for ReleaseStages {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::parse_csv(s))
	}
}

impl fmt::Display for ReleaseStages {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let joined: Vec<&str> = self.iter().collect();
		f.write_str(&joined.join(","))
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StagesRepr {
	Csv(String),
	List(Vec<String>),
}

impl<'de> Deserialize<'de> for ReleaseStages {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(match StagesRepr::deserialize(deserializer)? {
			StagesRepr::Csv(s) => Self::parse_csv(&s),
			StagesRepr::List(list) => Self::from_iter(list),
		})
	}
}
