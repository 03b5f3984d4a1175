// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use loom_report::{ApiKey, ReportConfig, Transport, TransportFailure};

/// Records every post and answers with a fixed result after an optional delay.
pub struct SpyTransport {
	calls: AtomicUsize,
	response: Result<u16, TransportFailure>,
	delay: Duration,
	bodies: Mutex<Vec<serde_json::Value>>,
}

impl SpyTransport {
	pub fn responding(response: Result<u16, TransportFailure>) -> Arc<Self> {
		Self::delayed(response, Duration::ZERO)
	}

	pub fn delayed(response: Result<u16, TransportFailure>, delay: Duration) -> Arc<Self> {
		Arc::new(Self {
			calls: AtomicUsize::new(0),
			response,
			delay,
			bodies: Mutex::new(Vec::new()),
		})
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn bodies(&self) -> Vec<serde_json::Value> {
		self.bodies.lock().unwrap().clone()
	}
}

#[async_trait::async_trait]
impl Transport for SpyTransport {
	async fn post(
		&self,
		_url: &str,
		body: Vec<u8>,
		_headers: &[(&str, &str)],
	) -> Result<u16, TransportFailure> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Ok(value) = serde_json::from_slice(&body) {
			self.bodies.lock().unwrap().push(value);
		}
		if !self.delay.is_zero() {
			tokio::time::sleep(self.delay).await;
		}
		self.response.clone()
	}
}

pub fn config() -> ReportConfig {
	ReportConfig {
		api_key: Some(ApiKey::new("c9d60ae4c7e70c4b6c4ebd3e8056d2b8")),
		endpoint_url: "http://collector.test".to_string(),
		..Default::default()
	}
}
