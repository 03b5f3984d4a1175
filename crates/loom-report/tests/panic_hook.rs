// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod common;

use std::time::Duration;

use common::{config, SpyTransport};
use loom_report::{Reporter, PANIC_CLASS};

#[tokio::test]
async fn panics_are_reported_through_the_hook() {
	let transport = SpyTransport::responding(Ok(200));
	let reporter = Reporter::builder()
		.config(config())
		.transport_arc(transport.clone())
		.build()
		.unwrap();

	assert!(reporter.install_panic_hook());

	let result = std::thread::Builder::new()
		.name("worker-7".to_string())
		.spawn(|| panic!("worker crashed"))
		.unwrap()
		.join();
	assert!(result.is_err());

	assert!(reporter.flush(Duration::from_secs(10)).await);

	// Restore the default hook.
	let _ = std::panic::take_hook();

	let bodies = transport.bodies();
	assert_eq!(bodies.len(), 1);
	let event = &bodies[0]["events"][0];
	assert_eq!(event["exceptions"][0]["errorClass"], PANIC_CLASS);
	assert_eq!(event["exceptions"][0]["message"], "worker crashed");
	assert_eq!(event["metaData"]["thread"]["name"], "worker-7");
	assert!(event["context"]
		.as_str()
		.unwrap()
		.contains("tests/panic_hook.rs"));
}
