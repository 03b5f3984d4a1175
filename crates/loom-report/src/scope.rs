// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Thread-local marker for code running on behalf of the reporter.
//!
//! Panics and error logs raised while the marker is set come from the
//! reporting pipeline itself (a faulty filter, transport or payload builder)
//! and must not be reported again.

use std::cell::Cell;
use std::future::Future;
use std::pin::pin;

use futures::future::poll_fn;

thread_local! {
	static SUPPRESSED: Cell<bool> = const { Cell::new(false) };
}

struct ScopeGuard {
	previous: bool,
}

impl ScopeGuard {
	fn enter() -> Self {
		Self {
			previous: SUPPRESSED.with(|s| s.replace(true)),
		}
	}
}

impl Drop for ScopeGuard {
	fn drop(&mut self) {
		SUPPRESSED.with(|s| s.set(self.previous));
	}
}

/// True while the current thread is running reporter code.
pub(crate) fn is_suppressed() -> bool {
	SUPPRESSED.with(Cell::get)
}

/// Runs `f` with the marker set.
pub(crate) fn suppressing<R>(f: impl FnOnce() -> R) -> R {
	let _guard = ScopeGuard::enter();
	f()
}

/// Sets the marker around every poll of `fut`, whichever thread polls it.
pub(crate) async fn suppressing_async<F: Future>(fut: F) -> F::Output {
	let mut fut = pin!(fut);
	poll_fn(move |cx| {
		let _guard = ScopeGuard::enter();
		fut.as_mut().poll(cx)
	})
	.await
}
