// SPDX-License-Identifier: MPL-2.0

//! Shared async runtime for the command-line front end.
//!
//! The library itself is runtime-agnostic; the binary drives every command
//! through this single multi-threaded runtime instead of building one per call.

use once_cell::sync::Lazy;
use std::future::Future;
use tokio::runtime::Runtime;

/// Two workers are plenty: the work is network and disk bound.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("rsl-async")
        .build()
        .expect("failed to create async runtime")
});

/// Execute a future on the shared runtime, blocking until completion.
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}
