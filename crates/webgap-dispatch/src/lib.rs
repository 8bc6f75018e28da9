// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! webgap-dispatch: command dispatch core.
//!
//! Every native call leaves through a `Dispatcher`, which tags it with a
//! correlation id, parks the caller's callbacks, and hands the command to an
//! `Executor`. Results come back later through the resolver methods.
//! One-shot calls are evicted on resolution; watches stay until cleared.

pub mod deferred;
pub mod dispatcher;
pub mod recording;
pub mod resolver;
pub mod traits;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use deferred::Deferred;
pub use dispatcher::{Dispatcher, OnceCallback, WatchCallback};
pub use recording::{Command, RecordingExecutor};
pub use traits::Executor;

/// Retrieves the executor implementation for the target operating system.
///
/// RETURNS: A boxed trait object that hides whether commands travel over
/// JNI or hit the desktop stub.
pub fn platform_executor() -> Box<dyn traits::Executor> {
    #[cfg(target_os = "android")]
    {
        // Android: static calls into the host's command manager class via `jni-rs`.
        Box::new(android::AndroidExecutor::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: every command reports `PlatformUnavailable`.
        Box::new(stub::StubExecutor)
    }
}
