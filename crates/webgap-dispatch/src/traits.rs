// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contract between the dispatcher and the native command executor.
//
// The executor performs the platform action and later reports the outcome
// back through the dispatcher's resolver methods using the correlation id it
// was handed here.

use std::sync::Arc;

use webgap_core::error::Result;
use webgap_core::types::{CallId, WatchId};

/// Native side of the bridge.
///
/// `Err` is reserved for transport failures (the command never reached the
/// native side). Native-level outcomes travel in the returned string or
/// through a later resolution.
pub trait Executor: Send + Sync {
    /// Dispatch a one-shot (`call_id` set) or synchronous (`call_id` unset)
    /// command. For async calls the return value is platform-defined and may
    /// be empty; for sync calls it is the literal result.
    fn exec(&self, domain: &str, action: &str, call_id: Option<&CallId>, args_json: &str)
    -> Result<String>;

    /// Start a persistent watch. Returns `"0"` on success; anything else is
    /// an error code.
    fn exec_watch(&self, domain: &str, action: &str, watch_id: WatchId, args_json: &str)
    -> Result<String>;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn exec(
        &self,
        domain: &str,
        action: &str,
        call_id: Option<&CallId>,
        args_json: &str,
    ) -> Result<String> {
        (**self).exec(domain, action, call_id, args_json)
    }

    fn exec_watch(
        &self,
        domain: &str,
        action: &str,
        watch_id: WatchId,
        args_json: &str,
    ) -> Result<String> {
        (**self).exec_watch(domain, action, watch_id, args_json)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn exec(
        &self,
        domain: &str,
        action: &str,
        call_id: Option<&CallId>,
        args_json: &str,
    ) -> Result<String> {
        (**self).exec(domain, action, call_id, args_json)
    }

    fn exec_watch(
        &self,
        domain: &str,
        action: &str,
        watch_id: WatchId,
        args_json: &str,
    ) -> Result<String> {
        (**self).exec_watch(domain, action, watch_id, args_json)
    }
}
