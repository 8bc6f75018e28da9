// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inbound half of the bridge: match native results to parked callbacks.
//
// One-shot calls are evicted before their callback runs, so a callback that
// dispatches again (or a duplicate resolution) never sees its own entry.
// Watches stay registered across resolutions. Unknown ids are ignored with a
// diagnostic; the return value tells the host whether anything matched.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error, trace, warn};
use webgap_core::types::{Payload, WatchId};

use crate::dispatcher::Dispatcher;

impl<E> Dispatcher<E> {
    /// Deliver a successful result for a one-shot call.
    pub fn resolve_success(&self, call_id: &str, payload: Payload) -> bool {
        let pending = self.calls().remove(call_id);
        match pending {
            Some(pending) => {
                trace!(call_id, "resolving call with success");
                if let Some(callback) = pending.on_success {
                    isolate("success", call_id, || callback(payload));
                }
                true
            }
            None => {
                self.stale("call", call_id);
                false
            }
        }
    }

    /// Deliver a failure for a one-shot call.
    pub fn resolve_failure(&self, call_id: &str, payload: Payload) -> bool {
        let pending = self.calls().remove(call_id);
        match pending {
            Some(pending) => {
                trace!(call_id, "resolving call with failure");
                if let Some(callback) = pending.on_failure {
                    isolate("failure", call_id, || callback(payload));
                }
                true
            }
            None => {
                self.stale("call", call_id);
                false
            }
        }
    }

    /// Deliver one event to a watch. The watch stays registered.
    pub fn resolve_watch(&self, watch_id: WatchId, payload: Payload) -> bool {
        let callback = self.watches().get(&watch_id).map(|w| w.on_success.clone());
        self.fire_watch(watch_id, callback, "watch success", payload)
    }

    /// Deliver an error event to a watch. The watch stays registered.
    pub fn resolve_watch_failure(&self, watch_id: WatchId, payload: Payload) -> bool {
        let callback = self.watches().get(&watch_id).map(|w| w.on_failure.clone());
        self.fire_watch(watch_id, callback, "watch failure", payload)
    }

    fn fire_watch(
        &self,
        watch_id: WatchId,
        callback: Option<Option<crate::dispatcher::WatchCallback>>,
        path: &'static str,
        payload: Payload,
    ) -> bool {
        match callback {
            Some(callback) => {
                if let Some(callback) = callback {
                    isolate(path, &watch_id.to_string(), || callback(payload));
                }
                true
            }
            None => {
                self.stale("watch", &watch_id.to_string());
                false
            }
        }
    }

    fn stale(&self, table: &'static str, id: &str) {
        if self.warn_on_stale {
            warn!(table, id, "resolution for unknown or already-resolved id ignored");
        } else {
            debug!(table, id, "resolution for unknown or already-resolved id ignored");
        }
    }
}

/// Run a user callback, logging instead of unwinding into the host.
fn isolate(path: &'static str, id: &str, f: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(path, id, panic = message, "bridge callback panicked");
    }
}
