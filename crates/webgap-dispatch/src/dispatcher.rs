// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outbound half of the bridge: correlation ids, pending tables, executor hand-off.
//
// A `Dispatcher` owns the call table, the watch table and their counters.
// Nothing here ever waits for a result; completion arrives later through the
// resolver methods in `resolver.rs`. No lock is held while the executor runs,
// so an executor may resolve a call before `call` returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use webgap_core::BridgeConfig;
use webgap_core::error::{BridgeError, Result};
use webgap_core::types::{CLEAR_WATCH_ACTION, CallId, NO_ERROR, Payload, WatchId};

use crate::traits::Executor;

/// Callback for a one-shot call. Runs at most once.
pub type OnceCallback = Box<dyn FnOnce(Payload) + Send>;

/// Callback for a watch. Runs once per native event.
pub type WatchCallback = Arc<dyn Fn(Payload) + Send + Sync>;

pub(crate) struct PendingCall {
    pub(crate) on_success: Option<OnceCallback>,
    pub(crate) on_failure: Option<OnceCallback>,
}

pub(crate) struct PendingWatch {
    pub(crate) on_success: Option<WatchCallback>,
    pub(crate) on_failure: Option<WatchCallback>,
}

/// Command dispatcher and callback store.
pub struct Dispatcher<E> {
    executor: E,
    calls: Mutex<HashMap<CallId, PendingCall>>,
    watches: Mutex<HashMap<WatchId, PendingWatch>>,
    next_call: AtomicU64,
    next_watch: AtomicU64,
    pub(crate) warn_on_stale: bool,
}

impl<E> Dispatcher<E> {
    pub(crate) fn calls(&self) -> MutexGuard<'_, HashMap<CallId, PendingCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn watches(&self) -> MutexGuard<'_, HashMap<WatchId, PendingWatch>> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Executor> Dispatcher<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            calls: Mutex::new(HashMap::new()),
            watches: Mutex::new(HashMap::new()),
            next_call: AtomicU64::new(0),
            next_watch: AtomicU64::new(0),
            warn_on_stale: true,
        }
    }

    pub fn with_config(executor: E, config: &BridgeConfig) -> Self {
        let mut dispatcher = Self::new(executor);
        dispatcher.warn_on_stale = config.warn_on_stale_resolution;
        dispatcher
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Dispatch an asynchronous call.
    ///
    /// The callbacks are parked under a fresh `domain`+counter id and the
    /// executor's immediate reply is returned unchanged. Exactly one of the
    /// callbacks runs later, when the native side resolves the id.
    #[instrument(skip(self, on_success, on_failure, args))]
    pub fn call<A: Serialize + ?Sized>(
        &self,
        on_success: Option<OnceCallback>,
        on_failure: Option<OnceCallback>,
        domain: &str,
        action: &str,
        args: &A,
    ) -> Result<String> {
        self.dispatch(on_success, on_failure, domain, action, args)
            .map(|(_, reply)| reply)
    }

    /// Dispatch and also return the correlation id that was assigned.
    pub(crate) fn dispatch<A: Serialize + ?Sized>(
        &self,
        on_success: Option<OnceCallback>,
        on_failure: Option<OnceCallback>,
        domain: &str,
        action: &str,
        args: &A,
    ) -> Result<(CallId, String)> {
        let args_json = serde_json::to_string(args)?;
        let id = {
            let mut calls = self.calls();
            // "A1"+2 and "A"+12 both read "A12"; skip any id still pending.
            let id = loop {
                let id = CallId::new(domain, self.next_call.fetch_add(1, Ordering::SeqCst));
                if !calls.contains_key(&id) {
                    break id;
                }
                debug!(call_id = %id, "correlation id already pending; skipping");
            };
            calls.insert(
                id.clone(),
                PendingCall {
                    on_success,
                    on_failure,
                },
            );
            id
        };
        debug!(call_id = %id, "dispatching call");

        match self.executor.exec(domain, action, Some(&id), &args_json) {
            Ok(reply) => Ok((id, reply)),
            Err(e) => {
                // The command never reached the native side; nothing will resolve it.
                self.calls().remove(&id);
                warn!(call_id = %id, error = %e, "executor rejected call");
                Err(e)
            }
        }
    }

    /// Dispatch a command whose result comes back synchronously.
    #[instrument(skip(self, args))]
    pub fn call_sync<A: Serialize + ?Sized>(
        &self,
        domain: &str,
        action: &str,
        args: &A,
    ) -> Result<String> {
        let args_json = serde_json::to_string(args)?;
        self.executor.exec(domain, action, None, &args_json)
    }

    /// Start a persistent watch. The success callback runs once per native
    /// event until [`Dispatcher::clear_watch`] is called.
    ///
    /// Any executor reply other than `"0"` is returned as
    /// [`BridgeError::Executor`] and the watch is not kept.
    #[instrument(skip(self, on_success, on_failure, args))]
    pub fn watch<A: Serialize + ?Sized>(
        &self,
        on_success: Option<WatchCallback>,
        on_failure: Option<WatchCallback>,
        domain: &str,
        action: &str,
        args: &A,
    ) -> Result<WatchId> {
        let args_json = serde_json::to_string(args)?;
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::SeqCst));
        self.watches().insert(
            id,
            PendingWatch {
                on_success,
                on_failure,
            },
        );

        let outcome = self
            .executor
            .exec_watch(domain, action, id, &args_json)
            .and_then(|code| {
                if code == NO_ERROR {
                    Ok(())
                } else {
                    Err(BridgeError::executor(code))
                }
            });
        match outcome {
            Ok(()) => {
                info!(watch_id = %id, "watch started");
                Ok(id)
            }
            Err(e) => {
                self.watches().remove(&id);
                warn!(watch_id = %id, error = %e, "watch rejected");
                Err(e)
            }
        }
    }

    /// Cancel a watch: forget its callbacks, then tell the native side.
    #[instrument(skip(self))]
    pub fn clear_watch(&self, domain: &str, watch_id: WatchId) -> Result<()> {
        if self.watches().remove(&watch_id).is_none() {
            debug!(watch_id = %watch_id, "clearing a watch that is not registered");
        }
        let args_json = serde_json::to_string(&serde_json::json!({ "watchId": watch_id }))?;
        let code = self
            .executor
            .exec(domain, CLEAR_WATCH_ACTION, None, &args_json)?;
        if code != NO_ERROR {
            return Err(BridgeError::executor(code));
        }
        Ok(())
    }

    /// Drop a pending call without running either callback.
    pub fn clear_call(&self, call_id: &str) -> bool {
        self.calls().remove(call_id).is_some()
    }

    pub fn pending_calls(&self) -> usize {
        self.calls().len()
    }

    pub fn pending_watches(&self) -> usize {
        self.watches().len()
    }

    pub fn is_pending(&self, call_id: &str) -> bool {
        self.calls().contains_key(call_id)
    }

    pub fn is_watching(&self, watch_id: WatchId) -> bool {
        self.watches().contains_key(&watch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingExecutor;

    fn dispatcher() -> Dispatcher<RecordingExecutor> {
        Dispatcher::new(RecordingExecutor::new())
    }

    #[test]
    fn call_ids_share_one_counter_across_domains() {
        let d = dispatcher();
        d.call(None, None, "App", "clearCache", &[(); 0]).expect("call");
        d.call(None, None, "Geo", "get", &[(); 0]).expect("call");
        d.call(None, None, "App", "clearHistory", &[(); 0]).expect("call");

        let ids: Vec<String> = d
            .executor()
            .commands()
            .into_iter()
            .filter_map(|c| c.call_id.map(|id| id.to_string()))
            .collect();
        assert_eq!(ids, ["App0", "Geo1", "App2"]);
        assert_eq!(d.pending_calls(), 3);
    }

    #[test]
    fn call_serializes_args_and_returns_executor_reply() {
        let d = dispatcher();
        d.executor().reply_exec("queued");
        let reply = d
            .call(None, None, "App", "loadUrl", &("http://x", serde_json::json!({"wait": 5})))
            .expect("call");
        assert_eq!(reply, "queued");
        let cmd = d.executor().last().expect("command");
        assert_eq!(cmd.action, "loadUrl");
        assert_eq!(cmd.args, serde_json::json!(["http://x", {"wait": 5}]));
    }

    #[test]
    fn transport_failure_does_not_leave_a_pending_call() {
        let d = dispatcher();
        d.executor().fail_exec("no vm");
        assert!(d.call(None, None, "App", "exitApp", &[(); 0]).is_err());
        assert_eq!(d.pending_calls(), 0);
    }

    #[test]
    fn call_sync_stores_nothing() {
        let d = dispatcher();
        d.executor().reply_exec("42");
        assert_eq!(d.call_sync("Device", "getUuid", &[(); 0]).expect("sync"), "42");
        assert_eq!(d.pending_calls(), 0);
        assert_eq!(d.executor().last().expect("command").call_id, None);
    }

    #[test]
    fn watch_ids_are_numbered_separately() {
        let d = dispatcher();
        d.call(None, None, "App", "clearCache", &[(); 0]).expect("call");
        let first = d.watch(None, None, "Accel", "watch", &[(); 0]).expect("watch");
        let second = d.watch(None, None, "Accel", "watch", &[(); 0]).expect("watch");
        assert_eq!((first, second), (WatchId(0), WatchId(1)));
        assert!(d.is_watching(first) && d.is_watching(second));
    }

    #[test]
    fn watch_error_code_is_raised_and_not_kept() {
        let d = dispatcher();
        d.executor().reply_watch("20");
        let err = d
            .watch(None, None, "Accel", "watch", &[(); 0])
            .expect_err("non-zero reply must fail");
        assert_eq!(err.executor_code(), Some("20"));
        assert_eq!(d.pending_watches(), 0);
    }

    #[test]
    fn clear_watch_removes_entry_and_notifies_native_side() {
        let d = dispatcher();
        let id = d.watch(None, None, "Accel", "watch", &[(); 0]).expect("watch");
        d.clear_watch("Accel", id).expect("clear");

        assert!(!d.is_watching(id));
        let cmd = d.executor().last().expect("command");
        assert_eq!(cmd.action, CLEAR_WATCH_ACTION);
        assert_eq!(cmd.call_id, None);
        assert_eq!(cmd.args, serde_json::json!({"watchId": 0}));
    }

    #[test]
    fn clear_watch_raises_on_error_code() {
        let d = dispatcher();
        let id = d.watch(None, None, "Accel", "watch", &[(); 0]).expect("watch");
        d.executor().reply_exec("3");
        let err = d.clear_watch("Accel", id).expect_err("non-zero reply must fail");
        assert_eq!(err.executor_code(), Some("3"));
        assert!(!d.is_watching(id));
    }

    #[test]
    fn clear_call_drops_callbacks() {
        let d = dispatcher();
        d.call(
            Some(Box::new(|_: Payload| panic!("must not run"))),
            None,
            "App",
            "loadUrl",
            &[(); 0],
        )
        .expect("call");
        assert!(d.clear_call("App0"));
        assert!(!d.resolve_success("App0", Payload::Null));
    }

    #[test]
    fn digit_suffixed_domain_never_shares_an_id() {
        let d = dispatcher();
        for _ in 0..2 {
            d.call(None, None, "Pad", "noop", &[(); 0]).expect("call");
        }
        let ran = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&ran);
        d.call(
            Some(Box::new(move |_: Payload| first.lock().expect("lock").push("A1"))),
            None,
            "A1",
            "get",
            &[(); 0],
        )
        .expect("call");
        for _ in 3..12 {
            d.call(None, None, "Pad", "noop", &[(); 0]).expect("call");
        }
        let second = Arc::clone(&ran);
        d.call(
            Some(Box::new(move |_: Payload| second.lock().expect("lock").push("A"))),
            None,
            "A",
            "get",
            &[(); 0],
        )
        .expect("call");

        let ids: Vec<String> = d
            .executor()
            .commands()
            .into_iter()
            .filter(|c| c.action == "get")
            .filter_map(|c| c.call_id.map(|id| id.to_string()))
            .collect();
        assert_eq!(ids, ["A12", "A13"]);

        assert!(d.resolve_success("A12", Payload::Null));
        assert!(d.resolve_success("A13", Payload::Null));
        assert_eq!(*ran.lock().expect("lock"), ["A1", "A"]);
    }

    #[test]
    fn stale_warning_level_follows_config() {
        let config = BridgeConfig {
            warn_on_stale_resolution: false,
            ..Default::default()
        };
        let d = Dispatcher::with_config(RecordingExecutor::new(), &config);
        assert!(!d.warn_on_stale);
    }
}
