// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Awaitable calls on top of the callback protocol.
//
// A deferred call is an ordinary call whose two callbacks feed a single
// `tokio::sync::oneshot` sender, so async hosts can `.await` the resolution
// instead of passing closures.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::oneshot;
use webgap_core::error::{BridgeError, Result};
use webgap_core::types::{CallId, Payload, Resolution};

use crate::dispatcher::Dispatcher;
use crate::traits::Executor;

/// Handle for an in-flight call.
#[derive(Debug)]
pub struct Deferred {
    call_id: CallId,
    immediate: String,
    rx: oneshot::Receiver<Resolution>,
}

impl Deferred {
    pub fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// What the executor returned at dispatch time.
    pub fn immediate(&self) -> &str {
        &self.immediate
    }

    /// Wait for the native side to resolve the call.
    ///
    /// Fails with [`BridgeError::CallFailed`] on the failure path and with
    /// [`BridgeError::CallAbandoned`] if the pending entry was dropped
    /// without a resolution.
    pub async fn resolved(self) -> Result<Payload> {
        match self.rx.await {
            Ok(resolution) => resolution.into_result().map_err(BridgeError::CallFailed),
            Err(_) => Err(BridgeError::CallAbandoned(self.call_id)),
        }
    }
}

impl<E: Executor> Dispatcher<E> {
    /// Dispatch a call and get a future for its resolution.
    pub fn call_deferred<A: Serialize + ?Sized>(
        &self,
        domain: &str,
        action: &str,
        args: &A,
    ) -> Result<Deferred> {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let fail_tx = Arc::clone(&tx);

        let (call_id, immediate) = self.dispatch(
            Some(Box::new(move |payload| send(&tx, Resolution::Success(payload)))),
            Some(Box::new(move |payload| send(&fail_tx, Resolution::Failure(payload)))),
            domain,
            action,
            args,
        )?;
        Ok(Deferred {
            call_id,
            immediate,
            rx,
        })
    }
}

fn send(slot: &Mutex<Option<oneshot::Sender<Resolution>>>, resolution: Resolution) {
    let tx = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = tx {
        // The receiver may already be gone if the caller stopped waiting.
        let _ = tx.send(resolution);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::recording::RecordingExecutor;

    use super::*;

    #[tokio::test]
    async fn success_resolves_the_future() {
        let d = Dispatcher::new(RecordingExecutor::new());
        d.executor().reply_exec("pending");
        let deferred = d.call_deferred("Device", "getInfo", &[(); 0]).expect("dispatch");
        assert_eq!(deferred.immediate(), "pending");

        let id = deferred.call_id().clone();
        assert!(d.resolve_success(id.as_str(), json!({"model": "x"})));
        assert_eq!(deferred.resolved().await.expect("resolved"), json!({"model": "x"}));
    }

    #[tokio::test]
    async fn failure_surfaces_as_call_failed() {
        let d = Dispatcher::new(RecordingExecutor::new());
        let deferred = d.call_deferred("Device", "getInfo", &[(); 0]).expect("dispatch");
        d.resolve_failure(deferred.call_id().as_str(), json!("denied"));
        match deferred.resolved().await {
            Err(BridgeError::CallFailed(payload)) => assert_eq!(payload, json!("denied")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cleared_call_is_abandoned() {
        let d = Dispatcher::new(RecordingExecutor::new());
        let deferred = d.call_deferred("App", "loadUrl", &["http://x"]).expect("dispatch");
        assert!(d.clear_call(deferred.call_id().as_str()));
        assert!(matches!(deferred.resolved().await, Err(BridgeError::CallAbandoned(_))));
    }

    #[tokio::test]
    async fn resolution_from_another_task() {
        let d = Arc::new(Dispatcher::new(RecordingExecutor::new()));
        let deferred = d.call_deferred("Net", "probe", &[(); 0]).expect("dispatch");
        let id = deferred.call_id().clone();
        let resolver = Arc::clone(&d);
        tokio::spawn(async move {
            resolver.resolve_success(id.as_str(), json!(7));
        });
        assert_eq!(deferred.resolved().await.expect("resolved"), json!(7));
    }
}
