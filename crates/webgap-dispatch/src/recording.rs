// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process executor that records commands and answers from a script.
//
// Used by tests and by desktop hosts that drive resolutions themselves.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;
use webgap_core::error::{BridgeError, Result};
use webgap_core::types::{CallId, NO_ERROR, Payload, WatchId};

use crate::traits::Executor;

/// One command as the executor received it.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub domain: String,
    pub action: String,
    pub call_id: Option<CallId>,
    pub watch_id: Option<WatchId>,
    /// Decoded arguments (the raw string if it was not valid JSON).
    pub args: Payload,
}

/// Executor that records every command. Replies come from per-entry-point
/// queues and default to `"0"` once a queue runs dry.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<Command>>,
    exec_replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    watch_replies: Mutex<VecDeque<std::result::Result<String, String>>>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply for the next `exec`.
    pub fn reply_exec(&self, reply: impl Into<String>) -> &Self {
        guard(&self.exec_replies).push_back(Ok(reply.into()));
        self
    }

    /// Queue the reply for the next `exec_watch`.
    pub fn reply_watch(&self, reply: impl Into<String>) -> &Self {
        guard(&self.watch_replies).push_back(Ok(reply.into()));
        self
    }

    /// Make the next `exec` fail as if the native side were unreachable.
    pub fn fail_exec(&self, reason: impl Into<String>) -> &Self {
        guard(&self.exec_replies).push_back(Err(reason.into()));
        self
    }

    /// Make the next `exec_watch` fail as if the native side were unreachable.
    pub fn fail_watch(&self, reason: impl Into<String>) -> &Self {
        guard(&self.watch_replies).push_back(Err(reason.into()));
        self
    }

    pub fn commands(&self) -> Vec<Command> {
        guard(&self.commands).clone()
    }

    pub fn last(&self) -> Option<Command> {
        guard(&self.commands).last().cloned()
    }

    pub fn clear(&self) {
        guard(&self.commands).clear();
    }

    fn record(
        &self,
        domain: &str,
        action: &str,
        call_id: Option<&CallId>,
        watch_id: Option<WatchId>,
        args_json: &str,
    ) {
        let args = serde_json::from_str(args_json)
            .unwrap_or_else(|_| Payload::String(args_json.to_owned()));
        trace!(domain, action, ?call_id, ?watch_id, "recorded command");
        guard(&self.commands).push(Command {
            domain: domain.to_owned(),
            action: action.to_owned(),
            call_id: call_id.cloned(),
            watch_id,
            args,
        });
    }
}

fn next_reply(queue: &Mutex<VecDeque<std::result::Result<String, String>>>) -> Result<String> {
    match guard(queue).pop_front() {
        Some(Ok(reply)) => Ok(reply),
        Some(Err(reason)) => Err(BridgeError::Bridge(reason)),
        None => Ok(NO_ERROR.to_owned()),
    }
}

impl Executor for RecordingExecutor {
    fn exec(
        &self,
        domain: &str,
        action: &str,
        call_id: Option<&CallId>,
        args_json: &str,
    ) -> Result<String> {
        self.record(domain, action, call_id, None, args_json);
        next_reply(&self.exec_replies)
    }

    fn exec_watch(
        &self,
        domain: &str,
        action: &str,
        watch_id: WatchId,
        args_json: &str,
    ) -> Result<String> {
        self.record(domain, action, None, Some(watch_id), args_json);
        next_reply(&self.watch_replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_commands_with_decoded_args() {
        let executor = RecordingExecutor::new();
        let id = CallId::new("App", 0);
        executor
            .exec("App", "loadUrl", Some(&id), r#"["http://x", {"wait": 1}]"#)
            .expect("exec");

        let cmd = executor.last().expect("one command");
        assert_eq!(cmd.domain, "App");
        assert_eq!(cmd.call_id, Some(id));
        assert_eq!(cmd.args, serde_json::json!(["http://x", {"wait": 1}]));
    }

    #[test]
    fn scripted_replies_are_consumed_in_order() {
        let executor = RecordingExecutor::new();
        executor.reply_exec("first").reply_exec("second");
        assert_eq!(executor.exec("D", "a", None, "[]").expect("exec"), "first");
        assert_eq!(executor.exec("D", "a", None, "[]").expect("exec"), "second");
        assert_eq!(executor.exec("D", "a", None, "[]").expect("exec"), NO_ERROR);
    }

    #[test]
    fn transport_failures_surface_as_bridge_errors() {
        let executor = RecordingExecutor::new();
        executor.fail_watch("vm detached");
        assert!(matches!(
            executor.exec_watch("D", "w", WatchId(0), "{}"),
            Err(BridgeError::Bridge(reason)) if reason == "vm detached"
        ));
    }
}
