// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub executor for desktop/CI builds where no native layer exists.
//
// Every command returns `PlatformUnavailable`; the real implementation
// lives in the `android` module.

use webgap_core::error::{BridgeError, Result};
use webgap_core::types::{CallId, WatchId};

use crate::traits::Executor;

/// No-op executor returned on non-mobile platforms.
pub struct StubExecutor;

impl Executor for StubExecutor {
    fn exec(
        &self,
        domain: &str,
        action: &str,
        _call_id: Option<&CallId>,
        _args_json: &str,
    ) -> Result<String> {
        tracing::warn!(domain, action, "Executor::exec called on stub executor");
        Err(BridgeError::PlatformUnavailable)
    }

    fn exec_watch(
        &self,
        domain: &str,
        action: &str,
        _watch_id: WatchId,
        _args_json: &str,
    ) -> Result<String> {
        tracing::warn!(domain, action, "Executor::exec_watch called on stub executor");
        Err(BridgeError::PlatformUnavailable)
    }
}
