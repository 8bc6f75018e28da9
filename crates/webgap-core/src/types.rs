// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the webgap bridge.

use serde::{Deserialize, Serialize};

/// Result payload delivered by the native side.
pub type Payload = serde_json::Value;

/// Marker the executor returns when a watch or clearWatch command succeeded.
pub const NO_ERROR: &str = "0";

/// Event name that is redirected to the device-ready channel.
pub const DEVICE_READY_EVENT: &str = "deviceready";

/// Event name that makes the native side route the hardware back key to script.
pub const BACK_BUTTON_EVENT: &str = "backbutton";

/// Action sent through the ordinary call path to cancel a watch.
pub const CLEAR_WATCH_ACTION: &str = "clearWatch";

/// Correlation id for a one-shot call: the domain followed by a
/// dispatcher-wide counter (e.g. `App7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn new(domain: &str, sequence: u64) -> Self {
        Self(format!("{domain}{sequence}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for CallId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl std::borrow::Borrow<str> for CallId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a persistent watch. Numbered independently of calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchId(pub u64);

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned by a channel subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which terminal path the native side took for a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "camelCase")]
pub enum Resolution {
    Success(Payload),
    Failure(Payload),
}

impl Resolution {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> std::result::Result<Payload, Payload> {
        match self {
            Self::Success(p) => Ok(p),
            Self::Failure(p) => Err(p),
        }
    }
}

/// ASCII case-insensitive comparison used for reserved event names.
pub fn is_event(name: &str, reserved: &str) -> bool {
    name.eq_ignore_ascii_case(reserved)
}
