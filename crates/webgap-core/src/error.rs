// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for webgap.

use thiserror::Error;

use crate::types::CallId;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Executor results --
    /// The native executor answered a watch or clearWatch command with
    /// something other than the `"0"` marker. The literal code is kept.
    #[error("native executor reported error: {code}")]
    Executor { code: String },

    // -- Deferred calls --
    #[error("native call failed: {0}")]
    CallFailed(serde_json::Value),

    #[error("call {0} was dropped before it was resolved")]
    CallAbandoned(CallId),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl BridgeError {
    /// Build an [`BridgeError::Executor`] from the literal result string.
    pub fn executor(code: impl Into<String>) -> Self {
        Self::Executor { code: code.into() }
    }

    /// The raw executor code, if this error came from the native side.
    pub fn executor_code(&self) -> Option<&str> {
        match self {
            Self::Executor { code } => Some(code),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
