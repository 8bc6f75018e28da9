// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Host-level bridge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Desktop hosts have no native layer. Registering for `deviceready`
    /// fires the device-ready channel directly instead of waiting.
    pub desktop_mode: bool,
    /// Log resolutions for unknown or already-resolved ids at warn level
    /// (debug otherwise).
    pub warn_on_stale_resolution: bool,
    /// Fallback tracing directive when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Defaults applied to every `App::load_url` call.
    pub load_url: LoadUrlOptions,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            desktop_mode: false,
            warn_on_stale_resolution: true,
            log_filter: "info".into(),
            load_url: LoadUrlOptions::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a JSON file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Persist configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            return Err(BridgeError::Config("log_filter must not be empty".into()));
        }
        match &self.load_url.loading_dialog {
            Some(dialog) if !dialog.contains(',') => {
                return Err(BridgeError::Config(format!(
                    "load_url.loading_dialog must be \"Title,Message\", got {dialog:?}"
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Properties handed to the native activity when loading a URL.
///
/// Serialized with the camelCase names the native side reads; unset fields
/// are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadUrlOptions {
    /// Milliseconds to wait before loading the URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
    /// Native loading dialog, formatted as `"Title,Message"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading_dialog: Option<String>,
    /// Hide the loading dialog when the page loads rather than on deviceready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_loading_dialog_on_page: Option<bool>,
    /// Load every link into the existing web view instead of a new browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_in_web_view: Option<bool>,
    /// Milliseconds before a load is reported as timed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_url_timeout_value: Option<u64>,
    /// Local URL to show if loading fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_url: Option<String>,
    /// Keep the app running in the background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_running: Option<bool>,
}

impl LoadUrlOptions {
    /// Fill every unset field from `defaults`.
    pub fn or(self, defaults: &LoadUrlOptions) -> Self {
        Self {
            wait: self.wait.or(defaults.wait),
            loading_dialog: self.loading_dialog.or_else(|| defaults.loading_dialog.clone()),
            hide_loading_dialog_on_page: self
                .hide_loading_dialog_on_page
                .or(defaults.hide_loading_dialog_on_page),
            load_in_web_view: self.load_in_web_view.or(defaults.load_in_web_view),
            load_url_timeout_value: self
                .load_url_timeout_value
                .or(defaults.load_url_timeout_value),
            error_url: self.error_url.or_else(|| defaults.error_url.clone()),
            keep_running: self.keep_running.or(defaults.keep_running),
        }
    }
}
