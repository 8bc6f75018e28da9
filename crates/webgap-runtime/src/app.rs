// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// App lifecycle, URL loading, and history control.
//
// Each method is a direct pass-through to the native "App" domain with no
// callbacks; the native side acts on its own schedule.

use std::sync::Arc;

use serde::Serialize;
use webgap_core::config::LoadUrlOptions;
use webgap_core::error::Result;
use webgap_dispatch::{Dispatcher, Executor};

/// Native domain that owns these actions.
pub const DOMAIN: &str = "App";

const NO_ARGS: [(); 0] = [];

/// Handle on the native "App" domain.
pub struct App<E> {
    dispatcher: Arc<Dispatcher<E>>,
    defaults: LoadUrlOptions,
}

impl<E: Executor> App<E> {
    pub fn new(dispatcher: Arc<Dispatcher<E>>, defaults: LoadUrlOptions) -> Self {
        Self {
            dispatcher,
            defaults,
        }
    }

    /// Clear the resource cache.
    pub fn clear_cache(&self) -> Result<()> {
        self.send("clearCache", &NO_ARGS)
    }

    /// Load `url` into the web view. Unset options fall back to the
    /// configured defaults.
    pub fn load_url(&self, url: &str, options: LoadUrlOptions) -> Result<()> {
        let options = options.or(&self.defaults);
        self.send("loadUrl", &(url, options))
    }

    /// Cancel a `load_url` that is still waiting.
    pub fn cancel_load_url(&self) -> Result<()> {
        self.send("cancelLoadUrl", &NO_ARGS)
    }

    /// Clear web history; BACK then exits the app instead of going back.
    pub fn clear_history(&self) -> Result<()> {
        self.send("clearHistory", &NO_ARGS)
    }

    /// Route the hardware back button to script (`true`) or restore the
    /// platform default (`false`).
    pub fn override_backbutton(&self, enabled: bool) -> Result<()> {
        self.send("overrideBackbutton", &[enabled])
    }

    /// Exit and terminate the application.
    pub fn exit_app(&self) -> Result<String> {
        self.dispatcher.call(None, None, DOMAIN, "exitApp", &NO_ARGS)
    }

    fn send<A: Serialize + ?Sized>(&self, action: &str, args: &A) -> Result<()> {
        self.dispatcher.call(None, None, DOMAIN, action, args).map(|_| ())
    }
}
