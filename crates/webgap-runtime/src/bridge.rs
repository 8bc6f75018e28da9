// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `Bridge` facade: one object per web view that owns the dispatcher,
// the readiness graph, event registration, and the plugin table.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info};
use webgap_channel::{IntoOutcome, Outcome};
use webgap_core::config::BridgeConfig;
use webgap_core::error::Result;
use webgap_core::types::{BACK_BUTTON_EVENT, Payload, SubscriptionId, is_event};
use webgap_dispatch::{Dispatcher, Executor};

use crate::app::App;
use crate::events::{EventRegistry, HostEvents, Listener, Registration};
use crate::plugins::PluginRegistry;
use crate::readiness::Readiness;

pub struct Bridge<E, H> {
    config: BridgeConfig,
    dispatcher: Arc<Dispatcher<E>>,
    readiness: Readiness,
    events: EventRegistry<H>,
    plugins: PluginRegistry,
    backbutton_overridden: AtomicBool,
}

impl<E: Executor, H: HostEvents> Bridge<E, H> {
    /// `native_ready_at_startup` is the flag the native layer may have set
    /// before the bridge existed.
    pub fn new(executor: E, host: H, config: BridgeConfig, native_ready_at_startup: bool) -> Self {
        let dispatcher = Arc::new(Dispatcher::with_config(executor, &config));
        let readiness = Readiness::new(native_ready_at_startup);
        let events = EventRegistry::new(host, readiness.clone(), config.desktop_mode);
        info!(desktop_mode = config.desktop_mode, "bridge created");
        Self {
            config,
            dispatcher,
            readiness,
            events,
            plugins: PluginRegistry::new(),
            backbutton_overridden: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher<E>> {
        &self.dispatcher
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn events(&self) -> &EventRegistry<H> {
        &self.events
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Wrapper for the native "App" domain, using the configured
    /// `load_url` defaults.
    pub fn app(&self) -> App<E> {
        App::new(Arc::clone(&self.dispatcher), self.config.load_url.clone())
    }

    pub fn page_loaded(&self) -> bool {
        self.readiness.page_loaded()
    }

    pub fn native_layer_ready(&self) -> bool {
        self.readiness.native_layer_ready()
    }

    /// Register an event listener.
    ///
    /// The first `backbutton` registration asks the native layer to route the
    /// hardware button to script before forwarding the listener.
    pub fn add_event_listener(&self, event: &str, listener: Listener) -> Result<Registration> {
        if is_event(event, BACK_BUTTON_EVENT) && !self.backbutton_overridden.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.app().override_backbutton(true) {
                self.backbutton_overridden.store(false, Ordering::SeqCst);
                return Err(e);
            }
        }
        Ok(self.events.add_event_listener(event, listener))
    }

    /// Run `f` once the device is ready. An `Err` or a panic from `f` is
    /// logged and does not stop other constructors.
    pub fn add_constructor<F, R>(&self, f: F) -> Option<SubscriptionId>
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoOutcome,
    {
        self.readiness.on_device_ready(move |_: &[Payload]| {
            let outcome = catch_unwind(AssertUnwindSafe(|| f().into_outcome()));
            if !matches!(outcome, Ok(Outcome::Success)) {
                error!("failed to run constructor");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use serde_json::json;
    use webgap_core::error::BridgeError;
    use webgap_dispatch::RecordingExecutor;

    use super::*;
    use crate::events::LocalEvents;

    fn bridge(config: BridgeConfig) -> Bridge<RecordingExecutor, LocalEvents> {
        Bridge::new(RecordingExecutor::new(), LocalEvents::new(), config, false)
    }

    fn noop() -> Listener {
        Arc::new(|_: &[Payload]| {})
    }

    #[test]
    fn constructors_run_in_order_after_device_ready() {
        let bridge = bridge(BridgeConfig::default());
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            bridge.add_constructor(move || order.lock().expect("lock").push(n));
        }
        assert!(order.lock().expect("lock").is_empty());

        bridge.native_layer_ready();
        bridge.page_loaded();
        assert_eq!(*order.lock().expect("lock"), [0, 1, 2]);
    }

    #[test]
    fn panicking_constructor_does_not_block_others() {
        let bridge = bridge(BridgeConfig::default());
        let ran = Arc::new(AtomicUsize::new(0));
        bridge.add_constructor(|| -> () { panic!("constructor blew up") });
        bridge.add_constructor(|| -> Result<()> { Err(BridgeError::Config("missing key".into())) });
        let inner = Arc::clone(&ran);
        bridge.add_constructor(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });

        bridge.native_layer_ready();
        bridge.page_loaded();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn device_ready_listener_added_from_constructor_runs() {
        let bridge = Arc::new(bridge(BridgeConfig::default()));
        let ran = Arc::new(AtomicUsize::new(0));
        let registered = Arc::new(Mutex::new(None));
        {
            let handle = Arc::clone(&bridge);
            let ran = Arc::clone(&ran);
            let registered = Arc::clone(&registered);
            bridge.add_constructor(move || {
                let listener: Listener = Arc::new(move |_: &[Payload]| {
                    ran.fetch_add(1, Ordering::SeqCst);
                });
                let reg = handle.add_event_listener("deviceready", listener);
                *registered.lock().expect("lock") = Some(reg.map_err(|e| e.to_string()));
            });
        }

        bridge.native_layer_ready();
        bridge.page_loaded();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(
            *registered.lock().expect("lock"),
            Some(Ok(Registration::DeviceReady(None)))
        );
        assert_eq!(bridge.readiness().device_ready().handler_count(), 0);
    }

    #[test]
    fn first_backbutton_listener_overrides_native_button() {
        let bridge = bridge(BridgeConfig::default());
        bridge.add_event_listener("backbutton", noop()).expect("first");
        bridge.add_event_listener("BackButton", noop()).expect("second");

        let commands = bridge.dispatcher().executor().commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].domain, "App");
        assert_eq!(commands[0].action, "overrideBackbutton");
        assert_eq!(commands[0].args, json!([true]));
        assert_eq!(bridge.events().host().listener_count("backbutton"), 1);
        assert_eq!(bridge.events().host().listener_count("BackButton"), 1);
    }

    #[test]
    fn failed_override_is_retried_on_next_registration() {
        let bridge = bridge(BridgeConfig::default());
        bridge.dispatcher().executor().fail_exec("no activity");
        assert!(bridge.add_event_listener("backbutton", noop()).is_err());
        assert_eq!(bridge.events().host().listener_count("backbutton"), 0);

        bridge.add_event_listener("backbutton", noop()).expect("retry");
        assert_eq!(bridge.dispatcher().executor().commands().len(), 2);
    }

    #[test]
    fn app_uses_configured_load_url_defaults() {
        let mut config = BridgeConfig::default();
        config.load_url.keep_running = Some(false);
        let bridge = bridge(config);

        bridge
            .app()
            .load_url("file:///android_asset/www/index.html", Default::default())
            .expect("loadUrl");
        let cmd = bridge.dispatcher().executor().last().expect("command");
        assert_eq!(
            cmd.args,
            json!(["file:///android_asset/www/index.html", {"keepRunning": false}])
        );
    }
}
