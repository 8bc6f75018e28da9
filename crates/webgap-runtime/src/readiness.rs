// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device-ready gating.
//
// Two independent signals, "DOM content loaded" and "native layer ready",
// are joined into a derived "device ready" channel. The native layer may
// have reported readiness before any of this exists, so the caller passes
// that flag in at construction and the native channel fires immediately.

use tracing::{debug, info};
use webgap_channel::{Channel, IntoOutcome, join};
use webgap_core::types::{Payload, SubscriptionId};

/// The readiness graph. Clones share the same channels.
#[derive(Debug, Clone)]
pub struct Readiness {
    dom_content_loaded: Channel,
    native_ready: Channel,
    device_ready: Channel,
}

impl Readiness {
    pub fn new(native_ready_at_startup: bool) -> Self {
        let dom_content_loaded: Channel = Channel::new("dom-content-loaded");
        let native_ready: Channel = Channel::new("native-ready");
        if native_ready_at_startup {
            debug!("native layer reported ready before bridge start");
            native_ready.fire(&[]);
        }

        let device_ready: Channel = Channel::new("device-ready");
        let target = device_ready.clone();
        join(
            move || {
                info!("device ready");
                target.fire(&[]);
            },
            &[&dom_content_loaded, &native_ready],
        );

        Self {
            dom_content_loaded,
            native_ready,
            device_ready,
        }
    }

    /// Host signal: the page finished parsing. Only the first call fires.
    pub fn page_loaded(&self) -> bool {
        fire_once(&self.dom_content_loaded)
    }

    /// Native signal: the platform side finished initialising. Only the
    /// first call fires.
    pub fn native_layer_ready(&self) -> bool {
        fire_once(&self.native_ready)
    }

    /// Run `f` once the device is ready (immediately if it already is).
    pub fn on_device_ready<F, R>(&self, f: F) -> Option<SubscriptionId>
    where
        F: FnOnce(&[Payload]) -> R + Send + 'static,
        R: IntoOutcome,
    {
        self.device_ready.subscribe_once(f)
    }

    pub fn is_device_ready(&self) -> bool {
        self.device_ready.fired()
    }

    pub fn dom_content_loaded(&self) -> &Channel {
        &self.dom_content_loaded
    }

    pub fn native_ready(&self) -> &Channel {
        &self.native_ready
    }

    pub fn device_ready(&self) -> &Channel {
        &self.device_ready
    }
}

fn fire_once(channel: &Channel) -> bool {
    if channel.fired() {
        debug!(channel = channel.kind(), "ignoring repeated readiness signal");
        return false;
    }
    channel.fire(&[]);
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn count_ready(readiness: &Readiness) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        readiness.on_device_ready(move |_: &[Payload]| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn needs_both_signals() {
        let readiness = Readiness::new(false);
        let count = count_ready(&readiness);

        readiness.page_loaded();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!readiness.is_device_ready());

        readiness.native_layer_ready();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(readiness.is_device_ready());
    }

    #[test]
    fn early_native_flag_counts_at_construction() {
        let readiness = Readiness::new(true);
        assert!(readiness.native_ready().fired());
        let count = count_ready(&readiness);
        readiness.page_loaded();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn repeated_signals_are_ignored() {
        let readiness = Readiness::new(false);
        let count = count_ready(&readiness);
        assert!(readiness.page_loaded());
        assert!(!readiness.page_loaded());
        assert!(readiness.native_layer_ready());
        assert!(!readiness.native_layer_ready());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_subscriber_runs_immediately() {
        let readiness = Readiness::new(true);
        readiness.page_loaded();
        let count = count_ready(&readiness);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(readiness.device_ready().handler_count(), 0);
    }
}
