// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event registration with the reserved `deviceready` name.
//
// Registering for `deviceready` (any ASCII case) becomes a one-shot
// subscription on the device-ready channel. Every other event name goes to
// the host's own listener mechanism untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use webgap_core::types::{DEVICE_READY_EVENT, Payload, SubscriptionId, is_event};

use crate::readiness::Readiness;

/// Event listener as the host sees it.
pub type Listener = Arc<dyn Fn(&[Payload]) + Send + Sync>;

/// The host page's generic event registration.
pub trait HostEvents: Send + Sync {
    fn add_listener(&self, event: &str, listener: Listener);
}

/// Where a registration ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Parked on the device-ready channel (`None` if it already ran).
    DeviceReady(Option<SubscriptionId>),
    /// Passed through to the host.
    Forwarded,
}

/// Entry point for event registration.
pub struct EventRegistry<H> {
    host: H,
    readiness: Readiness,
    desktop_mode: bool,
}

impl<H: HostEvents> EventRegistry<H> {
    pub fn new(host: H, readiness: Readiness, desktop_mode: bool) -> Self {
        Self {
            host,
            readiness,
            desktop_mode,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn add_event_listener(&self, event: &str, listener: Listener) -> Registration {
        if !is_event(event, DEVICE_READY_EVENT) {
            self.host.add_listener(event, listener);
            return Registration::Forwarded;
        }

        let id = self
            .readiness
            .on_device_ready(move |args: &[Payload]| listener(args));
        if self.desktop_mode && !self.readiness.is_device_ready() {
            // No native layer will ever report in, so readiness is immediate.
            debug!("desktop mode: firing device ready on registration");
            self.readiness.device_ready().fire(&[]);
        }
        Registration::DeviceReady(id)
    }
}

/// In-process listener table, for hosts without their own event system.
#[derive(Default)]
pub struct LocalEvents {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl LocalEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke every listener registered for `event`. Returns how many ran.
    pub fn dispatch(&self, event: &str, args: &[Payload]) -> usize {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            listener(args);
        }
        listeners.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }
}

impl HostEvents for LocalEvents {
    fn add_listener(&self, event: &str, listener: Listener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_owned())
            .or_default()
            .push(listener);
    }
}

impl<H: HostEvents + ?Sized> HostEvents for Arc<H> {
    fn add_listener(&self, event: &str, listener: Listener) {
        (**self).add_listener(event, listener);
    }
}
