// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// webgap-runtime: host-facing readiness gating, event registration,
// domain wrappers, and the `Bridge` facade that ties them to a dispatcher.

pub mod app;
pub mod bridge;
pub mod events;
pub mod logging;
pub mod plugins;
pub mod readiness;

pub use app::App;
pub use bridge::Bridge;
pub use events::{EventRegistry, HostEvents, Listener, LocalEvents, Registration};
pub use plugins::PluginRegistry;
pub use readiness::Readiness;
