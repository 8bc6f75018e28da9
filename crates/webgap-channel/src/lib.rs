// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// webgap-channel: readiness signalling primitives.
//
// A `Channel` is a named publish/subscribe point with a permanent "fired"
// latch. Late one-shot subscribers are replayed the arguments of the last
// fire, which is what lets `join` compose several channels into a single
// completion signal regardless of the order they fire in.

pub mod channel;
pub mod close;
pub mod join;

pub use channel::{Channel, Handler, IntoOutcome, Outcome, Unsubscribe, handler};
pub use close::close;
pub use join::{Joinable, join};
