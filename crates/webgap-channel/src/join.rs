// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Completion signal over a fixed set of channels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::channel::Channel;

/// Anything `join` can wait on: it has a fired latch and accepts a
/// one-shot callback.
pub trait Joinable {
    fn has_fired(&self) -> bool;

    fn once(&self, f: Box<dyn FnOnce() + Send>);
}

impl<T> Joinable for Channel<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn has_fired(&self) -> bool {
        self.fired()
    }

    fn once(&self, f: Box<dyn FnOnce() + Send>) {
        self.subscribe_once(move |_: &[T]| f());
    }
}

/// Run `on_complete` exactly once, after every channel in `channels` has
/// fired at least once.
///
/// Channels that already fired count immediately. If all of them have,
/// `on_complete` runs before `join` returns. Only the first fire of each
/// channel counts; later fires never run `on_complete` again.
pub fn join<F>(on_complete: F, channels: &[&dyn Joinable])
where
    F: FnOnce() + Send + 'static,
{
    let pending: Vec<&dyn Joinable> = channels.iter().copied().filter(|c| !c.has_fired()).collect();
    if pending.is_empty() {
        on_complete();
        return;
    }

    debug!(waiting = pending.len(), total = channels.len(), "joining channels");
    let remaining = Arc::new(AtomicUsize::new(pending.len()));
    let complete = Arc::new(Mutex::new(Some(on_complete)));
    for channel in pending {
        let remaining = Arc::clone(&remaining);
        let complete = Arc::clone(&complete);
        channel.once(Box::new(move || {
            if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                let f = complete.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(f) = f {
                    f();
                }
            }
        }));
    }
}
