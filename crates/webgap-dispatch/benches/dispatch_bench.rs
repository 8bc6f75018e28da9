// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the call/resolve round trip, watch delivery, and
// channel fan-out.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use webgap_channel::Channel;
use webgap_core::types::{Payload, WatchId};
use webgap_dispatch::{Dispatcher, RecordingExecutor};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Dispatch one call and resolve it immediately.
///
/// Exercises id allocation, argument serialization, table insert/evict, and
/// callback invocation.
fn bench_call_resolve(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(RecordingExecutor::new());
    let mut seq = 0u64;

    c.bench_function("call_then_resolve_success", |b| {
        b.iter(|| {
            dispatcher
                .call(
                    Some(Box::new(|p: Payload| {
                        black_box(p);
                    })),
                    None,
                    "App",
                    "loadUrl",
                    &("http://localhost/index.html", 2000),
                )
                .expect("call failed");
            let id = format!("App{seq}");
            seq += 1;
            assert!(dispatcher.resolve_success(&id, Payload::Null));
        });
        dispatcher.executor().clear();
    });
}

/// Deliver events to a single long-lived watch.
fn bench_watch_delivery(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(RecordingExecutor::new());
    let id = dispatcher
        .watch(
            Some(std::sync::Arc::new(|p: Payload| {
                black_box(p);
            })),
            None,
            "Accel",
            "watch",
            &[(); 0],
        )
        .expect("watch failed");
    assert_eq!(id, WatchId(0));

    c.bench_function("resolve_watch", |b| {
        b.iter(|| dispatcher.resolve_watch(id, black_box(Payload::from(1.5))));
    });
}

/// Fire a channel with a growing number of subscribers.
fn bench_channel_fire(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_fire");
    for subscribers in [1usize, 10, 100] {
        let channel: Channel<u32> = Channel::new("bench");
        for _ in 0..subscribers {
            channel.subscribe(|args: &[u32]| {
                black_box(args);
            });
        }
        group.bench_function(format!("{subscribers} subscribers"), |b| {
            b.iter(|| channel.fire(black_box(&[7])));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_call_resolve, bench_watch_delivery, bench_channel_fire);
criterion_main!(benches);
