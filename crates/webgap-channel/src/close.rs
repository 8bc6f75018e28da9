// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

/// Bind `func` to `context`, optionally with leading arguments.
///
/// The returned closure calls `func(&context, fixed ++ args)`, or
/// `func(&context, args)` when no fixed arguments were given.
pub fn close<C, T, R, F>(
    context: C,
    func: F,
    fixed: Option<Vec<T>>,
) -> impl Fn(&[T]) -> R + Send + Sync
where
    C: Send + Sync,
    T: Clone + Send + Sync,
    F: Fn(&C, &[T]) -> R + Send + Sync,
{
    move |args: &[T]| match &fixed {
        None => func(&context, args),
        Some(fixed) => {
            let mut all = Vec::with_capacity(fixed.len() + args.len());
            all.extend_from_slice(fixed);
            all.extend_from_slice(args);
            func(&context, &all)
        }
    }
}
