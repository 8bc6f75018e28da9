// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Named plugin and extension objects. First registration wins.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

type Object = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Mutex<HashMap<String, Object>>,
    extensions: Mutex<HashMap<String, Object>>,
}

fn insert_if_absent(table: MutexGuard<'_, HashMap<String, Object>>, kind: &str, name: &str, obj: Object) -> bool {
    let mut table = table;
    if table.contains_key(name) {
        debug!(kind, name, "already registered; keeping the first");
        return false;
    }
    table.insert(name.to_owned(), obj);
    true
}

fn lookup<T: Any + Send + Sync>(table: MutexGuard<'_, HashMap<String, Object>>, name: &str) -> Option<Arc<T>> {
    table.get(name).cloned().and_then(|obj| obj.downcast::<T>().ok())
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under `name` unless one is already there.
    pub fn add_plugin<T: Any + Send + Sync>(&self, name: &str, plugin: T) -> bool {
        insert_if_absent(self.plugins(), "plugin", name, Arc::new(plugin))
    }

    /// Register an extension under `name` unless one is already there.
    pub fn add_extension<T: Any + Send + Sync>(&self, name: &str, extension: T) -> bool {
        insert_if_absent(self.extensions(), "extension", name, Arc::new(extension))
    }

    /// Typed lookup; `None` if absent or registered with another type.
    pub fn plugin<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        lookup(self.plugins(), name)
    }

    pub fn extension<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        lookup(self.extensions(), name)
    }

    fn plugins(&self) -> MutexGuard<'_, HashMap<String, Object>> {
        self.plugins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn extensions(&self) -> MutexGuard<'_, HashMap<String, Object>> {
        self.extensions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
