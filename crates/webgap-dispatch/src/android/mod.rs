// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android executor via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Commands are forwarded to static methods on the
// host's command manager class:
//
//   static String exec(String domain, String action, String callId, String args)
//   static String execWatch(String domain, String action, int watchId, String args)
//
// `callId` is null for synchronous commands. The host Activity reports
// results back by calling the dispatcher's resolver methods from its own
// native glue.

#![cfg(target_os = "android")]

use std::sync::OnceLock;

use jni::objects::{JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};

use webgap_core::error::{BridgeError, Result};
use webgap_core::types::{CallId, WatchId};

use crate::traits::Executor;

/// Fully-qualified (slash-separated) class used when none is configured.
pub const DEFAULT_COMMAND_CLASS: &str = "org/webgap/bridge/CommandManager";

const EXEC_SIG: &str =
    "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;";
const EXEC_WATCH_SIG: &str =
    "(Ljava/lang/String;Ljava/lang/String;ILjava/lang/String;)Ljava/lang/String;";

static VM: OnceLock<JavaVM> = OnceLock::new();

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// Obtain the process-wide [`JavaVM`] from the NDK context.
///
/// Calls `ndk_context::android_context()` to retrieve the `JavaVM*` pointer
/// set by `android_main` or `ANativeActivity_onCreate`.
fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| BridgeError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
    Ok(VM.get_or_init(|| vm))
}

/// Attach the current thread (once) and return its [`JNIEnv`].
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| BridgeError::Bridge(format!("failed to attach JNI thread: {e}")))
}

/// Convenience: map any `jni::errors::Error` into `BridgeError::Bridge`.
fn jni_err(context: &str, e: jni::errors::Error) -> BridgeError {
    BridgeError::Bridge(format!("{context}: {e}"))
}

/// Convert a returned `java.lang.String` (possibly null) into a Rust string.
fn java_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> Result<String> {
    if obj.is_null() {
        return Ok(String::new());
    }
    let s = JString::from(obj);
    let rust: String = env
        .get_string(&s)
        .map_err(|e| jni_err("get_string(result)", e))?
        .into();
    Ok(rust)
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Android implementation of the native executor.
///
/// Holds only the class name; all command state lives on the Java side.
pub struct AndroidExecutor {
    class: String,
}

impl AndroidExecutor {
    /// Create an executor targeting [`DEFAULT_COMMAND_CLASS`].
    ///
    /// This does **not** touch JNI. The first JNI call happens lazily when
    /// a command is dispatched.
    pub fn new() -> Self {
        Self::with_class(DEFAULT_COMMAND_CLASS)
    }

    pub fn with_class(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

impl Default for AndroidExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for AndroidExecutor {
    fn exec(
        &self,
        domain: &str,
        action: &str,
        call_id: Option<&CallId>,
        args_json: &str,
    ) -> Result<String> {
        let mut env = jni_env()?;
        tracing::debug!(domain, action, ?call_id, "Android: exec");

        let j_domain = env
            .new_string(domain)
            .map_err(|e| jni_err("new_string(domain)", e))?;
        let j_action = env
            .new_string(action)
            .map_err(|e| jni_err("new_string(action)", e))?;
        let j_call_id: JObject = match call_id {
            Some(id) => env
                .new_string(id.as_str())
                .map_err(|e| jni_err("new_string(callId)", e))?
                .into(),
            None => JObject::null(),
        };
        let j_args = env
            .new_string(args_json)
            .map_err(|e| jni_err("new_string(args)", e))?;

        let result = env
            .call_static_method(
                self.class.as_str(),
                "exec",
                EXEC_SIG,
                &[
                    JValue::Object(&j_domain),
                    JValue::Object(&j_action),
                    JValue::Object(&j_call_id),
                    JValue::Object(&j_args),
                ],
            )
            .map_err(|e| jni_err("CommandManager.exec", e))?
            .l()
            .map_err(|e| jni_err("CommandManager.exec->l", e))?;
        java_string(&mut env, result)
    }

    fn exec_watch(
        &self,
        domain: &str,
        action: &str,
        watch_id: WatchId,
        args_json: &str,
    ) -> Result<String> {
        let mut env = jni_env()?;
        tracing::debug!(domain, action, %watch_id, "Android: execWatch");

        let watch_id = i32::try_from(watch_id.0)
            .map_err(|_| BridgeError::Bridge(format!("watch id {watch_id} exceeds jint")))?;
        let j_domain = env
            .new_string(domain)
            .map_err(|e| jni_err("new_string(domain)", e))?;
        let j_action = env
            .new_string(action)
            .map_err(|e| jni_err("new_string(action)", e))?;
        let j_args = env
            .new_string(args_json)
            .map_err(|e| jni_err("new_string(args)", e))?;

        let result = env
            .call_static_method(
                self.class.as_str(),
                "execWatch",
                EXEC_WATCH_SIG,
                &[
                    JValue::Object(&j_domain),
                    JValue::Object(&j_action),
                    JValue::Int(watch_id),
                    JValue::Object(&j_args),
                ],
            )
            .map_err(|e| jni_err("CommandManager.execWatch", e))?
            .l()
            .map_err(|e| jni_err("CommandManager.execWatch->l", e))?;
        java_string(&mut env, result)
    }
}
